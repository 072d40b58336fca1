//! Intent classification for free-text commands.
//!
//! Order of evaluation: empty text, storage subcommands, the structural
//! conjunction override, mood keywords, then the ingredient default.

use serde::{Deserialize, Serialize};

/// Words that describe how a meal should feel rather than what goes in it.
pub const MOOD_KEYWORDS: &[&str] = &[
    "さっぱり",
    "あっさり",
    "こってり",
    "ガッツリ",
    "ヘルシー",
    "夏バテ",
    "疲れ",
    "スタミナ",
    "温まる",
    "冷たい",
    "辛い",
    "甘い",
    "優しい",
    "濃厚",
    "サッパリ",
    "気分",
    "食べたい",
    "系",
    "な感じ",
    "的な",
    "元気",
    "パワー",
    "軽め",
    "重め",
    "食欲",
    "がっつり",
    "しっかり",
    "ボリューム",
    "満足",
    "和風",
    "洋風",
    "中華",
    "エスニック",
    "イタリアン",
];

/// Tokens that typically join several food nouns.
pub const CONJUNCTION_INDICATORS: &[&str] =
    &["と", "や", "、", "の", "が残って", "がある", "を使って"];

/// Distinct indicators needed before mood keywords are ignored.
const STRUCTURAL_THRESHOLD: usize = 2;

const EXPLICIT_SEPARATORS: &[char] = &[',', '、', '，', ';', '；', '／', '/'];
const SOFT_SEPARATORS: &[char] = &['と', 'や'];

/// What a user's text asks for. Exactly one per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Intent {
    GenerateFromIngredients(String),
    GenerateFromMood(String),
    StoreAdd(Vec<String>),
    StoreList,
    StoreClear,
    StoreGenerate,
    Help,
}

impl Intent {
    /// Stable name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::GenerateFromIngredients(_) => "generate_from_ingredients",
            Self::GenerateFromMood(_) => "generate_from_mood",
            Self::StoreAdd(_) => "store_add",
            Self::StoreList => "store_list",
            Self::StoreClear => "store_clear",
            Self::StoreGenerate => "store_generate",
            Self::Help => "help",
        }
    }
}

/// Classify free text. Total and pure.
pub fn classify(raw: &str) -> Intent {
    let text = raw.trim();
    if text.is_empty() {
        return Intent::Help;
    }

    if let Some(intent) = parse_subcommand(text) {
        return intent;
    }

    if conjunction_count(text) >= STRUCTURAL_THRESHOLD {
        return Intent::GenerateFromIngredients(text.to_string());
    }
    if has_mood_keyword(text) {
        return Intent::GenerateFromMood(text.to_string());
    }
    Intent::GenerateFromIngredients(text.to_string())
}

fn parse_subcommand(text: &str) -> Option<Intent> {
    let (head, rest) = match text.find(char::is_whitespace) {
        Some(idx) => (&text[..idx], text[idx..].trim()),
        None => (text, ""),
    };
    let head = head.to_ascii_lowercase();

    match head.as_str() {
        "add" => Some(Intent::StoreAdd(split_items(rest))),
        "list" if rest.is_empty() => Some(Intent::StoreList),
        "stored" if rest.is_empty() => Some(Intent::StoreGenerate),
        "clear" if rest.is_empty() => Some(Intent::StoreClear),
        "help" if rest.is_empty() => Some(Intent::Help),
        _ => None,
    }
}

/// Number of distinct conjunction indicators present in `text`.
pub fn conjunction_count(text: &str) -> usize {
    CONJUNCTION_INDICATORS
        .iter()
        .filter(|ind| text.contains(*ind))
        .count()
}

pub fn has_mood_keyword(text: &str) -> bool {
    let lower = text.to_lowercase();
    MOOD_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

/// Split the argument of `add` into items.
///
/// Explicit separators (commas, slashes, semicolons, `and`, `&`) take
/// precedence. `と`/`や` only split when none of those appear, and only
/// between two non-hiragana characters, so `とうふ` or `やさい` stay whole.
pub fn split_items(rest: &str) -> Vec<String> {
    let joined = rest
        .split_whitespace()
        .map(|word| {
            if word.eq_ignore_ascii_case("and") || word == "&" {
                ","
            } else {
                word
            }
        })
        .collect::<Vec<_>>()
        .join(" ");

    let explicit = joined.contains(EXPLICIT_SEPARATORS) || joined.contains('&');
    let pieces: Vec<&str> = if explicit {
        joined
            .split(|c: char| EXPLICIT_SEPARATORS.contains(&c) || c == '&')
            .collect()
    } else {
        split_on_particles(&joined)
    };

    pieces
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect()
}

/// Split on `と`/`や` used as a particle between two words.
fn split_on_particles(text: &str) -> Vec<&str> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut pieces = Vec::new();
    let mut start = 0;
    for (i, &(idx, c)) in chars.iter().enumerate() {
        if !SOFT_SEPARATORS.contains(&c) {
            continue;
        }
        let before = i.checked_sub(1).map(|j| chars[j].1);
        let after = chars.get(i + 1).map(|&(_, c)| c);
        if let (Some(b), Some(a)) = (before, after) {
            if !is_hiragana(b) && !is_hiragana(a) {
                pieces.push(&text[start..idx]);
                start = idx + c.len_utf8();
            }
        }
    }
    pieces.push(&text[start..]);
    pieces
}

fn is_hiragana(c: char) -> bool {
    ('\u{3041}'..='\u{309F}').contains(&c)
}
