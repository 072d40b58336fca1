//! Parse generated text into recipe records.
//!
//! Expected shape:
//!
//! ```text
//! 1. メニュー名
//!    - 説明
//!    - 追加で必要な食材: 卵、ねぎ
//! ```
//!
//! A strict pass only accepts numbered lines directly followed by a bullet.
//! When that finds nothing, a lenient pass takes any numbered line as a
//! record start.

use serde::{Deserialize, Serialize};

use crate::error::KondateError;

/// One suggested meal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub number: u32,
    pub name: String,
    pub description: String,
    /// Ingredients the user needs beyond what they have.
    pub missing_items: Vec<String>,
}

const BULLETS: &[char] = &['-', '－', '・', '•', '*'];
const MISSING_LABELS: &[&str] = &["不足", "追加で必要", "missing"];
const NOTHING: &[&str] = &["なし", "特になし", "none", "-"];

#[derive(Debug)]
enum Line<'a> {
    Numbered { number: u32, name: &'a str },
    Bullet(&'a str),
    Other,
}

fn classify_line(line: &str) -> Line<'_> {
    let line = line.trim();
    let digits_end = line
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(line.len());
    if digits_end > 0 {
        let rest = &line[digits_end..];
        let mut chars = rest.chars();
        if let Some(marker) = chars.next() {
            if matches!(marker, '.' | '．' | ')' | '）') {
                if let Ok(number) = line[..digits_end].parse() {
                    return Line::Numbered {
                        number,
                        name: chars.as_str().trim(),
                    };
                }
            }
        }
    }
    // Bold markers start with "**", which is not a bullet.
    if line.starts_with("**") {
        return Line::Other;
    }
    if let Some(rest) = line.strip_prefix(BULLETS) {
        return Line::Bullet(rest.trim());
    }
    Line::Other
}

fn clean_name(name: &str) -> String {
    name.replace("**", "")
        .trim_matches(|c: char| {
            c.is_whitespace() || matches!(c, '[' | ']' | '【' | '】' | '「' | '」' | ':' | '：')
        })
        .to_string()
}

/// Returns the item list when `bullet` is a missing-items line.
fn missing_items(bullet: &str) -> Option<Vec<String>> {
    let lower = bullet.to_lowercase();
    if !MISSING_LABELS.iter().any(|l| lower.starts_with(l)) {
        return None;
    }
    let value = bullet
        .split_once([':', '：'])
        .map(|(_, v)| v)
        .unwrap_or("")
        .trim();
    // Drop a trailing parenthetical such as "（なければ「なし」）".
    let value = value
        .split_once(['（', '('])
        .map(|(v, _)| v)
        .unwrap_or(value)
        .trim();
    if value.is_empty() || NOTHING.iter().any(|n| value.eq_ignore_ascii_case(n)) {
        return Some(Vec::new());
    }
    Some(
        value
            .split(['、', ',', '，', '/', '／'])
            .map(str::trim)
            .filter(|s| !s.is_empty() && !NOTHING.iter().any(|n| n == s))
            .map(String::from)
            .collect(),
    )
}

fn apply_bullet(recipe: &mut Recipe, bullet: &str) {
    if let Some(items) = missing_items(bullet) {
        recipe.missing_items.extend(items);
        return;
    }
    let text = bullet.replace("**", "");
    let text = text.trim();
    if text.is_empty() {
        return;
    }
    if !recipe.description.is_empty() {
        recipe.description.push('\n');
    }
    recipe.description.push_str(text);
}

fn new_record(number: u32, name: &str) -> Recipe {
    Recipe {
        number,
        name: clean_name(name),
        description: String::new(),
        missing_items: Vec::new(),
    }
}

fn parse_strict(lines: &[Line<'_>]) -> Vec<Recipe> {
    let mut recipes = Vec::new();
    let mut current: Option<Recipe> = None;
    for (i, line) in lines.iter().enumerate() {
        match line {
            Line::Numbered { number, name } => {
                recipes.extend(current.take());
                let followed_by_bullet = matches!(lines.get(i + 1), Some(Line::Bullet(_)));
                if followed_by_bullet && !name.is_empty() {
                    current = Some(new_record(*number, name));
                }
            }
            Line::Bullet(text) => {
                if let Some(recipe) = current.as_mut() {
                    apply_bullet(recipe, text);
                }
            }
            Line::Other => {}
        }
    }
    recipes.extend(current);
    recipes
}

fn parse_lenient(lines: &[Line<'_>]) -> Vec<Recipe> {
    let mut recipes = Vec::new();
    let mut current: Option<Recipe> = None;
    for line in lines {
        match line {
            Line::Numbered { number, name } => {
                recipes.extend(current.take());
                current = Some(new_record(*number, name));
            }
            Line::Bullet(text) => {
                if let Some(recipe) = current.as_mut() {
                    apply_bullet(recipe, text);
                }
            }
            Line::Other => {}
        }
    }
    recipes.extend(current);
    recipes.retain(|r| !r.name.is_empty());
    recipes
}

/// Parse generated text into recipes. Zero records is an error.
pub fn parse_recipes(text: &str) -> Result<Vec<Recipe>, KondateError> {
    let lines: Vec<Line<'_>> = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(classify_line)
        .collect();

    let mut recipes = parse_strict(&lines);
    if recipes.is_empty() {
        tracing::warn!("strict recipe pattern matched nothing, using line fallback");
        recipes = parse_lenient(&lines);
    }
    if recipes.is_empty() {
        return Err(KondateError::Provider(
            "no recipes found in generated text".into(),
        ));
    }
    Ok(recipes)
}
