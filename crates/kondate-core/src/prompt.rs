use serde::{Deserialize, Serialize};
use std::fmt;

/// Which phrasing the generation prompt uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptTemplate {
    /// Suggest meals from a list of on-hand ingredients.
    Ingredients,
    /// Suggest meals that fit a described mood or craving.
    Mood,
}

impl PromptTemplate {
    /// Short Japanese label shown next to results.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Ingredients => "食材",
            Self::Mood => "気分",
        }
    }
}

impl fmt::Display for PromptTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ingredients => f.write_str("ingredients"),
            Self::Mood => f.write_str("mood"),
        }
    }
}

const FORMAT_FOOTER: &str = "\
必要に応じて3つ目のメニューも提案してください。
メニュー名は具体的で、作りたくなるような名前にしてください。";

/// Build the generation prompt. Pure; shared by every platform.
pub fn build_prompt(template: PromptTemplate, text: &str) -> String {
    let text = text.trim();
    match template {
        PromptTemplate::Ingredients => format!(
            "あなたは優秀な料理アドバイザーです。
以下の食材を使って、美味しい晩御飯のメニューを2-3個提案してください。
各メニューについて、簡単な説明と、手元の食材以外に必要な食材も付けてください。

食材: {text}

提案フォーマット:
🍽️ メニュー提案

1. [メニュー名]
   - 簡単な説明
   - 追加で必要な食材: 食材名、食材名（なければ「なし」）

2. [メニュー名]
   - 簡単な説明
   - 追加で必要な食材: 食材名、食材名（なければ「なし」）

{FORMAT_FOOTER}
説明は1-2文で、調理方法の特徴や味の特徴を含めてください。"
        ),
        PromptTemplate::Mood => format!(
            "あなたはプロの料理アドバイザーです。
ユーザーの今の気分や食べたいものの希望に基づいて、ぴったりの晩御飯メニューを提案してください。

ユーザーの気分・希望: {text}

この気分にぴったり合う晩御飯メニューを2-3個提案してください。
各メニューについて、なぜその気分に合うのか、どんな味わいや特徴があるのかも含めて説明してください。

提案フォーマット:
🍽️ メニュー提案

1. [メニュー名]
   - 簡単な説明（この気分に合う理由、味の特徴、調理のポイントなど）
   - 追加で必要な食材: 主な食材名（なければ「なし」）

2. [メニュー名]
   - 簡単な説明（この気分に合う理由、味の特徴、調理のポイントなど）
   - 追加で必要な食材: 主な食材名（なければ「なし」）

{FORMAT_FOOTER}
説明は2-3文で、なぜその気分にマッチするかを含めて記載してください。"
        ),
    }
}
