//! Plain-text rendering shared by both platforms.

use kondate_core::prompt::PromptTemplate;
use kondate_core::recipe::Recipe;

pub(crate) const RESULT_TITLE: &str = "🍽️ 晩御飯メニュー提案";
pub(crate) const MISSING_LABEL: &str = "追加で必要";

/// Truncate to at most `max` characters, appending an ellipsis if cut.
pub(crate) fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

pub(crate) fn basis_line(template: PromptTemplate, input: &str) -> String {
    format!("{}「{}」に基づく提案", template.label(), input.trim())
}

pub(crate) fn missing_line(recipe: &Recipe) -> Option<String> {
    if recipe.missing_items.is_empty() {
        None
    } else {
        Some(format!("{MISSING_LABEL}: {}", recipe.missing_items.join("、")))
    }
}

/// Recipes as a plain-text message.
pub(crate) fn recipes_as_text(template: PromptTemplate, input: &str, recipes: &[Recipe]) -> String {
    let mut text = format!("{RESULT_TITLE}\n{}\n", basis_line(template, input));
    for recipe in recipes {
        text.push_str(&format!("\n{}. {}\n", recipe.number, recipe.name));
        if !recipe.description.is_empty() {
            for line in recipe.description.lines() {
                text.push_str(&format!("   - {line}\n"));
            }
        }
        if let Some(missing) = missing_line(recipe) {
            text.push_str(&format!("   - {missing}\n"));
        }
    }
    text.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipe(number: u32, name: &str, missing: &[&str]) -> Recipe {
        Recipe {
            number,
            name: name.into(),
            description: "説明".into(),
            missing_items: missing.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_truncate_chars_counts_characters() {
        assert_eq!(truncate_chars("あいう", 3), "あいう");
        assert_eq!(truncate_chars("あいうえ", 3), "あい…");
    }

    #[test]
    fn test_recipes_as_text_layout() {
        let text = recipes_as_text(
            PromptTemplate::Ingredients,
            "卵",
            &[recipe(1, "親子丼", &["鶏もも肉"]), recipe(2, "卵焼き", &[])],
        );
        assert!(text.starts_with(RESULT_TITLE));
        assert!(text.contains("食材「卵」に基づく提案"));
        assert!(text.contains("1. 親子丼\n   - 説明\n   - 追加で必要: 鶏もも肉"));
        assert!(text.ends_with("2. 卵焼き\n   - 説明"));
    }
}
