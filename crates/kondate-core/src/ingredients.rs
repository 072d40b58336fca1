use serde::{Deserialize, Serialize};

/// Trim an ingredient name for display, including the ideographic space.
/// Returns `None` for items that are empty after trimming.
pub fn clean_item(raw: &str) -> Option<String> {
    let trimmed = raw.trim_matches(|c: char| c.is_whitespace() || c == '\u{3000}');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Comparison key for an already-cleaned item.
pub fn normalize_key(item: &str) -> String {
    item.to_lowercase()
}

/// A user's on-hand ingredients, in first-insertion order.
///
/// Items compare case-insensitively; the first-seen spelling is kept for
/// display.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientSet {
    items: Vec<String>,
}

impl IngredientSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from raw items, cleaning and collapsing duplicates.
    pub fn from_items<I, S>(raw: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        set.extend(raw);
        set
    }

    /// Union raw items into the set. Returns how many were new.
    pub fn extend<I, S>(&mut self, raw: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut added = 0;
        for item in raw {
            let Some(clean) = clean_item(item.as_ref()) else {
                continue;
            };
            if !self.contains(&clean) {
                self.items.push(clean);
                added += 1;
            }
        }
        added
    }

    pub fn contains(&self, item: &str) -> bool {
        let Some(clean) = clean_item(item) else {
            return false;
        };
        let key = normalize_key(&clean);
        self.items.iter().any(|i| normalize_key(i) == key)
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Ingredients joined for use as generation input.
    pub fn to_input(&self) -> String {
        self.items.join("、")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_item_trims_ideographic_space() {
        assert_eq!(clean_item("\u{3000}トマト "), Some("トマト".to_string()));
        assert_eq!(clean_item(" \u{3000} "), None);
    }

    #[test]
    fn test_from_items_collapses_case_duplicates() {
        let set = IngredientSet::from_items(["Tomato", "tomato ", "TOMATO", "egg"]);
        assert_eq!(set.items(), &["Tomato".to_string(), "egg".to_string()]);
    }

    #[test]
    fn test_extend_is_idempotent() {
        let mut set = IngredientSet::from_items(["トマト", "卵"]);
        assert_eq!(set.extend(["卵", "トマト"]), 0);
        assert_eq!(set.len(), 2);
        assert_eq!(set.extend(["ベーコン", ""]), 1);
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_contains_is_case_insensitive() {
        let set = IngredientSet::from_items(["Bacon"]);
        assert!(set.contains("bacon"));
        assert!(set.contains(" BACON "));
        assert!(!set.contains(""));
    }

    #[test]
    fn test_to_input_joins_with_ideographic_comma() {
        let set = IngredientSet::from_items(["トマト", "卵"]);
        assert_eq!(set.to_input(), "トマト、卵");
        assert_eq!(IngredientSet::new().to_input(), "");
    }
}
