//! User-facing reply texts.

use kondate_core::ingredients::IngredientSet;

/// Help shown for empty input and `help`.
pub fn help() -> String {
    [
        "🍽️ *晩御飯メニュー提案ボット*",
        "",
        "食材や気分を送ると、晩御飯のメニューを3つ提案します。",
        "",
        "*例*",
        "• `キャベツと鶏むね肉と卵` ... 食材から提案",
        "• `さっぱりしたものが食べたい` ... 気分から提案",
        "",
        "*食材の保存*",
        "• `add トマト、卵、ベーコン` ... 食材を保存",
        "• `list` ... 保存した食材を表示",
        "• `stored` ... 保存した食材から提案",
        "• `clear` ... 保存した食材をすべて削除",
    ]
    .join("\n")
}

pub fn add_usage() -> String {
    "追加する食材を指定してください。例: `add トマト、卵、ベーコン`".to_string()
}

/// Shown when `stored` or `list` finds nothing.
pub fn store_empty() -> String {
    "保存されている食材はありません。`add 食材名` で食材を追加してください。".to_string()
}

/// Numbered list of stored ingredients, or guidance when empty.
pub fn ingredient_list(set: &IngredientSet) -> String {
    if set.is_empty() {
        return store_empty();
    }
    let mut out = format!("📝 保存されている食材（{}件）", set.len());
    for (i, item) in set.items().iter().enumerate() {
        out.push_str(&format!("\n{}. {item}", i + 1));
    }
    out
}

/// Confirmation after `add`, followed by the resulting set.
pub fn added(set: &IngredientSet) -> String {
    format!("✅ 食材を保存しました。\n\n{}", ingredient_list(set))
}

pub fn cleared() -> String {
    "🗑️ 保存した食材をすべて削除しました。".to_string()
}

pub fn generating() -> String {
    "🍽️ レシピを生成中です... 少々お待ちください！".to_string()
}

/// The job could not be handed to the generator.
pub fn handoff_failed() -> String {
    "⚠️ ただいま混み合っているため、レシピを生成できませんでした。少し時間をおいてもう一度お試しください。"
        .to_string()
}

/// Store failure or reply budget exceeded.
pub fn try_again() -> String {
    "⚠️ 処理中にエラーが発生しました。もう一度お試しください。".to_string()
}

pub fn generation_failed() -> String {
    "レシピの生成に失敗しました。もう一度お試しください。".to_string()
}
