//! LINE message objects: text and Flex bubbles.

use kondate_core::message::OutboundContent;
use kondate_core::prompt::PromptTemplate;
use kondate_core::recipe::Recipe;
use serde_json::{json, Value};

use crate::text::{basis_line, missing_line, recipes_as_text, truncate_chars, RESULT_TITLE};

/// LINE text messages are limited to 5000 characters.
const LINE_TEXT_LIMIT: usize = 5000;
/// Flex `altText` is limited to 400 characters.
const ALT_TEXT_LIMIT: usize = 400;

const ACCENT: &str = "#1DB446";
const HEADER_BG: &str = "#FF6B6B";

pub(crate) fn text_message(text: &str) -> Value {
    json!({
        "type": "text",
        "text": truncate_chars(text, LINE_TEXT_LIMIT),
    })
}

fn recipe_components(index: usize, recipe: &Recipe) -> Vec<Value> {
    let mut name = json!({
        "type": "text",
        "text": format!("{}. {}", recipe.number, recipe.name),
        "size": "md",
        "weight": "bold",
        "color": ACCENT,
        "wrap": true,
    });
    if index > 0 {
        name["margin"] = json!("lg");
    }
    let mut parts = vec![name];
    if !recipe.description.is_empty() {
        parts.push(json!({
            "type": "text",
            "text": recipe.description,
            "size": "sm",
            "color": "#666666",
            "wrap": true,
            "margin": "sm",
        }));
    }
    if let Some(missing) = missing_line(recipe) {
        parts.push(json!({
            "type": "text",
            "text": missing,
            "size": "xs",
            "color": "#999999",
            "wrap": true,
            "margin": "sm",
        }));
    }
    parts
}

/// A Flex bubble listing the recipes.
pub(crate) fn flex_message(template: PromptTemplate, input: &str, recipes: &[Recipe]) -> Value {
    let mut body = vec![json!({
        "type": "text",
        "text": basis_line(template, input),
        "size": "sm",
        "color": "#999999",
        "wrap": true,
    })];
    for (i, recipe) in recipes.iter().enumerate() {
        body.extend(recipe_components(i, recipe));
    }

    json!({
        "type": "flex",
        "altText": truncate_chars(RESULT_TITLE, ALT_TEXT_LIMIT),
        "contents": {
            "type": "bubble",
            "header": {
                "type": "box",
                "layout": "vertical",
                "backgroundColor": HEADER_BG,
                "paddingAll": "20px",
                "contents": [{
                    "type": "text",
                    "text": RESULT_TITLE,
                    "weight": "bold",
                    "color": "#FFFFFF",
                    "size": "lg",
                }],
            },
            "body": {
                "type": "box",
                "layout": "vertical",
                "paddingAll": "20px",
                "contents": body,
            },
            "footer": {
                "type": "box",
                "layout": "vertical",
                "paddingAll": "10px",
                "contents": [{
                    "type": "text",
                    "text": "どれか作ってみてくださいね😊",
                    "size": "xs",
                    "color": "#AAAAAA",
                    "align": "center",
                }],
            },
        },
    })
}

/// The single message object for a piece of content.
pub(crate) fn message_object(content: &OutboundContent, use_flex: bool) -> Value {
    match content {
        OutboundContent::Text(text) => text_message(text),
        OutboundContent::Error(text) => text_message(&format!("申し訳ありません。{text}")),
        OutboundContent::Recipes {
            template,
            input,
            recipes,
        } => {
            if use_flex {
                flex_message(*template, input, recipes)
            } else {
                text_message(&recipes_as_text(*template, input, recipes))
            }
        }
    }
}
