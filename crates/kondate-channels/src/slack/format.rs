//! Slack message rendering (mrkdwn text and Block Kit).

use kondate_core::message::{OutboundContent, ReplyTarget};
use kondate_core::prompt::PromptTemplate;
use kondate_core::recipe::Recipe;
use serde_json::{json, Value};

use crate::text::{basis_line, missing_line, recipes_as_text, truncate_chars, RESULT_TITLE};

/// Slack caps section text at 3000 characters.
const SECTION_TEXT_LIMIT: usize = 3000;
/// Header blocks are plain text, at most 150 characters.
const HEADER_TEXT_LIMIT: usize = 150;
/// Top-level `text` limit we keep under.
pub(crate) const SLACK_TEXT_LIMIT: usize = 4000;

/// Escape `&`, `<` and `>` for mrkdwn fields.
pub(crate) fn escape_mrkdwn(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Remove `<@U123>` style mention tags and collapse surrounding whitespace.
pub(crate) fn strip_mentions(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find("<@") {
        out.push_str(&rest[..start]);
        match rest[start..].find('>') {
            Some(end) => rest = &rest[start + end + 1..],
            None => {
                rest = &rest[start..];
                break;
            }
        }
    }
    out.push_str(rest);
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn recipe_section(recipe: &Recipe) -> Value {
    let mut text = format!("*{}. {}*", recipe.number, escape_mrkdwn(&recipe.name));
    if !recipe.description.is_empty() {
        text.push('\n');
        text.push_str(&escape_mrkdwn(&recipe.description));
    }
    if let Some(missing) = missing_line(recipe) {
        text.push_str(&format!("\n_{}_", escape_mrkdwn(&missing)));
    }
    json!({
        "type": "section",
        "text": { "type": "mrkdwn", "text": truncate_chars(&text, SECTION_TEXT_LIMIT) }
    })
}

/// Block Kit layout for a set of recipes.
pub(crate) fn recipe_blocks(
    template: PromptTemplate,
    input: &str,
    recipes: &[Recipe],
) -> Vec<Value> {
    let mut blocks = vec![
        json!({
            "type": "header",
            "text": {
                "type": "plain_text",
                "text": truncate_chars(RESULT_TITLE, HEADER_TEXT_LIMIT),
                "emoji": true
            }
        }),
        json!({
            "type": "context",
            "elements": [{
                "type": "mrkdwn",
                "text": escape_mrkdwn(&basis_line(template, input))
            }]
        }),
    ];
    blocks.extend(recipes.iter().map(recipe_section));
    blocks.push(json!({ "type": "divider" }));
    blocks
}

/// Full message payload for a reply target.
pub(crate) fn message_payload(target: &ReplyTarget, content: &OutboundContent) -> Value {
    let mut payload = match content {
        OutboundContent::Text(text) => json!({
            "text": truncate_chars(text, SLACK_TEXT_LIMIT),
        }),
        OutboundContent::Error(text) => json!({
            "text": truncate_chars(&format!("❌ {text}"), SLACK_TEXT_LIMIT),
        }),
        OutboundContent::Recipes {
            template,
            input,
            recipes,
        } => json!({
            "text": truncate_chars(&recipes_as_text(*template, input, recipes), SLACK_TEXT_LIMIT),
            "blocks": recipe_blocks(*template, input, recipes),
        }),
    };

    match target {
        ReplyTarget::ResponseUrl(_) => {
            payload["response_type"] = json!("in_channel");
            payload["replace_original"] = json!(true);
        }
        ReplyTarget::Conversation(channel) => {
            payload["channel"] = json!(channel);
        }
        ReplyTarget::ReplyToken(_) => {}
    }
    payload
}
