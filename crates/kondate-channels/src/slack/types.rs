//! Slack webhook payload types.

use kondate_core::error::KondateError;
use serde::Deserialize;
use std::collections::HashMap;

/// Fields of a slash command we use. The body is `application/x-www-form-urlencoded`.
#[derive(Debug)]
pub(crate) struct SlashCommand {
    pub text: String,
    pub user_id: String,
    pub response_url: String,
}

fn decode_component(raw: &str) -> Result<String, KondateError> {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|s| s.into_owned())
        .map_err(|e| KondateError::Malformed(format!("bad form encoding: {e}")))
}

/// Parse a form-encoded body into key/value pairs.
pub(crate) fn parse_form(body: &[u8]) -> Result<HashMap<String, String>, KondateError> {
    let body = std::str::from_utf8(body)
        .map_err(|_| KondateError::Malformed("form body is not UTF-8".into()))?;
    let mut fields = HashMap::new();
    for pair in body.split('&').filter(|p| !p.is_empty()) {
        let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
        fields.insert(decode_component(k)?, decode_component(v)?);
    }
    Ok(fields)
}

impl SlashCommand {
    pub(crate) fn from_form(body: &[u8]) -> Result<Self, KondateError> {
        let mut fields = parse_form(body)?;
        let mut required = |name: &str| {
            fields
                .remove(name)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| KondateError::Malformed(format!("slash command missing {name}")))
        };
        let user_id = required("user_id")?;
        let response_url = required("response_url")?;
        let text = fields.remove("text").unwrap_or_default();
        Ok(Self {
            text,
            user_id,
            response_url,
        })
    }
}

/// Events API envelope.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum EventEnvelope {
    UrlVerification { challenge: String },
    EventCallback { event: SlackEvent },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SlackEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub user: Option<String>,
    pub text: Option<String>,
    pub channel: Option<String>,
    pub channel_type: Option<String>,
    pub bot_id: Option<String>,
    pub subtype: Option<String>,
}

impl SlackEvent {
    /// Whether this event is a user command addressed to the bot.
    pub(crate) fn is_command(&self) -> bool {
        if self.bot_id.is_some() || self.subtype.is_some() {
            return false;
        }
        match self.event_type.as_str() {
            "app_mention" => true,
            "message" => self.channel_type.as_deref() == Some("im"),
            _ => false,
        }
    }
}

/// `chat.postMessage` response.
#[derive(Debug, Deserialize)]
pub(crate) struct PostMessageResponse {
    pub ok: bool,
    pub error: Option<String>,
}
