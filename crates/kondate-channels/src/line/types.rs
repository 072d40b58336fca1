//! LINE Messaging API webhook types.
//! Docs: <https://developers.line.biz/en/reference/messaging-api/#webhook-event-objects>

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct LineWebhook {
    #[serde(default)]
    pub events: Vec<LineEvent>,
}

impl LineWebhook {
    /// Newest event timestamp in seconds, if the body has any events.
    pub(crate) fn newest_event_secs(&self) -> Option<i64> {
        self.events
            .iter()
            .filter_map(|e| e.timestamp)
            .max()
            .map(|ms| ms / 1000)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LineEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub reply_token: Option<String>,
    /// Milliseconds since the epoch.
    pub timestamp: Option<i64>,
    pub source: Option<LineSource>,
    pub message: Option<LineMessage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LineSource {
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LineMessage {
    #[serde(rename = "type")]
    pub message_type: String,
    pub text: Option<String>,
}

impl LineEvent {
    /// `(user_id, reply_token, text)` for a text message event.
    pub(crate) fn text_command(self) -> Option<(String, String, String)> {
        if self.event_type != "message" {
            return None;
        }
        let message = self.message.filter(|m| m.message_type == "text")?;
        let user_id = self.source.and_then(|s| s.user_id)?;
        let reply_token = self.reply_token?;
        Some((user_id, reply_token, message.text.unwrap_or_default()))
    }
}
