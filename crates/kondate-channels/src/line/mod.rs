//! LINE Messaging API platform.
//!
//! The webhook has no reply deadline, but reply tokens are single-use and
//! expire, so each request gets exactly one reply message.

mod format;
mod types;


use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kondate_core::{
    config::LineConfig,
    error::{KondateError, VerifyError},
    message::{
        AcknowledgedReply, Endpoint, InboundPayload, InboundRequest, OutboundContent, Platform,
        RawRequest, ReplyTarget, ReplyVia,
    },
    signature::{self, Authentic, LINE_SIGNATURE_HEADER},
    traits::ChatPlatform,
};
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use types::LineWebhook;

const LINE_API_BASE: &str = "https://api.line.me";
const DELIVERY_TIMEOUT: Duration = Duration::from_secs(15);

/// LINE channel.
pub struct LineChannel {
    config: LineConfig,
    client: reqwest::Client,
    api_base: String,
}

impl LineChannel {
    pub fn new(config: LineConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
            api_base: LINE_API_BASE.to_string(),
        }
    }

    /// Point API calls somewhere other than `api.line.me`.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }
}

#[async_trait]
impl ChatPlatform for LineChannel {
    fn platform(&self) -> Platform {
        Platform::Line
    }

    fn verify(&self, raw: &RawRequest, now: DateTime<Utc>) -> Result<Authentic, VerifyError> {
        let sig = raw
            .headers
            .get(LINE_SIGNATURE_HEADER)
            .ok_or(VerifyError::MissingHeader(LINE_SIGNATURE_HEADER))?;
        // An unparseable body still has to pass the signature check; it is
        // rejected as malformed afterwards.
        let newest = serde_json::from_slice::<LineWebhook>(&raw.body)
            .ok()
            .and_then(|w| w.newest_event_secs());
        signature::verify_line(
            &self.config.channel_secret,
            &raw.body,
            sig,
            newest,
            now,
            self.config.freshness_window_secs,
        )
    }

    fn parse_inbound(&self, raw: &RawRequest) -> Result<InboundPayload, KondateError> {
        if raw.endpoint != Endpoint::Webhook {
            return Err(KondateError::Malformed(
                "LINE only serves its webhook endpoint".into(),
            ));
        }
        let webhook: LineWebhook = serde_json::from_slice(&raw.body)
            .map_err(|e| KondateError::Malformed(format!("line webhook body: {e}")))?;

        let total = webhook.events.len();
        let requests: Vec<InboundRequest> = webhook
            .events
            .into_iter()
            .filter_map(|e| e.text_command())
            .map(|(user_id, reply_token, text)| InboundRequest {
                platform: Platform::Line,
                user_id,
                text: text.trim().to_string(),
                reply_target: ReplyTarget::ReplyToken(reply_token),
                reply_via: ReplyVia::Push,
                received_at: raw.received_at,
            })
            .collect();
        debug!(total, text_messages = requests.len(), "line: parsed webhook");
        Ok(InboundPayload::Requests(requests))
    }

    fn single_use_reply_target(&self) -> bool {
        true
    }

    fn http_reply(
        &self,
        _endpoint: Endpoint,
        _reply: Option<&AcknowledgedReply>,
    ) -> serde_json::Value {
        json!({ "status": "ok" })
    }

    fn format_outbound(
        &self,
        target: &ReplyTarget,
        content: &OutboundContent,
    ) -> serde_json::Value {
        let message = format::message_object(content, self.config.use_flex_message);
        match target {
            ReplyTarget::ReplyToken(token) => json!({
                "replyToken": token,
                "messages": [message],
            }),
            _ => json!({ "messages": [message] }),
        }
    }

    async fn deliver(
        &self,
        target: &ReplyTarget,
        content: &OutboundContent,
    ) -> Result<(), KondateError> {
        if !matches!(target, ReplyTarget::ReplyToken(_)) {
            return Err(KondateError::Channel(format!(
                "line cannot deliver to a {} target",
                target.kind()
            )));
        }
        let payload = self.format_outbound(target, content);
        let url = format!("{}/v2/bot/message/reply", self.api_base.trim_end_matches('/'));

        let resp = self
            .client
            .post(&url)
            .timeout(DELIVERY_TIMEOUT)
            .bearer_auth(&self.config.channel_access_token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| KondateError::Channel(format!("line reply failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(KondateError::Channel(format!(
                "line reply returned {status}: {text}"
            )));
        }
        Ok(())
    }
}
