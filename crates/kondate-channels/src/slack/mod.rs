//! Slack platform: slash commands and the Events API.
//!
//! Slash commands must be answered within 3 seconds in the HTTP body; late
//! results go to the command's `response_url`. Events API messages are
//! answered with `chat.postMessage`.

mod format;
mod types;

#[cfg(test)]
mod tests;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use kondate_core::{
    config::SlackConfig,
    error::{KondateError, VerifyError},
    message::{
        AcknowledgedReply, Endpoint, InboundPayload, InboundRequest, OutboundContent, Platform,
        RawRequest, ReplyKind, ReplyTarget, ReplyVia,
    },
    signature::{self, Authentic, SLACK_SIGNATURE_HEADER, SLACK_TIMESTAMP_HEADER},
    traits::ChatPlatform,
};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

use types::{EventEnvelope, PostMessageResponse, SlashCommand};

const SLACK_API_BASE: &str = "https://slack.com/api";
const RETRY_HEADER: &str = "x-slack-retry-num";
const DELIVERY_TIMEOUT: Duration = Duration::from_secs(15);

/// Slack channel.
pub struct SlackChannel {
    config: SlackConfig,
    client: reqwest::Client,
    api_base: String,
}

impl SlackChannel {
    pub fn new(config: SlackConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
            api_base: SLACK_API_BASE.to_string(),
        }
    }

    /// Point Web API calls somewhere other than `slack.com`.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn parse_slash_command(raw: &RawRequest) -> Result<InboundPayload, KondateError> {
        let cmd = SlashCommand::from_form(&raw.body)?;
        Ok(InboundPayload::Requests(vec![InboundRequest {
            platform: Platform::Slack,
            user_id: cmd.user_id,
            text: format::strip_mentions(&cmd.text),
            reply_target: ReplyTarget::ResponseUrl(cmd.response_url),
            reply_via: ReplyVia::HttpBody,
            received_at: raw.received_at,
        }]))
    }

    fn parse_event(raw: &RawRequest) -> Result<InboundPayload, KondateError> {
        let envelope: EventEnvelope = serde_json::from_slice(&raw.body)
            .map_err(|e| KondateError::Malformed(format!("slack event body: {e}")))?;

        let event = match envelope {
            EventEnvelope::UrlVerification { challenge } => {
                return Ok(InboundPayload::Challenge(challenge))
            }
            EventEnvelope::EventCallback { event } => event,
            EventEnvelope::Other => return Ok(InboundPayload::Requests(Vec::new())),
        };

        if !event.is_command() {
            debug!(event_type = %event.event_type, "slack: ignoring event");
            return Ok(InboundPayload::Requests(Vec::new()));
        }

        let (Some(user_id), Some(channel)) = (event.user, event.channel) else {
            return Err(KondateError::Malformed(
                "slack event missing user or channel".into(),
            ));
        };

        Ok(InboundPayload::Requests(vec![InboundRequest {
            platform: Platform::Slack,
            user_id,
            text: format::strip_mentions(event.text.as_deref().unwrap_or_default()),
            reply_target: ReplyTarget::Conversation(channel),
            reply_via: ReplyVia::Push,
            received_at: raw.received_at,
        }]))
    }

    async fn post_to_response_url(
        &self,
        url: &str,
        payload: &serde_json::Value,
    ) -> Result<(), KondateError> {
        let resp = self
            .client
            .post(url)
            .timeout(DELIVERY_TIMEOUT)
            .json(payload)
            .send()
            .await
            .map_err(|e| KondateError::Channel(format!("slack response_url post failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(KondateError::Channel(format!(
                "slack response_url returned {status}: {text}"
            )));
        }
        Ok(())
    }

    async fn post_message(&self, payload: &serde_json::Value) -> Result<(), KondateError> {
        let url = format!("{}/chat.postMessage", self.api_base.trim_end_matches('/'));
        let resp = self
            .client
            .post(&url)
            .timeout(DELIVERY_TIMEOUT)
            .bearer_auth(&self.config.bot_token)
            .json(payload)
            .send()
            .await
            .map_err(|e| KondateError::Channel(format!("slack chat.postMessage failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(KondateError::Channel(format!(
                "slack chat.postMessage returned {status}"
            )));
        }
        let parsed: PostMessageResponse = resp
            .json()
            .await
            .map_err(|e| KondateError::Channel(format!("slack: bad postMessage response: {e}")))?;
        if !parsed.ok {
            let reason = parsed.error.unwrap_or_else(|| "unknown".into());
            warn!("slack chat.postMessage rejected: {reason}");
            return Err(KondateError::Channel(format!(
                "slack chat.postMessage rejected: {reason}"
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl ChatPlatform for SlackChannel {
    fn platform(&self) -> Platform {
        Platform::Slack
    }

    fn verify(&self, raw: &RawRequest, now: DateTime<Utc>) -> Result<Authentic, VerifyError> {
        let sig = raw
            .headers
            .get(SLACK_SIGNATURE_HEADER)
            .ok_or(VerifyError::MissingHeader(SLACK_SIGNATURE_HEADER))?;
        let ts = raw
            .headers
            .get(SLACK_TIMESTAMP_HEADER)
            .ok_or(VerifyError::MissingHeader(SLACK_TIMESTAMP_HEADER))?;
        signature::verify_slack(
            &self.config.signing_secret,
            &raw.body,
            sig,
            ts,
            now,
            self.config.freshness_window_secs,
        )
    }

    fn parse_inbound(&self, raw: &RawRequest) -> Result<InboundPayload, KondateError> {
        match raw.endpoint {
            Endpoint::SlashCommand => Self::parse_slash_command(raw),
            Endpoint::Events => Self::parse_event(raw),
            Endpoint::Webhook => Err(KondateError::Malformed(
                "slack does not serve the LINE webhook endpoint".into(),
            )),
        }
    }

    fn is_retry(&self, raw: &RawRequest) -> bool {
        raw.endpoint == Endpoint::Events && raw.headers.get(RETRY_HEADER).is_some()
    }

    fn http_reply(
        &self,
        endpoint: Endpoint,
        reply: Option<&AcknowledgedReply>,
    ) -> serde_json::Value {
        match (endpoint, reply) {
            (Endpoint::SlashCommand, Some(reply)) => {
                let response_type = match reply.kind {
                    ReplyKind::Ack => "in_channel",
                    ReplyKind::Inline | ReplyKind::Degraded => "ephemeral",
                };
                json!({
                    "response_type": response_type,
                    "text": reply.text,
                })
            }
            _ => json!({ "ok": true }),
        }
    }

    fn format_outbound(
        &self,
        target: &ReplyTarget,
        content: &OutboundContent,
    ) -> serde_json::Value {
        format::message_payload(target, content)
    }

    async fn deliver(
        &self,
        target: &ReplyTarget,
        content: &OutboundContent,
    ) -> Result<(), KondateError> {
        let payload = self.format_outbound(target, content);
        match target {
            ReplyTarget::ResponseUrl(url) => self.post_to_response_url(url, &payload).await,
            ReplyTarget::Conversation(_) => self.post_message(&payload).await,
            ReplyTarget::ReplyToken(_) => Err(KondateError::Channel(
                "slack cannot deliver to a LINE reply token".into(),
            )),
        }
    }
}
