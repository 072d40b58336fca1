use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    error::{KondateError, VerifyError},
    ingredients::IngredientSet,
    message::{
        AcknowledgedReply, Endpoint, GenerationJob, InboundPayload, OutboundContent, Platform,
        RawRequest, ReplyTarget,
    },
    signature::Authentic,
};

/// A single prompt for the text-generation service.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Text-generation service.
///
/// Latency and output quality are opaque; callers bound the call themselves.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Human-readable provider name.
    fn name(&self) -> &str;

    /// Whether this provider requires an API key to function.
    fn requires_api_key(&self) -> bool;

    /// Send a prompt and get the generated text back.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, KondateError>;

    /// Check if the provider is configured and ready.
    async fn is_available(&self) -> bool;
}

/// A chat platform: how its webhooks are verified and parsed, and how
/// results are rendered and delivered back to it.
///
/// The responder and generator only ever talk to this trait.
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    fn platform(&self) -> Platform;

    /// Check the request signature and freshness. No side effects.
    fn verify(&self, raw: &RawRequest, now: DateTime<Utc>) -> Result<Authentic, VerifyError>;

    /// Extract user commands from a verified body.
    fn parse_inbound(&self, raw: &RawRequest) -> Result<InboundPayload, KondateError>;

    /// Whether the request is a platform redelivery of one already handled.
    fn is_retry(&self, _raw: &RawRequest) -> bool {
        false
    }

    /// Whether a reply target can be used only once. When true, a dispatched
    /// job keeps the target and no acknowledgment is pushed to it.
    fn single_use_reply_target(&self) -> bool {
        false
    }

    /// JSON body for the webhook's HTTP response. `reply` is set only when
    /// the reply goes out in the body.
    fn http_reply(
        &self,
        endpoint: Endpoint,
        reply: Option<&AcknowledgedReply>,
    ) -> serde_json::Value;

    /// Render content into the platform's message payload.
    fn format_outbound(
        &self,
        target: &ReplyTarget,
        content: &OutboundContent,
    ) -> serde_json::Value;

    /// Deliver content to a reply target.
    async fn deliver(
        &self,
        target: &ReplyTarget,
        content: &OutboundContent,
    ) -> Result<(), KondateError>;
}

/// Per-user ingredient store.
///
/// Operations for one user are linearizable; two concurrent `add`s are both
/// reflected in the final set.
#[async_trait]
pub trait IngredientStore: Send + Sync {
    /// Union `items` into the user's set and return the result.
    async fn add(&self, user_id: &str, items: &[String]) -> Result<IngredientSet, KondateError>;

    /// The user's set; empty if they never added anything.
    async fn list(&self, user_id: &str) -> Result<IngredientSet, KondateError>;

    /// Remove everything for the user. Idempotent.
    async fn clear(&self, user_id: &str) -> Result<(), KondateError>;
}

/// Handoff boundary between the responder and the background generator.
///
/// `publish` never waits for the job to be consumed.
pub trait JobQueue: Send + Sync {
    fn publish(&self, job: GenerationJob) -> Result<(), KondateError>;
}
