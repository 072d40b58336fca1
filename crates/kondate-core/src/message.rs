use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use crate::prompt::PromptTemplate;
use crate::recipe::Recipe;
use crate::signature::Authentic;

/// Which chat platform a request came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Slack: slash commands and Events API. Hard 3s reply deadline.
    Slack,
    /// LINE Messaging API webhook. No reply deadline on the HTTP side.
    Line,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Slack => "slack",
            Self::Line => "line",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Header map with lowercased names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers(BTreeMap<String, String>);

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, value: impl Into<String>) {
        self.0.insert(name.to_ascii_lowercase(), value.into());
    }

    /// Case-insensitive lookup.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(&name.to_ascii_lowercase()).map(String::as_str)
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (k, v) in iter {
            headers.insert(k.as_ref(), v);
        }
        headers
    }
}

/// Which webhook endpoint on a platform received the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// Slack slash command (form-encoded).
    SlashCommand,
    /// Slack Events API (JSON).
    Events,
    /// LINE webhook (JSON).
    Webhook,
}

/// An HTTP request exactly as received, before verification.
#[derive(Debug, Clone)]
pub struct RawRequest {
    pub platform: Platform,
    pub endpoint: Endpoint,
    pub headers: Headers,
    pub body: Vec<u8>,
    pub received_at: DateTime<Utc>,
}

/// Where a reply or a background result should be delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReplyTarget {
    /// Slack slash command `response_url`.
    ResponseUrl(String),
    /// Slack conversation id for `chat.postMessage`.
    Conversation(String),
    /// LINE reply token.
    ReplyToken(String),
}

impl ReplyTarget {
    /// Short, log-safe description (no URLs or tokens).
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ResponseUrl(_) => "response_url",
            Self::Conversation(_) => "conversation",
            Self::ReplyToken(_) => "reply_token",
        }
    }
}

/// How an immediate reply reaches the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyVia {
    /// In the body of the webhook's HTTP response.
    HttpBody,
    /// Through the platform's delivery API.
    Push,
}

/// One user command extracted from a webhook body. Immutable once built.
#[derive(Debug, Clone)]
pub struct InboundRequest {
    pub platform: Platform,
    pub user_id: String,
    pub text: String,
    pub reply_target: ReplyTarget,
    pub reply_via: ReplyVia,
    pub received_at: DateTime<Utc>,
}

/// An [`InboundRequest`] whose webhook passed signature verification.
///
/// Only constructible from an [`Authentic`] proof, which only the signature
/// verifier hands out.
#[derive(Debug, Clone)]
pub struct VerifiedRequest {
    request: InboundRequest,
    verified_at: DateTime<Utc>,
}

impl VerifiedRequest {
    pub fn new(request: InboundRequest, proof: &Authentic) -> Self {
        Self {
            request,
            verified_at: proof.verified_at(),
        }
    }

    pub fn request(&self) -> &InboundRequest {
        &self.request
    }

    pub fn platform(&self) -> Platform {
        self.request.platform
    }

    pub fn user_id(&self) -> &str {
        &self.request.user_id
    }

    pub fn text(&self) -> &str {
        &self.request.text
    }

    pub fn reply_target(&self) -> &ReplyTarget {
        &self.request.reply_target
    }

    pub fn reply_via(&self) -> ReplyVia {
        self.request.reply_via
    }

    pub fn verified_at(&self) -> DateTime<Utc> {
        self.verified_at
    }
}

/// What a platform extracted from a webhook body.
#[derive(Debug, Clone)]
pub enum InboundPayload {
    /// URL-verification handshake; echo the challenge and stop.
    Challenge(String),
    /// Zero or more user commands. Empty means "acknowledge and ignore".
    Requests(Vec<InboundRequest>),
}

/// A unit of background work handed from the responder to the generator.
/// Never persisted; consumed exactly once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationJob {
    pub id: Uuid,
    pub platform: Platform,
    pub user_id: String,
    pub reply_target: ReplyTarget,
    pub template: PromptTemplate,
    /// Ingredient list or mood text the prompt is built from.
    pub input: String,
    pub created_at: DateTime<Utc>,
}

impl GenerationJob {
    pub fn new(request: &VerifiedRequest, template: PromptTemplate, input: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            platform: request.platform(),
            user_id: request.user_id().to_string(),
            reply_target: request.reply_target().clone(),
            template,
            input,
            created_at: Utc::now(),
        }
    }
}

/// Flavor of a synchronous reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    /// Complete answer (help, ingredient list, store result).
    Inline,
    /// Generation was handed off; the result follows later.
    Ack,
    /// Handoff or store failed; the user is asked to retry.
    Degraded,
}

/// The synchronous reply produced within the deadline. Never carries a
/// generation result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcknowledgedReply {
    pub kind: ReplyKind,
    pub text: String,
    pub reply_via: ReplyVia,
    pub reply_target: ReplyTarget,
}

/// Content pushed to a user through a platform's delivery API.
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundContent {
    /// Plain text message.
    Text(String),
    /// Parsed recipe suggestions.
    Recipes {
        template: PromptTemplate,
        input: String,
        recipes: Vec<Recipe>,
    },
    /// A user-visible failure notice.
    Error(String),
}
