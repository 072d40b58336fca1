//! Webhook HTTP server.
//!
//! Handlers only translate between HTTP and [`RawRequest`] /
//! [`WebhookOutcome`]; the responder does the rest.

use super::{Gateway, WebhookOutcome};
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use kondate_core::message::{Endpoint, Headers, Platform, RawRequest};
use serde_json::{json, Value};
use std::sync::Arc;

type Reply = (StatusCode, Json<Value>);

/// Build the webhook router.
pub fn build_router(gateway: Arc<Gateway>) -> Router {
    let body_limit = gateway.server_config.body_limit_bytes;
    Router::new()
        .route("/health", get(health))
        .route("/slack/commands", post(slack_commands))
        .route("/slack/events", post(slack_events))
        .route("/line/webhook", post(line_webhook))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(gateway)
}

/// `GET /health`
async fn health(State(gw): State<Arc<Gateway>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "platforms": gw.platform_names(),
        "uptime_secs": gw.uptime.elapsed().as_secs(),
    }))
}

/// `POST /slack/commands`
async fn slack_commands(
    State(gw): State<Arc<Gateway>>,
    headers: HeaderMap,
    body: Bytes,
) -> Reply {
    handle(&gw, Platform::Slack, Endpoint::SlashCommand, &headers, body).await
}

/// `POST /slack/events`
async fn slack_events(State(gw): State<Arc<Gateway>>, headers: HeaderMap, body: Bytes) -> Reply {
    handle(&gw, Platform::Slack, Endpoint::Events, &headers, body).await
}

/// `POST /line/webhook`
async fn line_webhook(State(gw): State<Arc<Gateway>>, headers: HeaderMap, body: Bytes) -> Reply {
    handle(&gw, Platform::Line, Endpoint::Webhook, &headers, body).await
}

async fn handle(
    gw: &Gateway,
    platform: Platform,
    endpoint: Endpoint,
    headers: &HeaderMap,
    body: Bytes,
) -> Reply {
    let raw = RawRequest {
        platform,
        endpoint,
        headers: to_headers(headers),
        body: body.to_vec(),
        received_at: Utc::now(),
    };
    into_reply(gw.handle_webhook(raw).await)
}

/// Headers with non-UTF-8 values dropped.
fn to_headers(headers: &HeaderMap) -> Headers {
    headers
        .iter()
        .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str(), v)))
        .collect()
}

fn into_reply(outcome: WebhookOutcome) -> Reply {
    match outcome {
        WebhookOutcome::Disabled => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "platform not enabled"})),
        ),
        WebhookOutcome::Rejected(e) => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": e.to_string()})),
        ),
        WebhookOutcome::Malformed(e) => (StatusCode::BAD_REQUEST, Json(json!({"error": e}))),
        WebhookOutcome::Challenge(challenge) => {
            (StatusCode::OK, Json(json!({"challenge": challenge})))
        }
        WebhookOutcome::Handled { body, .. } => (StatusCode::OK, Json(body)),
    }
}
