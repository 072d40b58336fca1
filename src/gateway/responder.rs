//! Instant responder: the deadline-bound path of every webhook.
//!
//! `Received → Verified → Classified → {RepliedInline | Dispatched}`.
//! A verification failure leaves the machine before anything else runs.
//! Every other failure still ends in a reply.

use super::{routing, Gateway};
use crate::replies;
use kondate_core::{
    error::VerifyError,
    intent,
    message::{
        AcknowledgedReply, InboundPayload, OutboundContent, RawRequest, ReplyKind, ReplyVia,
        VerifiedRequest,
    },
    traits::ChatPlatform,
};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Terminal state for one user command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// Answered without the generation service. Degraded replies land here too.
    RepliedInline(AcknowledgedReply),
    /// Handed to the generator. `ack` is `None` when the reply target is
    /// single-use and reserved for the result.
    Dispatched {
        job_id: Uuid,
        ack: Option<AcknowledgedReply>,
    },
}

impl Disposition {
    pub fn reply(&self) -> Option<&AcknowledgedReply> {
        match self {
            Self::RepliedInline(reply) => Some(reply),
            Self::Dispatched { ack, .. } => ack.as_ref(),
        }
    }
}

/// Result of handling one webhook.
#[derive(Debug)]
pub enum WebhookOutcome {
    /// No platform is configured for this endpoint.
    Disabled,
    /// Signature or freshness check failed. Nothing else ran.
    Rejected(VerifyError),
    /// Verified but the body could not be understood.
    Malformed(String),
    /// URL-verification handshake.
    Challenge(String),
    /// Verified and handled. `body` is the HTTP response body.
    Handled {
        body: serde_json::Value,
        dispositions: Vec<Disposition>,
    },
}

impl Gateway {
    /// Handle one webhook request. Never waits on the generation service.
    pub async fn handle_webhook(&self, raw: RawRequest) -> WebhookOutcome {
        let Some(platform) = self.platforms.get(&raw.platform).cloned() else {
            return WebhookOutcome::Disabled;
        };

        let proof = match platform.verify(&raw, raw.received_at) {
            Ok(proof) => proof,
            Err(e) => {
                warn!(platform = %raw.platform, "rejected webhook: {e}");
                return WebhookOutcome::Rejected(e);
            }
        };

        if platform.is_retry(&raw) {
            info!(platform = %raw.platform, "acknowledged platform retry without reprocessing");
            return WebhookOutcome::Handled {
                body: platform.http_reply(raw.endpoint, None),
                dispositions: Vec::new(),
            };
        }

        let requests = match platform.parse_inbound(&raw) {
            Ok(InboundPayload::Challenge(challenge)) => {
                info!(platform = %raw.platform, "answered url verification");
                return WebhookOutcome::Challenge(challenge);
            }
            Ok(InboundPayload::Requests(requests)) => requests,
            Err(e) => {
                warn!(platform = %raw.platform, "malformed webhook: {e}");
                return WebhookOutcome::Malformed(e.to_string());
            }
        };

        let mut dispositions = Vec::with_capacity(requests.len());
        for request in requests {
            let verified = VerifiedRequest::new(request, &proof);
            dispositions.push(self.respond(&platform, verified).await);
        }

        let inline = dispositions
            .iter()
            .filter_map(Disposition::reply)
            .find(|r| r.reply_via == ReplyVia::HttpBody);
        let body = platform.http_reply(raw.endpoint, inline);
        WebhookOutcome::Handled { body, dispositions }
    }

    /// Classify, route and reply to one verified command.
    async fn respond(
        &self,
        platform: &Arc<dyn ChatPlatform>,
        request: VerifiedRequest,
    ) -> Disposition {
        let intent = intent::classify(request.text());
        info!(
            platform = %request.platform(),
            user = request.user_id(),
            intent = intent.kind(),
            verified_at = %request.verified_at(),
            "classified request"
        );

        let routed = tokio::time::timeout(
            self.reply_budget(),
            routing::route(&request, intent, self.store.as_ref()),
        )
        .await;

        let disposition = match routed {
            Ok(Ok(routing::RouterAction::ReplyNow(text))) => {
                Disposition::RepliedInline(acknowledge(&request, ReplyKind::Inline, text))
            }
            Ok(Ok(routing::RouterAction::Dispatch(job))) => {
                let job_id = job.id;
                match self.queue.publish(job) {
                    Ok(()) => {
                        info!(user = request.user_id(), %job_id, "dispatched generation job");
                        let ack = if platform.single_use_reply_target() {
                            None
                        } else {
                            Some(acknowledge(&request, ReplyKind::Ack, replies::generating()))
                        };
                        Disposition::Dispatched { job_id, ack }
                    }
                    Err(e) => {
                        warn!(user = request.user_id(), %job_id, "handoff failed: {e}");
                        Disposition::RepliedInline(acknowledge(
                            &request,
                            ReplyKind::Degraded,
                            replies::handoff_failed(),
                        ))
                    }
                }
            }
            Ok(Err(e)) => {
                warn!(user = request.user_id(), "store error: {e}");
                Disposition::RepliedInline(acknowledge(
                    &request,
                    ReplyKind::Degraded,
                    replies::try_again(),
                ))
            }
            Err(_) => {
                warn!(
                    user = request.user_id(),
                    budget_ms = self.server_config.reply_budget_ms,
                    "reply budget exceeded"
                );
                Disposition::RepliedInline(acknowledge(
                    &request,
                    ReplyKind::Degraded,
                    replies::try_again(),
                ))
            }
        };

        if let Some(reply) = disposition.reply() {
            if reply.reply_via == ReplyVia::Push {
                push_reply(platform.clone(), reply.clone());
            }
        }
        disposition
    }
}

fn acknowledge(request: &VerifiedRequest, kind: ReplyKind, text: String) -> AcknowledgedReply {
    AcknowledgedReply {
        kind,
        text,
        reply_via: request.reply_via(),
        reply_target: request.reply_target().clone(),
    }
}

/// Deliver a reply through the platform API without holding up the response.
fn push_reply(platform: Arc<dyn ChatPlatform>, reply: AcknowledgedReply) {
    tokio::spawn(async move {
        let target = reply.reply_target;
        match platform
            .deliver(&target, &OutboundContent::Text(reply.text))
            .await
        {
            Ok(()) => debug!(
                platform = %platform.platform(),
                target = target.kind(),
                "pushed reply"
            ),
            Err(e) => warn!(platform = %platform.platform(), "failed to push reply: {e}"),
        }
    });
}
