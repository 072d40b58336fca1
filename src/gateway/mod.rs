//! Gateway: webhook server, instant responder, and background generator.
//!
//! Requests are answered inside the reply budget. Anything that needs the
//! generation service is handed to the generator through a [`JobQueue`] and
//! delivered later through the platform's delivery API.

pub mod generator;
pub mod handoff;
mod responder;
pub mod routing;
mod server;


pub use responder::{Disposition, WebhookOutcome};
pub use server::build_router;

use kondate_core::{
    config::{GenerationConfig, ServerConfig},
    message::{GenerationJob, Platform},
    traits::{ChatPlatform, IngredientStore, JobQueue, Provider},
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{error, info};

/// Enabled chat platforms, keyed by platform.
pub type Platforms = HashMap<Platform, Arc<dyn ChatPlatform>>;

/// Wires platforms, the ingredient store, the handoff queue and the provider.
pub struct Gateway {
    pub(super) provider: Arc<dyn Provider>,
    pub(super) platforms: Platforms,
    pub(super) store: Arc<dyn IngredientStore>,
    pub(super) queue: Arc<dyn JobQueue>,
    pub(super) server_config: ServerConfig,
    pub(super) generation: GenerationConfig,
    pub(super) uptime: Instant,
}

impl Gateway {
    pub fn new(
        provider: Arc<dyn Provider>,
        platforms: Platforms,
        store: Arc<dyn IngredientStore>,
        queue: Arc<dyn JobQueue>,
        server_config: ServerConfig,
        generation: GenerationConfig,
    ) -> Self {
        Self {
            provider,
            platforms,
            store,
            queue,
            server_config,
            generation,
            uptime: Instant::now(),
        }
    }

    /// Budget for the synchronous part of a request.
    pub(super) fn reply_budget(&self) -> Duration {
        Duration::from_millis(self.server_config.reply_budget_ms)
    }

    pub(super) fn platform_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.platforms.keys().map(|p| p.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Serve webhooks and consume generation jobs until Ctrl+C.
    pub async fn run(self: Arc<Self>, jobs: mpsc::Receiver<GenerationJob>) -> anyhow::Result<()> {
        info!(
            "Kondate gateway running | provider: {} | platforms: {} | reply budget: {}ms",
            self.provider.name(),
            self.platform_names().join(", "),
            self.server_config.reply_budget_ms,
        );

        let generator = tokio::spawn(self.clone().consume(jobs));

        let addr = format!("{}:{}", self.server_config.host, self.server_config.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        info!("Webhook server listening on {addr}");

        let app = build_router(self.clone());
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    error!("failed to listen for ctrl_c: {e}");
                }
            })
            .await;

        info!("Shutting down...");
        // In-flight jobs are dropped; handoff is at-most-once.
        generator.abort();
        result?;
        info!("Shutdown complete.");
        Ok(())
    }
}
