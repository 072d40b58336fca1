//! Async generator: turns a handed-off job into recipes and delivers them.
//!
//! Runs outside any reply deadline. A job gets exactly one delivery: the
//! recipes, or one error notice. Nothing is retried.

use super::Gateway;
use crate::replies;
use kondate_core::{
    error::KondateError,
    message::{GenerationJob, OutboundContent},
    prompt::build_prompt,
    recipe::{parse_recipes, Recipe},
    traits::{CompletionRequest, Provider},
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Build the prompt, call the provider within `timeout`, parse the output.
pub async fn generate(
    provider: &dyn Provider,
    request: CompletionRequest,
    timeout: Duration,
) -> Result<Vec<Recipe>, KondateError> {
    let text = tokio::time::timeout(timeout, provider.complete(&request))
        .await
        .map_err(|_| {
            KondateError::Provider(format!("generation timed out after {}s", timeout.as_secs()))
        })??;
    parse_recipes(&text)
}

impl Gateway {
    fn completion_request(&self, job: &GenerationJob) -> CompletionRequest {
        CompletionRequest {
            prompt: build_prompt(job.template, &job.input),
            max_tokens: self.generation.max_tokens,
            temperature: self.generation.temperature,
        }
    }

    /// Run one job to completion. Failures end in an error notice.
    pub async fn run_job(&self, job: GenerationJob) {
        let started = Instant::now();
        let Some(platform) = self.platforms.get(&job.platform).cloned() else {
            error!(job_id = %job.id, platform = %job.platform, "no platform for job; dropped");
            return;
        };

        let timeout = Duration::from_secs(self.generation.timeout_secs);
        let request = self.completion_request(&job);
        let content = match generate(self.provider.as_ref(), request, timeout).await {
            Ok(recipes) => {
                info!(
                    job_id = %job.id,
                    user = %job.user_id,
                    template = %job.template,
                    recipes = recipes.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "generated recipes"
                );
                OutboundContent::Recipes {
                    template: job.template,
                    input: job.input.clone(),
                    recipes,
                }
            }
            Err(e) => {
                warn!(job_id = %job.id, user = %job.user_id, "generation failed: {e}");
                OutboundContent::Error(replies::generation_failed())
            }
        };

        let is_result = matches!(content, OutboundContent::Recipes { .. });
        if let Err(e) = platform.deliver(&job.reply_target, &content).await {
            warn!(job_id = %job.id, "delivery failed: {e}");
            if is_result {
                let notice = OutboundContent::Error(replies::generation_failed());
                if let Err(e) = platform.deliver(&job.reply_target, &notice).await {
                    error!(job_id = %job.id, "error notice undeliverable: {e}");
                }
            }
        }
    }

    /// Consumer loop over the handoff queue. One task per job.
    pub(super) async fn consume(self: Arc<Self>, mut jobs: mpsc::Receiver<GenerationJob>) {
        while let Some(job) = jobs.recv().await {
            let gw = self.clone();
            tokio::spawn(async move { gw.run_job(job).await });
        }
        info!("handoff queue closed; generator stopped");
    }
}
