mod channels;
mod defaults;
mod providers;


pub use channels::*;
pub use providers::*;

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::error::KondateError;
use defaults::*;

/// Top-level Kondate configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub bot: BotConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub channel: ChannelConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
}

/// General bot settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            data_dir: default_data_dir(),
            log_level: default_log_level(),
        }
    }
}

/// Webhook HTTP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    /// Upper bound on the synchronous reply path, in milliseconds.
    /// Must stay well under the 3s Slack deadline.
    #[serde(default = "default_reply_budget_ms")]
    pub reply_budget_ms: u64,
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            reply_budget_ms: default_reply_budget_ms(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

/// Background generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Budget for a single generation call, in seconds.
    #[serde(default = "default_generation_timeout")]
    pub timeout_secs: u64,
    /// Capacity of the handoff queue between responder and generator.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_generation_timeout(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

/// Ingredient store config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    #[serde(default = "default_db_path")]
    pub db_path: String,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

impl Config {
    /// Overlay secrets from the environment. `lookup` is `std::env::var` in
    /// production and a map in tests.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("SLACK_BOT_TOKEN") {
            self.channel.slack_mut().bot_token = v;
        }
        if let Some(v) = get("SLACK_SIGNING_SECRET") {
            self.channel.slack_mut().signing_secret = v;
        }
        if let Some(v) = get("LINE_CHANNEL_SECRET") {
            self.channel.line_mut().channel_secret = v;
        }
        if let Some(v) = get("LINE_CHANNEL_ACCESS_TOKEN") {
            self.channel.line_mut().channel_access_token = v;
        }
        if let Some(v) = get("ANTHROPIC_API_KEY") {
            self.provider
                .anthropic
                .get_or_insert_with(AnthropicConfig::default)
                .api_key = v;
        }
        if let Some(v) = get("OPENAI_API_KEY") {
            self.provider
                .openai
                .get_or_insert_with(OpenAiConfig::default)
                .api_key = v;
        }
    }

    /// Reject configurations that would let an unverified request through.
    pub fn validate(&self) -> Result<(), KondateError> {
        if let Some(slack) = self.channel.slack.as_ref().filter(|s| s.enabled) {
            if slack.signing_secret.is_empty() {
                return Err(KondateError::Config(
                    "Slack is enabled but signing_secret is empty. \
                     Set it in config.toml or SLACK_SIGNING_SECRET env var."
                        .into(),
                ));
            }
        }
        if let Some(line) = self.channel.line.as_ref().filter(|l| l.enabled) {
            if line.channel_secret.is_empty() {
                return Err(KondateError::Config(
                    "LINE is enabled but channel_secret is empty. \
                     Set it in config.toml or LINE_CHANNEL_SECRET env var."
                        .into(),
                ));
            }
        }
        if self.server.reply_budget_ms == 0 || self.server.reply_budget_ms >= 3000 {
            return Err(KondateError::Config(format!(
                "server.reply_budget_ms must be between 1 and 2999, got {}",
                self.server.reply_budget_ms
            )));
        }
        if self.generation.queue_capacity == 0 {
            return Err(KondateError::Config(
                "generation.queue_capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Expand `~` to home directory.
pub fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return format!("{}/{rest}", home.to_string_lossy());
        }
    }
    path.to_string()
}

/// Load configuration from a TOML file.
///
/// Falls back to defaults if the file does not exist.
pub fn load(path: &str) -> Result<Config, KondateError> {
    let path = Path::new(path);
    if !path.exists() {
        info!(
            "Config file not found at {}, using defaults",
            path.display()
        );
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| KondateError::Config(format!("failed to read {}: {}", path.display(), e)))?;

    let config: Config = toml::from_str(&content)
        .map_err(|e| KondateError::Config(format!("failed to parse config: {}", e)))?;

    Ok(config)
}
