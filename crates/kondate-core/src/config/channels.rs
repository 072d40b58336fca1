use serde::{Deserialize, Serialize};

use super::defaults::{default_freshness_window, default_true};

/// Chat platform configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ChannelConfig {
    pub slack: Option<SlackConfig>,
    pub line: Option<LineConfig>,
}

impl ChannelConfig {
    pub(super) fn slack_mut(&mut self) -> &mut SlackConfig {
        self.slack.get_or_insert_with(SlackConfig::default)
    }

    pub(super) fn line_mut(&mut self) -> &mut LineConfig {
        self.line.get_or_insert_with(LineConfig::default)
    }
}

/// Slack app config (slash command + Events API).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlackConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Bot token (`xoxb-…`) used for `chat.postMessage`.
    #[serde(default)]
    pub bot_token: String,
    /// Signing secret for `X-Slack-Signature`.
    #[serde(default)]
    pub signing_secret: String,
    /// Replay window for `X-Slack-Request-Timestamp`, in seconds.
    #[serde(default = "default_freshness_window")]
    pub freshness_window_secs: i64,
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bot_token: String::new(),
            signing_secret: String::new(),
            freshness_window_secs: default_freshness_window(),
        }
    }
}

/// LINE Messaging API config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub channel_secret: String,
    #[serde(default)]
    pub channel_access_token: String,
    /// Render recipes as a Flex bubble instead of plain text.
    #[serde(default = "default_true")]
    pub use_flex_message: bool,
    #[serde(default = "default_freshness_window")]
    pub freshness_window_secs: i64,
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            channel_secret: String::new(),
            channel_access_token: String::new(),
            use_flex_message: true,
            freshness_window_secs: default_freshness_window(),
        }
    }
}
