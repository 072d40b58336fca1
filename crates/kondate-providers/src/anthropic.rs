//! Anthropic Messages API provider.

use async_trait::async_trait;
use kondate_core::{
    error::KondateError,
    traits::{CompletionRequest, Provider},
};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{debug, warn};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic Messages API provider.
pub struct AnthropicProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl AnthropicProvider {
    /// Create from config values.
    pub fn from_config(api_key: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model,
        }
    }

    fn build_request(&self, request: &CompletionRequest) -> AnthropicRequest {
        AnthropicRequest {
            model: self.model.clone(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            messages: vec![AnthropicMessage {
                role: "user".into(),
                content: request.prompt.clone(),
            }],
        }
    }
}

#[derive(Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<AnthropicMessage>,
}

#[derive(Serialize, Deserialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Option<Vec<AnthropicContentBlock>>,
    usage: Option<AnthropicUsage>,
}

#[derive(Deserialize)]
struct AnthropicContentBlock {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct AnthropicUsage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

impl AnthropicResponse {
    /// Concatenated text of all content blocks, or `None` if there is none.
    fn into_text(self) -> Option<String> {
        let text: String = self
            .content
            .unwrap_or_default()
            .into_iter()
            .map(|b| b.text)
            .collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[async_trait]
impl Provider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn requires_api_key(&self) -> bool {
        true
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, KondateError> {
        let start = Instant::now();
        let body = self.build_request(request);

        debug!("anthropic: POST {ANTHROPIC_API_URL} model={}", self.model);

        let resp = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| KondateError::Provider(format!("anthropic request failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(KondateError::Provider(format!(
                "anthropic returned {status}: {text}"
            )));
        }

        let parsed: AnthropicResponse = resp.json().await.map_err(|e| {
            KondateError::Provider(format!("anthropic: failed to parse response: {e}"))
        })?;

        let tokens = parsed
            .usage
            .as_ref()
            .map(|u| u.input_tokens + u.output_tokens);
        debug!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            tokens, "anthropic: completion received"
        );

        parsed
            .into_text()
            .ok_or_else(|| KondateError::Provider("anthropic returned no text".into()))
    }

    async fn is_available(&self) -> bool {
        if self.api_key.is_empty() {
            warn!("anthropic: no API key configured");
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> AnthropicProvider {
        AnthropicProvider::from_config("sk-ant-test".into(), "claude-3-5-haiku-20241022".into())
    }

    #[test]
    fn test_anthropic_provider_name() {
        let p = provider();
        assert_eq!(p.name(), "anthropic");
        assert!(p.requires_api_key());
    }

    #[test]
    fn test_anthropic_request_serialization() {
        let body = provider().build_request(&CompletionRequest {
            prompt: "食材: 卵".into(),
            max_tokens: 1000,
            temperature: 0.7,
        });
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "claude-3-5-haiku-20241022");
        assert_eq!(json["max_tokens"], 1000);
        assert!((json["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "食材: 卵");
        assert!(json.get("system").is_none());
    }

    #[test]
    fn test_anthropic_response_parsing() {
        let json = r#"{"content":[{"type":"text","text":"1. 親子丼\n"},{"type":"text","text":"- 定番"}],"usage":{"input_tokens":10,"output_tokens":5}}"#;
        let resp: AnthropicResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            resp.usage
                .as_ref()
                .map(|u| u.input_tokens + u.output_tokens),
            Some(15)
        );
        assert_eq!(resp.into_text().as_deref(), Some("1. 親子丼\n- 定番"));
    }

    #[test]
    fn test_anthropic_empty_response_is_none() {
        let resp: AnthropicResponse = serde_json::from_str(r#"{"content":[]}"#).unwrap();
        assert!(resp.into_text().is_none());
        let resp: AnthropicResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.into_text().is_none());
    }

    #[tokio::test]
    async fn test_anthropic_unavailable_without_key() {
        let p = AnthropicProvider::from_config(String::new(), "m".into());
        assert!(!p.is_available().await);
        assert!(provider().is_available().await);
    }
}
