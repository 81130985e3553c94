use crate::traits::{ChatMessage, Generation, GenerationProvider, TokenUsage};
use crate::types::{ResearchError, Result};
use async_trait::async_trait;
use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

/// Configuration for the OpenRouter chat-completions API.
#[derive(Debug, Clone)]
pub struct OpenRouterConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout_seconds: u64,
    /// Fixed retry budget for transient failures.
    pub max_retries: u32,
}

impl OpenRouterConfig {
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENROUTER_API_KEY")
            .map_err(|_| ResearchError::MissingConfig("OPENROUTER_API_KEY not set".to_string()))?;
        let base_url = std::env::var("OPENROUTER_BASE_URL")
            .unwrap_or_else(|_| "https://openrouter.ai/api/v1".to_string());
        Ok(Self { api_key, base_url, timeout_seconds: 120, max_retries: 3 })
    }
}

/// Generation provider speaking the OpenAI-compatible chat-completions
/// protocol. Transient failures (connection errors, 429, 5xx) are retried
/// with exponential backoff up to the fixed budget; other errors fail
/// immediately.
pub struct OpenRouterProvider {
    client: Client,
    config: OpenRouterConfig,
}

impl OpenRouterProvider {
    pub fn new(config: OpenRouterConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self { client, config })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(OpenRouterConfig::from_env()?)
    }

    async fn attempt(
        &self,
        messages: &[ChatMessage],
        model: &str,
        json_mode: bool,
    ) -> std::result::Result<Generation, AttemptError> {
        let mut payload = serde_json::json!({
            "model": model,
            "messages": messages,
        });
        if json_mode {
            payload["response_format"] = serde_json::json!({"type": "json_object"});
        }

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url.trim_end_matches('/')))
            .bearer_auth(&self.config.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AttemptError::Transient(e.to_string()))?;

        let status = response.status();
        if status.as_u16() == 429 || status.is_server_error() {
            return Err(AttemptError::Transient(format!("HTTP {}", status)));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AttemptError::Fatal(format!("HTTP {}: {}", status, body)));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| AttemptError::Fatal(format!("unexpected response body: {}", e)))?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| AttemptError::Fatal("response contained no choices".to_string()))?;

        Ok(Generation { text, usage: parsed.usage, cost: parsed.cost })
    }
}

enum AttemptError {
    Transient(String),
    Fatal(String),
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    usage: Option<TokenUsage>,
    /// OpenRouter reports the call cost when usage accounting is enabled.
    cost: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatCompletionMessage,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionMessage {
    #[serde(default)]
    content: String,
}

#[async_trait]
impl GenerationProvider for OpenRouterProvider {
    async fn generate(
        &self,
        messages: &[ChatMessage],
        model: &str,
        json_mode: bool,
    ) -> Result<Generation> {
        let mut backoff = ExponentialBackoff {
            initial_interval: Duration::from_secs(2),
            max_interval: Duration::from_secs(30),
            multiplier: 2.0,
            max_elapsed_time: None,
            ..Default::default()
        };

        let mut last_error = String::new();
        for attempt in 0..=self.config.max_retries {
            debug!(
                "Generation attempt {}/{} with model '{}'",
                attempt + 1,
                self.config.max_retries + 1,
                model
            );
            match self.attempt(messages, model, json_mode).await {
                Ok(generation) => return Ok(generation),
                Err(AttemptError::Fatal(e)) => {
                    return Err(ResearchError::Generation(e));
                }
                Err(AttemptError::Transient(e)) => {
                    last_error = e;
                    if attempt < self.config.max_retries {
                        let delay =
                            backoff.next_backoff().unwrap_or(Duration::from_secs(2));
                        warn!(
                            "Transient generation failure ({}), retrying in {:?}",
                            last_error, delay
                        );
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        Err(ResearchError::Generation(format!(
            "exhausted {} retries: {}",
            self.config.max_retries, last_error
        )))
    }
}
