use crate::traits::SearchProvider;
use crate::types::{ResearchError, Result, SearchTask, SourceRecord};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

const USER_AGENT: &str = "deep-research/0.1";

/// Configuration for the Serper search API.
#[derive(Debug, Clone)]
pub struct SerperConfig {
    pub api_key: String,
    pub base_url: String,
    pub default_location: String,
    pub timeout_seconds: u64,
}

impl SerperConfig {
    /// Create config from environment variables. `SERPER_API_KEY` is
    /// required; `SERPER_BASE_URL` overrides the default host.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("SERPER_API_KEY")
            .map_err(|_| ResearchError::MissingConfig("SERPER_API_KEY not set".to_string()))?;
        let base_url = std::env::var("SERPER_BASE_URL")
            .unwrap_or_else(|_| "https://google.serper.dev".to_string());
        Ok(Self { api_key, base_url, default_location: "us".to_string(), timeout_seconds: 15 })
    }
}

/// Search provider backed by Serper's batch endpoint: the whole task list
/// is POSTed as one request and answered with one result object per task.
pub struct SerperSearchProvider {
    client: Client,
    config: SerperConfig,
}

impl SerperSearchProvider {
    pub fn new(config: SerperConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self { client, config })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(SerperConfig::from_env()?)
    }
}

#[derive(Debug, Deserialize)]
struct SerperTaskResponse {
    #[serde(default)]
    organic: Vec<SerperOrganicHit>,
}

#[derive(Debug, Deserialize)]
struct SerperOrganicHit {
    #[serde(default)]
    link: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    snippet: String,
}

#[async_trait]
impl SearchProvider for SerperSearchProvider {
    async fn batch_search(&self, tasks: &[SearchTask]) -> Result<Vec<Vec<SourceRecord>>> {
        if tasks.is_empty() {
            return Err(ResearchError::Search("search task list cannot be empty".to_string()));
        }

        let payload: Vec<serde_json::Value> = tasks
            .iter()
            .map(|task| {
                serde_json::json!({
                    "q": task.query,
                    "type": task.endpoint.serper_type(),
                    "num": task.num_results,
                    "gl": self.config.default_location,
                })
            })
            .collect();

        let endpoint = format!("{}/search", self.config.base_url.trim_end_matches('/'));
        debug!("Issuing batch of {} Serper queries", tasks.len());
        let response = self
            .client
            .post(&endpoint)
            .header("X-API-KEY", &self.config.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ResearchError::Search(format!("Serper request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ResearchError::Search(format!(
                "Serper returned HTTP {}: {}",
                status,
                status.canonical_reason().unwrap_or("unknown")
            )));
        }

        let results: Vec<SerperTaskResponse> = response
            .json()
            .await
            .map_err(|e| ResearchError::Search(format!("unexpected Serper response: {}", e)))?;
        if results.len() != tasks.len() {
            return Err(ResearchError::Search(format!(
                "unexpected batch response length: expected {}, got {}",
                tasks.len(),
                results.len()
            )));
        }

        let batches: Vec<Vec<SourceRecord>> = results
            .into_iter()
            .map(|task_response| {
                task_response
                    .organic
                    .into_iter()
                    .filter(|hit| !hit.link.is_empty())
                    .map(|hit| SourceRecord { link: hit.link, title: hit.title, snippet: hit.snippet })
                    .collect()
            })
            .collect();

        info!(
            "Batch search complete: {} result(s) across {} task(s)",
            batches.iter().map(|b| b.len()).sum::<usize>(),
            batches.len()
        );
        Ok(batches)
    }
}
