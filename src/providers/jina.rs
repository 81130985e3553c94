use crate::traits::{RankedIndex, Reranker};
use crate::types::{ResearchError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Configuration for the Jina rerank API.
#[derive(Debug, Clone)]
pub struct JinaConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout_seconds: u64,
}

impl JinaConfig {
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("JINA_API_KEY")
            .map_err(|_| ResearchError::MissingConfig("JINA_API_KEY not set".to_string()))?;
        let model = std::env::var("JINA_RERANKER_MODEL")
            .unwrap_or_else(|_| "jina-reranker-v2-base-multilingual".to_string());
        Ok(Self {
            api_key,
            model,
            base_url: "https://api.jina.ai/v1".to_string(),
            timeout_seconds: 30,
        })
    }
}

/// Relevance ranker backed by the Jina rerank API. Failures surface as
/// errors; the selector treats them as a signal to fall back to discovery
/// order.
pub struct JinaReranker {
    client: Client,
    config: JinaConfig,
}

impl JinaReranker {
    pub fn new(config: JinaConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self { client, config })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(JinaConfig::from_env()?)
    }
}

#[derive(Debug, Deserialize)]
struct JinaRerankResponse {
    #[serde(default)]
    results: Vec<JinaRerankResult>,
}

#[derive(Debug, Deserialize)]
struct JinaRerankResult {
    index: usize,
    relevance_score: f64,
}

#[async_trait]
impl Reranker for JinaReranker {
    async fn rerank(
        &self,
        query: &str,
        documents: &[String],
        top_k: usize,
    ) -> Result<Vec<RankedIndex>> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        let payload = serde_json::json!({
            "model": self.config.model,
            "query": query,
            "documents": documents,
            "top_n": top_k.min(documents.len()),
        });

        debug!("Reranking {} documents with model '{}'", documents.len(), self.config.model);
        let response = self
            .client
            .post(format!("{}/rerank", self.config.base_url.trim_end_matches('/')))
            .bearer_auth(&self.config.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ResearchError::General(format!("Jina rerank request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ResearchError::General(format!(
                "Jina rerank returned HTTP {}: {}",
                status, body
            )));
        }

        let parsed: JinaRerankResponse = response
            .json()
            .await
            .map_err(|e| ResearchError::General(format!("unexpected Jina response: {}", e)))?;

        Ok(parsed
            .results
            .into_iter()
            .map(|r| RankedIndex { index: r.index, score: r.relevance_score })
            .collect())
    }
}
