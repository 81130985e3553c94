use crate::types::{Result, SearchTask, SourceRecord};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One message in a chat-completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".to_string(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }
}

/// Token counts reported by a generation provider for one call.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

/// Result of one generation call.
#[derive(Debug, Clone)]
pub struct Generation {
    pub text: String,
    pub usage: Option<TokenUsage>,
    pub cost: Option<f64>,
}

/// Result of one extraction strategy applied to a fetched page.
#[derive(Debug, Clone)]
pub struct ExtractionOutcome {
    pub success: bool,
    pub content: Option<String>,
    pub error: Option<String>,
}

impl ExtractionOutcome {
    pub fn ok(content: impl Into<String>) -> Self {
        Self { success: true, content: Some(content.into()), error: None }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self { success: false, content: None, error: Some(error.into()) }
    }
}

/// One entry of a rerank result: the index of a document in the request
/// plus its relevance score. Entries are ordered by score descending.
#[derive(Debug, Clone, Copy)]
pub struct RankedIndex {
    pub index: usize,
    pub score: f64,
}

/// Executes a batch of search tasks. The batch is all-or-nothing: a failure
/// fails every task in it.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Returns one result list per task, in task order.
    async fn batch_search(&self, tasks: &[SearchTask]) -> Result<Vec<Vec<SourceRecord>>>;
}

/// Resolves a URL to extracted text under one or more named strategies.
/// The entry order is the provider's preference order and drives the
/// acquirer's fallback, so it must be stable across calls.
#[async_trait]
pub trait ContentProvider: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<(String, ExtractionOutcome)>>;
}

/// Scores candidate documents against a query. An empty result is treated
/// as a ranking failure by the selector.
#[async_trait]
pub trait Reranker: Send + Sync {
    async fn rerank(&self, query: &str, documents: &[String], top_k: usize)
        -> Result<Vec<RankedIndex>>;
}

/// Language-model invocation. Implementations carry their own bounded
/// retry policy for transient failures.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    async fn generate(
        &self,
        messages: &[ChatMessage],
        model: &str,
        json_mode: bool,
    ) -> Result<Generation>;
}
