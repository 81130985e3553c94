//! Mock providers for development and testing. Each mock is scripted: you
//! queue outcomes up front and the mock replays them in call order.

use crate::content::NO_EXTRACTION;
use crate::traits::{
    ChatMessage, ContentProvider, ExtractionOutcome, Generation, GenerationProvider, RankedIndex,
    Reranker, SearchProvider,
};
use crate::types::{ResearchError, Result, SearchTask, SourceRecord};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// Scripted search provider. Each queued outcome answers one
/// `batch_search` call; once the script runs out, calls succeed with an
/// empty result list per task.
#[derive(Default)]
pub struct MockSearchProvider {
    script: Mutex<VecDeque<Result<Vec<Vec<SourceRecord>>>>>,
    calls: Mutex<usize>,
}

impl MockSearchProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_batches(&self, batches: Vec<Vec<SourceRecord>>) {
        self.script.lock().unwrap().push_back(Ok(batches));
    }

    pub fn push_failure(&self, message: impl Into<String>) {
        self.script
            .lock()
            .unwrap()
            .push_back(Err(ResearchError::Search(message.into())));
    }

    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl SearchProvider for MockSearchProvider {
    async fn batch_search(&self, tasks: &[SearchTask]) -> Result<Vec<Vec<SourceRecord>>> {
        *self.calls.lock().unwrap() += 1;
        match self.script.lock().unwrap().pop_front() {
            Some(outcome) => outcome,
            None => Ok(tasks.iter().map(|_| Vec::new()).collect()),
        }
    }
}

/// Content provider backed by a fixed link-to-text map. Unknown links
/// resolve to a failed extraction rather than an error, matching how the
/// live scraper reports unreachable pages.
#[derive(Default)]
pub struct MockContentProvider {
    pages: HashMap<String, String>,
}

impl MockContentProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, link: impl Into<String>, text: impl Into<String>) -> Self {
        self.pages.insert(link.into(), text.into());
        self
    }
}

#[async_trait]
impl ContentProvider for MockContentProvider {
    async fn fetch(&self, url: &str) -> Result<Vec<(String, ExtractionOutcome)>> {
        let outcome = match self.pages.get(url) {
            Some(text) => ExtractionOutcome::ok(text.clone()),
            None => ExtractionOutcome::failed(format!("no mock page for {}", url)),
        };
        Ok(vec![(NO_EXTRACTION.to_string(), outcome)])
    }
}

/// Reranker that either fails every call or returns a fixed score per
/// document index.
pub struct MockReranker {
    scores: Option<Vec<f64>>,
}

impl MockReranker {
    /// Every call returns a ranking error, forcing discovery-order fallback.
    pub fn failing() -> Self {
        Self { scores: None }
    }

    /// Scores documents by position; documents beyond the provided scores
    /// are omitted from the result.
    pub fn with_scores(scores: Vec<f64>) -> Self {
        Self { scores: Some(scores) }
    }
}

#[async_trait]
impl Reranker for MockReranker {
    async fn rerank(
        &self,
        _query: &str,
        documents: &[String],
        top_k: usize,
    ) -> Result<Vec<RankedIndex>> {
        let scores = self
            .scores
            .as_ref()
            .ok_or_else(|| ResearchError::General("mock reranker configured to fail".to_string()))?;
        let mut ranked: Vec<RankedIndex> = scores
            .iter()
            .enumerate()
            .take(documents.len())
            .map(|(index, &score)| RankedIndex { index, score })
            .collect();
        ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        ranked.truncate(top_k);
        Ok(ranked)
    }
}

/// Scripted generation provider. Each queued entry answers one `generate`
/// call in order; an exhausted script is an error so tests fail loudly when
/// the pipeline makes more calls than expected.
#[derive(Default)]
pub struct MockGenerationProvider {
    script: Mutex<VecDeque<Result<String>>>,
    calls: Mutex<usize>,
}

impl MockGenerationProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_text(&self, text: impl Into<String>) {
        self.script.lock().unwrap().push_back(Ok(text.into()));
    }

    pub fn push_failure(&self, message: impl Into<String>) {
        self.script
            .lock()
            .unwrap()
            .push_back(Err(ResearchError::Generation(message.into())));
    }

    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl GenerationProvider for MockGenerationProvider {
    async fn generate(
        &self,
        _messages: &[ChatMessage],
        _model: &str,
        _json_mode: bool,
    ) -> Result<Generation> {
        *self.calls.lock().unwrap() += 1;
        let text = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(ResearchError::Generation("no scripted generation response".to_string()))
            })?;
        Ok(Generation {
            text,
            usage: Some(crate::traits::TokenUsage {
                prompt_tokens: 100,
                completion_tokens: 50,
                total_tokens: 150,
            }),
            cost: None,
        })
    }
}
