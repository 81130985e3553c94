use crate::traits::Generation;
use tracing::debug;

/// Run-scoped accounting of model tokens, estimated cost and external
/// search queries. Reset at the start of each run and read only for
/// reporting; every generation and batch-search call site records into it.
#[derive(Debug, Clone, Copy, Default)]
pub struct UsageLedger {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
    pub estimated_cost: f64,
    pub search_queries: u64,
}

impl UsageLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Record the usage carried by one generation response, if the
    /// provider reported any.
    pub fn record_generation(&mut self, generation: &Generation) {
        if let Some(usage) = generation.usage {
            self.prompt_tokens += usage.prompt_tokens;
            self.completion_tokens += usage.completion_tokens;
            self.total_tokens += usage.total_tokens;
            debug!(
                "Tokens used: prompt={}, completion={}, total={} (cumulative total: {})",
                usage.prompt_tokens, usage.completion_tokens, usage.total_tokens, self.total_tokens
            );
        } else {
            debug!("Usage information not available in generation response");
        }
        if let Some(cost) = generation.cost {
            self.estimated_cost += cost;
            debug!(
                "Generation cost: ${:.6} (cumulative: ${:.6})",
                cost, self.estimated_cost
            );
        }
    }

    /// Record a batch of issued search queries.
    pub fn record_searches(&mut self, count: usize) {
        self.search_queries += count as u64;
    }

    /// One-line summary for the end-of-run log.
    pub fn summary(&self) -> String {
        format!(
            "tokens total={} (prompt={}, completion={}), estimated cost=${:.6}, search queries={}",
            self.total_tokens,
            self.prompt_tokens,
            self.completion_tokens,
            self.estimated_cost,
            self.search_queries
        )
    }
}
