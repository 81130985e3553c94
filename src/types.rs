use serde::{Deserialize, Serialize};

/// Serper-style endpoint a search task is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchEndpoint {
    #[default]
    General,
    Scholarly,
    News,
}

impl SearchEndpoint {
    /// Parse a planner-emitted endpoint string. The planner contract uses
    /// `/search`, `/scholar` and `/news`; bare names are accepted too.
    /// Unknown values fall back to the general endpoint.
    pub fn parse(value: &str) -> Self {
        match value.trim().trim_start_matches('/').to_lowercase().as_str() {
            "search" | "general" | "" => SearchEndpoint::General,
            "scholar" | "scholarly" => SearchEndpoint::Scholarly,
            "news" => SearchEndpoint::News,
            other => {
                tracing::warn!("Unsupported search endpoint '{}', defaulting to /search", other);
                SearchEndpoint::General
            }
        }
    }

    /// Endpoint path as the planner emits it.
    pub fn as_path(&self) -> &'static str {
        match self {
            SearchEndpoint::General => "/search",
            SearchEndpoint::Scholarly => "/scholar",
            SearchEndpoint::News => "/news",
        }
    }

    /// The `type` field the Serper batch API expects.
    pub fn serper_type(&self) -> &'static str {
        match self {
            SearchEndpoint::General => "search",
            SearchEndpoint::Scholarly => "scholar",
            SearchEndpoint::News => "news",
        }
    }
}

impl Serialize for SearchEndpoint {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_path())
    }
}

impl<'de> Deserialize<'de> for SearchEndpoint {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(SearchEndpoint::parse(&raw))
    }
}

/// One planned web search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchTask {
    pub query: String,
    #[serde(default)]
    pub endpoint: SearchEndpoint,
    #[serde(default = "default_num_results")]
    pub num_results: u32,
    #[serde(default)]
    pub reasoning: String,
}

fn default_num_results() -> u32 {
    10
}

impl SearchTask {
    /// Targeted single-topic task used by the refinement loop.
    pub fn targeted(query: impl Into<String>, num_results: u32) -> Self {
        Self {
            query: query.into(),
            endpoint: SearchEndpoint::General,
            num_results,
            reasoning: "Targeted follow-up search".to_string(),
        }
    }
}

/// Output of the planning phase. Immutable once created: the writing plan
/// guides every subsequent draft and revision call.
#[derive(Debug, Clone)]
pub struct ResearchPlan {
    pub search_tasks: Vec<SearchTask>,
    pub writing_plan: serde_json::Value,
}

/// A candidate source discovered by search. The link is the identity used
/// for deduplication; the first sighting of a link keeps its title/snippet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRecord {
    pub link: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub snippet: String,
}

/// A source together with its relevance score from the reranker.
#[derive(Debug, Clone)]
pub struct RankedSource {
    pub source: SourceRecord,
    pub score: f64,
}

/// Sources chosen for full-text processing, split into two positional
/// tiers. Both tiers are processed identically downstream.
#[derive(Debug, Clone, Default)]
pub struct SelectedSources {
    pub top_m: Vec<SourceRecord>,
    pub next_k: Vec<SourceRecord>,
}

impl SelectedSources {
    /// All selected sources in tier order, top tier first.
    pub fn all(&self) -> Vec<SourceRecord> {
        self.top_m.iter().chain(self.next_k.iter()).cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.top_m.is_empty() && self.next_k.is_empty()
    }

    pub fn len(&self) -> usize {
        self.top_m.len() + self.next_k.len()
    }
}

/// Full text resolved for one selected source.
#[derive(Debug, Clone)]
pub struct FetchedContent {
    pub link: String,
    pub title: String,
    pub text: String,
}

/// A query-focused summary of one source, carrying its permanent citation
/// identity.
#[derive(Debug, Clone)]
pub struct SourceSummary {
    pub link: String,
    pub title: String,
    pub text: String,
    pub citation_index: usize,
}

/// Append-only accumulator of source summaries. Citation indices are
/// assigned here and only here: the next index is always `len + 1`, and an
/// index is never reused or renumbered, even across refinement iterations.
#[derive(Debug, Clone, Default)]
pub struct SummaryLog {
    entries: Vec<SourceSummary>,
}

impl SummaryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a summary and assign its citation index. Returns the index.
    pub fn append(
        &mut self,
        title: impl Into<String>,
        link: impl Into<String>,
        text: impl Into<String>,
    ) -> usize {
        let citation_index = self.entries.len() + 1;
        self.entries.push(SourceSummary {
            link: link.into(),
            title: title.into(),
            text: text.into(),
            citation_index,
        });
        citation_index
    }

    pub fn entries(&self) -> &[SourceSummary] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render the reference list in citation-index order, one
    /// `"{i}. [{title}]({link})"` line per summary.
    pub fn render_references(&self) -> String {
        let mut section = String::from("References:\n");
        for entry in &self.entries {
            section.push_str(&format!(
                "{}. [{}]({})\n",
                entry.citation_index, entry.title, entry.link
            ));
        }
        section.trim_end().to_string()
    }
}

/// Constructor-time configuration for the research agent.
#[derive(Debug, Clone)]
pub struct DeepResearchConfig {
    pub planner_model: String,
    pub summarizer_model: String,
    pub writer_model: String,
    /// Upper bound on planner-generated search tasks; excess is truncated.
    pub max_initial_search_tasks: usize,
    /// Primary tier size for full-text processing.
    pub top_m_sources: usize,
    /// Secondary tier size, processed identically to the primary tier.
    pub next_k_sources: usize,
    /// Result count for the targeted refinement search.
    pub refinement_result_count: u32,
    /// Cap on new sources processed per refinement iteration.
    pub max_refinement_sources: usize,
    pub max_refinement_iterations: usize,
    /// Fetched text longer than this is truncated at a sentence boundary
    /// before summarization.
    pub max_source_chars: usize,
}

impl Default for DeepResearchConfig {
    fn default() -> Self {
        Self {
            planner_model: "google/gemini-2.0-flash-001".to_string(),
            summarizer_model: "google/gemini-2.0-flash-001".to_string(),
            writer_model: "google/gemini-2.5-pro-preview".to_string(),
            max_initial_search_tasks: 3,
            top_m_sources: 3,
            next_k_sources: 4,
            refinement_result_count: 5,
            max_refinement_sources: 3,
            max_refinement_iterations: 2,
            max_source_chars: 48_000,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ResearchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Planning failed: {0}")]
    Planning(String),

    #[error("Search failed: {0}")]
    Search(String),

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Missing configuration: {0}")]
    MissingConfig(String),

    #[error("No writing plan available for drafting")]
    EmptyWritingPlan,

    #[error("{0}")]
    General(String),
}

pub type Result<T> = std::result::Result<T, ResearchError>;
