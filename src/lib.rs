pub mod types;
pub mod traits;
pub mod usage;
pub mod utils;
pub mod prompts;
pub mod planner;
pub mod selection;
pub mod content;
pub mod summarize;
pub mod writer;
pub mod refine;
pub mod agent;
pub mod providers;

pub use types::*;
pub use traits::{
    ChatMessage, ContentProvider, ExtractionOutcome, Generation, GenerationProvider, RankedIndex,
    Reranker, SearchProvider, TokenUsage,
};
pub use usage::UsageLedger;
pub use agent::DeepResearchAgent;
