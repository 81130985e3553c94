pub mod jina;
pub mod mock;
pub mod openrouter;
pub mod scraper;
pub mod serper;

pub use jina::{JinaConfig, JinaReranker};
pub use mock::{MockContentProvider, MockGenerationProvider, MockReranker, MockSearchProvider};
pub use openrouter::{OpenRouterConfig, OpenRouterProvider};
pub use scraper::PageScraper;
pub use serper::{SerperConfig, SerperSearchProvider};
