use clap::Parser;
use deep_research::providers::{
    JinaReranker, OpenRouterProvider, PageScraper, SerperSearchProvider,
};
use deep_research::{DeepResearchAgent, DeepResearchConfig};
use tracing::info;

/// Research a question end to end: plan searches, gather and summarize
/// sources, then write and refine a cited report.
#[derive(Debug, Parser)]
#[command(name = "deep-research", version, about)]
struct Cli {
    /// The research question to investigate.
    query: String,

    /// Model used for planning the searches.
    #[arg(long)]
    planner_model: Option<String>,

    /// Model used for per-source summarization.
    #[arg(long)]
    summarizer_model: Option<String>,

    /// Model used for drafting and revising the report.
    #[arg(long)]
    writer_model: Option<String>,

    /// Number of primary sources to fetch and summarize.
    #[arg(long)]
    top_m: Option<usize>,

    /// Number of standby sources kept behind the primary tier.
    #[arg(long)]
    next_k: Option<usize>,

    /// Cap on the number of planned search tasks.
    #[arg(long)]
    max_search_tasks: Option<usize>,

    /// Cap on refinement iterations after the initial draft.
    #[arg(long)]
    max_iterations: Option<usize>,
}

impl Cli {
    fn into_config(self) -> (String, DeepResearchConfig) {
        let mut config = DeepResearchConfig::default();
        if let Some(model) = self.planner_model {
            config.planner_model = model;
        }
        if let Some(model) = self.summarizer_model {
            config.summarizer_model = model;
        }
        if let Some(model) = self.writer_model {
            config.writer_model = model;
        }
        if let Some(top_m) = self.top_m {
            config.top_m_sources = top_m;
        }
        if let Some(next_k) = self.next_k {
            config.next_k_sources = next_k;
        }
        if let Some(max_tasks) = self.max_search_tasks {
            config.max_initial_search_tasks = max_tasks;
        }
        if let Some(max_iterations) = self.max_iterations {
            config.max_refinement_iterations = max_iterations;
        }
        (self.query, config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let (query, config) = Cli::parse().into_config();

    let search = SerperSearchProvider::from_env()?;
    let reranker = JinaReranker::from_env()?;
    let scraper = PageScraper::new()?;
    let generation = OpenRouterProvider::from_env()?;

    let mut agent = DeepResearchAgent::new(
        config,
        Box::new(search),
        Box::new(scraper),
        Box::new(reranker),
        Box::new(generation),
    );

    let report = agent.run_deep_research(&query).await?;

    println!("{}", report);
    info!("Usage: {}", agent.usage().summary());

    Ok(())
}
