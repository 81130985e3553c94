use deep_research::providers::{
    MockContentProvider, MockGenerationProvider, MockReranker, MockSearchProvider,
};
use deep_research::{DeepResearchAgent, DeepResearchConfig, ResearchError, SourceRecord};
use tracing::info;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .try_init();
}

fn source(link: &str, title: &str) -> SourceRecord {
    SourceRecord {
        link: link.to_string(),
        title: title.to_string(),
        snippet: format!("Snippet for {}", title),
    }
}

fn plan_json(tasks: &[&str]) -> String {
    let tasks: Vec<serde_json::Value> = tasks
        .iter()
        .map(|q| serde_json::json!({"query": q, "endpoint": "/search", "num_results": 10}))
        .collect();
    serde_json::json!({
        "search_tasks": tasks,
        "writing_plan": {"sections": ["Background", "Findings", "Outlook"]}
    })
    .to_string()
}

#[tokio::test]
async fn fallback_selection_produces_report_with_ordered_references() {
    init_tracing();
    info!("Testing the discovery-order fallback path end to end");

    let generation = MockGenerationProvider::new();
    generation.push_text(plan_json(&["post-quantum migration", "quantum threat timeline"]));
    generation.push_text("Summary of source one.");
    generation.push_text("Summary of source two.");
    generation.push_text("Summary of source three.");
    generation.push_text("Report body citing [1], [2] and [3].");

    let search = MockSearchProvider::new();
    search.push_batches(vec![
        vec![
            source("https://a.example", "Alpha"),
            source("https://b.example", "Bravo"),
            source("https://c.example", "Charlie"),
        ],
        vec![source("https://d.example", "Delta"), source("https://e.example", "Echo")],
    ]);

    let content = MockContentProvider::new()
        .with_page("https://a.example", "Full text of alpha.")
        .with_page("https://b.example", "Full text of bravo.")
        .with_page("https://c.example", "Full text of charlie.");

    let config = DeepResearchConfig {
        top_m_sources: 3,
        next_k_sources: 0,
        ..DeepResearchConfig::default()
    };
    let mut agent = DeepResearchAgent::new(
        config,
        Box::new(search),
        Box::new(content),
        Box::new(MockReranker::failing()),
        Box::new(generation),
    );

    let report = agent.run_deep_research("How will quantum computing change security?").await.unwrap();

    assert!(report.starts_with("Report body citing [1], [2] and [3]."));
    assert!(report.contains("References:"));
    // Ranker failure falls back to discovery order, so references follow
    // the search result order.
    assert!(report.contains("1. [Alpha](https://a.example)"));
    assert!(report.contains("2. [Bravo](https://b.example)"));
    assert!(report.contains("3. [Charlie](https://c.example)"));
    assert!(!report.contains("Delta"));

    assert_eq!(agent.usage().search_queries, 2);
    assert!(agent.usage().total_tokens > 0);
}

#[tokio::test]
async fn refinement_adds_citations_that_continue_global_numbering() {
    init_tracing();

    let generation = MockGenerationProvider::new();
    generation.push_text(plan_json(&["solid state batteries"]));
    generation.push_text("Summary one.");
    generation.push_text("Summary two.");
    generation.push_text("Draft. <request_more_info topic=\"manufacturing yield\">");
    generation.push_text("Summary three.");
    generation.push_text("Summary four.");
    generation.push_text("Revised draft citing [1], [2], [3] and [4].");

    let search = MockSearchProvider::new();
    search.push_batches(vec![vec![
        source("https://a.example", "Alpha"),
        source("https://b.example", "Bravo"),
    ]]);
    search.push_batches(vec![vec![
        source("https://f.example", "Foxtrot"),
        source("https://g.example", "Golf"),
    ]]);

    let content = MockContentProvider::new()
        .with_page("https://a.example", "Alpha text.")
        .with_page("https://b.example", "Bravo text.")
        .with_page("https://f.example", "Foxtrot text.")
        .with_page("https://g.example", "Golf text.");

    let config = DeepResearchConfig {
        top_m_sources: 2,
        next_k_sources: 0,
        max_refinement_sources: 2,
        max_refinement_iterations: 2,
        ..DeepResearchConfig::default()
    };
    let mut agent = DeepResearchAgent::new(
        config,
        Box::new(search),
        Box::new(content),
        Box::new(MockReranker::with_scores(vec![0.9, 0.8])),
        Box::new(generation),
    );

    let report = agent.run_deep_research("State of solid state batteries?").await.unwrap();

    assert!(report.starts_with("Revised draft"));
    assert!(report.contains("3. [Foxtrot](https://f.example)"));
    assert!(report.contains("4. [Golf](https://g.example)"));
    // One initial task plus one targeted refinement search.
    assert_eq!(agent.usage().search_queries, 2);
}

#[tokio::test]
async fn failed_refinement_search_keeps_draft_and_counts_the_iteration() {
    init_tracing();

    let generation = MockGenerationProvider::new();
    generation.push_text(plan_json(&["carbon capture costs"]));
    generation.push_text("Summary one.");
    generation.push_text("Draft. <request_more_info topic=\"pipeline siting\">");

    let search = MockSearchProvider::new();
    search.push_batches(vec![vec![source("https://a.example", "Alpha")]]);
    search.push_failure("batch endpoint unavailable");

    let content = MockContentProvider::new().with_page("https://a.example", "Alpha text.");

    let config = DeepResearchConfig {
        top_m_sources: 1,
        next_k_sources: 0,
        max_refinement_iterations: 1,
        ..DeepResearchConfig::default()
    };
    let mut agent = DeepResearchAgent::new(
        config,
        Box::new(search),
        Box::new(content),
        Box::new(MockReranker::with_scores(vec![0.9])),
        Box::new(generation),
    );

    let report = agent.run_deep_research("Carbon capture at scale?").await.unwrap();

    // The skipped iteration exhausts the cap without revising, so the
    // marker survives into the final report and no citations were added.
    assert!(report.starts_with("Draft. <request_more_info"));
    assert!(report.contains("1. [Alpha](https://a.example)"));
    assert!(!report.contains("2. ["));
    assert_eq!(agent.usage().search_queries, 2);
}

#[tokio::test]
async fn failed_revision_keeps_previous_draft_but_appended_summaries_survive() {
    init_tracing();

    let generation = MockGenerationProvider::new();
    generation.push_text(plan_json(&["offshore wind permitting"]));
    generation.push_text("Summary one.");
    generation.push_text("Draft. <request_more_info topic=\"grid interconnection\">");
    generation.push_text("Summary two.");
    generation.push_failure("model overloaded");

    let search = MockSearchProvider::new();
    search.push_batches(vec![vec![source("https://a.example", "Alpha")]]);
    search.push_batches(vec![vec![source("https://n.example", "November")]]);

    let content = MockContentProvider::new()
        .with_page("https://a.example", "Alpha text.")
        .with_page("https://n.example", "November text.");

    let config = DeepResearchConfig {
        top_m_sources: 1,
        next_k_sources: 0,
        max_refinement_sources: 1,
        max_refinement_iterations: 1,
        ..DeepResearchConfig::default()
    };
    let mut agent = DeepResearchAgent::new(
        config,
        Box::new(search),
        Box::new(content),
        Box::new(MockReranker::with_scores(vec![0.9])),
        Box::new(generation),
    );

    let report = agent.run_deep_research("Offshore wind buildout?").await.unwrap();

    // The failed revision keeps the previous draft, the iteration still
    // counts toward the cap, and the summary appended before the failure
    // keeps its citation in the references.
    assert!(report.starts_with("Draft. <request_more_info"));
    assert!(report.contains("1. [Alpha](https://a.example)"));
    assert!(report.contains("2. [November](https://n.example)"));
    assert_eq!(agent.usage().search_queries, 2);
}

#[tokio::test]
async fn refinement_loop_halts_at_the_iteration_cap() {
    init_tracing();

    let generation = MockGenerationProvider::new();
    generation.push_text(plan_json(&["fusion startups"]));
    generation.push_text("Summary one.");
    generation.push_text("Draft. <request_more_info topic=\"tritium supply\">");
    // Unscripted refinement searches return no sources, so each iteration
    // revises with zero new summaries and re-requests.
    generation.push_text("Revision one. <request_more_info topic=\"magnet costs\">");
    generation.push_text("Revision two. <request_more_info topic=\"capital needs\">");

    let search = MockSearchProvider::new();
    search.push_batches(vec![vec![source("https://a.example", "Alpha")]]);

    let content = MockContentProvider::new().with_page("https://a.example", "Alpha text.");

    let config = DeepResearchConfig {
        top_m_sources: 1,
        next_k_sources: 0,
        max_refinement_iterations: 2,
        ..DeepResearchConfig::default()
    };
    let mut agent = DeepResearchAgent::new(
        config,
        Box::new(search),
        Box::new(content),
        Box::new(MockReranker::with_scores(vec![0.9])),
        Box::new(generation),
    );

    let report = agent.run_deep_research("Who leads commercial fusion?").await.unwrap();

    assert!(report.starts_with("Revision two."));
    // Initial search plus exactly two refinement searches.
    assert_eq!(agent.usage().search_queries, 3);
}

#[tokio::test]
async fn report_without_summaries_carries_no_references() {
    init_tracing();

    let generation = MockGenerationProvider::new();
    generation.push_text(plan_json(&["niche topic"]));
    generation.push_text("Plan-only report with no citations.");

    let search = MockSearchProvider::new();
    search.push_batches(vec![vec![source("https://a.example", "Alpha")]]);

    // No pages scripted, every fetch fails and the source is dropped.
    let content = MockContentProvider::new();

    let mut agent = DeepResearchAgent::new(
        DeepResearchConfig::default(),
        Box::new(search),
        Box::new(content),
        Box::new(MockReranker::with_scores(vec![0.9])),
        Box::new(generation),
    );

    let report = agent.run_deep_research("Anything published on this?").await.unwrap();

    assert_eq!(report, "Plan-only report with no citations.");
}

#[tokio::test]
async fn malformed_plan_aborts_the_run() {
    init_tracing();

    let generation = MockGenerationProvider::new();
    generation.push_text("not a json object at all");

    let mut agent = DeepResearchAgent::new(
        DeepResearchConfig::default(),
        Box::new(MockSearchProvider::new()),
        Box::new(MockContentProvider::new()),
        Box::new(MockReranker::failing()),
        Box::new(generation),
    );

    let err = agent.run_deep_research("query").await.unwrap_err();
    assert!(matches!(err, ResearchError::Planning(_)), "unexpected error: {}", err);
}

#[tokio::test]
async fn initial_search_failure_is_fatal() {
    init_tracing();

    let generation = MockGenerationProvider::new();
    generation.push_text(plan_json(&["a query"]));

    let search = MockSearchProvider::new();
    search.push_failure("quota exhausted");

    let mut agent = DeepResearchAgent::new(
        DeepResearchConfig::default(),
        Box::new(search),
        Box::new(MockContentProvider::new()),
        Box::new(MockReranker::failing()),
        Box::new(generation),
    );

    let err = agent.run_deep_research("query").await.unwrap_err();
    assert!(matches!(err, ResearchError::Search(_)), "unexpected error: {}", err);
}

#[tokio::test]
async fn initial_draft_failure_is_fatal() {
    init_tracing();

    let generation = MockGenerationProvider::new();
    generation.push_text(plan_json(&["a query"]));
    generation.push_text("Summary one.");
    generation.push_failure("model overloaded");

    let search = MockSearchProvider::new();
    search.push_batches(vec![vec![source("https://a.example", "Alpha")]]);

    let content = MockContentProvider::new().with_page("https://a.example", "Alpha text.");

    let mut agent = DeepResearchAgent::new(
        DeepResearchConfig::default(),
        Box::new(search),
        Box::new(content),
        Box::new(MockReranker::with_scores(vec![0.9])),
        Box::new(generation),
    );

    let err = agent.run_deep_research("query").await.unwrap_err();
    assert!(matches!(err, ResearchError::Generation(_)), "unexpected error: {}", err);
}

#[tokio::test]
async fn empty_writing_plan_fails_at_the_drafting_phase() {
    init_tracing();

    let generation = MockGenerationProvider::new();
    generation.push_text(r#"{"search_tasks": [], "writing_plan": {}}"#);

    let mut agent = DeepResearchAgent::new(
        DeepResearchConfig::default(),
        Box::new(MockSearchProvider::new()),
        Box::new(MockContentProvider::new()),
        Box::new(MockReranker::failing()),
        Box::new(generation),
    );

    let err = agent.run_deep_research("query").await.unwrap_err();
    assert!(matches!(err, ResearchError::EmptyWritingPlan), "unexpected error: {}", err);
}

#[tokio::test]
async fn duplicate_links_share_one_citation() {
    init_tracing();

    let generation = MockGenerationProvider::new();
    generation.push_text(plan_json(&["q1", "q2"]));
    generation.push_text("Summary one.");
    generation.push_text("Draft citing [1].");

    // The same link surfaces in both batches under different titles; the
    // first sighting wins.
    let search = MockSearchProvider::new();
    search.push_batches(vec![
        vec![source("https://dup.example", "First Title")],
        vec![source("https://dup.example", "Second Title")],
    ]);

    let content = MockContentProvider::new().with_page("https://dup.example", "Text.");

    let config = DeepResearchConfig {
        top_m_sources: 3,
        next_k_sources: 0,
        ..DeepResearchConfig::default()
    };
    let mut agent = DeepResearchAgent::new(
        config,
        Box::new(search),
        Box::new(content),
        Box::new(MockReranker::failing()),
        Box::new(generation),
    );

    let report = agent.run_deep_research("query").await.unwrap();

    assert!(report.contains("1. [First Title](https://dup.example)"));
    assert!(!report.contains("Second Title"));
    assert!(!report.contains("2. ["));
}
