use crate::content::acquire_content;
use crate::planner::build_research_plan;
use crate::refine::run_refinement_loop;
use crate::selection::{deduplicate_sources, select_sources};
use crate::summarize::summarize_sources;
use crate::traits::{ContentProvider, GenerationProvider, Reranker, SearchProvider};
use crate::types::{DeepResearchConfig, ResearchError, Result, SummaryLog};
use crate::usage::UsageLedger;
use crate::writer::write_initial_draft;
use tracing::{info, warn};
use uuid::Uuid;

/// Orchestrates one research run: planning, batch search, source
/// selection, content acquisition, summarization, drafting, the bounded
/// refinement loop, and finalization. All phases run strictly
/// sequentially; the summary log and usage ledger are only ever mutated by
/// these sequential steps.
pub struct DeepResearchAgent {
    config: DeepResearchConfig,
    search: Box<dyn SearchProvider>,
    content: Box<dyn ContentProvider>,
    reranker: Box<dyn Reranker>,
    generation: Box<dyn GenerationProvider>,
    ledger: UsageLedger,
}

impl DeepResearchAgent {
    pub fn new(
        config: DeepResearchConfig,
        search: Box<dyn SearchProvider>,
        content: Box<dyn ContentProvider>,
        reranker: Box<dyn Reranker>,
        generation: Box<dyn GenerationProvider>,
    ) -> Self {
        info!(
            "DeepResearchAgent initialized: planner={}, summarizer={}, writer={}, top_m={}, next_k={}, max_iterations={}",
            config.planner_model,
            config.summarizer_model,
            config.writer_model,
            config.top_m_sources,
            config.next_k_sources,
            config.max_refinement_iterations
        );
        Self { config, search, content, reranker, generation, ledger: UsageLedger::new() }
    }

    /// Usage accumulated by the most recent run.
    pub fn usage(&self) -> &UsageLedger {
        &self.ledger
    }

    /// Run the full research workflow for one query and return the final
    /// report text. Fatal phase failures (planning, the initial batch
    /// search, the initial draft) abort the run; everything else degrades
    /// per source or per iteration.
    pub async fn run_deep_research(&mut self, user_query: &str) -> Result<String> {
        self.ledger.reset();
        let run_id = Uuid::new_v4();
        let started_at = chrono::Utc::now();
        info!("Starting deep research run {} for query: '{}'", run_id, user_query);

        // Phase 1: planning.
        info!("[1/8] Planning");
        let plan = build_research_plan(
            self.generation.as_ref(),
            &self.config.planner_model,
            user_query,
            self.config.max_initial_search_tasks,
            &mut self.ledger,
        )
        .await?;

        // Phase 2: initial batch search. A batch failure here is fatal,
        // the run has no sources without it.
        info!("[2/8] Executing initial searches");
        let batches = if plan.search_tasks.is_empty() {
            warn!("Planner produced no search tasks, skipping search execution");
            Vec::new()
        } else {
            self.ledger.record_searches(plan.search_tasks.len());
            self.search
                .batch_search(&plan.search_tasks)
                .await
                .map_err(|e| ResearchError::Search(e.to_string()))?
        };

        // Phase 3: dedupe, rank, select.
        info!("[3/8] Selecting sources");
        let all_sources = deduplicate_sources(&batches);
        let selected = select_sources(
            self.reranker.as_ref(),
            user_query,
            &all_sources,
            self.config.top_m_sources,
            self.config.next_k_sources,
        )
        .await;
        if selected.is_empty() {
            warn!("No sources selected for content fetching");
        }

        // Phase 4: content acquisition.
        info!("[4/8] Fetching content for {} sources", selected.len());
        let fetched = acquire_content(self.content.as_ref(), &selected.all()).await;

        // Phase 5: summarization.
        info!("[5/8] Summarizing {} sources", fetched.len());
        let mut summaries = SummaryLog::new();
        summarize_sources(
            self.generation.as_ref(),
            &self.config.summarizer_model,
            user_query,
            &fetched,
            self.config.max_source_chars,
            &mut summaries,
            &mut self.ledger,
        )
        .await;

        // Phase 6: initial draft.
        info!("[6/8] Generating initial report");
        let draft = write_initial_draft(
            self.generation.as_ref(),
            &self.config.writer_model,
            user_query,
            &plan,
            summaries.entries(),
            &mut self.ledger,
        )
        .await?;

        // Phase 7: refinement loop.
        info!("[7/8] Running refinement loop");
        let final_draft = run_refinement_loop(
            self.search.as_ref(),
            self.content.as_ref(),
            self.generation.as_ref(),
            &self.config,
            user_query,
            &plan,
            draft,
            &mut summaries,
            &mut self.ledger,
        )
        .await;

        // Phase 8: finalization.
        info!("[8/8] Finalizing report");
        let report = finalize_report(&final_draft, &summaries);

        let elapsed = chrono::Utc::now().signed_duration_since(started_at);
        info!("Run {} complete in {}s; usage: {}", run_id, elapsed.num_seconds(), self.ledger.summary());
        Ok(report)
    }
}

/// Append the reference list to the draft iff any summaries were accepted;
/// otherwise the draft is returned verbatim.
fn finalize_report(draft: &str, summaries: &SummaryLog) -> String {
    if summaries.is_empty() {
        info!("No summaries accumulated, final report has no references");
        return draft.to_string();
    }
    info!("Appending {} references to the final report", summaries.len());
    format!("{}\n\n{}", draft.trim(), summaries.render_references())
}
