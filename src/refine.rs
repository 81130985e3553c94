use crate::content::acquire_content;
use crate::selection::deduplicate_sources;
use crate::summarize::summarize_sources;
use crate::traits::{ContentProvider, GenerationProvider, SearchProvider};
use crate::types::{DeepResearchConfig, ResearchPlan, SearchTask, SummaryLog};
use crate::usage::UsageLedger;
use crate::writer::revise_draft;
use regex::Regex;
use std::sync::OnceLock;
use tracing::{info, warn};

/// A writer request for more sourced information on a named topic,
/// extracted from an in-draft sentinel tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefinementRequest {
    pub topic: String,
}

/// Scan a draft for the `<request_more_info topic="...">` marker
/// (case-insensitive). Only the first marker counts; the writer is
/// instructed to emit at most one per draft.
pub fn parse_refinement_request(draft: &str) -> Option<RefinementRequest> {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    let re = MARKER.get_or_init(|| {
        Regex::new(r#"(?i)<request_more_info topic="(.*?)">"#).expect("marker pattern compiles")
    });
    re.captures(draft).and_then(|caps| {
        let topic = caps.get(1)?.as_str().trim().to_string();
        if topic.is_empty() {
            None
        } else {
            Some(RefinementRequest { topic })
        }
    })
}

/// Loop state threaded through refinement iterations. The draft is only
/// ever replaced wholesale by a successful revision.
struct RefinementState {
    iteration: usize,
    draft: String,
}

/// Run the bounded refinement loop: while the current draft carries a
/// refinement marker and the iteration cap is not reached, gather targeted
/// sources for the requested topic and revise the draft with them. Every
/// failure mode here is non-fatal; the previous draft always survives.
/// Returns the final draft.
#[allow(clippy::too_many_arguments)]
pub async fn run_refinement_loop(
    search: &dyn SearchProvider,
    content: &dyn ContentProvider,
    generation: &dyn GenerationProvider,
    config: &DeepResearchConfig,
    user_query: &str,
    plan: &ResearchPlan,
    initial_draft: String,
    summaries: &mut SummaryLog,
    ledger: &mut UsageLedger,
) -> String {
    let mut state = RefinementState { iteration: 0, draft: initial_draft };

    while state.iteration < config.max_refinement_iterations {
        info!(
            "Refinement iteration {}/{}",
            state.iteration + 1,
            config.max_refinement_iterations
        );

        let request = match parse_refinement_request(&state.draft) {
            Some(request) => request,
            None => {
                info!("No refinement request found in the draft, exiting loop");
                return state.draft;
            }
        };
        info!("Writer requested more info on topic: '{}'", request.topic);

        let task = SearchTask::targeted(&request.topic, config.refinement_result_count);
        ledger.record_searches(1);
        let batches = match search.batch_search(std::slice::from_ref(&task)).await {
            Ok(batches) => batches,
            Err(e) => {
                warn!("Refinement search failed ({}), skipping iteration", e);
                state.iteration += 1;
                continue;
            }
        };

        // Targeted results are assumed relevant already: dedupe and cap,
        // no reranking.
        let unique = deduplicate_sources(&batches);
        let selected: Vec<_> = unique.into_iter().take(config.max_refinement_sources).collect();
        info!("Selected {} refinement sources", selected.len());

        let fetched = acquire_content(content, &selected).await;
        let first_new = summaries.len();
        let appended = summarize_sources(
            generation,
            &config.summarizer_model,
            user_query,
            &fetched,
            config.max_source_chars,
            summaries,
            ledger,
        )
        .await;
        if appended == 0 {
            info!("No new summaries for '{}', revising against the gap anyway", request.topic);
        }
        let new_summaries = summaries.entries()[first_new..].to_vec();

        match revise_draft(
            generation,
            &config.writer_model,
            user_query,
            plan,
            &state.draft,
            &request.topic,
            &new_summaries,
            summaries.entries(),
            ledger,
        )
        .await
        {
            Ok(revised) => state.draft = revised,
            Err(e) => {
                warn!("Revision failed ({}), keeping previous draft", e);
            }
        }

        state.iteration += 1;
    }

    if state.iteration >= config.max_refinement_iterations {
        info!(
            "Reached maximum refinement iterations ({})",
            config.max_refinement_iterations
        );
    }
    state.draft
}
