use crate::prompts;
use crate::traits::GenerationProvider;
use crate::types::{ResearchError, ResearchPlan, Result, SourceSummary};
use crate::usage::UsageLedger;
use tracing::{debug, info, warn};

/// True when the writing plan gives the writer nothing to work against.
fn writing_plan_is_empty(plan: &ResearchPlan) -> bool {
    match &plan.writing_plan {
        serde_json::Value::Null => true,
        serde_json::Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Compose the initial report draft from the writing plan and the numbered
/// summaries. A missing writing plan is fatal; an empty summary list only
/// degrades the draft to plan-only.
pub async fn write_initial_draft(
    provider: &dyn GenerationProvider,
    model: &str,
    user_query: &str,
    plan: &ResearchPlan,
    summaries: &[SourceSummary],
    ledger: &mut UsageLedger,
) -> Result<String> {
    if writing_plan_is_empty(plan) {
        return Err(ResearchError::EmptyWritingPlan);
    }
    if summaries.is_empty() {
        warn!("No summaries available, generating report from the writing plan only");
    }

    let messages = prompts::writer_initial_messages(user_query, &plan.writing_plan, summaries);
    let input_chars: usize = messages.iter().map(|m| m.content.len()).sum();
    debug!("Writer input is ~{} chars across {} summaries", input_chars, summaries.len());

    info!("Calling writer model '{}' for the initial draft", model);
    let generation = provider
        .generate(&messages, model, false)
        .await
        .map_err(|e| ResearchError::Generation(format!("initial draft failed: {}", e)))?;
    ledger.record_generation(&generation);

    let draft = generation.text.trim().to_string();
    info!("Initial draft generated ({} chars)", draft.len());
    Ok(draft)
}

/// Revise an existing draft with newly gathered summaries. Errors are
/// returned to the caller, which keeps the previous draft.
pub async fn revise_draft(
    provider: &dyn GenerationProvider,
    model: &str,
    user_query: &str,
    plan: &ResearchPlan,
    previous_draft: &str,
    refinement_topic: &str,
    new_summaries: &[SourceSummary],
    all_summaries: &[SourceSummary],
    ledger: &mut UsageLedger,
) -> Result<String> {
    let messages = prompts::writer_refinement_messages(
        user_query,
        &plan.writing_plan,
        previous_draft,
        refinement_topic,
        new_summaries,
        all_summaries,
    );
    let input_chars: usize = messages.iter().map(|m| m.content.len()).sum();
    debug!("Revision input is ~{} chars", input_chars);

    info!("Calling writer model '{}' for a revision", model);
    let generation = provider
        .generate(&messages, model, false)
        .await
        .map_err(|e| ResearchError::Generation(format!("revision failed: {}", e)))?;
    ledger.record_generation(&generation);

    let revised = generation.text.trim().to_string();
    if revised.is_empty() {
        return Err(ResearchError::Generation("revision produced empty output".to_string()));
    }
    info!("Revision complete ({} chars)", revised.len());
    Ok(revised)
}
