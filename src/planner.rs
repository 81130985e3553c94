use crate::prompts;
use crate::traits::GenerationProvider;
use crate::types::{ResearchError, ResearchPlan, Result, SearchTask};
use crate::usage::UsageLedger;
use crate::utils::text::strip_code_fence;
use tracing::{debug, info, warn};

/// Turn the user query into a research plan: a bounded list of search
/// tasks plus the writing plan that will guide every draft call. Any
/// malformed planner output is fatal, the run cannot proceed without a
/// valid plan.
pub async fn build_research_plan(
    provider: &dyn GenerationProvider,
    model: &str,
    user_query: &str,
    max_tasks: usize,
    ledger: &mut UsageLedger,
) -> Result<ResearchPlan> {
    info!("Calling planner model '{}'", model);
    let messages = prompts::planner_messages(user_query);
    let generation = provider
        .generate(&messages, model, true)
        .await
        .map_err(|e| ResearchError::Planning(e.to_string()))?;
    ledger.record_generation(&generation);

    let plan = parse_plan(&generation.text, max_tasks)?;
    info!(
        "Planning complete: {} search task(s)",
        plan.search_tasks.len()
    );
    for task in &plan.search_tasks {
        debug!(
            "Planned task: '{}' via {} ({} results) - {}",
            task.query,
            task.endpoint.as_path(),
            task.num_results,
            task.reasoning
        );
    }
    Ok(plan)
}

/// Parse and validate the planner's JSON output. The payload may be
/// wrapped in a Markdown code fence. Missing `search_tasks` or
/// `writing_plan`, or `search_tasks` not being a list, is a validation
/// error; a task list longer than `max_tasks` is truncated with a warning.
pub fn parse_plan(raw: &str, max_tasks: usize) -> Result<ResearchPlan> {
    let cleaned = strip_code_fence(raw);
    let value: serde_json::Value = serde_json::from_str(cleaned)
        .map_err(|e| ResearchError::Planning(format!("planner output is not valid JSON: {}", e)))?;

    let tasks_value = value
        .get("search_tasks")
        .ok_or_else(|| ResearchError::Planning("planner output missing 'search_tasks'".to_string()))?;
    if !tasks_value.is_array() {
        return Err(ResearchError::Planning(
            "planner output 'search_tasks' is not a list".to_string(),
        ));
    }
    let writing_plan = value
        .get("writing_plan")
        .cloned()
        .ok_or_else(|| ResearchError::Planning("planner output missing 'writing_plan'".to_string()))?;

    let mut search_tasks: Vec<SearchTask> = serde_json::from_value(tasks_value.clone())
        .map_err(|e| ResearchError::Planning(format!("invalid search task: {}", e)))?;

    if search_tasks.len() > max_tasks {
        warn!(
            "Planner generated {} tasks, exceeding limit {}; truncating",
            search_tasks.len(),
            max_tasks
        );
        search_tasks.truncate(max_tasks);
    }

    Ok(ResearchPlan { search_tasks, writing_plan })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SearchEndpoint;

    const VALID: &str = r#"{
        "search_tasks": [
            {"query": "quantum computing cybersecurity", "endpoint": "/search", "num_results": 10, "reasoning": "broad overview"},
            {"query": "post-quantum cryptography adoption", "endpoint": "/scholar", "num_results": 5, "reasoning": "academic depth"}
        ],
        "writing_plan": {"overall_goal": "analysis", "sections": [{"title": "Intro", "guidance": "set context"}]}
    }"#;

    #[test]
    fn parses_a_valid_plan() {
        let plan = parse_plan(VALID, 3).unwrap();
        assert_eq!(plan.search_tasks.len(), 2);
        assert_eq!(plan.search_tasks[1].endpoint, SearchEndpoint::Scholarly);
        assert_eq!(plan.writing_plan["overall_goal"], "analysis");
    }

    #[test]
    fn accepts_fenced_output() {
        let fenced = format!("```json\n{}\n```", VALID);
        assert!(parse_plan(&fenced, 3).is_ok());
    }

    #[test]
    fn missing_search_tasks_is_fatal() {
        let err = parse_plan(r#"{"writing_plan": {}}"#, 3).unwrap_err();
        assert!(matches!(err, ResearchError::Planning(_)));
        assert!(err.to_string().contains("search_tasks"));
    }

    #[test]
    fn missing_writing_plan_is_fatal() {
        let err = parse_plan(r#"{"search_tasks": []}"#, 3).unwrap_err();
        assert!(err.to_string().contains("writing_plan"));
    }

    #[test]
    fn non_list_search_tasks_is_fatal() {
        let err = parse_plan(r#"{"search_tasks": "look it up", "writing_plan": {}}"#, 3).unwrap_err();
        assert!(err.to_string().contains("not a list"));
    }

    #[test]
    fn non_json_output_is_fatal() {
        assert!(parse_plan("I could not produce a plan.", 3).is_err());
    }

    #[test]
    fn excess_tasks_are_truncated_in_order() {
        let raw = r#"{
            "search_tasks": [
                {"query": "one"}, {"query": "two"}, {"query": "three"}, {"query": "four"}
            ],
            "writing_plan": {}
        }"#;
        let plan = parse_plan(raw, 2).unwrap();
        assert_eq!(plan.search_tasks.len(), 2);
        assert_eq!(plan.search_tasks[0].query, "one");
        assert_eq!(plan.search_tasks[1].query, "two");
    }
}
