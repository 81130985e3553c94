use crate::traits::ChatMessage;
use crate::types::SourceSummary;

const PLANNER_SYSTEM_PROMPT: &str = r#"You are an expert research assistant responsible for planning the steps needed to answer a complex user query.
Your goal is to generate a structured plan containing:
1.  A list of `search_tasks`: Define 1-3 specific search queries for a web search engine to gather the necessary information. For each task, specify the query string, the most appropriate endpoint (`/search`, `/scholar`, or `/news`), the desired number of results (`num_results`, typically 10 unless more are justified), and a brief reasoning.
2.  A detailed `writing_plan`: Outline the structure of the final report. This includes the overall goal, desired tone, specific sections with titles and guidance for each, and any additional directives for the writer.

Analyze the user's query carefully and devise a plan that will lead to a comprehensive and well-structured report.

Output *only* a single JSON object adhering to the following schema. Do not include any other text before or after the JSON object.

```json
{
  "search_tasks": [
    {
      "query": "Specific query string",
      "endpoint": "/search | /scholar | /news",
      "num_results": 10,
      "reasoning": "Why this query, endpoint, and result count are chosen"
    }
  ],
  "writing_plan": {
    "overall_goal": "Provide a comprehensive analysis of the topic, suitable for the intended audience.",
    "desired_tone": "Objective and analytical",
    "sections": [
      {
        "title": "Section Title",
        "guidance": "Specific instructions for the writer for this section."
      }
    ],
    "additional_directives": [
      "Directive (e.g., address counterarguments)"
    ]
  }
}
```"#;

const SUMMARIZER_SYSTEM_PROMPT: &str = r#"You are an expert summarizer. Your task is to create a concise, factual summary of the provided text content.
Focus specifically on extracting information relevant to answering the user's original research query, which will be used to generate a comprehensive report.
Extract key facts, findings, arguments, and data points pertinent to the user's query topic.
Maintain a neutral, objective tone.
The summary should be dense with relevant information but easy to understand.
Do not add introductions or conclusions like 'The text discusses...' or 'In summary...'. Just provide the summary content itself.
Focus on accurately representing the information from the provided text ONLY."#;

const WRITER_SYSTEM_PROMPT: &str = r#"You are an expert research report writer. Your goal is to synthesize information from provided source summaries into a well-structured, coherent, and informative report.
Follow the provided writing plan precisely, including the overall goal, tone, section structure, and specific guidance for each section.
Integrate the information from the source summaries naturally into the report narrative.
**Crucially, you MUST cite your sources using numerical markers.** Each source summary is provided with a numerical marker (e.g., [1], [2]). When you use information from a summary, add the corresponding numerical citation marker immediately after the information (e.g., 'Quantum computing poses a threat [1].'). Use multiple citations if information comes from several sources (e.g., 'Several sources discuss this [2][3].').
Maintain a logical flow and ensure the report directly addresses the original user query.
**Do NOT generate a bibliography or reference list at the end; this will be added later.**

If, while writing, you determine that you lack sufficient specific information on a crucial sub-topic required by the writing plan, you can request more information. To do this, insert the exact tag `<request_more_info topic="...">` at the point in the text where the information is needed. Replace "..." with a concise description of the specific information required. Use this tag *only* if absolutely necessary to fulfill the writing plan requirements and *only once* per draft."#;

/// Messages for the planning call.
pub fn planner_messages(user_query: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(PLANNER_SYSTEM_PROMPT),
        ChatMessage::user(format!(
            "Create a research plan for the following query: {}",
            user_query
        )),
    ]
}

/// Messages for one summarization call.
pub fn summarizer_messages(
    user_query: &str,
    source_title: &str,
    source_link: &str,
    source_content: &str,
) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(SUMMARIZER_SYSTEM_PROMPT),
        ChatMessage::user(format!(
            "Please summarize the following text content extracted from the source titled '{title}' (URL: {link}). \
             Focus on information that might be relevant for a research report addressing the query: '{query}'\n\n\
             Text Content:\n```\n{content}\n```\n\nConcise Summary:",
            title = source_title,
            link = source_link,
            query = user_query,
            content = source_content,
        )),
    ]
}

/// Format summaries as numbered source blocks using their permanent
/// citation markers.
pub fn format_summaries(summaries: &[SourceSummary]) -> String {
    if summaries.is_empty() {
        return "No summaries available.".to_string();
    }
    summaries
        .iter()
        .map(|s| {
            format!(
                "Source [{}] (Title: {}, Link: {})\nSummary: {}",
                s.citation_index, s.title, s.link, s.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Messages for the initial draft call.
pub fn writer_initial_messages(
    user_query: &str,
    writing_plan: &serde_json::Value,
    summaries: &[SourceSummary],
) -> Vec<ChatMessage> {
    let writing_plan_json =
        serde_json::to_string_pretty(writing_plan).unwrap_or_else(|_| "{}".to_string());
    vec![
        ChatMessage::system(WRITER_SYSTEM_PROMPT),
        ChatMessage::user(format!(
            "Original User Query: {query}\n\n\
             Writing Plan:\n```json\n{plan}\n```\n\n\
             Source Summaries (Cite using the numerical markers provided, e.g., [1], [2]):\n{summaries}\n\n\
             ---\n\n\
             Please generate the initial draft of the research report based *only* on the provided writing plan \
             and source summaries. Follow all instructions in the system prompt, especially regarding structure, \
             tone, and numerical citations (e.g., [1], [2]). **Do NOT include a reference list.** \
             If necessary, use the `<request_more_info topic=\"...\">` tag as described in the system prompt.\n\n\
             Report Draft:",
            query = user_query,
            plan = writing_plan_json,
            summaries = format_summaries(summaries),
        )),
    ]
}

/// Messages for a revision call within the refinement loop. `new_summaries`
/// carry their already-assigned global citation markers; `all_summaries` is
/// the complete list accumulated so far.
pub fn writer_refinement_messages(
    user_query: &str,
    writing_plan: &serde_json::Value,
    previous_draft: &str,
    refinement_topic: &str,
    new_summaries: &[SourceSummary],
    all_summaries: &[SourceSummary],
) -> Vec<ChatMessage> {
    let writing_plan_json =
        serde_json::to_string_pretty(writing_plan).unwrap_or_else(|_| "{}".to_string());
    let formatted_new = if new_summaries.is_empty() {
        "No new summaries available.".to_string()
    } else {
        format_summaries(new_summaries)
    };
    vec![
        ChatMessage::system(WRITER_SYSTEM_PROMPT),
        ChatMessage::user(format!(
            "Original User Query: {query}\n\n\
             Writing Plan:\n```json\n{plan}\n```\n\n\
             Previously Generated Draft:\n```\n{draft}\n```\n\n\
             *New* Source Summaries (to address the request for more info on '{topic}'. \
             Cite using their *new* numerical markers as provided below):\n{new}\n\n\
             All Available Source Summaries (Initial + Previous Refinements - Use these markers for citation):\n{all}\n\n\
             ---\n\n\
             Please revise the previous draft of the research report.\n\
             Your primary goal is to incorporate the *new* source summaries provided above to specifically address \
             the request for more information on the topic: '{topic}'.\n\
             Integrate the new information smoothly into the existing structure defined by the writing plan.\n\
             Ensure you *maintain* the overall structure, tone, and guidance from the original writing plan.\n\
             Crucially, continue to cite *all* sources accurately using the provided numerical markers (e.g., [1], [2], [15]) \
             for both new and previously used information based on the 'All Available Source Summaries' list. \
             **Do NOT include a reference list.**\n\
             If necessary, you may use the `<request_more_info topic=\"...\">` tag again if *absolutely critical* \
             information for the plan is still missing, but avoid it if possible.\n\n\
             Revised Report Draft:",
            query = user_query,
            plan = writing_plan_json,
            draft = previous_draft,
            topic = refinement_topic,
            new = formatted_new,
            all = format_summaries(all_summaries),
        )),
    ]
}
