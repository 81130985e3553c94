use crate::prompts;
use crate::traits::GenerationProvider;
use crate::types::{FetchedContent, SummaryLog};
use crate::usage::UsageLedger;
use crate::utils::text::smart_truncate;
use tracing::{debug, info, warn};

/// Summarize each fetched source in order, appending successful summaries
/// to the log. A failed or empty summary skips the source without
/// consuming a citation index. Returns the number of summaries appended.
pub async fn summarize_sources(
    provider: &dyn GenerationProvider,
    model: &str,
    user_query: &str,
    contents: &[FetchedContent],
    max_source_chars: usize,
    log: &mut SummaryLog,
    ledger: &mut UsageLedger,
) -> usize {
    let mut appended = 0;

    for (i, content) in contents.iter().enumerate() {
        debug!(
            "[{}/{}] Summarizing: {} ({})",
            i + 1,
            contents.len(),
            content.title,
            content.link
        );

        let text = smart_truncate(&content.text, max_source_chars);
        if text.len() < content.text.len() {
            debug!(
                "Truncated source text from {} to {} chars before summarization",
                content.text.len(),
                text.len()
            );
        }

        let messages = prompts::summarizer_messages(user_query, &content.title, &content.link, &text);
        match provider.generate(&messages, model, false).await {
            Ok(generation) => {
                ledger.record_generation(&generation);
                let summary = generation.text.trim();
                if summary.is_empty() {
                    warn!("Summarizer returned empty content for {}, skipping source", content.link);
                    continue;
                }
                let index = log.append(&content.title, &content.link, summary);
                debug!("Summary [{}] generated ({} chars)", index, summary.len());
                appended += 1;
            }
            Err(e) => {
                warn!("Error summarizing {}: {}, skipping source", content.link, e);
            }
        }
    }

    info!("Summarization complete: {} new summaries", appended);
    appended
}
