use crate::traits::ContentProvider;
use crate::types::{FetchedContent, SourceRecord};
use tracing::{debug, info, warn};

/// Strategy name carrying raw cleaned page text. Preferred over any other
/// extraction strategy when present and non-empty.
pub const NO_EXTRACTION: &str = "no_extraction";

/// Resolve each selected source to full text, one source at a time. The
/// `no_extraction` strategy wins when it carries non-empty content,
/// otherwise the first successful non-empty strategy in provider order is
/// used. A source whose fetch fails, or for which no strategy produced
/// non-empty content, is dropped (logged, never propagated) and does not
/// reach summarization. No retry happens at this layer.
pub async fn acquire_content(
    provider: &dyn ContentProvider,
    sources: &[SourceRecord],
) -> Vec<FetchedContent> {
    let mut fetched = Vec::new();

    for (i, source) in sources.iter().enumerate() {
        if source.link.is_empty() {
            warn!("Skipping source with missing link: {}", source.title);
            continue;
        }
        debug!(
            "[{}/{}] Fetching content: {} ({})",
            i + 1,
            sources.len(),
            source.title,
            source.link
        );

        let outcomes = match provider.fetch(&source.link).await {
            Ok(outcomes) => outcomes,
            Err(e) => {
                warn!("Failed to fetch {}: {}", source.link, e);
                continue;
            }
        };

        let content = outcomes
            .iter()
            .find(|(name, o)| name.as_str() == NO_EXTRACTION && o.success)
            .and_then(|(name, o)| {
                o.content
                    .as_deref()
                    .filter(|c| !c.is_empty())
                    .map(|c| (name.clone(), c.to_string()))
            })
            .or_else(|| {
                outcomes.iter().find_map(|(name, o)| {
                    o.success
                        .then(|| o.content.as_deref())
                        .flatten()
                        .filter(|c| !c.is_empty())
                        .map(|c| (name.clone(), c.to_string()))
                })
            });

        match content {
            Some((strategy, text)) => {
                debug!(
                    "Extracted {} chars from {} using strategy '{}'",
                    text.len(),
                    source.link,
                    strategy
                );
                fetched.push(FetchedContent {
                    link: source.link.clone(),
                    title: source.title.clone(),
                    text,
                });
            }
            None => {
                warn!("No extraction strategy succeeded for {}", source.link);
            }
        }
    }

    info!(
        "Content fetching complete: {} of {} sources resolved",
        fetched.len(),
        sources.len()
    );
    fetched
}
