use crate::traits::Reranker;
use crate::types::{RankedSource, SelectedSources, SourceRecord};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// Flatten per-task result batches into one list of unique sources. The
/// link is the dedup key; the first sighting of a link keeps its title and
/// snippet, and the output preserves discovery order.
pub fn deduplicate_sources(batches: &[Vec<SourceRecord>]) -> Vec<SourceRecord> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut unique = Vec::new();
    for batch in batches {
        for source in batch {
            if source.link.is_empty() {
                continue;
            }
            if seen.insert(source.link.clone()) {
                unique.push(source.clone());
            }
        }
    }
    debug!("Consolidated {} unique sources from {} result batches", unique.len(), batches.len());
    unique
}

/// Rank the candidate sources against the query and partition them into the
/// primary and secondary tiers. Ranking happens on title+snippet scoring
/// documents, before any content is fetched. A ranking failure or an empty
/// ranking falls back to original discovery order.
pub async fn select_sources(
    reranker: &dyn Reranker,
    user_query: &str,
    all_sources: &[SourceRecord],
    top_m: usize,
    next_k: usize,
) -> SelectedSources {
    if all_sources.is_empty() {
        warn!("No unique sources found to process");
        return SelectedSources::default();
    }

    let documents: Vec<String> = all_sources
        .iter()
        .map(|s| format!("{} {}", s.title, s.snippet))
        .collect();

    let ranked = match reranker.rerank(user_query, &documents, documents.len()).await {
        Ok(results) if !results.is_empty() => {
            let mut entries: Vec<_> =
                results.iter().filter(|r| r.index < all_sources.len()).copied().collect();
            // Start from discovery order so that the stable score sort
            // breaks ties by first sighting.
            entries.sort_by_key(|r| r.index);
            let mut ranked: Vec<RankedSource> = entries
                .into_iter()
                .map(|r| RankedSource { source: all_sources[r.index].clone(), score: r.score })
                .collect();
            ranked.sort_by(|a, b| {
                b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal)
            });
            if let (Some(first), Some(last)) = (ranked.first(), ranked.last()) {
                info!(
                    "Reranking complete, scores range from {:.4} to {:.4}",
                    first.score, last.score
                );
            }
            Some(ranked.into_iter().map(|r| r.source).collect::<Vec<_>>())
        }
        Ok(_) => {
            warn!("Reranking returned no results, falling back to discovery order");
            None
        }
        Err(e) => {
            warn!("Reranking failed ({}), falling back to discovery order", e);
            None
        }
    };

    let ordered = ranked.unwrap_or_else(|| all_sources.to_vec());
    partition(ordered, top_m, next_k)
}

/// Positional split of an ordered source list into the two tiers. A source
/// never lands in both; when fewer than `top_m` sources exist the secondary
/// tier is simply empty.
fn partition(ordered: Vec<SourceRecord>, top_m: usize, next_k: usize) -> SelectedSources {
    let mut iter = ordered.into_iter();
    let top: Vec<SourceRecord> = iter.by_ref().take(top_m).collect();
    let next: Vec<SourceRecord> = iter.take(next_k).collect();
    info!(
        "Selected {} primary and {} secondary sources",
        top.len(),
        next.len()
    );
    SelectedSources { top_m: top, next_k: next }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::RankedIndex;
    use async_trait::async_trait;

    fn src(link: &str, title: &str) -> SourceRecord {
        SourceRecord {
            link: link.to_string(),
            title: title.to_string(),
            snippet: format!("snippet for {}", title),
        }
    }

    struct FixedRanker(Vec<RankedIndex>);

    #[async_trait]
    impl Reranker for FixedRanker {
        async fn rerank(
            &self,
            _query: &str,
            _documents: &[String],
            _top_k: usize,
        ) -> crate::types::Result<Vec<RankedIndex>> {
            Ok(self.0.clone())
        }
    }

    struct FailingRanker;

    #[async_trait]
    impl Reranker for FailingRanker {
        async fn rerank(
            &self,
            _query: &str,
            _documents: &[String],
            _top_k: usize,
        ) -> crate::types::Result<Vec<RankedIndex>> {
            Err(crate::types::ResearchError::General("ranker down".to_string()))
        }
    }

    #[test]
    fn dedupe_keeps_first_sighting() {
        let batches = vec![
            vec![src("https://a.example", "A first"), src("https://b.example", "B")],
            vec![src("https://a.example", "A second"), src("https://c.example", "C")],
        ];
        let unique = deduplicate_sources(&batches);
        assert_eq!(unique.len(), 3);
        assert_eq!(unique[0].title, "A first");
        assert_eq!(unique[1].link, "https://b.example");
        assert_eq!(unique[2].link, "https://c.example");
    }

    #[test]
    fn dedupe_skips_sources_without_links() {
        let batches = vec![vec![src("", "missing"), src("https://a.example", "A")]];
        assert_eq!(deduplicate_sources(&batches).len(), 1);
    }

    #[tokio::test]
    async fn ranked_order_drives_the_partition() {
        let sources = vec![src("https://a.example", "A"), src("https://b.example", "B"), src("https://c.example", "C")];
        let ranker = FixedRanker(vec![
            RankedIndex { index: 2, score: 0.9 },
            RankedIndex { index: 0, score: 0.5 },
            RankedIndex { index: 1, score: 0.1 },
        ]);
        let selected = select_sources(&ranker, "q", &sources, 2, 1).await;
        assert_eq!(selected.top_m[0].link, "https://c.example");
        assert_eq!(selected.top_m[1].link, "https://a.example");
        assert_eq!(selected.next_k[0].link, "https://b.example");
    }

    #[tokio::test]
    async fn ranker_failure_falls_back_to_discovery_order() {
        let sources = vec![src("https://a.example", "A"), src("https://b.example", "B"), src("https://c.example", "C")];
        let selected = select_sources(&FailingRanker, "q", &sources, 2, 2).await;
        assert_eq!(selected.top_m.len(), 2);
        assert_eq!(selected.top_m[0].link, "https://a.example");
        assert_eq!(selected.next_k.len(), 1);
        assert_eq!(selected.next_k[0].link, "https://c.example");
    }

    #[tokio::test]
    async fn empty_ranking_also_falls_back() {
        let sources = vec![src("https://a.example", "A")];
        let selected = select_sources(&FixedRanker(vec![]), "q", &sources, 3, 4).await;
        assert_eq!(selected.top_m.len(), 1);
        assert!(selected.next_k.is_empty());
    }

    #[tokio::test]
    async fn no_candidates_yields_empty_selection() {
        let selected = select_sources(&FailingRanker, "q", &[], 3, 4).await;
        assert!(selected.is_empty());
    }

    #[tokio::test]
    async fn tie_scores_keep_discovery_order() {
        let sources = vec![src("https://a.example", "A"), src("https://b.example", "B")];
        let ranker = FixedRanker(vec![
            RankedIndex { index: 1, score: 0.5 },
            RankedIndex { index: 0, score: 0.5 },
        ]);
        let selected = select_sources(&ranker, "q", &sources, 2, 0).await;
        assert_eq!(selected.top_m[0].link, "https://a.example");
    }
}
