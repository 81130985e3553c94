use crate::content::NO_EXTRACTION;
use crate::traits::{ContentProvider, ExtractionOutcome};
use crate::types::Result;
use crate::utils;
use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

const USER_AGENT: &str =
    "Mozilla/5.0 (compatible; deep-research/0.1; +https://github.com/deep-research)";

/// Content provider that fetches pages over HTTP and strips markup into
/// readable text, served under the `no_extraction` strategy name. Requests
/// to the same host are spaced out by a minimum interval.
pub struct PageScraper {
    client: Client,
    min_host_interval: Duration,
    last_request: Arc<RwLock<HashMap<String, Instant>>>,
}

impl PageScraper {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;
        Ok(Self {
            client,
            min_host_interval: Duration::from_secs(1),
            last_request: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    async fn apply_host_delay(&self, url: &str) {
        let host = match utils::url::extract_domain(url) {
            Some(host) => host,
            None => return,
        };
        let now = Instant::now();
        // Read the last-seen instant without holding the lock across the
        // sleep, so concurrent fetches to other hosts are not blocked.
        let wait = {
            let last_request = self.last_request.read().await;
            last_request.get(&host).and_then(|last| {
                let elapsed = now.duration_since(*last);
                (elapsed < self.min_host_interval).then(|| self.min_host_interval - elapsed)
            })
        };
        if let Some(wait) = wait {
            debug!("Rate limiting {}: waiting {:?}", host, wait);
            tokio::time::sleep(wait).await;
        }
        self.last_request.write().await.insert(host, Instant::now());
    }
}

#[async_trait]
impl ContentProvider for PageScraper {
    async fn fetch(&self, url: &str) -> Result<Vec<(String, ExtractionOutcome)>> {
        if !utils::url::is_fetchable(url) {
            return Ok(strategy(ExtractionOutcome::failed(format!(
                "not a fetchable URL: {}",
                url
            ))));
        }

        self.apply_host_delay(url).await;
        debug!("Fetching page: {}", url);

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => return Ok(strategy(ExtractionOutcome::failed(e.to_string()))),
        };

        let status = response.status();
        if !status.is_success() {
            return Ok(strategy(ExtractionOutcome::failed(format!("HTTP {}", status))));
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return Ok(strategy(ExtractionOutcome::failed(e.to_string()))),
        };

        let text = html_to_text(&body);
        let outcome = if text.is_empty() {
            ExtractionOutcome::failed("no readable text extracted")
        } else {
            ExtractionOutcome::ok(text)
        };
        Ok(strategy(outcome))
    }
}

fn strategy(outcome: ExtractionOutcome) -> Vec<(String, ExtractionOutcome)> {
    vec![(NO_EXTRACTION.to_string(), outcome)]
}

/// Strip HTML markup into plain text: tags are removed, script/style
/// bodies dropped, common entities decoded, whitespace collapsed.
fn html_to_text(html: &str) -> String {
    fn matches_at(haystack: &str, at: usize, needle: &str) -> bool {
        haystack
            .as_bytes()
            .get(at..at + needle.len())
            .is_some_and(|slice| slice.eq_ignore_ascii_case(needle.as_bytes()))
    }

    let mut text = String::with_capacity(html.len() / 2);
    let mut chars = html.char_indices();
    let mut skip_until: Option<&'static str> = None;

    while let Some((i, c)) = chars.next() {
        if let Some(closing) = skip_until {
            if matches_at(html, i, closing) {
                skip_until = None;
                for _ in 0..closing.len() - 1 {
                    chars.next();
                }
            }
            continue;
        }
        if c == '<' {
            if matches_at(html, i, "<script") {
                skip_until = Some("</script>");
                continue;
            }
            if matches_at(html, i, "<style") {
                skip_until = Some("</style>");
                continue;
            }
            // Skip to the end of the tag; every tag becomes a separator.
            for (_, tc) in chars.by_ref() {
                if tc == '>' {
                    break;
                }
            }
            text.push(' ');
            continue;
        }
        text.push(c);
    }

    let decoded = text
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'");
    utils::text::normalize_whitespace(&decoded)
}
