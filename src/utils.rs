/// Text processing utilities
pub mod text {
    /// Strip an optional surrounding Markdown code fence (```json ... ```),
    /// leaving the inner payload. Text without a fence is returned trimmed.
    pub fn strip_code_fence(text: &str) -> &str {
        let trimmed = text.trim();
        let without_open = trimmed
            .strip_prefix("```json")
            .or_else(|| trimmed.strip_prefix("```"))
            .unwrap_or(trimmed);
        without_open.strip_suffix("```").unwrap_or(without_open).trim()
    }

    /// Truncate text to a maximum length, trying to break at sentence
    /// boundaries.
    pub fn smart_truncate(text: &str, max_length: usize) -> String {
        if text.len() <= max_length {
            return text.to_string();
        }

        // Avoid slicing inside a multi-byte character.
        let mut cut = max_length;
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        let truncated = &text[..cut];
        if let Some(last_sentence) = truncated.rfind('.') {
            truncated[..last_sentence + 1].to_string()
        } else if let Some(last_space) = truncated.rfind(' ') {
            format!("{}...", &truncated[..last_space])
        } else {
            format!("{}...", truncated)
        }
    }

    /// Collapse whitespace runs into single spaces.
    pub fn normalize_whitespace(text: &str) -> String {
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

/// URL utilities
pub mod url {
    use url::Url;

    /// Extract domain from URL
    pub fn extract_domain(url_str: &str) -> Option<String> {
        Url::parse(url_str).ok().and_then(|url| url.domain().map(|d| d.to_string()))
    }

    /// Check whether a string is a fetchable http(s) URL.
    pub fn is_fetchable(url_str: &str) -> bool {
        match Url::parse(url_str) {
            Ok(url) => url.scheme() == "http" || url.scheme() == "https",
            Err(_) => false,
        }
    }
}
