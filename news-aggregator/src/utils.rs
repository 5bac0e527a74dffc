/// Text processing utilities
pub mod text {
    use patterns::{tags, whitespace};

    /// Cut `text` to at most `max_chars` characters, appending `...` when anything was removed.
    pub fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
        match text.char_indices().nth(max_chars) {
            Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
            None => text.to_string(),
        }
    }

    /// Plain-text snippet of an HTML fragment: tags stripped, entities decoded,
    /// whitespace collapsed.
    pub fn snippet(html: &str) -> String {
        let without_tags = tags().replace_all(html, " ");
        let decoded = html_escape::decode_html_entities(&without_tags);
        whitespace().replace_all(&decoded, " ").trim().to_string()
    }

    /// Join the non-empty fragments with `sep`.
    pub fn join_non_empty<'a, I>(parts: I, sep: &str) -> String
    where
        I: IntoIterator<Item = &'a str>,
    {
        parts
            .into_iter()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join(sep)
    }

    mod patterns {
        use regex::Regex;
        use std::sync::OnceLock;

        pub fn tags() -> &'static Regex {
            static RE: OnceLock<Regex> = OnceLock::new();
            RE.get_or_init(|| Regex::new(r"(?s)<[^>]*>").expect("static regex"))
        }

        pub fn whitespace() -> &'static Regex {
            static RE: OnceLock<Regex> = OnceLock::new();
            RE.get_or_init(|| Regex::new(r"\s+").expect("static regex"))
        }
    }
}

/// Time utilities for entity timestamps
pub mod time {
    use chrono::{DateTime, Duration, Utc};

    pub fn from_unix(seconds: i64) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(seconds, 0)
    }

    /// Calendar date shown in summaries, e.g. `2025-03-14`.
    pub fn format_date(ts: DateTime<Utc>) -> String {
        ts.format("%Y-%m-%d").to_string()
    }

    /// Whether `ts` is no older than `days` days relative to `now`. A window
    /// reaching past the representable range has no lower bound.
    pub fn within_days(ts: DateTime<Utc>, now: DateTime<Utc>, days: u32) -> bool {
        match Duration::try_days(i64::from(days)).and_then(|window| now.checked_sub_signed(window)) {
            Some(cutoff) => ts >= cutoff,
            None => true,
        }
    }
}
