use crate::types::{AggregatorError, NormalizedItem, Result, SUMMARY_MAX_CHARS};
use crate::utils::text;
use chrono::{DateTime, Utc};
use feed_rs::parser;
use tracing::{debug, info};

#[derive(Debug)]
pub struct ParsedFeed {
    pub title: Option<String>,
    pub entries: Vec<ParsedEntry>,
}

#[derive(Debug)]
pub struct ParsedEntry {
    pub url: String,
    pub title: String,
    pub description: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
}

pub struct FeedParser;

impl FeedParser {
    pub fn parse_feed(content: &str) -> Result<ParsedFeed> {
        debug!("Parsing feed content ({} bytes)", content.len());

        let feed = parser::parse(content.as_bytes())
            .map_err(|e| AggregatorError::Parse(format!("Failed to parse feed: {}", e)))?;

        let title = feed.title.map(|t| t.content);
        let entries: Vec<ParsedEntry> = feed.entries.into_iter().filter_map(Self::parse_entry).collect();

        info!("Parsed feed with {} entries", entries.len());
        Ok(ParsedFeed { title, entries })
    }

    fn parse_entry(entry: feed_rs::model::Entry) -> Option<ParsedEntry> {
        // Without a link the entry has no identity. Atom entries may list
        // `self`/`replies` links ahead of the page itself.
        let page_link = entry
            .links
            .iter()
            .find(|link| matches!(link.rel.as_deref(), None | Some("alternate")))
            .or_else(|| entry.links.first());
        let url = match page_link {
            Some(link) => link.href.clone(),
            None => {
                debug!("Skipping entry without link: {}", entry.id);
                return None;
            }
        };

        let title = entry
            .title
            .map(|t| t.content.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| "Untitled".to_string());

        // Prefer the short summary; fall back to the full body.
        let description = entry
            .summary
            .map(|s| s.content)
            .or_else(|| entry.content.and_then(|c| c.body));

        let published_at = entry
            .published
            .or(entry.updated)
            .map(|dt| dt.with_timezone(&Utc));

        Some(ParsedEntry {
            url,
            title,
            description,
            published_at,
        })
    }

    /// Map parsed entries onto the common item shape. Entries without a
    /// usable date are stamped with `fetched_at`.
    pub fn into_items(parsed: ParsedFeed, source_name: &str, fetched_at: DateTime<Utc>) -> Vec<NormalizedItem> {
        parsed
            .entries
            .into_iter()
            .map(|entry| {
                let summary = entry
                    .description
                    .as_deref()
                    .map(text::snippet)
                    .map(|s| text::truncate_with_ellipsis(&s, SUMMARY_MAX_CHARS))
                    .unwrap_or_default();

                NormalizedItem {
                    title: entry.title,
                    link: entry.url,
                    published_at: entry.published_at.unwrap_or(fetched_at),
                    source_name: source_name.to_string(),
                    summary,
                }
            })
            .collect()
    }

    pub fn is_valid_feed_content(content: &str) -> bool {
        let content_lower = content.to_lowercase();
        content_lower.contains("<rss")
            || content_lower.contains("<feed")
            || content_lower.contains("<rdf:rdf")
            || content_lower.contains("<channel")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>T</title><link>https://t.test</link><description>d</description>
<item><title>Dated</title><link>https://t.test/a</link><pubDate>Tue, 04 Mar 2025 10:00:00 GMT</pubDate>
<description>&lt;p&gt;Short &amp;amp; sweet&lt;/p&gt;</description></item>
<item><title>Undated</title><link>https://t.test/b</link></item>
<item><title>No link</title></item>
</channel></rss>"#;

    #[test]
    fn parses_entries_and_skips_linkless() {
        let parsed = FeedParser::parse_feed(RSS).unwrap();
        assert_eq!(parsed.title.as_deref(), Some("T"));
        assert_eq!(parsed.entries.len(), 2);
    }

    #[test]
    fn missing_date_uses_fetch_time() {
        let fetched_at = Utc.with_ymd_and_hms(2025, 3, 5, 0, 0, 0).unwrap();
        let items = FeedParser::into_items(FeedParser::parse_feed(RSS).unwrap(), "T", fetched_at);
        assert_eq!(items[0].published_at, Utc.with_ymd_and_hms(2025, 3, 4, 10, 0, 0).unwrap());
        assert_eq!(items[0].summary, "Short & sweet");
        assert_eq!(items[1].published_at, fetched_at);
        assert_eq!(items[1].summary, "");
        assert!(items.iter().all(|i| i.source_name == "T"));
    }

    #[test]
    fn atom_entries_prefer_the_alternate_link() {
        let atom = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom Test</title>
  <id>urn:feed</id>
  <updated>2025-03-04T10:00:00Z</updated>
  <entry>
    <title>Ransomware gang resurfaces</title>
    <id>urn:entry:1</id>
    <updated>2025-03-04T10:00:00Z</updated>
    <link rel="self" href="https://atom.test/api/entries/1"/>
    <link rel="replies" href="https://atom.test/entries/1/comments"/>
    <link rel="alternate" href="https://atom.test/posts/ransomware"/>
  </entry>
  <entry>
    <title>Only self</title>
    <id>urn:entry:2</id>
    <updated>2025-03-03T10:00:00Z</updated>
    <link rel="self" href="https://atom.test/api/entries/2"/>
  </entry>
</feed>"#;
        let parsed = FeedParser::parse_feed(atom).unwrap();
        assert_eq!(parsed.entries[0].url, "https://atom.test/posts/ransomware");
        assert_eq!(parsed.entries[1].url, "https://atom.test/api/entries/2");
    }

    #[test]
    fn garbage_is_a_parse_error() {
        assert!(matches!(
            FeedParser::parse_feed("<html>not a feed</html>"),
            Err(AggregatorError::Parse(_))
        ));
        assert!(!FeedParser::is_valid_feed_content("<html></html>"));
        assert!(FeedParser::is_valid_feed_content(RSS));
    }
}
