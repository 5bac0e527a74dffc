use crate::traits::SourceAdapter;
use crate::types::{AggregatorError, NormalizedItem, Result, SourceConfig};
use crate::{FeedParser, Fetcher};
use async_trait::async_trait;
use chrono::Utc;
use tracing::{error, info};
use url::Url;

/// Plain RSS/Atom feed adapter.
pub struct RssFeedSource {
    fetcher: Fetcher,
}

impl RssFeedSource {
    pub fn new(fetcher: Fetcher) -> Self {
        Self { fetcher }
    }

    async fn pull(&self, source: &SourceConfig) -> Result<Vec<NormalizedItem>> {
        info!("Pulling RSS feed {} ({})", source.name, source.url);

        let feed_url = Url::parse(&source.url)?;
        let content = self.fetcher.fetch_feed(feed_url.as_str()).await?;
        if !FeedParser::is_valid_feed_content(&content) {
            return Err(AggregatorError::Parse("response is not an RSS/Atom document".to_string()));
        }

        let parsed = FeedParser::parse_feed(&content)?;
        let items = FeedParser::into_items(parsed, &source.name, Utc::now());

        info!("Pulled {} items from RSS feed {}", items.len(), source.name);
        Ok(items)
    }
}

#[async_trait]
impl SourceAdapter for RssFeedSource {
    fn adapter_name(&self) -> &'static str {
        "rss"
    }

    async fn collect(&self, source: &SourceConfig) -> Vec<NormalizedItem> {
        match self.pull(source).await {
            Ok(items) => items,
            Err(e) => {
                error!(source = %source.name, status = ?e.status(), "Error fetching RSS feed: {}", e);
                Vec::new()
            }
        }
    }
}
