use super::client::{endpoint_url, IntelApi};
use super::wire::Entity;
use crate::traits::SourceAdapter;
use crate::types::{AggregatorError, CampaignOptions, NormalizedItem, Result, SourceConfig, SourceKind, ThreatIntelMode, SUMMARY_MAX_CHARS};
use crate::utils::{text, time};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub const DEFAULT_CAMPAIGN_ENDPOINT: &str = "/collections?filter=collection_type:campaign";

/// Smallest page size ever requested, whatever `fetchLimit` says.
const MIN_PAGE_LIMIT: usize = 50;

/// Paginated, time-unfiltered listing of campaign entities from one endpoint.
pub struct CampaignSource {
    api: Option<Arc<dyn IntelApi>>,
}

impl CampaignSource {
    /// `api` is `None` when no credential was configured.
    pub fn new(api: Option<Arc<dyn IntelApi>>) -> Self {
        Self { api }
    }

    async fn pull(&self, source: &SourceConfig, options: &CampaignOptions) -> Result<Vec<NormalizedItem>> {
        let api = self.api.as_deref().ok_or(AggregatorError::MissingCredential)?;
        let url = endpoint_url(
            &source.url,
            options.endpoint.as_deref().unwrap_or(DEFAULT_CAMPAIGN_ENDPOINT),
        );
        let page_limit = options.fetch_limit.max(MIN_PAGE_LIMIT);

        let mut dated: Vec<(i64, Entity)> = Vec::new();
        let mut cursor: Option<String> = None;
        let mut pages = 0;
        loop {
            let mut query = vec![("limit", page_limit.to_string())];
            if let Some(c) = &cursor {
                query.push(("cursor", c.clone()));
            }

            let page = api.list(&url, &query).await?;
            pages += 1;
            let received = page.data.len();
            cursor = page.next_cursor();

            // Undated campaigns cannot be ranked.
            dated.extend(
                page.data
                    .into_iter()
                    .filter_map(|entity| entity.creation_date().map(|ts| (ts, entity))),
            );
            debug!(source = %source.name, page = pages, received, "campaign page");

            if cursor.is_none() || pages >= options.max_pages {
                break;
            }
        }

        dated.sort_by(|a, b| b.0.cmp(&a.0));
        let items: Vec<NormalizedItem> = dated
            .into_iter()
            .take(options.fetch_limit)
            .filter_map(|(_, entity)| campaign_item(&entity, &source.name, &options.link_base))
            .collect();

        info!(source = %source.name, pages, count = items.len(), "Fetched campaigns");
        Ok(items)
    }
}

fn campaign_item(entity: &Entity, source_name: &str, link_base: &str) -> Option<NormalizedItem> {
    let published_at = entity.created_at()?;
    let created = format!("Created: {}", time::format_date(published_at));
    let summary = match entity.description() {
        Some(description) => format!("{} - {}", created, description),
        None => created,
    };

    Some(NormalizedItem {
        title: format!("Campaign: {}", entity.name().unwrap_or(entity.id.as_str())),
        link: format!("{}/collection/{}", link_base.trim_end_matches('/'), entity.id),
        published_at,
        source_name: source_name.to_string(),
        summary: text::truncate_with_ellipsis(&summary, SUMMARY_MAX_CHARS),
    })
}

#[async_trait]
impl SourceAdapter for CampaignSource {
    fn adapter_name(&self) -> &'static str {
        "threat-intel campaigns"
    }

    async fn collect(&self, source: &SourceConfig) -> Vec<NormalizedItem> {
        let SourceKind::ThreatIntel(ThreatIntelMode::Campaigns(options)) = &source.kind else {
            warn!(source = %source.name, "campaign adapter given a non-campaign source");
            return Vec::new();
        };

        match self.pull(source, options).await {
            Ok(items) => items,
            Err(AggregatorError::MissingCredential) => {
                warn!(source = %source.name, "No threat intel API key configured; skipping source");
                Vec::new()
            }
            Err(e) => {
                error!(source = %source.name, status = ?e.status(), "Error fetching campaigns: {}", e);
                Vec::new()
            }
        }
    }
}
