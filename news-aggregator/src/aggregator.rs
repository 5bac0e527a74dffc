use crate::selector::select;
use crate::sources::threat_intel::IntelApi;
use crate::sources::{ActorCampaignSource, CampaignSource, RssFeedSource};
use crate::traits::{EmptyAdapter, SourceAdapter};
use crate::types::{NormalizedItem, SelectionConfig, SourceConfig, SourceKind, ThreatIntelMode};
use crate::Fetcher;
use futures::future::join_all;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdapterKey {
    Rss,
    Campaigns,
    ActorCampaigns,
}

impl AdapterKey {
    pub fn for_kind(kind: &SourceKind) -> Option<Self> {
        match kind {
            SourceKind::Rss => Some(AdapterKey::Rss),
            SourceKind::ThreatIntel(ThreatIntelMode::Campaigns(_)) => Some(AdapterKey::Campaigns),
            SourceKind::ThreatIntel(ThreatIntelMode::ActorCampaigns(_)) => Some(AdapterKey::ActorCampaigns),
            SourceKind::Unsupported { .. } => None,
        }
    }
}

/// Adapter lookup by source kind/mode. Unknown combinations get an adapter that yields nothing.
pub struct AdapterRegistry {
    adapters: HashMap<AdapterKey, Arc<dyn SourceAdapter>>,
    fallback: Arc<dyn SourceAdapter>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self {
            adapters: HashMap::new(),
            fallback: Arc::new(EmptyAdapter),
        }
    }

    /// Registry with the built-in adapters. `intel_api` is `None` without credentials.
    pub fn standard(fetcher: Fetcher, intel_api: Option<Arc<dyn IntelApi>>) -> Self {
        let mut registry = Self::new();
        registry.register(AdapterKey::Rss, Arc::new(RssFeedSource::new(fetcher)));
        registry.register(AdapterKey::Campaigns, Arc::new(CampaignSource::new(intel_api.clone())));
        registry.register(AdapterKey::ActorCampaigns, Arc::new(ActorCampaignSource::new(intel_api)));
        registry
    }

    pub fn register(&mut self, key: AdapterKey, adapter: Arc<dyn SourceAdapter>) {
        self.adapters.insert(key, adapter);
    }

    pub fn adapter_for(&self, kind: &SourceKind) -> Arc<dyn SourceAdapter> {
        AdapterKey::for_kind(kind)
            .and_then(|key| self.adapters.get(&key))
            .cloned()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

pub struct NewsAggregator {
    registry: AdapterRegistry,
}

impl NewsAggregator {
    pub fn new(registry: AdapterRegistry) -> Self {
        Self { registry }
    }

    /// Fetch every enabled source concurrently and flatten the results into one pool.
    ///
    /// Each source runs in its own task; a task that dies is logged and
    /// counted as a source with no items.
    pub async fn gather(&self, sources: &[SourceConfig]) -> Vec<NormalizedItem> {
        let enabled: Vec<&SourceConfig> = sources.iter().filter(|s| s.enabled).collect();
        info!("Fetching from {} enabled sources ({} configured)", enabled.len(), sources.len());

        let handles = enabled.iter().map(|source| {
            let adapter = self.registry.adapter_for(&source.kind);
            if let SourceKind::Unsupported { kind, mode } = &source.kind {
                warn!(source = %source.name, %kind, ?mode, "Unsupported source type; it will contribute nothing");
            }
            let source = (*source).clone();
            tokio::spawn(async move {
                debug!(source = %source.name, adapter = adapter.adapter_name(), "dispatching");
                adapter.collect(&source).await
            })
        });

        let results = join_all(handles).await;

        let mut pool = Vec::new();
        for (source, result) in enabled.iter().zip(results) {
            match result {
                Ok(items) => {
                    debug!(source = %source.name, count = items.len(), "source finished");
                    pool.extend(items);
                }
                Err(e) => {
                    error!(source = %source.name, "Source task failed: {}", e);
                }
            }
        }

        info!("Gathered {} items into the pool", pool.len());
        pool
    }

    /// Gather from `sources`, then select the final list under `selection`.
    pub async fn run(&self, sources: &[SourceConfig], selection: &SelectionConfig) -> Vec<NormalizedItem> {
        let pool = self.gather(sources).await;
        let pool_counts = count_by_source(&pool);
        let selected = select(pool, selection);

        let selected_counts = count_by_source(&selected);
        for (source, pooled) in &pool_counts {
            info!(
                source = %source,
                pooled,
                selected = selected_counts.get(source).copied().unwrap_or(0),
                "source contribution"
            );
        }
        info!("Selected {} items (cap {})", selected.len(), selection.max_items);
        selected
    }
}

pub fn count_by_source(items: &[NormalizedItem]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for item in items {
        *counts.entry(item.source_name.clone()).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Utc;

    struct Fixed(Vec<&'static str>);

    #[async_trait]
    impl SourceAdapter for Fixed {
        fn adapter_name(&self) -> &'static str {
            "fixed"
        }

        async fn collect(&self, source: &SourceConfig) -> Vec<NormalizedItem> {
            self.0
                .iter()
                .map(|link| NormalizedItem {
                    title: link.to_string(),
                    link: link.to_string(),
                    published_at: Utc::now(),
                    source_name: source.name.clone(),
                    summary: String::new(),
                })
                .collect()
        }
    }

    #[test]
    fn unknown_kinds_resolve_to_empty_adapter() {
        let mut registry = AdapterRegistry::new();
        registry.register(AdapterKey::Rss, Arc::new(Fixed(vec!["a"])));
        let kind = SourceKind::Unsupported {
            kind: "scrape".into(),
            mode: None,
        };
        assert_eq!(registry.adapter_for(&kind).adapter_name(), "empty");
        assert_eq!(registry.adapter_for(&SourceKind::Rss).adapter_name(), "fixed");
    }

    #[tokio::test]
    async fn disabled_sources_are_skipped() {
        let mut registry = AdapterRegistry::new();
        registry.register(AdapterKey::Rss, Arc::new(Fixed(vec!["a", "b"])));
        let aggregator = NewsAggregator::new(registry);

        let mut off = SourceConfig::rss("Off", "https://off.test/feed");
        off.enabled = false;
        let pool = aggregator
            .gather(&[SourceConfig::rss("On", "https://on.test/feed"), off])
            .await;

        assert_eq!(pool.len(), 2);
        assert!(pool.iter().all(|i| i.source_name == "On"));
        assert_eq!(count_by_source(&pool).get("On"), Some(&2));
    }
}
