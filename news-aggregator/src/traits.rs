use crate::types::{NormalizedItem, SourceConfig};
use async_trait::async_trait;

/// Turns one configured source into items.
///
/// Implementations never fail: every error is logged with the source name and
/// degrades to an empty result, so one broken source cannot affect the others.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Human-readable adapter name used in logs.
    fn adapter_name(&self) -> &'static str;

    async fn collect(&self, source: &SourceConfig) -> Vec<NormalizedItem>;
}

/// Adapter for source kinds nobody understands; contributes nothing.
pub struct EmptyAdapter;

#[async_trait]
impl SourceAdapter for EmptyAdapter {
    fn adapter_name(&self) -> &'static str {
        "empty"
    }

    async fn collect(&self, _source: &SourceConfig) -> Vec<NormalizedItem> {
        Vec::new()
    }
}
