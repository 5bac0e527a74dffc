//! Final selection: recency sort, per-source quotas, dedup and the global cap.
//!
//! The output is the quota picks (grouped by source, in quota declaration
//! order) followed by the recency fill. It is therefore not globally sorted
//! when quotas are configured; consumers rely on that order, so it is kept.

use crate::types::{NormalizedItem, SelectionConfig};
use std::collections::{HashMap, HashSet};
use tracing::debug;

pub fn select(mut pool: Vec<NormalizedItem>, config: &SelectionConfig) -> Vec<NormalizedItem> {
    // Stable, so equal timestamps keep their pool order.
    pool.sort_by(|a, b| b.published_at.cmp(&a.published_at));

    let chosen = choose(&pool, config);
    let mut slots: Vec<Option<NormalizedItem>> = pool.into_iter().map(Some).collect();
    chosen
        .into_iter()
        .filter_map(|idx| slots[idx].take())
        .collect()
}

/// Indices into the sorted pool, in output order.
fn choose(pool: &[NormalizedItem], config: &SelectionConfig) -> Vec<usize> {
    let mut by_source: HashMap<&str, Vec<usize>> = HashMap::new();
    for (idx, item) in pool.iter().enumerate() {
        by_source.entry(item.source_name.as_str()).or_default().push(idx);
    }

    let max_items = config.max_items;
    let mut used: HashSet<(&str, &str)> = HashSet::new();
    let mut chosen: Vec<usize> = Vec::with_capacity(max_items.min(pool.len()));

    // Quotas first; the first declared source wins the last free slots.
    for (source, min_items) in config.source_min_items.iter() {
        let Some(indices) = by_source.get(source) else {
            debug!(%source, "quota source has no items in the pool");
            continue;
        };
        let mut taken = 0;
        for &idx in indices {
            if taken >= min_items || chosen.len() >= max_items {
                break;
            }
            if used.insert(pool[idx].dedup_key()) {
                chosen.push(idx);
                taken += 1;
            }
        }
        debug!(%source, min_items, taken, "quota applied");
    }

    // Then fill by recency.
    for (idx, item) in pool.iter().enumerate() {
        if chosen.len() >= max_items {
            break;
        }
        if used.insert(item.dedup_key()) {
            chosen.push(idx);
        }
    }
    chosen
}
