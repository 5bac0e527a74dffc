//! Campaigns grouped by threat actor.
//!
//! The upstream API renamed its actor and relationship endpoints several times,
//! so every listing goes through an ordered chain of candidate endpoints and the
//! first one that answers wins.

use super::client::{endpoint_url, first_success, observed_statuses, IntelApi};
use super::wire::Entity;
use crate::traits::SourceAdapter;
use crate::types::{ActorCampaignOptions, AggregatorError, NormalizedItem, Result, SourceConfig, SourceKind, ThreatIntelMode, SUMMARY_MAX_CHARS};
use crate::utils::{text, time};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use url::Url;

/// Actor discovery endpoints, newest shape first.
pub fn actor_list_endpoints(base: &str) -> Vec<String> {
    [
        "/collections?filter=collection_type:threat-actor",
        "/threat_actors",
        "/intelligence/threat_actors",
    ]
    .iter()
    .map(|path| endpoint_url(base, path))
    .collect()
}

/// Per-actor campaign endpoints: relationships path, direct nested path, then legacy segments.
pub fn campaign_endpoints(base: &str, actor_id: &str) -> Vec<String> {
    [
        format!("/collections/{}/relationships/campaigns", actor_id),
        format!("/collections/{}/campaigns", actor_id),
        format!("/threat_actors/{}/relationships/campaigns", actor_id),
        format!("/threat_actors/{}/campaigns", actor_id),
    ]
    .iter()
    .map(|path| endpoint_url(base, path))
    .collect()
}

pub fn campaign_lookup_url(base: &str, campaign_id: &str) -> String {
    endpoint_url(base, &format!("/collections/{}", campaign_id))
}

pub struct ActorCampaignSource {
    api: Option<Arc<dyn IntelApi>>,
}

impl ActorCampaignSource {
    /// `api` is `None` when no credential was configured.
    pub fn new(api: Option<Arc<dyn IntelApi>>) -> Self {
        Self { api }
    }

    async fn pull(&self, source: &SourceConfig, options: &ActorCampaignOptions, now: DateTime<Utc>) -> Result<Vec<NormalizedItem>> {
        let api = self.api.as_deref().ok_or(AggregatorError::MissingCredential)?;

        let actors = resolve_actors(api, source, options).await;
        if actors.is_empty() {
            info!(source = %source.name, "No threat actors resolved");
            return Ok(Vec::new());
        }

        // Actors are independent of each other; within one actor, requests stay sequential.
        let per_actor = join_all(
            actors
                .iter()
                .map(|actor| campaigns_for_actor(api, source, options, actor, now)),
        )
        .await;

        let items: Vec<NormalizedItem> = per_actor.into_iter().flatten().collect();
        info!(source = %source.name, actors = actors.len(), count = items.len(), "Fetched actor campaigns");
        Ok(items)
    }
}

async fn resolve_actors(api: &dyn IntelApi, source: &SourceConfig, options: &ActorCampaignOptions) -> Vec<Entity> {
    if !options.actor_ids.is_empty() {
        debug!(source = %source.name, ids = ?options.actor_ids, "Using configured actor ids");
        return options.actor_ids.iter().map(Entity::from_id).collect();
    }

    let query = [("limit", options.actors_limit.to_string())];
    let query = &query[..];
    match first_success(actor_list_endpoints(&source.url), |url| async move { api.list(&url, query).await }).await {
        Ok(page) => page.data.into_iter().take(options.actors_limit).collect(),
        Err(failures) => {
            warn!(
                source = %source.name,
                statuses = ?observed_statuses(&failures),
                attempts = failures.len(),
                "Every actor listing endpoint failed"
            );
            Vec::new()
        }
    }
}

async fn campaigns_for_actor(
    api: &dyn IntelApi,
    source: &SourceConfig,
    options: &ActorCampaignOptions,
    actor: &Entity,
    now: DateTime<Utc>,
) -> Vec<NormalizedItem> {
    let query = [("limit", options.campaign_fetch_limit.to_string())];
    let query = &query[..];
    let listing = first_success(campaign_endpoints(&source.url, &actor.id), |url| async move {
        api.list(&url, query).await
    })
    .await;

    let page = match listing {
        Ok(page) => page,
        Err(failures) => {
            warn!(
                source = %source.name,
                actor = %actor.display_name(),
                status = ?failures.iter().rev().find_map(AggregatorError::status),
                "No campaign endpoint answered; skipping actor"
            );
            return Vec::new();
        }
    };

    // One lookup at a time per actor to stay gentle with the rate limit.
    let mut campaigns = Vec::with_capacity(page.data.len());
    for campaign in page.data.into_iter().take(options.campaign_fetch_limit) {
        campaigns.push(hydrate(api, &source.url, campaign).await);
    }

    let items: Vec<NormalizedItem> = campaigns
        .iter()
        .filter(|c| {
            c.created_at()
                .is_some_and(|ts| time::within_days(ts, now, options.days_window))
        })
        .take(options.campaigns_per_actor)
        .map(|c| actor_campaign_item(actor, c, &source.name, &options.link_base, now))
        .collect();

    debug!(actor = %actor.display_name(), listed = campaigns.len(), kept = items.len(), "actor campaigns");
    items
}

/// Relationship listings may leave out attributes; fetch the full entity when
/// the creation date is missing. A failed lookup keeps the partial entry.
async fn hydrate(api: &dyn IntelApi, base: &str, campaign: Entity) -> Entity {
    if campaign.creation_date().is_some() {
        return campaign;
    }
    match api.get(&campaign_lookup_url(base, &campaign.id)).await {
        Ok(full) => full,
        Err(e) => {
            debug!(campaign = %campaign.id, status = ?e.status(), "hydration failed, keeping partial entry: {}", e);
            campaign
        }
    }
}

fn actor_campaign_item(actor: &Entity, campaign: &Entity, source_name: &str, link_base: &str, now: DateTime<Utc>) -> NormalizedItem {
    let actor_name = actor.display_name();
    let campaign_name = campaign.display_name();
    let created = campaign.created_at();
    let created_text = created.map(time::format_date).unwrap_or_default();

    let summary = text::join_non_empty(
        [
            actor_name,
            campaign_name,
            created_text.as_str(),
            campaign.description().unwrap_or_default(),
        ],
        " | ",
    );
    NormalizedItem {
        title: format!("{} campaign: {}", actor_name, campaign_name),
        link: actor_link(link_base, actor_name),
        published_at: created.unwrap_or(now),
        source_name: source_name.to_string(),
        summary: text::truncate_with_ellipsis(&summary, SUMMARY_MAX_CHARS),
    }
}

/// `{link_base}/threat-actor/{actor}` with the actor name encoded as one path segment.
fn actor_link(link_base: &str, actor_name: &str) -> String {
    let mut link = match Url::parse(link_base) {
        Ok(url) if !url.cannot_be_a_base() => url,
        _ => {
            debug!(%link_base, "link base is not a hierarchical url, appending the raw name");
            return format!("{}/threat-actor/{}", link_base.trim_end_matches('/'), actor_name);
        }
    };
    if let Ok(mut segments) = link.path_segments_mut() {
        segments.pop_if_empty().push("threat-actor").push(actor_name);
    }
    link.into()
}

#[async_trait]
impl SourceAdapter for ActorCampaignSource {
    fn adapter_name(&self) -> &'static str {
        "threat-intel actor campaigns"
    }

    async fn collect(&self, source: &SourceConfig) -> Vec<NormalizedItem> {
        let SourceKind::ThreatIntel(ThreatIntelMode::ActorCampaigns(options)) = &source.kind else {
            warn!(source = %source.name, "actor campaign adapter given a non actor-campaign source");
            return Vec::new();
        };

        match self.pull(source, options, Utc::now()).await {
            Ok(items) => items,
            Err(AggregatorError::MissingCredential) => {
                warn!(source = %source.name, "No threat intel API key configured; skipping source");
                Vec::new()
            }
            Err(e) => {
                error!(source = %source.name, status = ?e.status(), "Error fetching actor campaigns: {}", e);
                Vec::new()
            }
        }
    }
}
