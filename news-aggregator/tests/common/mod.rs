#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use news_aggregator::sources::threat_intel::{Entity, EntityPage, IntelApi, PageMeta};
use news_aggregator::{AggregatorError, NormalizedItem, Result};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, Once};
use std::time::Duration as StdDuration;

pub const API_BASE: &str = "https://intel.test/api/v3";

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

pub fn url(path: &str) -> String {
    format!("{}{}", API_BASE, path)
}

pub fn entity(id: &str, attributes: Value) -> Entity {
    serde_json::from_value(json!({ "id": id, "attributes": attributes })).unwrap()
}

/// Campaign created `days_ago` days before now.
pub fn campaign(id: &str, name: &str, days_ago: i64) -> Entity {
    let created = (Utc::now() - Duration::days(days_ago)).timestamp();
    entity(id, json!({ "name": name, "creation_date": created }))
}

pub fn page(data: Vec<Entity>, next: Option<&str>) -> EntityPage {
    EntityPage {
        data,
        meta: next.map(|n| PageMeta {
            next: Some(n.to_string()),
            cursor: None,
        }),
    }
}

pub fn news(source: &str, link: &str, published_at: DateTime<Utc>) -> NormalizedItem {
    NormalizedItem {
        title: format!("{} story", source),
        link: link.to_string(),
        published_at,
        source_name: source.to_string(),
        summary: String::new(),
    }
}

#[derive(Debug, Clone)]
pub enum Reply {
    Page(EntityPage),
    Object(Entity),
    Status(u16),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub url: String,
    pub query: Vec<(String, String)>,
}

impl Call {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Scripted stand-in for the threat intel API. Unscripted urls answer 404.
///
/// Single-entity lookups always suspend before answering (for `latency` when
/// set), and the highest number of lookups in flight at once is recorded.
#[derive(Default)]
pub struct ScriptedIntelApi {
    replies: HashMap<String, Reply>,
    calls: Mutex<Vec<Call>>,
    latency: Option<StdDuration>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl ScriptedIntelApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(mut self, url: impl Into<String>, page: EntityPage) -> Self {
        self.replies.insert(url.into(), Reply::Page(page));
        self
    }

    /// Page served only when the request carries `cursor`.
    pub fn page_after(mut self, url: &str, cursor: &str, page: EntityPage) -> Self {
        self.replies.insert(format!("{}#{}", url, cursor), Reply::Page(page));
        self
    }

    pub fn object(mut self, url: impl Into<String>, entity: Entity) -> Self {
        self.replies.insert(url.into(), Reply::Object(entity));
        self
    }

    pub fn status(mut self, url: impl Into<String>, status: u16) -> Self {
        self.replies.insert(url.into(), Reply::Status(status));
        self
    }

    pub fn with_latency(mut self, latency: StdDuration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Most single-entity lookups that were outstanding at the same time.
    pub fn peak_lookups(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, url: &str) -> Vec<Call> {
        self.calls().into_iter().filter(|c| c.url == url).collect()
    }

    fn record(&self, url: &str, query: &[(&str, String)]) -> String {
        let call = Call {
            url: url.to_string(),
            query: query.iter().map(|(k, v)| (k.to_string(), v.clone())).collect(),
        };
        let key = match call.param("cursor") {
            Some(cursor) => format!("{}#{}", url, cursor),
            None => url.to_string(),
        };
        self.calls.lock().unwrap().push(call);
        key
    }

    fn not_found(url: &str, status: u16) -> AggregatorError {
        AggregatorError::Status {
            status,
            url: url.to_string(),
        }
    }
}

#[async_trait]
impl IntelApi for ScriptedIntelApi {
    async fn list(&self, url: &str, query: &[(&str, String)]) -> Result<EntityPage> {
        let key = self.record(url, query);
        match self.replies.get(&key) {
            Some(Reply::Page(page)) => Ok(page.clone()),
            Some(Reply::Status(status)) => Err(Self::not_found(url, *status)),
            _ => Err(Self::not_found(url, 404)),
        }
    }

    async fn get(&self, url: &str) -> Result<Entity> {
        self.record(url, &[]);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        match self.latency {
            Some(latency) => tokio::time::sleep(latency).await,
            None => tokio::task::yield_now().await,
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.replies.get(url) {
            Some(Reply::Object(entity)) => Ok(entity.clone()),
            Some(Reply::Status(status)) => Err(Self::not_found(url, *status)),
            _ => Err(Self::not_found(url, 404)),
        }
    }
}
