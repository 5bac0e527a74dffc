use super::wire::{Entity, EntityObject, EntityPage};
use crate::types::{AggregatorError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::future::Future;
use tracing::debug;

pub const API_KEY_HEADER: &str = "x-apikey";

/// Transport to the threat-intelligence API.
#[async_trait]
pub trait IntelApi: Send + Sync {
    /// GET a paginated entity listing.
    async fn list(&self, url: &str, query: &[(&str, String)]) -> Result<EntityPage>;

    /// GET a single entity by its full url.
    async fn get(&self, url: &str) -> Result<Entity>;
}

pub struct HttpIntelClient {
    client: Client,
    api_key: String,
}

impl HttpIntelClient {
    pub fn new(client: Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, String)]) -> Result<T> {
        debug!(%url, ?query, "threat intel request");
        let response = self
            .client
            .get(url)
            .header(API_KEY_HEADER, &self.api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AggregatorError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl IntelApi for HttpIntelClient {
    async fn list(&self, url: &str, query: &[(&str, String)]) -> Result<EntityPage> {
        self.get_json(url, query).await
    }

    async fn get(&self, url: &str) -> Result<Entity> {
        let object: EntityObject = self.get_json(url, &[]).await?;
        Ok(object.data)
    }
}

/// Resolve an endpoint against the source's base url. Absolute endpoints are kept as-is.
pub fn endpoint_url(base: &str, endpoint: &str) -> String {
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        return endpoint.to_string();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        endpoint.trim_start_matches('/')
    )
}

/// Try each candidate in order and return the first success. On exhaustion,
/// every failure is handed back, in attempt order.
pub async fn first_success<T, F, Fut>(candidates: Vec<String>, mut attempt: F) -> std::result::Result<T, Vec<AggregatorError>>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut failures = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        match attempt(candidate.clone()).await {
            Ok(value) => {
                debug!(endpoint = %candidate, "endpoint answered");
                return Ok(value);
            }
            Err(e) => {
                debug!(endpoint = %candidate, error = %e, "endpoint failed, trying next");
                failures.push(e);
            }
        }
    }
    Err(failures)
}

/// Distinct statuses seen across failures; transport errors without a status are skipped.
pub fn observed_statuses(failures: &[AggregatorError]) -> Vec<u16> {
    let mut statuses: Vec<u16> = failures.iter().filter_map(AggregatorError::status).collect();
    statuses.sort_unstable();
    statuses.dedup();
    statuses
}
