use crate::types::{AggregatorError, FetchConfig, Result};
use backoff::{backoff::Backoff, exponential::ExponentialBackoff};
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Shared HTTP client. The configured timeout is the only bound on a hung request.
#[derive(Clone)]
pub struct Fetcher {
    client: Client,
    config: FetchConfig,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Download a feed body, retrying transport failures and 5xx responses.
    pub async fn fetch_feed(&self, url: &str) -> Result<String> {
        let start_time = Instant::now();
        debug!("Fetching feed: {}", url);

        let mut backoff: ExponentialBackoff<backoff::SystemClock> = ExponentialBackoff {
            current_interval: Duration::from_secs(self.config.retry_delay_seconds),
            initial_interval: Duration::from_secs(self.config.retry_delay_seconds),
            max_interval: Duration::from_secs(self.config.retry_delay_seconds * 32),
            multiplier: 2.0,
            max_elapsed_time: Some(Duration::from_secs(self.config.retry_delay_seconds * 60)),
            ..Default::default()
        };

        let mut attempt = 0;
        loop {
            let err = match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let content = response.text().await?;
                        info!(
                            "Fetched feed: {} ({} bytes in {}ms)",
                            url,
                            content.len(),
                            start_time.elapsed().as_millis()
                        );
                        return Ok(content);
                    }
                    let err = AggregatorError::Status {
                        status: status.as_u16(),
                        url: url.to_string(),
                    };
                    if !status.is_server_error() {
                        return Err(err);
                    }
                    err
                }
                Err(e) => AggregatorError::Http(e),
            };

            if attempt >= self.config.max_retries {
                return Err(err);
            }
            match backoff.next_backoff() {
                Some(delay) => {
                    warn!("Attempt {} failed for {}: {}, retrying in {:?}", attempt + 1, url, err, delay);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                None => return Err(err),
            }
        }
    }
}
