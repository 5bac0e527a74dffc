use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use news_aggregator::config::{API_KEY_ENV, DEFAULT_CONFIG_PATH};
use news_aggregator::sources::threat_intel::{HttpIntelClient, IntelApi};
use news_aggregator::{output, AdapterRegistry, ConfigFile, FetchConfig, Fetcher, NewsAggregator};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Fetch security news from the configured sources and write the selected items.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// JSON configuration with sources and selection settings
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    /// Where to write the selected items
    #[arg(short, long, default_value = "news-data.json")]
    output: String,

    /// Threat intelligence API key
    #[arg(long, env = API_KEY_ENV, hide_env_values = true)]
    api_key: Option<String>,

    /// Override settings.maxItems from the configuration
    #[arg(long)]
    max_items: Option<usize>,

    /// Per-request HTTP timeout
    #[arg(long, default_value_t = 30)]
    timeout_seconds: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    let args = Cli::parse();
    info!("Starting news aggregation");

    let mut config_file = ConfigFile::load_or_create(&args.config)
        .with_context(|| format!("loading configuration from {}", args.config))?;

    let mut selection = config_file.config.settings.clone();
    if let Some(max_items) = args.max_items {
        selection.max_items = max_items;
    }

    let fetcher = Fetcher::new(FetchConfig {
        timeout_seconds: args.timeout_seconds,
        ..FetchConfig::default()
    })
    .context("building HTTP client")?;

    let intel_api: Option<Arc<dyn IntelApi>> = match args.api_key.filter(|k| !k.trim().is_empty()) {
        Some(key) => Some(Arc::new(HttpIntelClient::new(fetcher.client().clone(), key))),
        None => {
            warn!("{} is not set; threat intel sources will be skipped", API_KEY_ENV);
            None
        }
    };

    let aggregator = NewsAggregator::new(AdapterRegistry::standard(fetcher, intel_api));
    let items = aggregator.run(&config_file.config.sources, &selection).await;

    output::write_items_json(&args.output, &items)
        .with_context(|| format!("writing {}", args.output))?;

    config_file.set_last_updated(Utc::now());
    config_file
        .save()
        .with_context(|| format!("updating {}", config_file.path().display()))?;

    info!(
        "Fetched {} news items from {} active sources",
        items.len(),
        config_file.config.sources.iter().filter(|s| s.enabled).count()
    );
    Ok(())
}
