use crate::types::{AggregatorError, Result, SelectionConfig, SourceConfig};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub const DEFAULT_CONFIG_PATH: &str = "config/news-sources.json";
pub const API_KEY_ENV: &str = "THREAT_INTEL_API_KEY";

#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    pub sources: Vec<SourceConfig>,
    #[serde(default)]
    pub settings: SelectionConfig,
}

/// A loaded configuration file. The raw document is kept so that saving
/// only touches `settings.lastUpdated` and leaves everything else as written.
#[derive(Debug)]
pub struct ConfigFile {
    path: PathBuf,
    document: Value,
    pub config: RunConfig,
}

impl ConfigFile {
    /// Load `path`, writing the default configuration there first if it does not exist.
    pub fn load_or_create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!("No configuration found at {}, creating default config", path.display());
            let file = Self::from_document(path, default_document())?;
            file.save()?;
            return Ok(file);
        }

        let raw = fs::read_to_string(path)?;
        let document: Value = serde_json::from_str(&raw)
            .map_err(|e| AggregatorError::Config(format!("{}: {}", path.display(), e)))?;
        let file = Self::from_document(path, document)?;
        info!(
            "Loaded configuration with {} sources from {}",
            file.config.sources.len(),
            path.display()
        );
        Ok(file)
    }

    pub fn from_document(path: impl Into<PathBuf>, document: Value) -> Result<Self> {
        let path = path.into();
        let config: RunConfig = serde_json::from_value(document.clone())
            .map_err(|e| AggregatorError::Config(format!("{}: {}", path.display(), e)))?;
        Ok(Self { path, document, config })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn last_updated(&self) -> Option<&str> {
        self.document.pointer("/settings/lastUpdated").and_then(Value::as_str)
    }

    pub fn set_last_updated(&mut self, at: DateTime<Utc>) {
        let stamp = Value::String(at.to_rfc3339_opts(SecondsFormat::Millis, true));
        if let Value::Object(root) = &mut self.document {
            let settings = root.entry("settings").or_insert_with(|| json!({}));
            if let Value::Object(settings) = settings {
                settings.insert("lastUpdated".to_string(), stamp);
            }
        }
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&self.document)?)?;
        Ok(())
    }
}

fn rss_source(name: &str, url: &str) -> Value {
    json!({ "name": name, "url": url, "type": "rss", "enabled": true })
}

/// Six well-known security news feeds, capped at 30 items.
pub fn default_document() -> Value {
    json!({
        "sources": [
            rss_source("Krebs on Security", "https://krebsonsecurity.com/feed/"),
            rss_source("The Hacker News", "https://feeds.feedburner.com/TheHackersNews"),
            rss_source("Threatpost", "https://threatpost.com/feed/"),
            rss_source("Bleeping Computer", "https://www.bleepingcomputer.com/feed/"),
            rss_source("Dark Reading", "https://www.darkreading.com/rss.xml"),
            rss_source("ZDNet Security", "https://www.zdnet.com/topic/security/rss.xml"),
        ],
        "settings": {
            "maxNewsItems": 30,
            "lastUpdated": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SourceKind, ThreatIntelMode};
    use chrono::TimeZone;

    #[test]
    fn missing_file_gets_default_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config").join("news-sources.json");

        let file = ConfigFile::load_or_create(&path).unwrap();
        assert!(path.exists());
        assert_eq!(file.config.sources.len(), 6);
        assert!(file.config.sources.iter().all(|s| s.enabled && s.kind == SourceKind::Rss));
        assert_eq!(file.config.settings.max_items, 30);
    }

    #[test]
    fn saving_only_touches_last_updated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.json");
        fs::write(
            &path,
            r#"{"sources":[{"name":"TI","url":"https://intel.test/api/v3","type":"threatIntel","mode":"campaigns","options":{"maxPages":1}}],
                "settings":{"maxItems":7,"sourceMinItems":{"TI":2},"sortMode":"recency","custom":true}}"#,
        )
        .unwrap();

        let mut file = ConfigFile::load_or_create(&path).unwrap();
        assert_eq!(file.config.settings.max_items, 7);
        assert!(matches!(
            &file.config.sources[0].kind,
            SourceKind::ThreatIntel(ThreatIntelMode::Campaigns(o)) if o.max_pages == 1 && o.fetch_limit == 30
        ));

        file.set_last_updated(Utc.with_ymd_and_hms(2025, 6, 1, 8, 30, 0).unwrap());
        file.save().unwrap();

        let saved: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved["settings"]["lastUpdated"], "2025-06-01T08:30:00.000Z");
        assert_eq!(saved["settings"]["custom"], true);
        assert_eq!(saved["settings"]["sortMode"], "recency");
        assert_eq!(saved["sources"][0]["options"], json!({"maxPages": 1}));
    }

    #[test]
    fn unparseable_file_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(ConfigFile::load_or_create(&path), Err(AggregatorError::Config(_))));

        fs::write(&path, r#"{"settings": {}}"#).unwrap();
        assert!(matches!(ConfigFile::load_or_create(&path), Err(AggregatorError::Config(_))));
    }
}
