use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};

pub const DEFAULT_LINK_BASE: &str = "https://www.virustotal.com/gui";

/// One configured origin. Options are already validated into the typed
/// structure for the adapter that will consume them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawSourceConfig")]
pub struct SourceConfig {
    pub name: String,
    pub url: String,
    pub enabled: bool,
    pub kind: SourceKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SourceKind {
    Rss,
    ThreatIntel(ThreatIntelMode),
    /// A type/mode pair no adapter understands. Kept so the run can log it
    /// and move on instead of refusing the whole configuration.
    Unsupported { kind: String, mode: Option<String> },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ThreatIntelMode {
    Campaigns(CampaignOptions),
    ActorCampaigns(ActorCampaignOptions),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CampaignOptions {
    /// Path relative to the source url, or an absolute url.
    pub endpoint: Option<String>,
    pub fetch_limit: usize,
    pub max_pages: usize,
    pub link_base: String,
}

impl Default for CampaignOptions {
    fn default() -> Self {
        Self {
            endpoint: None,
            fetch_limit: 30,
            max_pages: 3,
            link_base: DEFAULT_LINK_BASE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ActorCampaignOptions {
    pub actor_ids: Vec<String>,
    pub actors_limit: usize,
    pub campaign_fetch_limit: usize,
    pub days_window: u32,
    pub campaigns_per_actor: usize,
    pub link_base: String,
}

impl Default for ActorCampaignOptions {
    fn default() -> Self {
        Self {
            actor_ids: Vec::new(),
            actors_limit: 5,
            campaign_fetch_limit: 20,
            days_window: 3,
            campaigns_per_actor: 3,
            link_base: DEFAULT_LINK_BASE.to_string(),
        }
    }
}

impl SourceConfig {
    pub fn rss(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            enabled: true,
            kind: SourceKind::Rss,
        }
    }

    pub fn threat_intel(name: impl Into<String>, url: impl Into<String>, mode: ThreatIntelMode) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            enabled: true,
            kind: SourceKind::ThreatIntel(mode),
        }
    }
}

#[derive(Deserialize)]
struct RawSourceConfig {
    name: String,
    url: String,
    #[serde(rename = "type", alias = "kind")]
    kind: String,
    #[serde(default)]
    mode: Option<String>,
    #[serde(default = "enabled_by_default")]
    enabled: bool,
    #[serde(default)]
    options: Map<String, Value>,
}

fn enabled_by_default() -> bool {
    true
}

fn typed_options<T: DeserializeOwned>(source: &str, options: Map<String, Value>) -> Result<T, String> {
    serde_json::from_value(Value::Object(options))
        .map_err(|e| format!("invalid options for source '{}': {}", source, e))
}

impl TryFrom<RawSourceConfig> for SourceConfig {
    type Error = String;

    fn try_from(raw: RawSourceConfig) -> Result<Self, Self::Error> {
        let kind = match (raw.kind.as_str(), raw.mode.as_deref()) {
            ("rss", _) => SourceKind::Rss,
            ("threatIntel", Some("campaigns")) => {
                SourceKind::ThreatIntel(ThreatIntelMode::Campaigns(typed_options(&raw.name, raw.options)?))
            }
            ("threatIntel", Some("actorCampaigns")) => {
                SourceKind::ThreatIntel(ThreatIntelMode::ActorCampaigns(typed_options(&raw.name, raw.options)?))
            }
            _ => SourceKind::Unsupported {
                kind: raw.kind,
                mode: raw.mode,
            },
        };

        Ok(Self {
            name: raw.name,
            url: raw.url,
            enabled: raw.enabled,
            kind,
        })
    }
}
