pub use interfaces::defs::{NormalizedItem, SelectionConfig, SourceQuotas};
pub use interfaces::source::{ActorCampaignOptions, CampaignOptions, SourceConfig, SourceKind, ThreatIntelMode};

/// Maximum length of an item summary before it gets cut and marked with an ellipsis.
pub const SUMMARY_MAX_CHARS: usize = 200;

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    /// Retries for feed downloads only; API calls fall back to other endpoints instead.
    pub max_retries: u32,
    pub retry_delay_seconds: u64,
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "SentryDigest-Aggregator/1.0".to_string(),
            timeout_seconds: 30,
            max_retries: 2,
            retry_delay_seconds: 2,
            max_redirects: 5,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AggregatorError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("Missing API credential")]
    MissingCredential,

    #[error("Feed parse error: {0}")]
    Parse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AggregatorError {
    /// HTTP status observed while producing this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            AggregatorError::Status { status, .. } => Some(*status),
            AggregatorError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, AggregatorError>;
