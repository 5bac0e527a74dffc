pub mod defs;
pub mod source;

pub use defs::{NormalizedItem, SelectionConfig, SourceQuotas, DEFAULT_MAX_ITEMS};
pub use source::{ActorCampaignOptions, CampaignOptions, SourceConfig, SourceKind, ThreatIntelMode};
