pub mod rss_feed;
pub mod threat_intel;

pub use rss_feed::RssFeedSource;
pub use threat_intel::{ActorCampaignSource, CampaignSource};
