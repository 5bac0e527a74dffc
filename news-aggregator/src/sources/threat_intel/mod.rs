pub mod actor_campaigns;
pub mod campaigns;
pub mod client;
pub mod wire;

pub use actor_campaigns::ActorCampaignSource;
pub use campaigns::CampaignSource;
pub use client::{HttpIntelClient, IntelApi};
pub use wire::{Entity, EntityPage, PageMeta};
