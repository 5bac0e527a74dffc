pub mod aggregator;
pub mod config;
pub mod fetcher;
pub mod output;
pub mod parser;
pub mod selector;
pub mod sources;
pub mod traits;
pub mod types;
pub mod utils;

pub use aggregator::{AdapterKey, AdapterRegistry, NewsAggregator};
pub use config::{ConfigFile, RunConfig};
pub use fetcher::Fetcher;
pub use parser::FeedParser;
pub use selector::select;
pub use traits::SourceAdapter;
pub use types::*;
