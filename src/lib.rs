pub mod aggregator;
pub mod analysis;
pub mod fetcher;
pub mod parser;
pub mod processor;
pub mod store;
pub mod text;
pub mod types;

pub use aggregator::NewsAggregator;
pub use analysis::{ContentAnalysis, ContentAnalyzer, TagSuggestion};
pub use fetcher::{FeedClient, HttpFeedClient};
pub use processor::EntryProcessor;
pub use store::Store;
pub use types::*;
