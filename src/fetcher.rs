//! Feed-fetching capability.
//!
//! The aggregator depends on the [`FeedClient`] trait rather than a concrete
//! HTTP client, so tests can inject stub feeds and the orchestrator stays
//! free of ambient singletons.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::redirect::Policy;
use reqwest::Client;
use tracing::debug;

use crate::parser::parse_entries;
use crate::types::{AggregatorError, FetchConfig, RawEntry, Result};

/// Retrieves and parses one feed. Network errors, timeouts and parse errors
/// are all surfaced as a single failure outcome; retry cadence belongs to the
/// caller's schedule, not this layer.
#[async_trait]
pub trait FeedClient: Send + Sync {
    async fn fetch(&self, feed_url: &str) -> Result<Vec<RawEntry>>;
}

/// Production [`FeedClient`] backed by reqwest and feed-rs.
pub struct HttpFeedClient {
    client: Client,
}

impl HttpFeedClient {
    pub fn new(config: &FetchConfig) -> Self {
        let redirect = if config.follow_redirects {
            Policy::limited(config.max_redirects)
        } else {
            Policy::none()
        };

        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(redirect)
            .build()
            .expect("Failed to create HTTP client");

        Self { client }
    }
}

impl Default for HttpFeedClient {
    fn default() -> Self {
        Self::new(&FetchConfig::default())
    }
}

#[async_trait]
impl FeedClient for HttpFeedClient {
    async fn fetch(&self, feed_url: &str) -> Result<Vec<RawEntry>> {
        debug!("fetching feed: {}", feed_url);

        let response = self.client.get(feed_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AggregatorError::General(format!(
                "HTTP {}: {}",
                status,
                status.canonical_reason().unwrap_or("unknown")
            )));
        }

        let body = response.text().await?;
        parse_entries(&body)
    }
}
