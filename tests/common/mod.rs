#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use cyberfeed::{
    AggregatorError, AnalysisConfig, FeedClient, NewArticle, NewsAggregator, RawEntry, Result,
    Store, SyncConfig,
};
use uuid::Uuid;

/// Scripted behavior for one stubbed feed URL.
#[derive(Clone)]
pub enum StubFeed {
    Entries(Vec<RawEntry>),
    Failure(String),
    Panic,
}

/// In-memory [`FeedClient`] keyed by feed URL.
pub struct StubFeedClient {
    feeds: HashMap<String, StubFeed>,
}

impl StubFeedClient {
    pub fn new(feeds: HashMap<String, StubFeed>) -> Self {
        Self { feeds }
    }

    pub fn single(feed_url: &str, feed: StubFeed) -> Self {
        Self::new(HashMap::from([(feed_url.to_string(), feed)]))
    }
}

#[async_trait]
impl FeedClient for StubFeedClient {
    async fn fetch(&self, feed_url: &str) -> Result<Vec<RawEntry>> {
        match self.feeds.get(feed_url) {
            Some(StubFeed::Entries(entries)) => Ok(entries.clone()),
            Some(StubFeed::Failure(message)) => Err(AggregatorError::General(message.clone())),
            Some(StubFeed::Panic) => panic!("stub feed panicked"),
            None => Err(AggregatorError::General(format!(
                "no stub feed for {}",
                feed_url
            ))),
        }
    }
}

/// Aggregator over an in-memory store with no inter-batch delay.
pub async fn stub_aggregator(store: Store, client: StubFeedClient) -> NewsAggregator {
    NewsAggregator::new(
        store,
        Arc::new(client),
        SyncConfig {
            batch_size: 3,
            batch_delay_seconds: 0,
        },
        AnalysisConfig::default(),
    )
}

pub fn entry(guid: &str, url: &str, title: &str) -> RawEntry {
    RawEntry {
        guid: Some(guid.to_string()),
        url: Some(url.to_string()),
        title: Some(title.to_string()),
        description: Some(format!("{} description", title)),
        content: None,
        author: None,
        published_at: Some(Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()),
        enclosure_image: None,
        media_image: None,
        thumbnail: None,
    }
}

pub fn new_article(source_id: Uuid, guid: &str, title: &str) -> NewArticle {
    NewArticle {
        source_id,
        guid: guid.to_string(),
        title: title.to_string(),
        description: Some(format!("{} description", title)),
        content: None,
        excerpt: None,
        author: None,
        url: format!("https://news.example.com/{}", guid),
        image_url: None,
        published_at: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
        keywords: Vec::new(),
        sentiment_score: 0.0,
        read_time_minutes: 1,
        is_trending: false,
        is_breaking: false,
    }
}
