//! Aggregation orchestrator: batched sync across sources plus the read APIs
//! consumed by the page and dashboard layers.

use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use tokio::time::{sleep, Duration};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::fetcher::{FeedClient, HttpFeedClient};
use crate::processor::EntryProcessor;
use crate::store::Store;
use crate::types::{
    AggregatorError, AnalysisConfig, ArticlePage, ArticleQuery, ArticleStats, FetchConfig,
    FetchResult, Result, Source, SourceStats, SyncConfig,
};

#[derive(Clone)]
pub struct NewsAggregator {
    store: Store,
    client: Arc<dyn FeedClient>,
    processor: EntryProcessor,
    config: SyncConfig,
}

impl NewsAggregator {
    /// Assemble an aggregator from an explicit store and feed client.
    pub fn new(
        store: Store,
        client: Arc<dyn FeedClient>,
        sync_config: SyncConfig,
        analysis_config: AnalysisConfig,
    ) -> Self {
        let processor = EntryProcessor::new(store.clone(), analysis_config);
        Self {
            store,
            client,
            processor,
            config: sync_config,
        }
    }

    /// Convenience constructor wiring the HTTP feed client.
    pub async fn connect(
        database_url: &str,
        fetch_config: FetchConfig,
        sync_config: SyncConfig,
        analysis_config: AnalysisConfig,
    ) -> Result<Self> {
        let store = Store::connect(database_url).await?;
        let client = Arc::new(HttpFeedClient::new(&fetch_config));
        Ok(Self::new(store, client, sync_config, analysis_config))
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Register a feed source after validating its URL.
    pub async fn add_source(&self, name: &str, feed_url: &str) -> Result<Uuid> {
        if !self.store.validate_feed_url(feed_url).await? {
            return Err(AggregatorError::General(
                "invalid or already registered feed URL".to_string(),
            ));
        }
        self.store.add_source(name, feed_url).await
    }

    /// Sync every active source, least recently fetched first, in concurrent
    /// batches with a politeness delay in between.
    ///
    /// Per-source failures are captured into their `FetchResult`; only a
    /// store failure before any per-source work begins fails the whole call.
    pub async fn sync_all_sources(&self) -> Result<Vec<FetchResult>> {
        let sources = self.store.sources_for_sync().await?;
        info!(
            "syncing {} sources in batches of {}",
            sources.len(),
            self.config.batch_size
        );

        let batch_size = self.config.batch_size.max(1);
        let mut results = Vec::with_capacity(sources.len());

        for (index, batch) in sources.chunks(batch_size).enumerate() {
            if index > 0 && self.config.batch_delay_seconds > 0 {
                sleep(Duration::from_secs(self.config.batch_delay_seconds)).await;
            }

            let handles: Vec<_> = batch
                .iter()
                .map(|source| {
                    let this = self.clone();
                    let source = source.clone();
                    tokio::spawn(async move { this.sync_source(&source).await })
                })
                .collect();

            for (outcome, source) in join_all(handles).await.into_iter().zip(batch) {
                match outcome {
                    Ok(result) => results.push(result),
                    // A panicked task must not take its batch siblings down.
                    Err(join_error) => {
                        error!("sync task for {} failed: {}", source.name, join_error);
                        results.push(FetchResult::failure(
                            source,
                            Utc::now(),
                            format!("sync task failed: {}", join_error),
                        ));
                    }
                }
            }
        }

        Ok(results)
    }

    /// Fetch one source and process its entries, converting every failure
    /// mode into a failure-shaped result.
    pub async fn sync_source(&self, source: &Source) -> FetchResult {
        let fetched_at = Utc::now();

        if let Err(e) = self.store.mark_fetch_attempt(source.id).await {
            error!("failed to mark fetch attempt for {}: {}", source.name, e);
            return FetchResult::failure(source, fetched_at, format!("storage unavailable: {}", e));
        }

        let entries = match self.client.fetch(&source.feed_url).await {
            Ok(entries) => entries,
            Err(e) => {
                let message = e.to_string();
                warn!("fetch failed for {}: {}", source.name, message);
                if let Err(db_err) = self.store.record_fetch_failure(source.id, &message).await {
                    error!(
                        "failed to record fetch failure for {}: {}",
                        source.name, db_err
                    );
                }
                return FetchResult::failure(source, fetched_at, message);
            }
        };

        let item_count = entries.len();
        let mut new_article_count = 0;

        for entry in &entries {
            match self.processor.process_entry(entry, source).await {
                Ok(Some(outcome)) if outcome.is_new => new_article_count += 1,
                Ok(_) => {}
                Err(AggregatorError::Database(e)) => {
                    error!("storage failure while processing {}: {}", source.name, e);
                    return FetchResult::failure(
                        source,
                        fetched_at,
                        format!("storage unavailable: {}", e),
                    );
                }
                Err(e) => {
                    warn!("skipping entry from {}: {}", source.name, e);
                }
            }
        }

        if let Err(e) = self.store.record_fetch_success(source.id).await {
            error!("failed to record fetch success for {}: {}", source.name, e);
            return FetchResult::failure(source, fetched_at, format!("storage unavailable: {}", e));
        }

        info!(
            "synced {}: {} items, {} new",
            source.name, item_count, new_article_count
        );

        FetchResult {
            source_id: source.id,
            source_name: source.name.clone(),
            success: true,
            item_count,
            new_article_count,
            error: None,
            fetched_at,
        }
    }

    /// Filtered, paginated article listing.
    pub async fn get_articles(&self, query: &ArticleQuery) -> Result<ArticlePage> {
        self.store.query_articles(query).await
    }

    /// Aggregate counts over approved articles.
    pub async fn get_stats(&self) -> Result<ArticleStats> {
        self.store.article_stats().await
    }

    /// Operational counts over the source table.
    pub async fn get_source_stats(&self) -> Result<SourceStats> {
        self.store.source_stats().await
    }
}
