use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A configured feed endpoint the aggregator polls.
///
/// Sources are created and edited by the admin surface; the sync loop only
/// touches the fetch bookkeeping fields (timestamps, error counter).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub id: Uuid,
    pub name: String,
    pub feed_url: String,
    pub is_active: bool,
    pub error_count: u32,
    pub last_error: Option<String>,
    pub last_fetched_at: Option<DateTime<Utc>>,
    pub last_successful_fetch_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A normalized, deduplicated news item derived from exactly one feed entry.
///
/// Immutable once inserted by the sync pipeline; view counts, moderation and
/// category assignment are owned by external collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    pub source_id: Uuid,
    pub guid: String,
    pub title: String,
    pub description: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub author: Option<String>,
    pub url: String,
    pub image_url: Option<String>,
    pub published_at: DateTime<Utc>,
    pub keywords: Vec<String>,
    pub sentiment_score: f64,
    pub read_time_minutes: u32,
    pub is_featured: bool,
    pub is_trending: bool,
    pub is_breaking: bool,
    pub category_id: Option<i64>,
    pub status: String,
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
}

/// Fields for an article about to be inserted.
#[derive(Debug, Clone)]
pub struct NewArticle {
    pub source_id: Uuid,
    pub guid: String,
    pub title: String,
    pub description: Option<String>,
    pub content: Option<String>,
    pub excerpt: Option<String>,
    pub author: Option<String>,
    pub url: String,
    pub image_url: Option<String>,
    pub published_at: DateTime<Utc>,
    pub keywords: Vec<String>,
    pub sentiment_score: f64,
    pub read_time_minutes: u32,
    pub is_trending: bool,
    pub is_breaking: bool,
}

/// A tag association produced from the content-analysis suggested-tags list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleTag {
    pub id: i64,
    pub article_id: i64,
    pub tag: String,
    pub confidence: f64,
}

/// One raw item extracted from a parsed feed, prior to normalization.
#[derive(Debug, Clone, Default)]
pub struct RawEntry {
    pub guid: Option<String>,
    pub url: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Raw markup; content is preferred over the summary when both exist.
    pub content: Option<String>,
    pub author: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    /// URL of an enclosure declared with an image media type.
    pub enclosure_image: Option<String>,
    /// URL of the first media content object, regardless of declared type.
    pub media_image: Option<String>,
    /// URL of the first media thumbnail.
    pub thumbnail: Option<String>,
}

/// Per-source outcome of one sync pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchResult {
    pub source_id: Uuid,
    pub source_name: String,
    pub success: bool,
    pub item_count: usize,
    pub new_article_count: usize,
    pub error: Option<String>,
    pub fetched_at: DateTime<Utc>,
}

impl FetchResult {
    pub fn failure(source: &Source, fetched_at: DateTime<Utc>, error: String) -> Self {
        Self {
            source_id: source.id,
            source_name: source.name.clone(),
            success: false,
            item_count: 0,
            new_article_count: 0,
            error: Some(error),
            fetched_at,
        }
    }
}

/// Outcome of processing one raw entry.
#[derive(Debug, Clone)]
pub struct ProcessOutcome {
    pub article: Article,
    pub is_new: bool,
    pub is_duplicate: bool,
}

/// HTTP fetch settings.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub follow_redirects: bool,
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "cyberfeed/0.1".to_string(),
            timeout_seconds: 30,
            follow_redirects: true,
            max_redirects: 5,
        }
    }
}

/// Batch shape of a sync run. The inter-batch delay is politeness toward
/// upstream feed providers, not a performance knob.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub batch_size: usize,
    pub batch_delay_seconds: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            batch_size: 3,
            batch_delay_seconds: 2,
        }
    }
}

/// Tunables for the content-analysis heuristics.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub words_per_minute: usize,
    pub sentiment_step: f64,
    pub tag_confidence: f64,
    pub max_tags: usize,
    pub max_keywords: usize,
    pub excerpt_max_chars: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            words_per_minute: 200,
            sentiment_step: 0.1,
            tag_confidence: 0.8,
            max_tags: 5,
            max_keywords: 10,
            excerpt_max_chars: 200,
        }
    }
}

/// Column an article listing may be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    PublishedAt,
    CreatedAt,
    Title,
    SentimentScore,
    ReadTime,
    ViewCount,
}

impl SortField {
    pub(crate) fn column(self) -> &'static str {
        match self {
            SortField::PublishedAt => "published_at",
            SortField::CreatedAt => "created_at",
            SortField::Title => "title",
            SortField::SentimentScore => "sentiment_score",
            SortField::ReadTime => "read_time_minutes",
            SortField::ViewCount => "view_count",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Filter, sort and pagination options for article listings.
#[derive(Debug, Clone)]
pub struct ArticleQuery {
    pub category_ids: Vec<i64>,
    pub source_ids: Vec<Uuid>,
    pub published_after: Option<DateTime<Utc>>,
    pub published_before: Option<DateTime<Utc>>,
    pub featured: Option<bool>,
    pub trending: Option<bool>,
    pub breaking: Option<bool>,
    /// Moderation status; callers must opt in to see anything but approved.
    pub status: Option<String>,
    /// Case-insensitive substring match against title or description.
    pub search: Option<String>,
    pub sort_by: SortField,
    pub sort_order: SortOrder,
    pub limit: i64,
    pub offset: i64,
}

impl Default for ArticleQuery {
    fn default() -> Self {
        Self {
            category_ids: Vec::new(),
            source_ids: Vec::new(),
            published_after: None,
            published_before: None,
            featured: None,
            trending: None,
            breaking: None,
            status: None,
            search: None,
            sort_by: SortField::PublishedAt,
            sort_order: SortOrder::Desc,
            limit: 20,
            offset: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pagination {
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticlePage {
    pub articles: Vec<Article>,
    pub pagination: Pagination,
}

/// Aggregate article counts, scoped to approved articles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleStats {
    pub total_articles: i64,
    pub recent_articles: i64,
    pub featured_articles: i64,
    pub trending_articles: i64,
    pub breaking_news: i64,
    pub last_updated: DateTime<Utc>,
}

/// Operational counts over the source table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceStats {
    pub total_sources: i64,
    pub active_sources: i64,
    pub failing_sources: i64,
    pub never_fetched: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum AggregatorError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Feed parse error: {0}")]
    Parse(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Source not found: {id}")]
    SourceNotFound { id: Uuid },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("General error: {0}")]
    General(String),
}

pub type Result<T> = std::result::Result<T, AggregatorError>;
