//! sqlx-backed persistence for sources, articles and article tags.

use std::str::FromStr;

use chrono::{Duration, Utc};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow, SqliteSynchronous,
};
use sqlx::{Pool, QueryBuilder, Row, Sqlite};
use tracing::{debug, info};
use uuid::Uuid;

use crate::analysis::TagSuggestion;
use crate::types::{
    AggregatorError, Article, ArticlePage, ArticleQuery, ArticleStats, ArticleTag, NewArticle,
    Pagination, Result, Source, SourceStats, SortOrder,
};

#[derive(Clone)]
pub struct Store {
    pool: Pool<Sqlite>,
}

impl Store {
    /// Open (or create) a database at the given sqlx SQLite URL.
    pub async fn connect(database_url: &str) -> Result<Self> {
        info!("opening database: {}", database_url);

        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(AggregatorError::Database)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(5))
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    /// In-memory database on a single connection, for tests.
    pub async fn in_memory() -> Result<Self> {
        let options =
            SqliteConnectOptions::from_str("sqlite::memory:").map_err(AggregatorError::Database)?;
        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(1)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sources (
                id BLOB PRIMARY KEY,
                name TEXT NOT NULL,
                feed_url TEXT NOT NULL UNIQUE,
                is_active BOOLEAN NOT NULL DEFAULT TRUE,
                error_count INTEGER NOT NULL DEFAULT 0,
                last_error TEXT,
                last_fetched_at TEXT,
                last_successful_fetch_at TEXT,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS articles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                source_id BLOB NOT NULL,
                guid TEXT NOT NULL,
                title TEXT NOT NULL,
                description TEXT,
                content TEXT,
                excerpt TEXT,
                author TEXT,
                url TEXT NOT NULL,
                image_url TEXT,
                published_at TEXT NOT NULL,
                keywords TEXT NOT NULL DEFAULT '[]',
                sentiment_score REAL NOT NULL DEFAULT 0,
                read_time_minutes INTEGER NOT NULL DEFAULT 1,
                is_featured BOOLEAN NOT NULL DEFAULT FALSE,
                is_trending BOOLEAN NOT NULL DEFAULT FALSE,
                is_breaking BOOLEAN NOT NULL DEFAULT FALSE,
                category_id INTEGER,
                status TEXT NOT NULL DEFAULT 'approved',
                view_count INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                UNIQUE (source_id, guid),
                FOREIGN KEY (source_id) REFERENCES sources (id)
            );
            CREATE INDEX IF NOT EXISTS idx_articles_published_at ON articles (published_at);
            CREATE INDEX IF NOT EXISTS idx_articles_status ON articles (status);
            CREATE INDEX IF NOT EXISTS idx_articles_source_id ON articles (source_id);
            CREATE INDEX IF NOT EXISTS idx_articles_created_at ON articles (created_at);

            CREATE TABLE IF NOT EXISTS article_tags (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                article_id INTEGER NOT NULL,
                tag TEXT NOT NULL,
                confidence REAL NOT NULL,
                UNIQUE (article_id, tag),
                FOREIGN KEY (article_id) REFERENCES articles (id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_article_tags_article_id ON article_tags (article_id);
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Scheme, host and not-already-registered checks for a candidate feed URL.
    pub async fn validate_feed_url(&self, url: &str) -> Result<bool> {
        let parsed = url::Url::parse(url)?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Ok(false);
        }
        if parsed.host().is_none() {
            return Ok(false);
        }

        let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sources WHERE feed_url = ?1")
            .bind(url)
            .fetch_one(&self.pool)
            .await?;

        Ok(existing == 0)
    }

    pub async fn add_source(&self, name: &str, feed_url: &str) -> Result<Uuid> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO sources (id, name, feed_url, is_active, error_count, created_at)
            VALUES (?1, ?2, ?3, TRUE, 0, ?4)
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(feed_url)
        .bind(now)
        .execute(&self.pool)
        .await?;

        info!("added source {} ({})", name, id);
        Ok(id)
    }

    pub async fn get_source(&self, id: Uuid) -> Result<Source> {
        let row = sqlx::query("SELECT * FROM sources WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => source_from_row(&row).map_err(AggregatorError::Database),
            None => Err(AggregatorError::SourceNotFound { id }),
        }
    }

    pub async fn list_sources(&self) -> Result<Vec<Source>> {
        let rows = sqlx::query("SELECT * FROM sources ORDER BY created_at")
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| source_from_row(row).map_err(AggregatorError::Database))
            .collect()
    }

    /// Active sources, least recently fetched first; never-fetched sources
    /// lead the list. Computed once per sync run.
    pub async fn sources_for_sync(&self) -> Result<Vec<Source>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM sources
            WHERE is_active = TRUE
            ORDER BY last_fetched_at IS NOT NULL, last_fetched_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| source_from_row(row).map_err(AggregatorError::Database))
            .collect()
    }

    /// Stamp the fetch-attempt timestamp before the fetch itself, so stalled
    /// fetches stay visible to monitoring.
    pub async fn mark_fetch_attempt(&self, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE sources SET last_fetched_at = ?1 WHERE id = ?2")
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn record_fetch_success(&self, id: Uuid) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE sources
            SET last_successful_fetch_at = ?1, error_count = 0, last_error = NULL
            WHERE id = ?2
            "#,
        )
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn record_fetch_failure(&self, id: Uuid, error: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE sources
            SET error_count = error_count + 1, last_error = ?1
            WHERE id = ?2
            "#,
        )
        .bind(error)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn deactivate_source(&self, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE sources SET is_active = FALSE WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        info!("deactivated source {}", id);
        Ok(())
    }

    /// Dedup lookup by the (source, guid) key.
    pub async fn find_article(&self, source_id: Uuid, guid: &str) -> Result<Option<Article>> {
        let row = sqlx::query("SELECT * FROM articles WHERE source_id = ?1 AND guid = ?2")
            .bind(source_id)
            .bind(guid)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| article_from_row(&row).map_err(AggregatorError::Database))
            .transpose()
    }

    pub async fn get_article(&self, id: i64) -> Result<Option<Article>> {
        let row = sqlx::query("SELECT * FROM articles WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| article_from_row(&row).map_err(AggregatorError::Database))
            .transpose()
    }

    /// Insert a new article, relying on the (source_id, guid) unique
    /// constraint to reject racing duplicates. Returns the stored article, or
    /// None when another writer inserted the same key first.
    pub async fn insert_article(&self, article: &NewArticle) -> Result<Option<Article>> {
        let keywords = serde_json::to_string(&article.keywords)?;
        let now = Utc::now();

        let inserted: Option<(i64,)> = sqlx::query_as(
            r#"
            INSERT INTO articles (
                source_id, guid, title, description, content, excerpt, author,
                url, image_url, published_at, keywords, sentiment_score,
                read_time_minutes, is_trending, is_breaking, status, created_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, 'approved', ?16)
            ON CONFLICT (source_id, guid) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(article.source_id)
        .bind(&article.guid)
        .bind(&article.title)
        .bind(&article.description)
        .bind(&article.content)
        .bind(&article.excerpt)
        .bind(&article.author)
        .bind(&article.url)
        .bind(&article.image_url)
        .bind(article.published_at)
        .bind(&keywords)
        .bind(article.sentiment_score)
        .bind(article.read_time_minutes)
        .bind(article.is_trending)
        .bind(article.is_breaking)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        match inserted {
            Some((id,)) => {
                debug!("inserted article {} ({})", id, article.guid);
                self.get_article(id).await
            }
            None => Ok(None),
        }
    }

    pub async fn insert_article_tags(
        &self,
        article_id: i64,
        tags: &[TagSuggestion],
    ) -> Result<()> {
        for suggestion in tags {
            sqlx::query(
                r#"
                INSERT INTO article_tags (article_id, tag, confidence)
                VALUES (?1, ?2, ?3)
                ON CONFLICT (article_id, tag) DO NOTHING
                "#,
            )
            .bind(article_id)
            .bind(&suggestion.tag)
            .bind(suggestion.confidence)
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }

    pub async fn article_tags(&self, article_id: i64) -> Result<Vec<ArticleTag>> {
        let rows = sqlx::query(
            "SELECT id, article_id, tag, confidence FROM article_tags WHERE article_id = ?1 ORDER BY id",
        )
        .bind(article_id)
        .fetch_all(&self.pool)
        .await?;

        let mut tags = Vec::with_capacity(rows.len());
        for row in rows {
            tags.push(ArticleTag {
                id: row.try_get("id")?,
                article_id: row.try_get("article_id")?,
                tag: row.try_get("tag")?,
                confidence: row.try_get("confidence")?,
            });
        }
        Ok(tags)
    }

    /// Filtered, sorted, paginated article listing with an exact total count.
    pub async fn query_articles(&self, query: &ArticleQuery) -> Result<ArticlePage> {
        let mut count_builder = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM articles");
        push_filters(&mut count_builder, query);
        let total: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut builder = QueryBuilder::<Sqlite>::new("SELECT * FROM articles");
        push_filters(&mut builder, query);
        builder.push(" ORDER BY ");
        builder.push(query.sort_by.column());
        builder.push(match query.sort_order {
            SortOrder::Asc => " ASC",
            SortOrder::Desc => " DESC",
        });
        builder.push(" LIMIT ");
        builder.push_bind(query.limit);
        builder.push(" OFFSET ");
        builder.push_bind(query.offset);

        let rows = builder.build().fetch_all(&self.pool).await?;
        let articles = rows
            .iter()
            .map(article_from_row)
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let limit = query.limit.max(1);
        let page = query.offset / limit + 1;
        let total_pages = if total == 0 { 0 } else { (total + limit - 1) / limit };

        Ok(ArticlePage {
            articles,
            pagination: Pagination {
                total,
                page,
                limit: query.limit,
                total_pages,
                has_next_page: query.offset + limit < total,
                has_prev_page: query.offset > 0,
            },
        })
    }

    /// Aggregate counts over approved articles, as independent queries.
    pub async fn article_stats(&self) -> Result<ArticleStats> {
        let total_articles = self
            .count("SELECT COUNT(*) FROM articles WHERE status = 'approved'")
            .await?;
        let recent_cutoff = Utc::now() - Duration::hours(24);
        let recent_articles: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM articles WHERE status = 'approved' AND created_at >= ?1",
        )
        .bind(recent_cutoff)
        .fetch_one(&self.pool)
        .await?;
        let featured_articles = self
            .count(
                "SELECT COUNT(*) FROM articles WHERE status = 'approved' AND is_featured = TRUE",
            )
            .await?;
        let trending_articles = self
            .count(
                "SELECT COUNT(*) FROM articles WHERE status = 'approved' AND is_trending = TRUE",
            )
            .await?;
        let breaking_news = self
            .count(
                "SELECT COUNT(*) FROM articles WHERE status = 'approved' AND is_breaking = TRUE",
            )
            .await?;

        Ok(ArticleStats {
            total_articles,
            recent_articles,
            featured_articles,
            trending_articles,
            breaking_news,
            last_updated: Utc::now(),
        })
    }

    pub async fn source_stats(&self) -> Result<SourceStats> {
        let total_sources = self.count("SELECT COUNT(*) FROM sources").await?;
        let active_sources = self
            .count("SELECT COUNT(*) FROM sources WHERE is_active = TRUE")
            .await?;
        let failing_sources = self
            .count(
                "SELECT COUNT(*) FROM sources WHERE is_active = TRUE AND error_count > 0",
            )
            .await?;
        let never_fetched = self
            .count(
                "SELECT COUNT(*) FROM sources WHERE is_active = TRUE AND last_fetched_at IS NULL",
            )
            .await?;

        Ok(SourceStats {
            total_sources,
            active_sources,
            failing_sources,
            never_fetched,
        })
    }

    async fn count(&self, sql: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(sql).fetch_one(&self.pool).await?;
        Ok(count)
    }
}

fn push_filters(builder: &mut QueryBuilder<'_, Sqlite>, query: &ArticleQuery) {
    builder.push(" WHERE status = ");
    builder.push_bind(
        query
            .status
            .clone()
            .unwrap_or_else(|| "approved".to_string()),
    );

    if !query.category_ids.is_empty() {
        builder.push(" AND category_id IN (");
        let mut ids = builder.separated(", ");
        for id in &query.category_ids {
            ids.push_bind(*id);
        }
        builder.push(")");
    }

    if !query.source_ids.is_empty() {
        builder.push(" AND source_id IN (");
        let mut ids = builder.separated(", ");
        for id in &query.source_ids {
            ids.push_bind(*id);
        }
        builder.push(")");
    }

    if let Some(after) = query.published_after {
        builder.push(" AND published_at >= ");
        builder.push_bind(after);
    }
    if let Some(before) = query.published_before {
        builder.push(" AND published_at <= ");
        builder.push_bind(before);
    }

    if let Some(featured) = query.featured {
        builder.push(" AND is_featured = ");
        builder.push_bind(featured);
    }
    if let Some(trending) = query.trending {
        builder.push(" AND is_trending = ");
        builder.push_bind(trending);
    }
    if let Some(breaking) = query.breaking {
        builder.push(" AND is_breaking = ");
        builder.push_bind(breaking);
    }

    if let Some(search) = &query.search {
        let pattern = format!("%{}%", search);
        builder.push(" AND (title LIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR description LIKE ");
        builder.push_bind(pattern);
        builder.push(")");
    }
}

fn source_from_row(row: &SqliteRow) -> std::result::Result<Source, sqlx::Error> {
    Ok(Source {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        feed_url: row.try_get("feed_url")?,
        is_active: row.try_get("is_active")?,
        error_count: row.try_get("error_count")?,
        last_error: row.try_get("last_error")?,
        last_fetched_at: row.try_get("last_fetched_at")?,
        last_successful_fetch_at: row.try_get("last_successful_fetch_at")?,
        created_at: row.try_get("created_at")?,
    })
}

fn article_from_row(row: &SqliteRow) -> std::result::Result<Article, sqlx::Error> {
    let keywords_json: String = row.try_get("keywords")?;
    let keywords: Vec<String> = serde_json::from_str(&keywords_json).unwrap_or_default();

    Ok(Article {
        id: row.try_get("id")?,
        source_id: row.try_get("source_id")?,
        guid: row.try_get("guid")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        content: row.try_get("content")?,
        excerpt: row.try_get("excerpt")?,
        author: row.try_get("author")?,
        url: row.try_get("url")?,
        image_url: row.try_get("image_url")?,
        published_at: row.try_get("published_at")?,
        keywords,
        sentiment_score: row.try_get("sentiment_score")?,
        read_time_minutes: row.try_get("read_time_minutes")?,
        is_featured: row.try_get("is_featured")?,
        is_trending: row.try_get("is_trending")?,
        is_breaking: row.try_get("is_breaking")?,
        category_id: row.try_get("category_id")?,
        status: row.try_get("status")?,
        view_count: row.try_get("view_count")?,
        created_at: row.try_get("created_at")?,
    })
}
