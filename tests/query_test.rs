mod common;

use chrono::{Duration, TimeZone, Utc};
use common::new_article;
use cyberfeed::{ArticleQuery, SortField, SortOrder, Store};

#[tokio::test]
async fn breaking_filter_returns_only_breaking_articles() {
    let store = Store::in_memory().await.unwrap();
    let source_id = store
        .add_source("Example", "https://example.com/feed.xml")
        .await
        .unwrap();

    for i in 0..2 {
        let mut article = new_article(source_id, &format!("breaking-{}", i), "Breaking story");
        article.is_breaking = true;
        store.insert_article(&article).await.unwrap();
    }
    for i in 0..8 {
        let article = new_article(source_id, &format!("calm-{}", i), "Calm story");
        store.insert_article(&article).await.unwrap();
    }

    let query = ArticleQuery {
        breaking: Some(true),
        limit: 10,
        offset: 0,
        ..ArticleQuery::default()
    };
    let page = store.query_articles(&query).await.unwrap();

    assert_eq!(page.articles.len(), 2);
    assert!(page.articles.iter().all(|a| a.is_breaking));
    assert_eq!(page.pagination.total, 2);
    assert!(!page.pagination.has_next_page);
    assert!(!page.pagination.has_prev_page);
}

#[tokio::test]
async fn pagination_reports_pages_and_neighbors() {
    let store = Store::in_memory().await.unwrap();
    let source_id = store
        .add_source("Example", "https://example.com/feed.xml")
        .await
        .unwrap();

    for i in 0..25 {
        let article = new_article(source_id, &format!("item-{:02}", i), "Story");
        store.insert_article(&article).await.unwrap();
    }

    let query = ArticleQuery {
        limit: 10,
        offset: 20,
        ..ArticleQuery::default()
    };
    let page = store.query_articles(&query).await.unwrap();

    assert_eq!(page.articles.len(), 5);
    assert_eq!(page.pagination.total, 25);
    assert_eq!(page.pagination.page, 3);
    assert_eq!(page.pagination.total_pages, 3);
    assert!(!page.pagination.has_next_page);
    assert!(page.pagination.has_prev_page);
}

#[tokio::test]
async fn search_matches_title_or_description_case_insensitively() {
    let store = Store::in_memory().await.unwrap();
    let source_id = store
        .add_source("Example", "https://example.com/feed.xml")
        .await
        .unwrap();

    let mut vpn = new_article(source_id, "vpn", "Zero-Day In VPN Appliance");
    vpn.description = Some("Exploit in the wild.".to_string());
    store.insert_article(&vpn).await.unwrap();

    let mut other = new_article(source_id, "other", "Quarterly report");
    other.description = Some("Patch cadence for the vpn fleet.".to_string());
    store.insert_article(&other).await.unwrap();

    let unrelated = new_article(source_id, "unrelated", "Conference recap");
    store.insert_article(&unrelated).await.unwrap();

    let query = ArticleQuery {
        search: Some("vpn".to_string()),
        ..ArticleQuery::default()
    };
    let page = store.query_articles(&query).await.unwrap();
    assert_eq!(page.pagination.total, 2);
}

#[tokio::test]
async fn default_query_only_sees_approved_articles() {
    let store = Store::in_memory().await.unwrap();
    let source_id = store
        .add_source("Example", "https://example.com/feed.xml")
        .await
        .unwrap();

    let approved = new_article(source_id, "approved", "Approved story");
    store.insert_article(&approved).await.unwrap();
    let hidden = new_article(source_id, "hidden", "Hidden story");
    let hidden = store.insert_article(&hidden).await.unwrap().unwrap();

    sqlx::query("UPDATE articles SET status = 'pending' WHERE id = ?1")
        .bind(hidden.id)
        .execute(store.pool())
        .await
        .unwrap();

    let page = store.query_articles(&ArticleQuery::default()).await.unwrap();
    assert_eq!(page.pagination.total, 1);
    assert_eq!(page.articles[0].guid, "approved");

    let pending = ArticleQuery {
        status: Some("pending".to_string()),
        ..ArticleQuery::default()
    };
    let page = store.query_articles(&pending).await.unwrap();
    assert_eq!(page.pagination.total, 1);
    assert_eq!(page.articles[0].guid, "hidden");
}

#[tokio::test]
async fn publish_date_range_is_inclusive() {
    let store = Store::in_memory().await.unwrap();
    let source_id = store
        .add_source("Example", "https://example.com/feed.xml")
        .await
        .unwrap();

    for (guid, day) in [("early", 1), ("middle", 10), ("late", 20)] {
        let mut article = new_article(source_id, guid, "Story");
        article.published_at = Utc.with_ymd_and_hms(2025, 6, day, 12, 0, 0).unwrap();
        store.insert_article(&article).await.unwrap();
    }

    let query = ArticleQuery {
        published_after: Some(Utc.with_ymd_and_hms(2025, 6, 10, 12, 0, 0).unwrap()),
        published_before: Some(Utc.with_ymd_and_hms(2025, 6, 20, 12, 0, 0).unwrap()),
        ..ArticleQuery::default()
    };
    let page = store.query_articles(&query).await.unwrap();
    let guids: Vec<&str> = page.articles.iter().map(|a| a.guid.as_str()).collect();
    assert_eq!(page.pagination.total, 2);
    assert!(guids.contains(&"middle"));
    assert!(guids.contains(&"late"));
}

#[tokio::test]
async fn sort_order_is_respected() {
    let store = Store::in_memory().await.unwrap();
    let source_id = store
        .add_source("Example", "https://example.com/feed.xml")
        .await
        .unwrap();

    for (guid, title) in [("b", "Bravo"), ("a", "Alpha"), ("c", "Charlie")] {
        let article = new_article(source_id, guid, title);
        store.insert_article(&article).await.unwrap();
    }

    let query = ArticleQuery {
        sort_by: SortField::Title,
        sort_order: SortOrder::Asc,
        ..ArticleQuery::default()
    };
    let page = store.query_articles(&query).await.unwrap();
    let titles: Vec<&str> = page.articles.iter().map(|a| a.title.as_str()).collect();
    assert_eq!(titles, vec!["Alpha", "Bravo", "Charlie"]);
}

#[tokio::test]
async fn category_and_source_filters_match_any_listed_id() {
    let store = Store::in_memory().await.unwrap();
    let first = store
        .add_source("First", "https://first.example.com/feed.xml")
        .await
        .unwrap();
    let second = store
        .add_source("Second", "https://second.example.com/feed.xml")
        .await
        .unwrap();

    let from_first = store
        .insert_article(&new_article(first, "a", "From first"))
        .await
        .unwrap()
        .unwrap();
    store
        .insert_article(&new_article(second, "b", "From second"))
        .await
        .unwrap();

    let by_source = ArticleQuery {
        source_ids: vec![first],
        ..ArticleQuery::default()
    };
    let page = store.query_articles(&by_source).await.unwrap();
    assert_eq!(page.pagination.total, 1);
    assert_eq!(page.articles[0].guid, "a");

    // Categories are assigned by an external collaborator.
    sqlx::query("UPDATE articles SET category_id = 7 WHERE id = ?1")
        .bind(from_first.id)
        .execute(store.pool())
        .await
        .unwrap();

    let by_category = ArticleQuery {
        category_ids: vec![7, 9],
        ..ArticleQuery::default()
    };
    let page = store.query_articles(&by_category).await.unwrap();
    assert_eq!(page.pagination.total, 1);
    assert_eq!(page.articles[0].guid, "a");
}

#[tokio::test]
async fn unique_key_rejects_second_insert() {
    let store = Store::in_memory().await.unwrap();
    let source_id = store
        .add_source("Example", "https://example.com/feed.xml")
        .await
        .unwrap();

    let article = new_article(source_id, "same-guid", "Original");
    let first = store.insert_article(&article).await.unwrap();
    assert!(first.is_some());

    let rival = new_article(source_id, "same-guid", "Racing duplicate");
    let second = store.insert_article(&rival).await.unwrap();
    assert!(second.is_none());

    let page = store.query_articles(&ArticleQuery::default()).await.unwrap();
    assert_eq!(page.pagination.total, 1);
    assert_eq!(page.articles[0].title, "Original");
}

#[tokio::test]
async fn stats_on_empty_store_are_all_zero() {
    let store = Store::in_memory().await.unwrap();
    let stats = store.article_stats().await.unwrap();

    assert_eq!(stats.total_articles, 0);
    assert_eq!(stats.recent_articles, 0);
    assert_eq!(stats.featured_articles, 0);
    assert_eq!(stats.trending_articles, 0);
    assert_eq!(stats.breaking_news, 0);
}

#[tokio::test]
async fn stats_count_flags_and_recency() {
    let store = Store::in_memory().await.unwrap();
    let source_id = store
        .add_source("Example", "https://example.com/feed.xml")
        .await
        .unwrap();

    let mut trending = new_article(source_id, "trending", "Trending story");
    trending.is_trending = true;
    store.insert_article(&trending).await.unwrap();

    let mut breaking = new_article(source_id, "breaking", "Breaking story");
    breaking.is_breaking = true;
    let breaking = store.insert_article(&breaking).await.unwrap().unwrap();

    let plain = new_article(source_id, "plain", "Plain story");
    store.insert_article(&plain).await.unwrap();

    // Age one article out of the 24h recency window.
    let old = Utc::now() - Duration::hours(48);
    sqlx::query("UPDATE articles SET created_at = ?1 WHERE id = ?2")
        .bind(old)
        .bind(breaking.id)
        .execute(store.pool())
        .await
        .unwrap();

    let stats = store.article_stats().await.unwrap();
    assert_eq!(stats.total_articles, 3);
    assert_eq!(stats.recent_articles, 2);
    assert_eq!(stats.trending_articles, 1);
    assert_eq!(stats.breaking_news, 1);
}

#[tokio::test]
async fn source_stats_track_failures_and_activity() {
    let store = Store::in_memory().await.unwrap();
    let healthy = store
        .add_source("Healthy", "https://healthy.example.com/feed.xml")
        .await
        .unwrap();
    let failing = store
        .add_source("Failing", "https://failing.example.com/feed.xml")
        .await
        .unwrap();
    let retired = store
        .add_source("Retired", "https://retired.example.com/feed.xml")
        .await
        .unwrap();

    store.mark_fetch_attempt(healthy).await.unwrap();
    store.record_fetch_success(healthy).await.unwrap();
    store.mark_fetch_attempt(failing).await.unwrap();
    store
        .record_fetch_failure(failing, "timed out")
        .await
        .unwrap();
    store.deactivate_source(retired).await.unwrap();

    let stats = store.source_stats().await.unwrap();
    assert_eq!(stats.total_sources, 3);
    assert_eq!(stats.active_sources, 2);
    assert_eq!(stats.failing_sources, 1);
    assert_eq!(stats.never_fetched, 0);
}

#[tokio::test]
async fn feed_url_validation_rejects_bad_and_known_urls() {
    let store = Store::in_memory().await.unwrap();

    assert!(store
        .validate_feed_url("https://fresh.example.com/feed.xml")
        .await
        .unwrap());
    assert!(!store.validate_feed_url("ftp://example.com/feed").await.unwrap());
    assert!(store.validate_feed_url("not a url").await.is_err());

    store
        .add_source("Known", "https://known.example.com/feed.xml")
        .await
        .unwrap();
    assert!(!store
        .validate_feed_url("https://known.example.com/feed.xml")
        .await
        .unwrap());
}
