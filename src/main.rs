use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use cyberfeed::{
    AnalysisConfig, ArticleQuery, FetchConfig, NewsAggregator, SyncConfig,
};

#[derive(Parser)]
#[command(name = "cyberfeed", about = "News aggregation pipeline for a cybersecurity content platform")]
struct Cli {
    /// SQLite database URL; falls back to $DATABASE_URL.
    #[arg(long)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Register a feed source.
    AddSource {
        name: String,
        feed_url: String,
    },
    /// List all configured sources.
    ListSources,
    /// Fetch all active sources once.
    Sync,
    /// List recent articles.
    Articles {
        #[arg(long, default_value_t = 20)]
        limit: i64,
        #[arg(long)]
        breaking: bool,
        #[arg(long)]
        trending: bool,
    },
    /// Print article and source statistics.
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let database_url = cli
        .database_url
        .or_else(|| std::env::var("DATABASE_URL").ok())
        .unwrap_or_else(|| "sqlite://cyberfeed.db".to_string());

    let aggregator = NewsAggregator::connect(
        &database_url,
        FetchConfig::default(),
        SyncConfig::default(),
        AnalysisConfig::default(),
    )
    .await
    .with_context(|| format!("failed to open database {}", database_url))?;

    match cli.command {
        Command::AddSource { name, feed_url } => {
            let id = aggregator.add_source(&name, &feed_url).await?;
            println!("added source {} ({})", name, id);
        }
        Command::ListSources => {
            for source in aggregator.store().list_sources().await? {
                let status = if source.is_active { "active" } else { "inactive" };
                println!(
                    "{}  {}  {}  errors={}  last_success={}",
                    source.id,
                    status,
                    source.feed_url,
                    source.error_count,
                    source
                        .last_successful_fetch_at
                        .map(|t| t.to_rfc3339())
                        .unwrap_or_else(|| "never".to_string()),
                );
            }
        }
        Command::Sync => {
            let results = aggregator.sync_all_sources().await?;
            let succeeded = results.iter().filter(|r| r.success).count();
            for result in &results {
                match &result.error {
                    None => info!(
                        "{}: {} items, {} new",
                        result.source_name, result.item_count, result.new_article_count
                    ),
                    Some(error) => info!("{}: failed: {}", result.source_name, error),
                }
            }
            println!("synced {}/{} sources", succeeded, results.len());
        }
        Command::Articles {
            limit,
            breaking,
            trending,
        } => {
            let query = ArticleQuery {
                limit,
                breaking: breaking.then_some(true),
                trending: trending.then_some(true),
                ..ArticleQuery::default()
            };
            let page = aggregator.get_articles(&query).await?;
            for article in &page.articles {
                println!(
                    "[{}] {}  ({})",
                    article.published_at.format("%Y-%m-%d"),
                    article.title,
                    article.url
                );
            }
            println!(
                "page {}/{} ({} total)",
                page.pagination.page, page.pagination.total_pages, page.pagination.total
            );
        }
        Command::Stats => {
            let stats = aggregator.get_stats().await?;
            let sources = aggregator.get_source_stats().await?;
            println!("articles: {} total, {} recent, {} featured, {} trending, {} breaking",
                stats.total_articles,
                stats.recent_articles,
                stats.featured_articles,
                stats.trending_articles,
                stats.breaking_news,
            );
            println!(
                "sources: {} total, {} active, {} failing, {} never fetched",
                sources.total_sources,
                sources.active_sources,
                sources.failing_sources,
                sources.never_fetched,
            );
        }
    }

    Ok(())
}
