//! Item processor: one raw feed entry in, one normalized article out.

use chrono::Utc;
use tracing::debug;

use crate::analysis::ContentAnalyzer;
use crate::store::Store;
use crate::text::{first_img_src, make_excerpt, strip_html};
use crate::types::{AnalysisConfig, NewArticle, ProcessOutcome, RawEntry, Result, Source};

#[derive(Clone)]
pub struct EntryProcessor {
    store: Store,
    analyzer: ContentAnalyzer,
    excerpt_max_chars: usize,
}

impl EntryProcessor {
    pub fn new(store: Store, config: AnalysisConfig) -> Self {
        let excerpt_max_chars = config.excerpt_max_chars;
        Self {
            store,
            analyzer: ContentAnalyzer::new(config),
            excerpt_max_chars,
        }
    }

    /// Normalize, deduplicate and store one entry.
    ///
    /// Returns None for entries missing the hard-required fields (title and
    /// link). A known (source, guid) pair returns the existing article with
    /// `is_duplicate` set and writes nothing.
    pub async fn process_entry(
        &self,
        raw: &RawEntry,
        source: &Source,
    ) -> Result<Option<ProcessOutcome>> {
        let title = strip_html(raw.title.as_deref().unwrap_or(""));
        let link = raw.url.as_deref().unwrap_or("").trim().to_string();

        if title.is_empty() || link.is_empty() {
            debug!("skipping entry without title or link from {}", source.name);
            return Ok(None);
        }

        // Explicit guid when present, link otherwise.
        let guid = raw
            .guid
            .clone()
            .filter(|g| !g.trim().is_empty())
            .unwrap_or_else(|| link.clone());

        if let Some(existing) = self.store.find_article(source.id, &guid).await? {
            debug!("duplicate entry {} for source {}", guid, source.name);
            return Ok(Some(ProcessOutcome {
                article: existing,
                is_new: false,
                is_duplicate: true,
            }));
        }

        let description = non_empty(strip_html(raw.description.as_deref().unwrap_or("")));
        let content = non_empty(strip_html(raw.content.as_deref().unwrap_or("")));

        let combined = [
            title.as_str(),
            description.as_deref().unwrap_or(""),
            content.as_deref().unwrap_or(""),
        ]
        .join(" ");
        let analysis = self.analyzer.analyze(&combined);

        let excerpt_source = content.as_deref().or(description.as_deref());
        let excerpt = excerpt_source.map(|text| make_excerpt(text, self.excerpt_max_chars));

        let image_url = raw
            .enclosure_image
            .clone()
            .or_else(|| raw.media_image.clone())
            .or_else(|| raw.thumbnail.clone())
            .or_else(|| raw.content.as_deref().and_then(first_img_src));

        let published_at = raw.published_at.unwrap_or_else(Utc::now);

        let new_article = NewArticle {
            source_id: source.id,
            guid: guid.clone(),
            title,
            description,
            content,
            excerpt,
            author: raw.author.clone(),
            url: link,
            image_url,
            published_at,
            keywords: analysis.keywords.clone(),
            sentiment_score: analysis.sentiment_score,
            read_time_minutes: analysis.read_time_minutes,
            is_trending: analysis.is_trending,
            is_breaking: analysis.is_breaking,
        };

        match self.store.insert_article(&new_article).await? {
            Some(article) => {
                if !analysis.suggested_tags.is_empty() {
                    self.store
                        .insert_article_tags(article.id, &analysis.suggested_tags)
                        .await?;
                }
                Ok(Some(ProcessOutcome {
                    article,
                    is_new: true,
                    is_duplicate: false,
                }))
            }
            // Another writer inserted the same (source, guid) first; report
            // it as the duplicate it is.
            None => {
                let existing = self.store.find_article(source.id, &guid).await?;
                Ok(existing.map(|article| ProcessOutcome {
                    article,
                    is_new: false,
                    is_duplicate: true,
                }))
            }
        }
    }
}

fn non_empty(text: String) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}
