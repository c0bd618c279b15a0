//! Feed parsing: raw RSS/Atom bytes into [`RawEntry`] values.

use chrono::Utc;
use feed_rs::model::Entry;
use feed_rs::parser;
use tracing::debug;

use crate::types::{AggregatorError, RawEntry, Result};

/// Parse feed content and extract one [`RawEntry`] per item.
///
/// Entries are returned as-is; validation, deduplication and HTML stripping
/// happen in the item processor.
pub fn parse_entries(content: &str) -> Result<Vec<RawEntry>> {
    let feed = parser::parse(content.as_bytes())
        .map_err(|e| AggregatorError::Parse(format!("failed to parse feed: {}", e)))?;

    let entries: Vec<RawEntry> = feed.entries.into_iter().map(extract_entry).collect();
    debug!("parsed feed with {} entries", entries.len());
    Ok(entries)
}

fn extract_entry(entry: Entry) -> RawEntry {
    let guid = if entry.id.is_empty() {
        None
    } else {
        Some(entry.id.clone())
    };

    let url = entry.links.first().map(|link| link.href.clone());
    let title = entry.title.map(|t| t.content);
    let description = entry.summary.map(|s| s.content);

    // Prefer full content over the summary when both exist.
    let content = entry
        .content
        .and_then(|c| c.body)
        .or_else(|| description.clone());

    let author = entry.authors.first().map(|a| a.name.clone());
    let published_at = entry.published.map(|dt| dt.with_timezone(&Utc));

    let mut enclosure_image = None;
    let mut media_image = None;
    let mut thumbnail = None;
    for media in &entry.media {
        for item in &media.content {
            let Some(item_url) = item.url.as_ref() else {
                continue;
            };
            let is_image = item
                .content_type
                .as_ref()
                .map(|mime| mime.to_string().starts_with("image/"))
                .unwrap_or(false);
            if is_image && enclosure_image.is_none() {
                enclosure_image = Some(item_url.to_string());
            }
            if media_image.is_none() {
                media_image = Some(item_url.to_string());
            }
        }
        if thumbnail.is_none() {
            thumbnail = media.thumbnails.first().map(|t| t.image.uri.clone());
        }
    }

    RawEntry {
        guid,
        url,
        title,
        description,
        content,
        author,
        published_at,
        enclosure_image,
        media_image,
        thumbnail,
    }
}
