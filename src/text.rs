//! HTML and plain-text helpers shared by the item processor.

use once_cell::sync::Lazy;
use regex::Regex;

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid tag regex"));

static IMG_SRC_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<img[^>]*\bsrc\s*=\s*["']([^"']+)["']"#).expect("valid img regex")
});

/// Marker appended when an excerpt is cut mid-sentence.
pub const ELLIPSIS: &str = "…";

/// Remove markup, decode HTML entities and collapse whitespace.
pub fn strip_html(input: &str) -> String {
    let without_tags = TAG_RE.replace_all(input, " ");
    let decoded = html_escape::decode_html_entities(without_tags.as_ref());
    collapse_whitespace(decoded.as_ref())
}

/// Collapse runs of whitespace (including newlines) into single spaces.
pub fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First `<img src=...>` URL found in raw markup, if any.
pub fn first_img_src(markup: &str) -> Option<String> {
    IMG_SRC_RE
        .captures(markup)
        .map(|caps| caps[1].to_string())
}

/// Build an excerpt from already-stripped text.
///
/// Text within the limit is returned unchanged. Longer text is cut at the
/// last sentence boundary when that boundary falls past 70% of the limit,
/// otherwise at the last word boundary with an ellipsis marker.
pub fn make_excerpt(text: &str, max_chars: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_chars {
        return text.to_string();
    }

    let prefix = &chars[..max_chars];
    let sentence_floor = max_chars * 7 / 10;

    if let Some(pos) = prefix.iter().rposition(|&c| c == '.') {
        if pos >= sentence_floor {
            return prefix[..=pos].iter().collect();
        }
    }

    let cut = prefix
        .iter()
        .rposition(|&c| c == ' ')
        .unwrap_or(max_chars);
    let mut excerpt: String = prefix[..cut].iter().collect();
    excerpt.truncate(excerpt.trim_end().len());
    excerpt.push_str(ELLIPSIS);
    excerpt
}
