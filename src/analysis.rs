//! Deterministic content analysis over article text.
//!
//! Everything here is a pure function of the combined title, description and
//! content text: a bag-of-words sentiment heuristic, term-frequency keyword
//! extraction, presence-match trending/breaking flags and suggested tags, and
//! a words-per-minute read-time estimate. The lexicons are fixed; the weights
//! live on [`AnalysisConfig`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::types::AnalysisConfig;

/// Terms that nudge the sentiment score up, one step per occurrence.
const POSITIVE_TERMS: &[&str] = &[
    "secure",
    "protection",
    "safe",
    "successful",
    "improved",
    "updated",
    "fixed",
    "patched",
    "resolved",
];

/// Terms that pull the sentiment score down, one step per occurrence.
const NEGATIVE_TERMS: &[&str] = &[
    "breach",
    "attack",
    "vulnerability",
    "hack",
    "exploit",
    "malware",
    "ransomware",
    "threat",
    "risk",
    "compromise",
];

const TRENDING_TERMS: &[&str] = &["breaking", "urgent", "alert", "critical", "major", "massive"];

const BREAKING_TERMS: &[&str] = &[
    "breaking",
    "urgent",
    "alert",
    "critical",
    "just in",
    "developing",
];

/// Domain vocabulary matched against article text to suggest tags.
const TAG_VOCABULARY: &[&str] = &[
    "malware",
    "ransomware",
    "phishing",
    "apt",
    "zero-day",
    "vulnerability",
    "breach",
    "incident",
    "threat-intelligence",
    "compliance",
    "privacy",
    "encryption",
    "authentication",
    "firewall",
    "endpoint",
    "cloud-security",
];

const STOPWORDS: &[&str] = &[
    "this", "that", "with", "from", "have", "will", "been", "were", "their", "they", "about",
    "which", "would", "there", "after", "before", "could", "should", "other", "these", "those",
    "when", "where", "what", "your", "than", "then", "them", "into", "over", "more", "most",
    "some", "such", "only", "also", "very", "just", "being", "during", "through", "said", "says",
];

/// A tag suggested by the analyzer, with its confidence score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagSuggestion {
    pub tag: String,
    pub confidence: f64,
}

/// Structured result of one analysis pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentAnalysis {
    pub read_time_minutes: u32,
    pub sentiment_score: f64,
    pub keywords: Vec<String>,
    pub suggested_tags: Vec<TagSuggestion>,
    pub is_trending: bool,
    pub is_breaking: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ContentAnalyzer {
    config: AnalysisConfig,
}

impl ContentAnalyzer {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn analyze(&self, text: &str) -> ContentAnalysis {
        let lowered = text.to_lowercase();

        ContentAnalysis {
            read_time_minutes: self.read_time(text),
            sentiment_score: self.sentiment(&lowered),
            keywords: self.keywords(&lowered),
            suggested_tags: self.suggest_tags(&lowered),
            is_trending: contains_any(&lowered, TRENDING_TERMS),
            is_breaking: contains_any(&lowered, BREAKING_TERMS),
        }
    }

    /// Word count divided by reading speed, rounded up, never below one.
    fn read_time(&self, text: &str) -> u32 {
        let words = text.split_whitespace().count();
        let wpm = self.config.words_per_minute.max(1);
        (words.div_ceil(wpm)).max(1) as u32
    }

    /// One step up per positive-lexicon occurrence, one down per negative,
    /// clamped to [-1, 1].
    fn sentiment(&self, lowered: &str) -> f64 {
        let positive: usize = POSITIVE_TERMS
            .iter()
            .map(|term| lowered.matches(term).count())
            .sum();
        let negative: usize = NEGATIVE_TERMS
            .iter()
            .map(|term| lowered.matches(term).count())
            .sum();

        let score = (positive as f64 - negative as f64) * self.config.sentiment_step;
        score.clamp(-1.0, 1.0)
    }

    /// Top terms by frequency, ties broken by first appearance.
    fn keywords(&self, lowered: &str) -> Vec<String> {
        let mut counts: HashMap<String, usize> = HashMap::new();
        let mut first_seen: Vec<String> = Vec::new();

        for token in lowered.split_whitespace() {
            let cleaned: String = token
                .chars()
                .filter(|c| c.is_alphanumeric() || *c == '-')
                .collect();
            let cleaned = cleaned.trim_matches('-').to_string();
            if cleaned.len() <= 3 || STOPWORDS.contains(&cleaned.as_str()) {
                continue;
            }
            match counts.get_mut(&cleaned) {
                Some(count) => *count += 1,
                None => {
                    counts.insert(cleaned.clone(), 1);
                    first_seen.push(cleaned);
                }
            }
        }

        // Stable sort keeps first-seen order for equal frequencies.
        first_seen.sort_by(|a, b| counts[b].cmp(&counts[a]));
        first_seen.truncate(self.config.max_keywords);
        first_seen
    }

    fn suggest_tags(&self, lowered: &str) -> Vec<TagSuggestion> {
        TAG_VOCABULARY
            .iter()
            .filter(|term| lowered.contains(*term))
            .take(self.config.max_tags)
            .map(|term| TagSuggestion {
                tag: term.to_string(),
                confidence: self.config.tag_confidence,
            })
            .collect()
    }
}

fn contains_any(lowered: &str, terms: &[&str]) -> bool {
    terms.iter().any(|term| lowered.contains(term))
}
