use cyberfeed::text::{make_excerpt, ELLIPSIS};
use cyberfeed::{AnalysisConfig, ContentAnalyzer};

fn analyzer() -> ContentAnalyzer {
    ContentAnalyzer::new(AnalysisConfig::default())
}

#[test]
fn sentiment_stays_within_bounds() {
    let negative = "breach attack vulnerability hack exploit malware threat risk ".repeat(5);
    let texts = [
        "",
        "secure protection safe successful improved updated fixed",
        negative.as_str(),
        "The quarterly report mentions no security terms at all",
    ];
    for text in texts {
        let score = analyzer().analyze(text).sentiment_score;
        assert!((-1.0..=1.0).contains(&score), "score {} for {:?}", score, text);
    }
}

#[test]
fn heavily_negative_text_clamps_to_minus_one() {
    let text = "breach attack exploit malware threat ".repeat(10);
    assert_eq!(analyzer().analyze(&text).sentiment_score, -1.0);
}

#[test]
fn positive_terms_raise_the_score() {
    let analysis = analyzer().analyze("Vendor fixed and patched the issue; systems secure again");
    assert!(analysis.sentiment_score > 0.0);
}

#[test]
fn read_time_never_drops_below_one_minute() {
    assert_eq!(analyzer().analyze("").read_time_minutes, 1);
    assert_eq!(analyzer().analyze("tiny update").read_time_minutes, 1);

    let words = "word ".repeat(450);
    assert_eq!(analyzer().analyze(&words).read_time_minutes, 3);
}

#[test]
fn read_time_uses_configured_speed() {
    let analyzer = ContentAnalyzer::new(AnalysisConfig {
        words_per_minute: 100,
        ..AnalysisConfig::default()
    });
    let words = "word ".repeat(250);
    assert_eq!(analyzer.analyze(&words).read_time_minutes, 3);
}

#[test]
fn keywords_skip_short_tokens_and_stopwords() {
    let analysis =
        analyzer().analyze("the attackers used stolen credentials and the attackers pivoted");
    assert_eq!(analysis.keywords.first().map(String::as_str), Some("attackers"));
    assert!(!analysis.keywords.iter().any(|k| k == "the"));
    assert!(!analysis.keywords.iter().any(|k| k == "and"));
}

#[test]
fn keywords_are_capped_at_ten() {
    let text = (0..30)
        .map(|i| format!("keyword{:02}", i))
        .collect::<Vec<_>>()
        .join(" ");
    let analysis = analyzer().analyze(&text);
    assert_eq!(analysis.keywords.len(), 10);
}

#[test]
fn trending_and_breaking_are_independent() {
    let massive = analyzer().analyze("Massive outage across providers");
    assert!(massive.is_trending);
    assert!(!massive.is_breaking);

    let developing = analyzer().analyze("Developing story on the incident");
    assert!(developing.is_breaking);
    assert!(!developing.is_trending);

    let calm = analyzer().analyze("Routine maintenance window announced");
    assert!(!calm.is_trending);
    assert!(!calm.is_breaking);
}

#[test]
fn critical_ransomware_scenario() {
    let analysis = analyzer().analyze("Critical ransomware breach exploits zero-day vulnerability");

    assert!(analysis.is_breaking);
    assert!(analysis.is_trending);
    assert!(analysis.sentiment_score <= -0.3);

    let tags: Vec<&str> = analysis.suggested_tags.iter().map(|t| t.tag.as_str()).collect();
    assert!(tags.contains(&"ransomware"));
    assert!(tags.contains(&"breach"));
    assert!(tags.contains(&"zero-day"));
    assert!(tags.contains(&"vulnerability"));
    assert!(tags.len() <= 5);
    assert!(analysis
        .suggested_tags
        .iter()
        .all(|t| (t.confidence - 0.8).abs() < f64::EPSILON));
}

#[test]
fn suggested_tags_are_capped_at_five() {
    let analysis =
        analyzer().analyze("malware ransomware phishing breach incident privacy encryption");
    assert_eq!(analysis.suggested_tags.len(), 5);
}

#[test]
fn excerpt_length_is_bounded() {
    let text = "An unusually long advisory paragraph. ".repeat(30);
    let max = AnalysisConfig::default().excerpt_max_chars;
    let excerpt = make_excerpt(text.trim(), max);
    assert!(excerpt.chars().count() <= max + ELLIPSIS.chars().count());
}
