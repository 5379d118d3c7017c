//! Query analysis orchestration.
//!
//! Normalizes a raw query, classifies topics, detects interrogative form,
//! extracts numeric entities, and scores overall complexity.

use crate::entities;
use crate::topics::TopicTaxonomy;
use crate::types::{AnalyzedQuery, Complexity};
use once_cell::sync::Lazy;
use regex::Regex;

static STRIP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s?]").expect("valid strip pattern"));

static COLLAPSE_WS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws pattern"));

/// Lead words that mark a query as a question even without '?'.
const QUESTION_WORDS: &[&str] = &[
    "what", "how", "why", "when", "where", "who", "which", "can", "should", "could", "would",
];

/// Words that indicate the user is comparing options.
const COMPARISON_INDICATORS: &[&str] = &[
    "compare",
    "difference",
    "versus",
    "vs",
    "better",
    "worse",
    "pros and cons",
];

/// Connectives that indicate a multi-part question.
const MULTI_PART_INDICATORS: &[&str] = &[
    " and ",
    " or ",
    " also ",
    " additionally ",
    "; ",
    "first",
    "second",
    "finally",
];

/// Analyzes raw user queries against a topic taxonomy.
///
/// Pure apart from the taxonomy read once at construction; the same input
/// always produces the same [`AnalyzedQuery`].
pub struct QueryAnalyzer {
    taxonomy: TopicTaxonomy,
}

impl QueryAnalyzer {
    /// Create an analyzer over the built-in financial taxonomy.
    pub fn new() -> Self {
        Self::with_taxonomy(TopicTaxonomy::financial())
    }

    /// Create an analyzer over a custom taxonomy.
    pub fn with_taxonomy(taxonomy: TopicTaxonomy) -> Self {
        Self { taxonomy }
    }

    /// Analyze a raw query.
    ///
    /// Empty or malformed input is a valid (low-information) query, never an
    /// error: no topics, no numbers, `complexity == Simple`.
    pub fn analyze(&self, raw_query: &str) -> AnalyzedQuery {
        let lowered = raw_query.to_lowercase();
        let normalized = normalize(&lowered);

        let topics = self.taxonomy.classify(&normalized);
        let is_question = is_question(&normalized);
        // Entities come from the lowered raw text: normalization strips the
        // '$' and '%' markers the currency/percent passes key on.
        let numbers = entities::extract_numbers(&lowered);
        let complexity = self.determine_complexity(&normalized);

        tracing::debug!(
            "Analyzed query: {} topics, {} numbers, complexity {:?}",
            topics.len(),
            numbers.len(),
            complexity
        );

        AnalyzedQuery {
            original: raw_query.to_string(),
            normalized,
            topics,
            is_question,
            numbers,
            complexity,
        }
    }

    /// Classify query complexity from word count, financial-term density,
    /// comparison indicators, and multi-part connectives.
    fn determine_complexity(&self, normalized: &str) -> Complexity {
        let word_count = normalized.split_whitespace().count();
        let term_count = self.taxonomy.term_count(normalized);

        let has_comparison = COMPARISON_INDICATORS
            .iter()
            .any(|indicator| normalized.contains(indicator));
        let has_multi_part = MULTI_PART_INDICATORS
            .iter()
            .any(|indicator| normalized.contains(indicator));

        // The simple arm must win before the complex arm is considered:
        // a short single-term query stays simple even though neither
        // comparison nor multi-part is present in both branches' terms.
        if word_count <= 10 && term_count <= 1 && !has_comparison && !has_multi_part {
            Complexity::Simple
        } else if word_count > 25 || term_count > 3 || (has_comparison && has_multi_part) {
            Complexity::Complex
        } else {
            Complexity::Moderate
        }
    }
}

impl Default for QueryAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalize a lowered query: strip punctuation except '?', collapse runs of
/// whitespace, trim.
fn normalize(lowered: &str) -> String {
    let stripped = STRIP_RE.replace_all(lowered, "");
    let collapsed = COLLAPSE_WS_RE.replace_all(&stripped, " ");
    collapsed.trim().to_string()
}

/// Whether a normalized query reads as a question.
fn is_question(normalized: &str) -> bool {
    if normalized.contains('?') {
        return true;
    }

    QUESTION_WORDS
        .iter()
        .any(|word| normalized.starts_with(&format!("{} ", word)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NumberKind;

    #[test]
    fn test_normalize() {
        assert_eq!(
            normalize("what's   the  50/30/20 rule?"),
            "whats the 503020 rule?"
        );
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_analyze_empty_query() {
        let analyzer = QueryAnalyzer::new();
        let analysis = analyzer.analyze("");

        assert!(!analysis.is_question);
        assert!(analysis.topics.is_empty());
        assert!(analysis.numbers.is_empty());
        assert_eq!(analysis.complexity, Complexity::Simple);
    }

    #[test]
    fn test_analyze_budget_question() {
        let analyzer = QueryAnalyzer::new();
        let analysis = analyzer.analyze("What is the 50/30/20 rule for a $5,000 budget?");

        assert!(analysis.is_question);
        assert!(analysis.topic_score("budgeting").unwrap_or(0.0) > 0.0);

        let currency: Vec<_> = analysis
            .numbers
            .iter()
            .filter(|n| n.kind == NumberKind::Currency)
            .collect();
        assert_eq!(currency.len(), 1);
        assert_eq!(currency[0].value, 5000.0);

        // The currency span must not reappear as a generic number
        assert!(analysis
            .numbers
            .iter()
            .filter(|n| n.kind == NumberKind::Number)
            .all(|n| n.raw_text != "5,000" && n.raw_text != "5000"));
    }

    #[test]
    fn test_question_detection_lead_word() {
        let analyzer = QueryAnalyzer::new();
        assert!(analyzer.analyze("should i refinance my mortgage").is_question);
        assert!(!analyzer.analyze("i refinanced my mortgage").is_question);
    }

    #[test]
    fn test_question_detection_question_mark() {
        let analyzer = QueryAnalyzer::new();
        assert!(analyzer.analyze("my mortgage, refinance?").is_question);
    }

    #[test]
    fn test_complexity_simple() {
        let analyzer = QueryAnalyzer::new();
        let analysis = analyzer.analyze("what is a budget");
        assert_eq!(analysis.complexity, Complexity::Simple);
    }

    #[test]
    fn test_complexity_complex_by_word_count() {
        let analyzer = QueryAnalyzer::new();
        let long_query = "please tell me in great detail everything that a person \
                          just starting out really ought to know about building a \
                          monthly plan for organizing household money";
        let analysis = analyzer.analyze(long_query);
        assert_eq!(analysis.complexity, Complexity::Complex);
    }

    #[test]
    fn test_complexity_complex_by_comparison_and_multipart() {
        let analyzer = QueryAnalyzer::new();
        let analysis =
            analyzer.analyze("compare a roth ira versus a 401k and also explain the tax rules");
        assert_eq!(analysis.complexity, Complexity::Complex);
    }

    #[test]
    fn test_complexity_moderate() {
        let analyzer = QueryAnalyzer::new();
        // Two financial terms push this past simple without reaching complex
        let analysis = analyzer.analyze("how should i split money between savings and debt");
        assert_eq!(analysis.complexity, Complexity::Moderate);
    }

    #[test]
    fn test_topics_ordered_descending() {
        let analyzer = QueryAnalyzer::new();
        let analysis =
            analyzer.analyze("budget budgeting spending expense income versus one stock");

        for pair in analysis.topics.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }
}
