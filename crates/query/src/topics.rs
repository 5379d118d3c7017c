//! Topic classification over a keyword taxonomy.
//!
//! Maps free text to a ranked set of financial topics with confidence scores
//! and matched-keyword evidence. Longer, more specific phrases score higher
//! per hit; per-topic totals are capped at 1.0.

use crate::types::TopicScore;
use regex::Regex;

/// A topic taxonomy: named topics with associated keyword phrases.
///
/// Keyword patterns are compiled once at construction. Classification is
/// deterministic and has no side effects.
pub struct TopicTaxonomy {
    topics: Vec<TopicEntry>,
}

struct TopicEntry {
    name: String,
    keywords: Vec<KeywordPattern>,
}

struct KeywordPattern {
    phrase: String,
    word_count: usize,
    pattern: Regex,
}

impl TopicTaxonomy {
    /// Build a taxonomy from (topic, keywords) pairs.
    ///
    /// Declaration order is preserved and used to break score ties.
    pub fn new<I, K>(topics: I) -> Self
    where
        I: IntoIterator<Item = (String, K)>,
        K: IntoIterator<Item = String>,
    {
        let topics = topics
            .into_iter()
            .map(|(name, keywords)| TopicEntry {
                name,
                keywords: keywords
                    .into_iter()
                    .map(|phrase| {
                        // Whole-word/phrase matching; the phrase itself is
                        // escaped so taxonomy entries are always literal.
                        let pattern =
                            Regex::new(&format!(r"\b{}\b", regex::escape(&phrase)))
                                .expect("escaped keyword pattern is valid");
                        KeywordPattern {
                            word_count: phrase.split_whitespace().count(),
                            phrase,
                            pattern,
                        }
                    })
                    .collect(),
            })
            .collect();

        Self { topics }
    }

    /// The built-in financial taxonomy.
    pub fn financial() -> Self {
        let topics: Vec<(&str, Vec<&str>)> = vec![
            (
                "budgeting",
                vec![
                    "budget", "budgeting", "50/30/20", "envelope", "zero-based", "expense",
                    "spending", "income", "cash flow", "track expenses",
                ],
            ),
            (
                "saving",
                vec![
                    "save", "saving", "savings", "emergency fund", "rainy day fund",
                    "sinking fund", "save money", "savings rate", "savings account",
                ],
            ),
            (
                "investing",
                vec![
                    "invest", "investing", "investment", "stock", "bond", "etf", "mutual fund",
                    "index fund", "portfolio", "asset allocation", "diversification",
                    "retirement", "401k", "ira", "roth",
                ],
            ),
            (
                "debt",
                vec![
                    "debt", "loan", "credit card", "mortgage", "student loan", "car loan",
                    "personal loan", "debt snowball", "debt avalanche", "interest rate",
                    "refinance", "consolidation",
                ],
            ),
            (
                "credit",
                vec![
                    "credit", "credit score", "credit report", "fico", "credit card",
                    "credit utilization", "credit history", "credit limit",
                ],
            ),
            (
                "taxes",
                vec![
                    "tax", "taxes", "tax return", "tax refund", "tax deduction", "tax credit",
                    "income tax", "property tax", "capital gains",
                ],
            ),
            (
                "insurance",
                vec![
                    "insurance", "life insurance", "health insurance", "auto insurance",
                    "home insurance", "disability insurance", "premium", "deductible",
                ],
            ),
            (
                "retirement",
                vec![
                    "retirement", "retire", "401k", "ira", "roth", "pension",
                    "social security", "retirement planning", "retirement age",
                ],
            ),
            (
                "housing",
                vec![
                    "house", "home", "mortgage", "rent", "property", "real estate",
                    "down payment", "closing costs", "homeowner", "landlord",
                ],
            ),
            (
                "financial_planning",
                vec![
                    "financial plan", "financial planning", "financial advisor",
                    "financial goals", "net worth", "estate planning", "will", "trust",
                ],
            ),
        ];

        Self::new(topics.into_iter().map(|(name, keywords)| {
            (
                name.to_string(),
                keywords.into_iter().map(String::from).collect::<Vec<_>>(),
            )
        }))
    }

    /// Classify normalized (pre-lowered) text into ranked topics.
    ///
    /// Per keyword, each non-overlapping whole-word match contributes
    /// `0.5 + 0.5 * word_count / 3`, so multi-word phrases weigh more.
    /// Topic totals are capped at 1.0; only positive scores are kept,
    /// sorted descending with stable ties.
    pub fn classify(&self, normalized: &str) -> Vec<TopicScore> {
        let mut scores: Vec<TopicScore> = Vec::new();

        for entry in &self.topics {
            let mut score = 0.0f64;
            let mut matched_keywords = Vec::new();

            for keyword in &entry.keywords {
                let occurrences = keyword.pattern.find_iter(normalized).count();
                if occurrences > 0 {
                    score += occurrences as f64
                        * (0.5 + 0.5 * keyword.word_count as f64 / 3.0);
                    matched_keywords.push(keyword.phrase.clone());
                }
            }

            if score > 0.0 {
                scores.push(TopicScore {
                    topic: entry.name.clone(),
                    score: score.min(1.0),
                    matched_keywords,
                });
            }
        }

        // sort_by is stable, so equal scores keep declaration order
        scores.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        scores
    }

    /// Count financial-term hits for complexity scoring.
    ///
    /// Substring match with surrounding-space boundary, counted once per
    /// keyword across all topics' lists. Keywords appearing in multiple
    /// topic lists (e.g. "credit card") count once per list on purpose.
    pub fn term_count(&self, normalized: &str) -> usize {
        let padded = format!(" {} ", normalized);
        self.topics
            .iter()
            .flat_map(|entry| entry.keywords.iter())
            .filter(|keyword| padded.contains(&format!(" {} ", keyword.phrase)))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_single_topic() {
        let taxonomy = TopicTaxonomy::financial();
        let scores = taxonomy.classify("how do i make a budget");

        assert_eq!(scores[0].topic, "budgeting");
        assert!(scores[0].score > 0.0);
        assert!(scores[0].matched_keywords.contains(&"budget".to_string()));
    }

    #[test]
    fn test_classify_no_match() {
        let taxonomy = TopicTaxonomy::financial();
        let scores = taxonomy.classify("what is the weather today");
        assert!(scores.is_empty());
    }

    #[test]
    fn test_score_monotone_in_match_count() {
        let taxonomy = TopicTaxonomy::financial();
        let one = taxonomy.classify("my premium");
        let two = taxonomy.classify("my premium and her premium");

        let s1 = one.iter().find(|t| t.topic == "insurance").unwrap().score;
        let s2 = two.iter().find(|t| t.topic == "insurance").unwrap().score;
        assert!(s2 >= s1);
    }

    #[test]
    fn test_longer_phrases_score_higher_per_hit() {
        let taxonomy = TopicTaxonomy::new(vec![
            ("short".to_string(), vec!["fund".to_string()]),
            ("long".to_string(), vec!["emergency fund plan".to_string()]),
        ]);
        let scores = taxonomy.classify("emergency fund plan");

        let short = scores.iter().find(|t| t.topic == "short").unwrap().score;
        let long = scores.iter().find(|t| t.topic == "long").unwrap().score;
        // One hit each: 0.5 + 0.5*1/3 vs 0.5 + 0.5*3/3
        assert!(long > short);
    }

    #[test]
    fn test_score_capped_at_one() {
        let taxonomy = TopicTaxonomy::financial();
        let scores =
            taxonomy.classify("budget budget budget budget spending income expense budgeting");

        let budgeting = scores.iter().find(|t| t.topic == "budgeting").unwrap();
        assert!(budgeting.score <= 1.0);
    }

    #[test]
    fn test_stable_tie_order() {
        let taxonomy = TopicTaxonomy::new(vec![
            ("alpha".to_string(), vec!["apple".to_string()]),
            ("beta".to_string(), vec!["pear".to_string()]),
        ]);
        let scores = taxonomy.classify("apple pear");

        // Equal scores: declaration order preserved
        assert_eq!(scores[0].topic, "alpha");
        assert_eq!(scores[1].topic, "beta");
    }

    #[test]
    fn test_whole_word_matching() {
        let taxonomy = TopicTaxonomy::financial();
        // "taxi" must not match the "tax" keyword
        let scores = taxonomy.classify("i took a taxi");
        assert!(scores.iter().all(|t| t.topic != "taxes"));
    }

    #[test]
    fn test_term_count_not_deduplicated() {
        let taxonomy = TopicTaxonomy::financial();
        // "credit card" is listed under both debt and credit; "credit" under credit
        let count = taxonomy.term_count("my credit card");
        assert!(count >= 3);
    }
}
