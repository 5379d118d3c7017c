//! Query analysis type definitions.

use serde::{Deserialize, Serialize};

/// Complexity classification of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Simple,
    Moderate,
    Complex,
}

/// Kind of numeric entity found in a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NumberKind {
    /// Dollar amount (e.g., "$5,000")
    Currency,
    /// Percentage (e.g., "7%")
    Percentage,
    /// Plain number
    Number,
}

/// A numeric value extracted from a query, with its surrounding context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumericEntity {
    /// Parsed numeric value (thousands separators removed)
    pub value: f64,

    /// What kind of quantity this is
    pub kind: NumberKind,

    /// The exact text that matched (e.g., "$5,000")
    pub raw_text: String,

    /// Up to 20 characters of text on either side of the match
    pub context: String,
}

/// A topic matched in a query, with confidence and keyword evidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicScore {
    /// Topic name (e.g., "budgeting")
    pub topic: String,

    /// Confidence score in [0, 1]
    pub score: f64,

    /// Keywords from the topic's list that matched, in declaration order
    pub matched_keywords: Vec<String>,
}

/// Result of analyzing a raw user query.
///
/// Invariants: `topics` holds only positive scores, ordered descending
/// (ties stable in taxonomy declaration order); `numbers` has no duplicate
/// `raw_text` entries across kinds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzedQuery {
    /// The query exactly as the user typed it
    pub original: String,

    /// Lower-cased, whitespace-collapsed, punctuation stripped except '?'
    pub normalized: String,

    /// Matched topics, ordered descending by score
    pub topics: Vec<TopicScore>,

    /// Whether the query reads as a question
    pub is_question: bool,

    /// Numeric entities found in the query
    pub numbers: Vec<NumericEntity>,

    /// Overall complexity classification
    pub complexity: Complexity,
}

impl AnalyzedQuery {
    /// Look up the score for a topic by name, if it matched.
    pub fn topic_score(&self, topic: &str) -> Option<f64> {
        self.topics.iter().find(|t| t.topic == topic).map(|t| t.score)
    }
}
