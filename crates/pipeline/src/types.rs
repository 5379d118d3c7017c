//! Answer pipeline type definitions.

use finsight_query::AnalyzedQuery;
use serde::{Deserialize, Serialize};

/// The apologetic answer returned when generation itself fails.
pub const APOLOGY_ANSWER: &str = "I'm sorry, I encountered a problem while answering your \
                                  question. Please try asking it differently.";

/// Confidence attached to degraded (unparsable-output) answers.
pub const DEGRADED_CONFIDENCE: f32 = 0.7;

/// Generic follow-up questions used by the fallback paths.
pub const GENERIC_FOLLOW_UPS: [&str; 3] = [
    "Can you explain more about this topic?",
    "What are the next steps I should take?",
    "How does this apply to my specific situation?",
];

/// A citation to a source used in the answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Citation {
    /// Title of the source document
    #[serde(default)]
    pub source_title: String,

    /// URL of the source document, if available
    #[serde(default)]
    pub source_url: Option<String>,

    /// Relevance score from 0.0 to 1.0
    #[serde(default)]
    pub relevance: f32,

    /// Relevant quote from the source
    #[serde(default)]
    pub quote: Option<String>,
}

/// Structured answer with citations.
///
/// Every field is present under every path: the fallback constructors and
/// the serde defaults guarantee no field is ever missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SynthesizedAnswer {
    /// The answer to the user's question
    #[serde(default)]
    pub answer: String,

    /// Citations for sources used in the answer
    #[serde(default)]
    pub citations: Vec<Citation>,

    /// Confidence score from 0.0 to 1.0
    #[serde(default)]
    pub confidence: f32,

    /// Suggested follow-up questions
    #[serde(default)]
    pub follow_up_questions: Vec<String>,
}

impl SynthesizedAnswer {
    /// The final fallback: apologetic answer, nothing else.
    pub fn apologetic() -> Self {
        Self {
            answer: APOLOGY_ANSWER.to_string(),
            citations: Vec::new(),
            confidence: 0.0,
            follow_up_questions: Vec::new(),
        }
    }

    /// Clamp confidence and citation relevance into [0, 1].
    pub fn clamped(mut self) -> Self {
        self.confidence = self.confidence.clamp(0.0, 1.0);
        for citation in &mut self.citations {
            citation.relevance = citation.relevance.clamp(0.0, 1.0);
        }
        self
    }
}

/// How the answer was produced.
///
/// Lets callers distinguish confidence tiers without inspecting errors:
/// `Structured` means the model's JSON parsed, `Degraded` means generation
/// succeeded but its output did not parse, `Failed` means generation itself
/// failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SynthesisOutcome {
    Structured,
    Degraded,
    Failed,
}

/// One turn of prior conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    /// "user" or "assistant"
    pub role: String,

    /// Message text
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Diagnostic metadata attached to a pipeline response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostics {
    /// The query exactly as received
    pub query: String,

    /// Full query analysis
    pub analysis: AnalyzedQuery,

    /// Unique passages retrieved before budget truncation
    pub passages_retrieved: usize,

    /// Detail of an error recovered at the orchestrator boundary, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Final pipeline output: the answer plus how it was produced and why.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResponse {
    /// The synthesized answer (always well-formed)
    pub answer: SynthesizedAnswer,

    /// Which synthesis path produced the answer
    pub outcome: SynthesisOutcome,

    /// Diagnostic metadata
    pub diagnostics: Diagnostics,
}
