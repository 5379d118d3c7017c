//! Query understanding for the Finsight advisor.
//!
//! Turns a raw user question into an [`AnalyzedQuery`] (normalization, topic
//! classification, numeric entity extraction, complexity scoring) and expands
//! it into a bounded list of retrieval queries.
//!
//! Everything in this crate is pure and deterministic: the only state is the
//! topic taxonomy read once at construction.

pub mod analyzer;
pub mod entities;
pub mod expand;
pub mod topics;
pub mod types;

// Re-export commonly used types
pub use analyzer::QueryAnalyzer;
pub use expand::expand_queries;
pub use topics::TopicTaxonomy;
pub use types::{AnalyzedQuery, Complexity, NumberKind, NumericEntity, TopicScore};
