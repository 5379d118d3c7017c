//! The retrieval-augmented answer pipeline.
//!
//! Sequences query analysis, multi-query retrieval, deduplication, and
//! structured answer synthesis:
//!
//! 1. [`finsight_query::QueryAnalyzer`] turns the raw question into an
//!    analyzed query and a bounded list of retrieval queries.
//! 2. [`aggregator`] runs those queries against the knowledge store, merges
//!    and deduplicates the results.
//! 3. [`synthesizer::AnswerSynthesizer`] assembles a context block, invokes
//!    the generation capability, and parses the structured answer, degrading
//!    gracefully instead of failing.
//! 4. [`pipeline::Pipeline`] ties the stages together and guarantees the
//!    caller always receives a well-formed response.

pub mod aggregator;
pub mod extract;
pub mod pipeline;
pub mod synthesizer;
pub mod types;

#[cfg(test)]
pub(crate) mod testutil;


// Re-export commonly used types
pub use pipeline::{Pipeline, PipelineConfig};
pub use synthesizer::AnswerSynthesizer;
pub use types::{
    ChatTurn, Citation, Diagnostics, PipelineResponse, SynthesisOutcome, SynthesizedAnswer,
};
