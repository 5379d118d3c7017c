//! Pipeline orchestration.
//!
//! Sequences query analysis → multi-query expansion → retrieval aggregation
//! → answer synthesis, and guarantees the caller always receives a
//! well-formed response: any error escaping an inner stage is converted here
//! into the apologetic fallback with the detail attached as a diagnostic.

use crate::aggregator;
use crate::synthesizer::AnswerSynthesizer;
use crate::types::{ChatTurn, Diagnostics, PipelineResponse, SynthesisOutcome, SynthesizedAnswer};
use finsight_core::AppResult;
use finsight_knowledge::KnowledgeStore;
use finsight_llm::LlmClient;
use finsight_query::{expand_queries, QueryAnalyzer};
use std::sync::Arc;
use std::time::Duration;

/// Default number of passages handed to the synthesizer.
pub const DEFAULT_RESULT_BUDGET: usize = 5;

/// Tuning knobs for the pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Generation model identifier
    pub model: String,

    /// Maximum number of expanded retrieval queries
    pub max_queries: usize,

    /// Timeout for each knowledge-store and generation call
    pub call_timeout: Duration,

    /// Sampling temperature for generation
    pub temperature: f32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            model: "llama3.2".to_string(),
            max_queries: 3,
            call_timeout: Duration::from_secs(60),
            temperature: 0.2,
        }
    }
}

/// The retrieval-augmented answer pipeline.
///
/// Explicitly constructed once at startup and shared by reference; holds no
/// per-request state. The knowledge store is the only shared mutable
/// collaborator, and only its ingestion path mutates.
pub struct Pipeline {
    analyzer: QueryAnalyzer,
    store: Arc<dyn KnowledgeStore>,
    synthesizer: AnswerSynthesizer,
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a pipeline from its collaborators.
    pub fn new(
        store: Arc<dyn KnowledgeStore>,
        client: Arc<dyn LlmClient>,
        config: PipelineConfig,
    ) -> Self {
        let synthesizer = AnswerSynthesizer::new(client, &config.model)
            .with_timeout(config.call_timeout)
            .with_temperature(config.temperature);

        Self {
            analyzer: QueryAnalyzer::new(),
            store,
            synthesizer,
            config,
        }
    }

    /// Process a query with the default result budget.
    pub async fn process(&self, query: &str, chat_history: &[ChatTurn]) -> PipelineResponse {
        self.process_with_budget(query, chat_history, DEFAULT_RESULT_BUDGET)
            .await
    }

    /// Process a query, retrieving at most `result_budget` passages.
    ///
    /// Never returns an error: inner failures degrade per their own
    /// contracts, and anything unexpected is converted to the apologetic
    /// fallback at this boundary.
    pub async fn process_with_budget(
        &self,
        query: &str,
        chat_history: &[ChatTurn],
        result_budget: usize,
    ) -> PipelineResponse {
        tracing::info!("Processing query: {}", query);

        let analysis = self.analyzer.analyze(query);

        match self
            .run_stages(query, chat_history, result_budget, &analysis)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("Pipeline error recovered at boundary: {}", e);
                PipelineResponse {
                    answer: SynthesizedAnswer::apologetic(),
                    outcome: SynthesisOutcome::Failed,
                    diagnostics: Diagnostics {
                        query: query.to_string(),
                        analysis: analysis.clone(),
                        passages_retrieved: 0,
                        error: Some(e.to_string()),
                    },
                }
            }
        }
    }

    async fn run_stages(
        &self,
        query: &str,
        chat_history: &[ChatTurn],
        result_budget: usize,
        analysis: &finsight_query::AnalyzedQuery,
    ) -> AppResult<PipelineResponse> {
        let queries = expand_queries(analysis, self.config.max_queries);

        let aggregated = aggregator::aggregate(
            &queries,
            self.store.as_ref(),
            result_budget,
            result_budget,
            self.config.call_timeout,
        )
        .await;

        let (answer, outcome) = self
            .synthesizer
            .synthesize(query, chat_history, &aggregated.passages)
            .await;

        tracing::info!(
            "Answer produced via {:?} path with confidence {:.2}",
            outcome,
            answer.confidence
        );

        Ok(PipelineResponse {
            answer,
            outcome,
            diagnostics: Diagnostics {
                query: query.to_string(),
                analysis: analysis.clone(),
                passages_retrieved: aggregated.total_unique,
                error: None,
            },
        })
    }

    /// Generate follow-up questions for an existing answer.
    pub async fn follow_ups(&self, query: &str, answer: &str, count: usize) -> Vec<String> {
        self.synthesizer.generate_follow_ups(query, answer, count).await
    }
}
