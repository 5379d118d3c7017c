//! Ask command handler.
//!
//! Runs one pipeline invocation: analyze, retrieve, synthesize, print.

use clap::Args;
use finsight_core::{config::AppConfig, AppResult};
use finsight_llm::create_client;
use finsight_pipeline::{Pipeline, PipelineConfig, SynthesisOutcome};
use std::time::Duration;

/// Ask a financial question
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub query: String,

    /// Number of passages to retrieve
    #[arg(short = 'k', long, default_value = "5")]
    pub results: usize,

    /// Output as JSON (includes diagnostics)
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");

        let store = super::open_store(config)?;
        let client = create_client(&config.provider, config.endpoint.as_deref())?;

        let pipeline = Pipeline::new(
            store,
            client,
            PipelineConfig {
                model: config.model.clone(),
                call_timeout: Duration::from_secs(config.call_timeout_secs),
                ..PipelineConfig::default()
            },
        );

        let response = pipeline
            .process_with_budget(&self.query, &[], self.results)
            .await;

        if self.json {
            let json = serde_json::to_string_pretty(&response)
                .map_err(|e| finsight_core::AppError::Serialization(e.to_string()))?;
            println!("{}", json);
            return Ok(());
        }

        println!("{}", response.answer.answer);

        if !response.answer.citations.is_empty() {
            println!("\nSources:");
            for citation in &response.answer.citations {
                match &citation.source_url {
                    Some(url) => println!(
                        "  - {} ({}) [relevance {:.2}]",
                        citation.source_title, url, citation.relevance
                    ),
                    None => println!(
                        "  - {} [relevance {:.2}]",
                        citation.source_title, citation.relevance
                    ),
                }
            }
        }

        if !response.answer.follow_up_questions.is_empty() {
            println!("\nYou might also ask:");
            for question in &response.answer.follow_up_questions {
                println!("  - {}", question);
            }
        }

        let tier = match response.outcome {
            SynthesisOutcome::Structured => "structured",
            SynthesisOutcome::Degraded => "degraded",
            SynthesisOutcome::Failed => "failed",
        };
        println!(
            "\nConfidence: {:.2} ({})",
            response.answer.confidence, tier
        );

        Ok(())
    }
}
