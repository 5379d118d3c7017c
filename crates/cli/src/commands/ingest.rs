//! Ingest command handler.
//!
//! Reads a JSON array of knowledge records and stores them. Records missing
//! content are dropped before reaching the store; the rest of the batch
//! still ingests.

use clap::Args;
use finsight_core::{config::AppConfig, AppError, AppResult};
use finsight_knowledge::{KnowledgeRecord, KnowledgeStore};
use std::path::PathBuf;

/// Ingest knowledge records from a JSON file
#[derive(Args, Debug)]
pub struct IngestCommand {
    /// Path to a JSON file holding an array of records
    pub file: PathBuf,

    /// Reset the store before ingesting
    #[arg(long)]
    pub reset: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl IngestCommand {
    /// Execute the ingest command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ingest command for {:?}", self.file);

        let contents = std::fs::read_to_string(&self.file).map_err(|e| {
            AppError::Knowledge(format!("Failed to read {:?}: {}", self.file, e))
        })?;

        let raw_items: Vec<serde_json::Value> = serde_json::from_str(&contents).map_err(|e| {
            AppError::Knowledge(format!("{:?} is not a JSON array of records: {}", self.file, e))
        })?;

        // Drop malformed records (missing content) with a warning; the rest
        // of the batch proceeds.
        let total = raw_items.len();
        let records: Vec<KnowledgeRecord> = raw_items
            .into_iter()
            .enumerate()
            .filter_map(|(i, item)| match serde_json::from_value(item) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!("Dropping record {}: {}", i, e);
                    None
                }
            })
            .collect();
        let dropped = total - records.len();

        let store = super::open_store(config)?;

        if self.reset {
            tracing::info!("Resetting knowledge store before ingest");
            store.reset().await?;
        }

        let chunks = store.ingest(&records).await?;

        if self.json {
            let output = serde_json::json!({
                "recordsRead": total,
                "recordsDropped": dropped,
                "chunksStored": chunks,
            });
            println!(
                "{}",
                serde_json::to_string_pretty(&output)
                    .map_err(|e| AppError::Serialization(e.to_string()))?
            );
        } else {
            println!(
                "Ingested {} records as {} chunks ({} dropped)",
                records.len(),
                chunks,
                dropped
            );
        }

        Ok(())
    }
}
