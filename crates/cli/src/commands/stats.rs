//! Stats command handler.
//!
//! Shows knowledge store counters.

use clap::Args;
use finsight_core::{config::AppConfig, AppError, AppResult};

/// Show knowledge store statistics
#[derive(Args, Debug)]
pub struct StatsCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatsCommand {
    /// Execute the stats command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing stats command");

        let store = super::open_store(config)?;
        let stats = store.stats().await?;

        if self.json {
            let output = serde_json::json!({
                "recordsCount": stats.records_count,
                "chunksCount": stats.chunks_count,
                "storePath": config.store_path(),
            });
            println!(
                "{}",
                serde_json::to_string_pretty(&output)
                    .map_err(|e| AppError::Serialization(e.to_string()))?
            );
        } else {
            println!(
                "Knowledge store: {} records, {} chunks ({})",
                stats.records_count,
                stats.chunks_count,
                config.store_path().display()
            );
        }

        Ok(())
    }
}
