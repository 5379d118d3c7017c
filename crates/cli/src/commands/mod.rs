//! Command handlers for the Finsight CLI.
//!
//! This module organizes all CLI commands into separate submodules.

pub mod ask;
pub mod ingest;
pub mod stats;

// Re-export command types for convenience
pub use ask::AskCommand;
pub use ingest::IngestCommand;
pub use stats::StatsCommand;

use finsight_core::{config::AppConfig, AppResult};
use finsight_knowledge::{create_provider, SqliteStore};
use std::sync::Arc;

/// Open the workspace knowledge store with the configured embedding provider.
pub fn open_store(config: &AppConfig) -> AppResult<Arc<SqliteStore>> {
    let embedder = create_provider(
        &config.embedding_provider,
        &config.embedding_model,
        config.endpoint.as_deref(),
    )?;

    let store = SqliteStore::open(&config.store_path(), embedder)?;
    Ok(Arc::new(store))
}
