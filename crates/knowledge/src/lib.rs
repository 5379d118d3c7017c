//! Knowledge store for the Finsight advisor.
//!
//! Stores financial passages as embedded chunks in a local SQLite index and
//! retrieves them by vector similarity. The rest of the pipeline depends only
//! on the [`KnowledgeStore`] trait: ordered scored passages out, validated
//! ingestion records in.

pub mod chunker;
pub mod embeddings;
pub mod index;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use embeddings::{create_provider, EmbeddingProvider};
pub use store::{KnowledgeStore, SqliteStore};
pub use types::{KnowledgeRecord, PassageMeta, ScoredPassage, StoreStats};
