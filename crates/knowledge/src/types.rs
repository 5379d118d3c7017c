//! Knowledge store type definitions.

use serde::{Deserialize, Serialize};

/// A record accepted by the ingestion boundary.
///
/// `content` is the only required field; everything else defaults. Arbitrary
/// extra metadata travels in the open `extra` map and is persisted alongside
/// the standard fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeRecord {
    /// Title of the source document
    #[serde(default)]
    pub title: String,

    /// The text to store. Records with empty content are dropped at the
    /// ingestion boundary.
    pub content: String,

    /// Where the content came from
    #[serde(default = "default_source")]
    pub source: String,

    /// Source category (e.g., "knowledge_item", "article")
    #[serde(default = "default_source_type")]
    pub source_type: String,

    /// URL of the source document, if any
    #[serde(default)]
    pub url: String,

    /// Arbitrary additional metadata
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

fn default_source() -> String {
    "financial_knowledge".to_string()
}

fn default_source_type() -> String {
    "knowledge_item".to_string()
}

impl KnowledgeRecord {
    /// Create a record with just a title and content.
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            source: default_source(),
            source_type: default_source_type(),
            url: String::new(),
            metadata: serde_json::Map::new(),
        }
    }

    /// Build the passage metadata persisted with each chunk of this record.
    pub fn passage_meta(&self) -> PassageMeta {
        PassageMeta {
            title: self.title.clone(),
            source: self.source.clone(),
            source_type: self.source_type.clone(),
            url: self.url.clone(),
            extra: self.metadata.clone(),
        }
    }
}

/// Metadata carried by every stored passage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PassageMeta {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub source: String,

    #[serde(default)]
    pub source_type: String,

    #[serde(default)]
    pub url: String,

    /// Arbitrary additional metadata, flattened into the stored JSON
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A passage returned from retrieval, with its relevance score.
///
/// Transient: owned by the retrieval call that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredPassage {
    /// Chunk text
    pub content: String,

    /// Metadata inherited from the ingested record
    pub meta: PassageMeta,

    /// Similarity score, higher is more relevant
    pub score: f32,
}

/// Counters for a knowledge store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreStats {
    /// Number of ingested records
    pub records_count: u32,

    /// Number of stored chunks
    pub chunks_count: u32,
}

/// Internal chunk candidate before embedding.
#[derive(Debug, Clone)]
pub struct ChunkCandidate {
    pub position: u32,
    pub text: String,
}
