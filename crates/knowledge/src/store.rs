//! The knowledge store contract and its SQLite implementation.
//!
//! The pipeline depends only on the [`KnowledgeStore`] trait; [`SqliteStore`]
//! is the local implementation composing the chunker, an embedding provider,
//! and the SQLite index.

use crate::chunker;
use crate::embeddings::EmbeddingProvider;
use crate::index::{self, PassageRow};
use crate::types::{KnowledgeRecord, ScoredPassage, StoreStats};
use chrono::Utc;
use finsight_core::AppResult;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Default chunk size in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Default overlap between consecutive chunks, in characters.
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Contract between the pipeline and its retrieval capability.
///
/// `retrieve` returns an empty Vec (never an error) when the store holds
/// nothing relevant or has not been populated yet. `ingest` returns the
/// number of chunks stored; records with empty content are dropped without
/// failing the batch.
#[async_trait::async_trait]
pub trait KnowledgeStore: Send + Sync {
    /// Retrieve up to `k` passages ordered by descending relevance.
    async fn retrieve(&self, query: &str, k: usize) -> AppResult<Vec<ScoredPassage>>;

    /// Chunk, embed, and persist records. Returns the stored chunk count.
    async fn ingest(&self, records: &[KnowledgeRecord]) -> AppResult<usize>;
}

/// SQLite-backed knowledge store.
///
/// Ingestion is serialized through the connection mutex and committed in a
/// single transaction per batch, so readers never observe a half-written
/// index. Re-ingesting identical content produces duplicate rows; collapsing
/// duplicates in results is the retrieval aggregator's responsibility.
pub struct SqliteStore {
    conn: Mutex<rusqlite::Connection>,
    embedder: Arc<dyn EmbeddingProvider>,
    chunk_size: usize,
    chunk_overlap: usize,
}

impl SqliteStore {
    /// Open (or create) a store at the given path.
    pub fn open(db_path: &Path, embedder: Arc<dyn EmbeddingProvider>) -> AppResult<Self> {
        let conn = index::init_index(db_path)?;

        Ok(Self {
            conn: Mutex::new(conn),
            embedder,
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        })
    }

    /// Override the chunking window.
    pub fn with_chunking(mut self, chunk_size: usize, chunk_overlap: usize) -> Self {
        self.chunk_size = chunk_size;
        self.chunk_overlap = chunk_overlap;
        self
    }

    /// Get record and chunk counters.
    pub async fn stats(&self) -> AppResult<StoreStats> {
        let conn = self.conn.lock().await;
        let (records_count, chunks_count) = index::get_stats(&conn)?;

        Ok(StoreStats {
            records_count,
            chunks_count,
        })
    }

    /// Delete all stored records and passages.
    pub async fn reset(&self) -> AppResult<()> {
        let conn = self.conn.lock().await;
        index::reset_index(&conn)
    }
}

#[async_trait::async_trait]
impl KnowledgeStore for SqliteStore {
    async fn retrieve(&self, query: &str, k: usize) -> AppResult<Vec<ScoredPassage>> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed(query).await?;

        let conn = self.conn.lock().await;
        let results = index::query_passages(&conn, &query_embedding, k)?;

        tracing::debug!("Retrieved {} passages for query", results.len());
        Ok(results)
    }

    async fn ingest(&self, records: &[KnowledgeRecord]) -> AppResult<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        // Validate and chunk first; embedding happens before the write lock
        // so retrievals are only blocked for the actual index write.
        struct Prepared {
            record: KnowledgeRecord,
            chunks: Vec<crate::types::ChunkCandidate>,
        }

        let mut prepared = Vec::new();
        for record in records {
            if record.content.trim().is_empty() {
                tracing::warn!("Skipping record without content: '{}'", record.title);
                continue;
            }

            let chunks = chunker::chunk_text(&record.content, self.chunk_size, self.chunk_overlap);
            prepared.push(Prepared {
                record: record.clone(),
                chunks,
            });
        }

        if prepared.is_empty() {
            return Ok(0);
        }

        let texts: Vec<String> = prepared
            .iter()
            .flat_map(|p| p.chunks.iter().map(|c| c.text.clone()))
            .collect();
        let mut embeddings = self.embedder.embed_batch(&texts).await?.into_iter();

        // Single transaction per batch: readers never see a partial write.
        let mut conn = self.conn.lock().await;
        let tx = conn
            .transaction()
            .map_err(|e| finsight_core::AppError::Knowledge(format!("Failed to begin transaction: {}", e)))?;

        let now = Utc::now().to_rfc3339();
        let mut stored_chunks = 0usize;

        for p in &prepared {
            let record_id = uuid::Uuid::new_v4().to_string();
            let meta_json = serde_json::to_string(&p.record.passage_meta())?;

            index::insert_record(
                &tx,
                &record_id,
                &p.record.title,
                &p.record.source,
                &p.record.source_type,
                &p.record.url,
                &now,
                p.chunks.len() as u32,
            )?;

            for (chunk, embedding) in p.chunks.iter().zip(&mut embeddings) {
                index::insert_passage(
                    &tx,
                    &PassageRow {
                        id: uuid::Uuid::new_v4().to_string(),
                        record_id: record_id.clone(),
                        position: chunk.position,
                        content: chunk.text.clone(),
                        embedding,
                        metadata_json: meta_json.clone(),
                    },
                )?;
                stored_chunks += 1;
            }
        }

        tx.commit()
            .map_err(|e| finsight_core::AppError::Knowledge(format!("Failed to commit ingest: {}", e)))?;

        tracing::info!(
            "Ingested {} records as {} chunks",
            prepared.len(),
            stored_chunks
        );

        Ok(stored_chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::providers::trigram::TrigramProvider;
    use tempfile::TempDir;

    fn open_store(dir: &TempDir) -> SqliteStore {
        let embedder = Arc::new(TrigramProvider::new(384));
        SqliteStore::open(&dir.path().join("knowledge.db"), embedder).unwrap()
    }

    #[tokio::test]
    async fn test_retrieve_from_empty_store() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        let results = store.retrieve("anything", 5).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_ingest_and_retrieve() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        let records = vec![
            KnowledgeRecord::new("Emergency funds", "An emergency fund covers three to six months of expenses."),
            KnowledgeRecord::new("Index funds", "Index funds track a market index at low cost."),
        ];

        let stored = store.ingest(&records).await.unwrap();
        assert_eq!(stored, 2);

        let results = store.retrieve("emergency fund expenses", 2).await.unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].content.contains("emergency fund"));
        assert_eq!(results[0].meta.title, "Emergency funds");

        // Descending relevance
        assert!(results[0].score >= results[1].score);
    }

    #[tokio::test]
    async fn test_ingest_empty_batch() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        assert_eq!(store.ingest(&[]).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_ingest_skips_empty_content() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        let records = vec![
            KnowledgeRecord::new("Empty", ""),
            KnowledgeRecord::new("Good", "Paying the balance in full avoids interest."),
        ];

        let stored = store.ingest(&records).await.unwrap();
        assert_eq!(stored, 1);

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.records_count, 1);
        assert_eq!(stats.chunks_count, 1);
    }

    #[tokio::test]
    async fn test_long_content_chunked() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir).with_chunking(100, 20);

        let long_text = "diversification spreads risk across assets. ".repeat(20);
        let stored = store
            .ingest(&[KnowledgeRecord::new("Diversification", &long_text)])
            .await
            .unwrap();

        assert!(stored > 1);
    }

    #[tokio::test]
    async fn test_retrieve_bounded_by_k() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        let records: Vec<_> = (0..5)
            .map(|i| KnowledgeRecord::new(format!("Doc {}", i), format!("budget advice number {}", i)))
            .collect();
        store.ingest(&records).await.unwrap();

        let results = store.retrieve("budget advice", 3).await.unwrap();
        assert_eq!(results.len(), 3);
    }

    #[tokio::test]
    async fn test_persistence_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("knowledge.db");
        let embedder = Arc::new(TrigramProvider::new(384));

        {
            let store = SqliteStore::open(&path, embedder.clone()).unwrap();
            store
                .ingest(&[KnowledgeRecord::new("Saved", "compound interest grows savings")])
                .await
                .unwrap();
        }

        let reopened = SqliteStore::open(&path, embedder).unwrap();
        let results = reopened.retrieve("compound interest", 1).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].meta.title, "Saved");
    }

    #[tokio::test]
    async fn test_concurrent_ingest_serialized() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(open_store(&dir));

        let batch_a: Vec<_> = (0..3)
            .map(|i| KnowledgeRecord::new(format!("A{}", i), format!("first batch text {}", i)))
            .collect();
        let batch_b: Vec<_> = (0..3)
            .map(|i| KnowledgeRecord::new(format!("B{}", i), format!("second batch text {}", i)))
            .collect();

        let store_a = store.clone();
        let store_b = store.clone();
        let (a, b) = tokio::join!(
            async move { store_a.ingest(&batch_a).await },
            async move { store_b.ingest(&batch_b).await },
        );

        assert_eq!(a.unwrap() + b.unwrap(), 6);
        assert_eq!(store.stats().await.unwrap().chunks_count, 6);
    }

    #[tokio::test]
    async fn test_reingest_duplicates_left_to_aggregator() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        let record = KnowledgeRecord::new("Dup", "identical passage content");
        store.ingest(&[record.clone()]).await.unwrap();
        store.ingest(&[record]).await.unwrap();

        // The store itself does not dedup; both rows are retrievable
        let results = store.retrieve("identical passage content", 5).await.unwrap();
        assert_eq!(results.len(), 2);
    }
}
