//! SQLite-backed vector index for knowledge passages.

use crate::types::{PassageMeta, ScoredPassage};
use finsight_core::{AppError, AppResult};
use rusqlite::{params, Connection};
use std::path::Path;

/// A chunk row ready for insertion.
pub struct PassageRow {
    pub id: String,
    pub record_id: String,
    pub position: u32,
    pub content: String,
    pub embedding: Vec<f32>,
    pub metadata_json: String,
}

/// Initialize the SQLite index database.
pub fn init_index(db_path: &Path) -> AppResult<Connection> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| AppError::Knowledge(format!("Failed to create index directory: {}", e)))?;
    }

    let conn = Connection::open(db_path)
        .map_err(|e| AppError::Knowledge(format!("Failed to open SQLite index: {}", e)))?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS records (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            source TEXT NOT NULL,
            source_type TEXT NOT NULL,
            url TEXT NOT NULL,
            ingested_at TEXT NOT NULL,
            chunk_count INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS passages (
            id TEXT PRIMARY KEY,
            record_id TEXT NOT NULL,
            position INTEGER NOT NULL,
            content TEXT NOT NULL,
            embedding BLOB NOT NULL,
            metadata TEXT NOT NULL,
            FOREIGN KEY (record_id) REFERENCES records(id)
        );

        CREATE INDEX IF NOT EXISTS idx_passages_record ON passages(record_id);
        "#,
    )
    .map_err(|e| AppError::Knowledge(format!("Failed to create tables: {}", e)))?;

    tracing::debug!("Initialized SQLite index at {:?}", db_path);
    Ok(conn)
}

/// Insert a record row.
#[allow(clippy::too_many_arguments)]
pub fn insert_record(
    conn: &Connection,
    id: &str,
    title: &str,
    source: &str,
    source_type: &str,
    url: &str,
    ingested_at: &str,
    chunk_count: u32,
) -> AppResult<()> {
    conn.execute(
        "INSERT OR REPLACE INTO records (id, title, source, source_type, url, ingested_at, chunk_count)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![id, title, source, source_type, url, ingested_at, chunk_count as i64],
    )
    .map_err(|e| AppError::Knowledge(format!("Failed to insert record: {}", e)))?;

    Ok(())
}

/// Insert a passage row with its embedding.
pub fn insert_passage(conn: &Connection, row: &PassageRow) -> AppResult<()> {
    let embedding_bytes = embedding_to_bytes(&row.embedding);

    conn.execute(
        "INSERT OR REPLACE INTO passages (id, record_id, position, content, embedding, metadata)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            row.id,
            row.record_id,
            row.position as i64,
            row.content,
            embedding_bytes,
            row.metadata_json,
        ],
    )
    .map_err(|e| AppError::Knowledge(format!("Failed to insert passage: {}", e)))?;

    Ok(())
}

/// Query the index for the top-k passages most similar to the query embedding.
///
/// Returns an empty Vec when the index holds no passages.
pub fn query_passages(
    conn: &Connection,
    query_embedding: &[f32],
    top_k: usize,
) -> AppResult<Vec<ScoredPassage>> {
    let mut stmt = conn
        .prepare("SELECT content, embedding, metadata FROM passages")
        .map_err(|e| AppError::Knowledge(format!("Failed to prepare query: {}", e)))?;

    let rows = stmt
        .query_map([], |row| {
            let content: String = row.get(0)?;
            let embedding_bytes: Vec<u8> = row.get(1)?;
            let metadata_json: String = row.get(2)?;
            Ok((content, embedding_bytes, metadata_json))
        })
        .map_err(|e| AppError::Knowledge(format!("Failed to query passages: {}", e)))?;

    let mut results: Vec<ScoredPassage> = Vec::new();
    for row in rows {
        let (content, embedding_bytes, metadata_json) =
            row.map_err(|e| AppError::Knowledge(format!("Failed to read passage row: {}", e)))?;

        let embedding = bytes_to_embedding(&embedding_bytes)?;
        let score = cosine_similarity(query_embedding, &embedding);
        let meta: PassageMeta = serde_json::from_str(&metadata_json).unwrap_or_default();

        results.push(ScoredPassage {
            content,
            meta,
            score,
        });
    }

    // Sort by score descending
    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    results.truncate(top_k);

    tracing::debug!("Retrieved {} passages (requested top-{})", results.len(), top_k);

    Ok(results)
}

/// Get record and chunk counters.
pub fn get_stats(conn: &Connection) -> AppResult<(u32, u32)> {
    let records_count: u32 = conn
        .query_row("SELECT COUNT(*) FROM records", [], |row| {
            row.get::<_, i64>(0).map(|v| v as u32)
        })
        .map_err(|e| AppError::Knowledge(format!("Failed to count records: {}", e)))?;

    let chunks_count: u32 = conn
        .query_row("SELECT COUNT(*) FROM passages", [], |row| {
            row.get::<_, i64>(0).map(|v| v as u32)
        })
        .map_err(|e| AppError::Knowledge(format!("Failed to count passages: {}", e)))?;

    Ok((records_count, chunks_count))
}

/// Reset the index (delete all data).
pub fn reset_index(conn: &Connection) -> AppResult<()> {
    conn.execute("DELETE FROM passages", [])
        .map_err(|e| AppError::Knowledge(format!("Failed to delete passages: {}", e)))?;

    conn.execute("DELETE FROM records", [])
        .map_err(|e| AppError::Knowledge(format!("Failed to delete records: {}", e)))?;

    tracing::info!("Reset knowledge index");
    Ok(())
}

/// Convert embedding vector to bytes for storage.
fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(embedding.len() * 4);
    for &value in embedding {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Convert bytes back to embedding vector.
fn bytes_to_embedding(bytes: &[u8]) -> AppResult<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(AppError::Knowledge(
            "Invalid embedding bytes length".to_string(),
        ));
    }

    let mut embedding = Vec::with_capacity(bytes.len() / 4);
    for chunk in bytes.chunks_exact(4) {
        let value = f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        embedding.push(value);
    }

    Ok(embedding)
}

/// Calculate cosine similarity between two vectors.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn test_row(id: &str, content: &str, embedding: Vec<f32>) -> PassageRow {
        PassageRow {
            id: id.to_string(),
            record_id: "record1".to_string(),
            position: 0,
            content: content.to_string(),
            embedding,
            metadata_json: r#"{"title":"t","source":"s","source_type":"st","url":""}"#.to_string(),
        }
    }

    #[test]
    fn test_init_index() {
        let temp_file = NamedTempFile::new().unwrap();
        let conn = init_index(temp_file.path()).unwrap();

        let table_count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table'",
                [],
                |row| row.get(0),
            )
            .unwrap();

        assert!(table_count >= 2); // records and passages tables
    }

    #[test]
    fn test_insert_and_query() {
        let temp_file = NamedTempFile::new().unwrap();
        let conn = init_index(temp_file.path()).unwrap();

        insert_record(&conn, "record1", "title", "src", "knowledge_item", "", "now", 1).unwrap();
        insert_passage(&conn, &test_row("p1", "test text", vec![1.0, 0.0, 0.0])).unwrap();

        let results = query_passages(&conn, &[1.0, 0.0, 0.0], 5).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].content, "test text");
        assert_eq!(results[0].meta.title, "t");
        assert!((results[0].score - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_query_empty_index() {
        let temp_file = NamedTempFile::new().unwrap();
        let conn = init_index(temp_file.path()).unwrap();

        let results = query_passages(&conn, &[1.0, 0.0], 5).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_query_orders_by_similarity() {
        let temp_file = NamedTempFile::new().unwrap();
        let conn = init_index(temp_file.path()).unwrap();

        insert_record(&conn, "record1", "title", "src", "knowledge_item", "", "now", 2).unwrap();
        insert_passage(&conn, &test_row("p1", "far", vec![0.0, 1.0, 0.0])).unwrap();
        insert_passage(&conn, &test_row("p2", "near", vec![1.0, 0.1, 0.0])).unwrap();

        let results = query_passages(&conn, &[1.0, 0.0, 0.0], 5).unwrap();
        assert_eq!(results[0].content, "near");
        assert_eq!(results[1].content, "far");
    }

    #[test]
    fn test_get_stats_and_reset() {
        let temp_file = NamedTempFile::new().unwrap();
        let conn = init_index(temp_file.path()).unwrap();

        insert_record(&conn, "record1", "title", "src", "knowledge_item", "", "now", 1).unwrap();
        insert_passage(&conn, &test_row("p1", "text", vec![1.0])).unwrap();

        assert_eq!(get_stats(&conn).unwrap(), (1, 1));

        reset_index(&conn).unwrap();
        assert_eq!(get_stats(&conn).unwrap(), (0, 0));
    }

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);

        let c = vec![1.0, 0.0, 0.0];
        let d = vec![0.0, 1.0, 0.0];
        assert!(cosine_similarity(&c, &d).abs() < 0.001);
    }
}
