//! Multi-query retrieval aggregation.
//!
//! Runs the expanded queries against the knowledge store in order, merges
//! the results, deduplicates by exact content, and truncates to the result
//! budget. A failing or timed-out retrieval for one query contributes
//! nothing; the others still run.

use finsight_knowledge::{KnowledgeStore, ScoredPassage};
use std::collections::HashSet;
use std::time::Duration;

/// Merged retrieval results.
#[derive(Debug)]
pub struct Aggregated {
    /// Unique passages, truncated to the result budget
    pub passages: Vec<ScoredPassage>,

    /// Unique passage count before truncation
    pub total_unique: usize,
}

/// Retrieve, merge, deduplicate, truncate.
///
/// Ordering contract: passages keep their first-seen position, meaning
/// per-query relevance order within query order. Duplicates (exact content
/// equality) keep the first occurrence. No re-sort by score.
pub async fn aggregate(
    queries: &[String],
    store: &dyn KnowledgeStore,
    per_query_k: usize,
    result_budget: usize,
    timeout: Duration,
) -> Aggregated {
    let mut merged: Vec<ScoredPassage> = Vec::new();

    for query in queries {
        match tokio::time::timeout(timeout, store.retrieve(query, per_query_k)).await {
            Ok(Ok(passages)) => {
                tracing::debug!("Query '{}' returned {} passages", query, passages.len());
                merged.extend(passages);
            }
            Ok(Err(e)) => {
                tracing::warn!("Retrieval failed for query '{}': {}", query, e);
            }
            Err(_) => {
                tracing::warn!(
                    "Retrieval timed out for query '{}' after {:?}",
                    query,
                    timeout
                );
            }
        }
    }

    let mut seen: HashSet<String> = HashSet::new();
    let mut unique: Vec<ScoredPassage> = Vec::new();
    for passage in merged {
        if seen.insert(passage.content.clone()) {
            unique.push(passage);
        }
    }

    let total_unique = unique.len();
    unique.truncate(result_budget);

    tracing::info!(
        "Aggregated {} unique passages ({} kept within budget)",
        total_unique,
        unique.len()
    );

    Aggregated {
        passages: unique,
        total_unique,
    }
}
