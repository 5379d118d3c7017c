//! Multi-query expansion.
//!
//! Turns one analyzed query into an ordered list of retrieval queries: the
//! normalized query first, then topic-focused variants for the top topics.

use crate::types::AnalyzedQuery;

/// Expand an analyzed query into at most `max_queries` retrieval queries.
///
/// The normalized query always comes first. For each of the top two topics
/// a variant is built as `"{topic} {up to 2 matched keywords} {normalized}"`.
/// Always returns at least one query.
pub fn expand_queries(analysis: &AnalyzedQuery, max_queries: usize) -> Vec<String> {
    let mut queries = vec![analysis.normalized.clone()];

    for topic in analysis.topics.iter().take(2) {
        if topic.matched_keywords.is_empty() {
            continue;
        }

        let keywords = topic
            .matched_keywords
            .iter()
            .take(2)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ");

        queries.push(format!(
            "{} {} {}",
            topic.topic, keywords, analysis.normalized
        ));
    }

    queries.truncate(max_queries.max(1));

    tracing::debug!("Expanded into {} retrieval queries", queries.len());
    queries
}
