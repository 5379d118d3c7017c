//! Trigram embedding provider: deterministic, content-aware, fully offline.

use crate::embeddings::provider::EmbeddingProvider;
use finsight_core::AppResult;

/// Offline embedding provider based on character trigrams.
///
/// Generates deterministic embeddings from word frequencies and character
/// trigrams. Not semantically accurate like a real embedding model, but
/// consistent and content-dependent, which makes it the default for local
/// development and the test suite.
#[derive(Debug)]
pub struct TrigramProvider {
    dimensions: usize,
}

impl TrigramProvider {
    /// Create a new trigram provider with the given dimensionality.
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn generate_embedding(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut embedding = vec![0.0; self.dimensions];

        let lower = text.to_lowercase();

        // Filter stop words for better discrimination
        let stop_words: std::collections::HashSet<&str> = [
            "the", "is", "at", "which", "on", "a", "an", "as", "are", "was", "were", "for", "to",
            "of", "in", "and", "or", "but", "with", "by", "from", "this", "that", "be", "have",
            "has", "had", "it", "its", "their", "they", "them",
        ]
        .iter()
        .copied()
        .collect();

        let words: Vec<&str> = lower
            .split_whitespace()
            .filter(|w| !stop_words.contains(w) && w.len() > 2)
            .collect();

        let mut word_freq = std::collections::HashMap::new();
        for word in &words {
            *word_freq.entry(*word).or_insert(0) += 1;
        }

        // Each word contributes through its trigrams and as a whole,
        // spreading related words across shared dimensions.
        for (word, freq) in word_freq.iter() {
            let chars: Vec<char> = word.chars().collect();
            for i in 0..chars.len().saturating_sub(2) {
                let trigram = format!(
                    "{}{}{}",
                    chars[i],
                    chars[i + 1],
                    chars.get(i + 2).unwrap_or(&' ')
                );
                let trigram_hash = trigram
                    .bytes()
                    .fold(0u64, |acc, b| acc.wrapping_mul(37).wrapping_add(b as u64));

                let dim_idx = (trigram_hash as usize) % self.dimensions;
                embedding[dim_idx] += (*freq as f32).sqrt();
            }

            let word_hash = word
                .bytes()
                .fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
            let base_dim = (word_hash as usize) % self.dimensions;
            embedding[base_dim] += *freq as f32;
        }

        // Normalize to unit vector
        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut embedding {
                *v /= norm;
            }
        }

        Ok(embedding)
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for TrigramProvider {
    fn provider_name(&self) -> &str {
        "trigram"
    }

    fn model_name(&self) -> &str {
        "trigram-v1"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        texts
            .iter()
            .map(|text| self.generate_embedding(text))
            .collect()
    }
}
