//! Embedding provider trait and factory.

use finsight_core::{AppError, AppResult};
use std::sync::Arc;

/// Trait for embedding providers.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "trigram", "ollama")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Generate embeddings for multiple texts in a batch.
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;

    /// Generate embedding for a single text (convenience method).
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut results = self.embed_batch(&[text.to_string()]).await?;
        results
            .pop()
            .ok_or_else(|| AppError::Knowledge("No embedding returned".to_string()))
    }
}

/// Create an embedding provider by name.
pub fn create_provider(
    provider: &str,
    model: &str,
    endpoint: Option<&str>,
) -> AppResult<Arc<dyn EmbeddingProvider>> {
    match provider {
        "trigram" => Ok(Arc::new(super::providers::trigram::TrigramProvider::new(
            384,
        ))),

        "ollama" => {
            let base_url = endpoint.unwrap_or("http://localhost:11434");
            Ok(Arc::new(super::providers::ollama::OllamaEmbedder::new(
                base_url, model,
            )))
        }

        _ => Err(AppError::Knowledge(format!(
            "Unknown embedding provider: '{}'. Supported providers: trigram, ollama",
            provider
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_trigram_provider() {
        let provider = create_provider("trigram", "trigram-v1", None).unwrap();
        assert_eq!(provider.provider_name(), "trigram");
        assert_eq!(provider.dimensions(), 384);
    }

    #[test]
    fn test_create_ollama_provider() {
        let provider = create_provider("ollama", "nomic-embed-text", None).unwrap();
        assert_eq!(provider.provider_name(), "ollama");
        assert_eq!(provider.model_name(), "nomic-embed-text");
    }

    #[test]
    fn test_create_unknown_provider() {
        let result = create_provider("unknown", "model", None);
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Unknown embedding provider"));
    }

    #[tokio::test]
    async fn test_provider_embed_single() {
        let provider = create_provider("trigram", "trigram-v1", None).unwrap();

        let embedding = provider.embed("test text").await.unwrap();
        assert_eq!(embedding.len(), 384);
    }
}
