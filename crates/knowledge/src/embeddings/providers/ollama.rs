//! Ollama embedding provider.
//!
//! Calls a local Ollama instance's embeddings endpoint, one text at a time
//! (the endpoint accepts a single prompt per request).

use crate::embeddings::provider::EmbeddingProvider;
use finsight_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Default dimensionality for nomic-embed-text.
const DEFAULT_DIMENSIONS: usize = 768;

#[derive(Debug, Serialize)]
struct OllamaEmbeddingRequest {
    model: String,
    prompt: String,
}

#[derive(Debug, Deserialize)]
struct OllamaEmbeddingResponse {
    embedding: Vec<f32>,
}

/// Embedding provider backed by Ollama.
#[derive(Debug)]
pub struct OllamaEmbedder {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl OllamaEmbedder {
    /// Create a new Ollama embedder.
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
            client: reqwest::Client::new(),
        }
    }

    async fn embed_one(&self, text: &str) -> AppResult<Vec<f32>> {
        let url = format!("{}/api/embeddings", self.base_url);
        let request = OllamaEmbeddingRequest {
            model: self.model.clone(),
            prompt: text.to_string(),
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Knowledge(format!("Embedding request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Knowledge(format!(
                "Ollama embeddings API error ({}): {}",
                status, error_text
            )));
        }

        let parsed: OllamaEmbeddingResponse = response
            .json()
            .await
            .map_err(|e| AppError::Knowledge(format!("Failed to parse embedding: {}", e)))?;

        Ok(parsed.embedding)
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for OllamaEmbedder {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        DEFAULT_DIMENSIONS
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed_one(text).await?);
        }
        Ok(embeddings)
    }
}
