//! LLM provider factory.
//!
//! This module creates LLM clients from application configuration:
//! provider-name resolution plus endpoint selection.

use crate::client::LlmClient;
use crate::providers::OllamaClient;
use finsight_core::{AppError, AppResult};
use std::sync::Arc;

/// Create an LLM client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("ollama")
/// * `endpoint` - Optional custom endpoint URL
///
/// # Errors
/// Returns `AppError::Llm` if the provider is unknown.
pub fn create_client(provider: &str, endpoint: Option<&str>) -> AppResult<Arc<dyn LlmClient>> {
    match provider.to_lowercase().as_str() {
        "ollama" => {
            let base_url = endpoint.unwrap_or("http://localhost:11434");
            let client = OllamaClient::with_base_url(base_url);
            Ok(Arc::new(client))
        }
        _ => Err(AppError::Llm(format!("Unknown provider: {}", provider))),
    }
}
