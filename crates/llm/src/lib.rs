//! LLM integration crate for the Finsight advisor.
//!
//! This crate provides a provider-agnostic abstraction for the text-generation
//! capability the answer pipeline depends on. The pipeline only needs a single
//! non-streaming completion call with a system prompt and a user prompt; the
//! JSON output shape is embedded in the prompt itself.
//!
//! # Providers
//! - **Ollama**: Local LLM runtime (default)
//!
//! # Example
//! ```no_run
//! use finsight_llm::{LlmClient, LlmRequest, providers::OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new();
//! let request = LlmRequest::new("Hello, world!", "llama3.2");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;

// Re-export main types
pub use client::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::create_client;
pub use providers::OllamaClient;
