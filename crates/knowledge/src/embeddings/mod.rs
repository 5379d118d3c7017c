//! Embedding generation for knowledge passages.
//!
//! Embedding is a pluggable external capability: the store only depends on
//! the [`EmbeddingProvider`] trait. The trigram provider is deterministic and
//! fully offline; the Ollama provider calls a local embedding model.

pub mod provider;
pub mod providers;

pub use provider::{create_provider, EmbeddingProvider};
