//! Provider abstractions for embeddings, generation and knowledge storage
//!
//! Trait-based seams let the pipeline switch between local (Ollama) and hosted
//! (OpenAI-compatible) backends, and let tests substitute deterministic stubs.

pub mod embedding;
pub mod generation;
pub mod knowledge_store;
pub mod memory;
pub mod ollama;
pub mod openai;

use std::sync::Arc;

pub use embedding::EmbeddingProvider;
pub use generation::{GenerationProvider, GenerationRequest};
pub use knowledge_store::KnowledgeStore;
pub use memory::MemoryKnowledgeStore;

use crate::config::{EmbeddingConfig, GenerationConfig, ProviderBackend};
use crate::error::Result;

/// Build the configured embedding provider
pub fn build_embedder(
    config: &EmbeddingConfig,
    api_key: Option<String>,
) -> Result<Arc<dyn EmbeddingProvider>> {
    Ok(match config.backend {
        ProviderBackend::Ollama => Arc::new(ollama::OllamaEmbedder::new(config)?),
        ProviderBackend::OpenAi => Arc::new(openai::OpenAiEmbedder::new(config, api_key)?),
    })
}

/// Build the configured generation provider
pub fn build_generator(config: &GenerationConfig) -> Result<Arc<dyn GenerationProvider>> {
    Ok(match config.backend {
        ProviderBackend::Ollama => Arc::new(ollama::OllamaGenerator::new(config)?),
        ProviderBackend::OpenAi => Arc::new(openai::OpenAiGenerator::new(config)?),
    })
}
