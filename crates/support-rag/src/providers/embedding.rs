//! Embedding provider trait for generating text embeddings

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::types::EmbeddingVector;

/// Trait for generating text embeddings
///
/// Implementations:
/// - `OllamaEmbedder`: Local Ollama server (all-minilm, nomic-embed-text)
/// - `OpenAiEmbedder`: OpenAI-compatible `/embeddings` endpoint
///
/// Inputs longer than the configured limit are truncated with [`truncate_input`]
/// before they are sent, so the same text always embeds the same way.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate the embedding for a single text
    ///
    /// Fails with `EmbeddingUnavailable` on provider errors and with
    /// `DimensionMismatch` when the model returns an unexpected length.
    async fn embed(&self, text: &str) -> Result<EmbeddingVector>;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Check if the provider is healthy and available
    ///
    /// Remote providers also embed a short text and return
    /// `Error::DimensionMismatch` when the model disagrees with `dimensions()`.
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;
}

/// Cut `text` to at most `max_chars` characters on a char boundary
pub fn truncate_input(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Reject vectors that do not have the configured dimension
pub fn check_dimensions(values: Vec<f32>, expected: usize) -> Result<EmbeddingVector> {
    if values.len() != expected {
        return Err(Error::DimensionMismatch {
            expected,
            actual: values.len(),
        });
    }
    Ok(EmbeddingVector::new(values))
}

/// Embed a short text and compare its length with the configured dimension
///
/// A mismatch is returned as an error so readiness can report it; any other
/// embedding failure just means the provider is not healthy.
pub async fn verify_dimensions<P>(provider: &P) -> Result<bool>
where
    P: EmbeddingProvider + ?Sized,
{
    match provider.embed("health check").await {
        Ok(_) => Ok(true),
        Err(e @ Error::DimensionMismatch { .. }) => Err(e),
        Err(e) => {
            tracing::warn!("{} health check embedding failed: {}", provider.name(), e);
            Ok(false)
        }
    }
}
