//! Generation provider trait for prompt completion

use async_trait::async_trait;

use crate::error::Result;

/// A single completion request
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// Role instructions
    pub system: String,
    /// Task input
    pub prompt: String,
    /// Sampling temperature
    pub temperature: f32,
}

impl GenerationRequest {
    pub fn new(system: impl Into<String>, prompt: impl Into<String>, temperature: f32) -> Self {
        Self {
            system: system.into(),
            prompt: prompt.into(),
            temperature,
        }
    }
}

/// Trait for text generation
///
/// Output is nondeterministic and calls may be rate limited, so every failure
/// surfaces as `GenerationFailed` and the caller decides whether to retry.
///
/// Implementations:
/// - `OllamaGenerator`: Local Ollama server (llama3.2, phi3, etc.)
/// - `OpenAiGenerator`: OpenAI-compatible chat completions
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Generate text for a request
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;

    /// Check if the provider is healthy and available
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}
