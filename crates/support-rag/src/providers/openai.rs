//! OpenAI-compatible providers for embeddings and chat completions

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{EmbeddingConfig, GenerationConfig};
use crate::error::{Error, Result};
use crate::types::EmbeddingVector;

use super::embedding::{
    check_dimensions, truncate_input, verify_dimensions, EmbeddingProvider,
};
use super::generation::{GenerationProvider, GenerationRequest};

/// Bearer-authenticated client for an OpenAI-compatible API
pub struct OpenAiClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl OpenAiClient {
    pub fn new(endpoint: &str, api_key: Option<String>, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| Error::config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        let request = self.client.post(format!("{}/{}", self.endpoint, path));
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    /// Reachability check against `/models`
    pub async fn health_check(&self) -> Result<bool> {
        let mut request = self.client.get(format!("{}/models", self.endpoint));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        match request.send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    /// Run a chat completion with a system and a user message
    pub async fn chat(&self, model: &str, request: &GenerationRequest) -> Result<String> {
        let body = ChatRequest {
            model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.prompt,
                },
            ],
            temperature: request.temperature,
        };

        let response = self
            .post("chat/completions")
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::generation(format!("Chat request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::generation(describe_status(status, &text)));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::generation(format!("Failed to parse chat response: {}", e)))?;

        chat.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .ok_or_else(|| Error::generation("Chat response contained no choices"))
    }

    /// Embed one input
    pub async fn embed(&self, model: &str, input: &str) -> Result<Vec<f32>> {
        let response = self
            .post("embeddings")
            .json(&EmbeddingsRequest { model, input })
            .send()
            .await
            .map_err(|e| Error::embedding(format!("Embedding request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::embedding(describe_status(status, &text)));
        }

        let parsed: EmbeddingsResponse = response
            .json()
            .await
            .map_err(|e| Error::embedding(format!("Failed to parse embedding response: {}", e)))?;

        parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| Error::embedding("Embedding response contained no data"))
    }
}

fn describe_status(status: StatusCode, body: &str) -> String {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return "Rate limited by provider (HTTP 429)".to_string();
    }
    let body: String = body.chars().take(200).collect();
    format!("HTTP {} - {}", status, body)
}

/// Chat-completion generation provider
pub struct OpenAiGenerator {
    client: Arc<OpenAiClient>,
    model: String,
}

impl OpenAiGenerator {
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let client = OpenAiClient::new(
            &config.base_url,
            config.api_key.clone(),
            config.timeout_secs,
        )?;
        Ok(Self {
            client: Arc::new(client),
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl GenerationProvider for OpenAiGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        self.client.chat(&self.model, request).await
    }

    async fn health_check(&self) -> Result<bool> {
        self.client.health_check().await
    }

    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// `/embeddings` provider
pub struct OpenAiEmbedder {
    client: Arc<OpenAiClient>,
    model: String,
    dimensions: usize,
    max_input_chars: usize,
}

impl OpenAiEmbedder {
    /// The credential is shared with the generation backend
    pub fn new(config: &EmbeddingConfig, api_key: Option<String>) -> Result<Self> {
        let client = OpenAiClient::new(&config.base_url, api_key, config.timeout_secs)?;
        Ok(Self {
            client: Arc::new(client),
            model: config.model.clone(),
            dimensions: config.dimensions,
            max_input_chars: config.max_input_chars,
        })
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<EmbeddingVector> {
        let input = truncate_input(text, self.max_input_chars);
        let values = self.client.embed(&self.model, input).await?;
        check_dimensions(values, self.dimensions)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn health_check(&self) -> Result<bool> {
        if !self.client.health_check().await? {
            return Ok(false);
        }
        verify_dimensions(self).await
    }

    fn name(&self) -> &str {
        "openai"
    }
}
