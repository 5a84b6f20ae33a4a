//! Technical draft synthesis grounded on retrieved documents

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::generation::{citations_for, PromptBuilder};
use crate::providers::{GenerationProvider, GenerationRequest};
use crate::types::{Draft, ReformulatedQuery, RetrievalResult};

pub struct DraftSynthesizer {
    generator: Arc<dyn GenerationProvider>,
    temperature: f32,
    max_excerpt_chars: usize,
}

impl DraftSynthesizer {
    pub fn new(
        generator: Arc<dyn GenerationProvider>,
        temperature: f32,
        max_excerpt_chars: usize,
    ) -> Self {
        Self {
            generator,
            temperature,
            max_excerpt_chars,
        }
    }

    /// Draft a technical answer for `query` from `retrieved`
    ///
    /// An empty retrieval result produces a no-knowledge draft without calling
    /// the generator. Citations always come from `retrieved`.
    pub async fn synthesize(
        &self,
        query: &ReformulatedQuery,
        retrieved: &RetrievalResult,
    ) -> Result<Draft> {
        if retrieved.is_empty() {
            tracing::info!("No relevant documents, skipping draft generation");
            return Ok(Draft::no_knowledge(query.clone()));
        }

        let context = PromptBuilder::build_context(retrieved, self.max_excerpt_chars);
        let prompt = PromptBuilder::draft(query, &context);
        let request = GenerationRequest::new(prompt.system, prompt.prompt, self.temperature);

        let content = self.generator.generate(&request).await?;
        if content.trim().is_empty() {
            return Err(Error::generation("Draft generation returned empty text"));
        }

        Ok(Draft {
            query: query.clone(),
            content,
            citations: citations_for(retrieved),
        })
    }
}
