//! Query reformulation through the generation provider

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::generation::PromptBuilder;
use crate::providers::{GenerationProvider, GenerationRequest};
use crate::types::{Query, ReformulatedQuery};

/// Rewrites vague customer questions into retrieval-friendly technical queries
pub struct QueryReformulator {
    generator: Arc<dyn GenerationProvider>,
    temperature: f32,
}

impl QueryReformulator {
    pub fn new(generator: Arc<dyn GenerationProvider>, temperature: f32) -> Self {
        Self {
            generator,
            temperature,
        }
    }

    /// Reformulate `query`
    ///
    /// Blank output is a `GenerationFailed` error; falling back to the raw query
    /// is the caller's decision.
    pub async fn reformulate(&self, query: &Query) -> Result<ReformulatedQuery> {
        let prompt = PromptBuilder::reformulation(query.as_str());
        let request = GenerationRequest::new(prompt.system, prompt.prompt, self.temperature);

        let output = self.generator.generate(&request).await?;
        let text = strip_quotes(&output);
        if text.is_empty() {
            return Err(Error::generation("Reformulation returned empty text"));
        }

        tracing::debug!("Reformulated query: {}", text);
        Ok(ReformulatedQuery::new(query.clone(), text))
    }
}

/// Models often echo the query back wrapped in quotes
///
/// Only one matched pair of surrounding quotes is removed.
fn strip_quotes(text: &str) -> &str {
    let text = text.trim();
    for quote in ['"', '\''] {
        if let Some(inner) = text
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner.trim();
        }
    }
    text
}
