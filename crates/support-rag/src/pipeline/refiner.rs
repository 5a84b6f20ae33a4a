//! Customer-facing refinement of technical drafts

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::generation::PromptBuilder;
use crate::providers::{GenerationProvider, GenerationRequest};
use crate::types::{Draft, FinalResponse};

/// Answer used when no documentation matched the question
pub const NO_DOCUMENTATION_ANSWER: &str = "I'm sorry, but no documentation was found in our \
knowledge base that covers your question. Please reach out to our support team directly so a \
specialist can look into it with you. We're happy to help!";

pub struct ResponseRefiner {
    generator: Arc<dyn GenerationProvider>,
    temperature: f32,
}

impl ResponseRefiner {
    pub fn new(generator: Arc<dyn GenerationProvider>, temperature: f32) -> Self {
        Self {
            generator,
            temperature,
        }
    }

    /// Rewrite `draft` for the customer, keeping its sources unchanged
    pub async fn refine(&self, draft: &Draft) -> Result<FinalResponse> {
        if !draft.has_citations() {
            return Ok(FinalResponse::from_draft(
                NO_DOCUMENTATION_ANSWER.to_string(),
                draft,
            ));
        }

        let prompt = PromptBuilder::refinement(draft);
        let request = GenerationRequest::new(prompt.system, prompt.prompt, self.temperature);

        let answer = self.generator.generate(&request).await?;
        if answer.trim().is_empty() {
            return Err(Error::generation("Refinement returned empty text"));
        }

        Ok(FinalResponse::from_draft(answer, draft))
    }
}
