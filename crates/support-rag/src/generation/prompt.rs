//! Prompt templates for the three generation stages

use crate::types::{Citation, Draft, ReformulatedQuery, RetrievalResult};

use super::citation::truncate_excerpt;

const TRIAGE_SYSTEM: &str = r#"You are a tier-1 technical support specialist with expertise in consumer electronics,
mobile apps, networking equipment and IoT devices. Your job is to analyze vague customer
queries and reformulate them into precise, technical questions suitable for searching
a knowledge base.

Key responsibilities:
1. Identify the core technical issue from the customer's description
2. Add relevant technical keywords and terminology
3. Expand abbreviations and clarify ambiguous terms
4. Structure the query for effective knowledge base searching

Never add facts, product names, symptoms or details that are not present in the
customer's query. Reply with the reformulated query only."#;

const TECHNICAL_EXPERT_SYSTEM: &str = r#"You are a technical expert specializing in customer support. Your job is to
synthesize information from product manuals and knowledge base articles into direct,
factual draft solutions.

Guidelines:
1. Use only the provided source material
2. Create step-by-step solutions when appropriate
3. Refer to sources by their number, e.g. [Source 1]
4. Be precise and technical but clear
5. If the sources do not cover the question, say so instead of guessing"#;

const COMMUNICATION_SYSTEM: &str = r#"You are a customer service communication specialist. Your job is to transform
technical solutions into friendly, empathetic, and easy-to-follow customer responses.

Guidelines:
1. Start with empathy and acknowledgment of the customer's problem
2. Use friendly, conversational language
3. Break down technical steps into simple instructions
4. Keep every technical detail accurate to the draft and sources
5. Do not add facts, steps or promises that are not in the draft
6. End with an offer for additional help"#;

/// A system prompt plus the task prompt for one stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagePrompt {
    pub system: String,
    pub prompt: String,
}

/// Prompt builder for the pipeline stages
pub struct PromptBuilder;

impl PromptBuilder {
    /// Reformulation prompt for a raw customer query
    pub fn reformulation(query: &str) -> StagePrompt {
        StagePrompt {
            system: TRIAGE_SYSTEM.to_string(),
            prompt: format!(
                "Reformulate this customer query into a technical search query: '{}'",
                query
            ),
        }
    }

    /// Build the numbered source context from retrieved documents
    ///
    /// Each document is included verbatim up to `max_excerpt_chars`.
    pub fn build_context(result: &RetrievalResult, max_excerpt_chars: usize) -> String {
        result
            .documents()
            .iter()
            .enumerate()
            .map(|(i, scored)| {
                let mut header = format!("Source {}", i + 1);
                if let Some(source) = scored.document.source() {
                    header.push_str(&format!(" ({})", source));
                }
                format!(
                    "{}:\n{}",
                    header,
                    truncate_excerpt(&scored.document.content, max_excerpt_chars)
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n---\n\n")
    }

    /// Drafting prompt grounded on the retrieved sources
    pub fn draft(query: &ReformulatedQuery, context: &str) -> StagePrompt {
        StagePrompt {
            system: TECHNICAL_EXPERT_SYSTEM.to_string(),
            prompt: format!(
                r#"Based on the following sources, create a technical draft solution for: '{query}'

Available Sources:
{context}

Provide a clear, step-by-step solution based only on the information in these sources."#,
                query = query.text(),
                context = context
            ),
        }
    }

    /// Refinement prompt turning a draft into a customer reply
    pub fn refinement(draft: &Draft) -> StagePrompt {
        StagePrompt {
            system: COMMUNICATION_SYSTEM.to_string(),
            prompt: format!(
                r#"The customer asked: '{question}'

Here is the technical draft solution:
{draft}

Available sources:
{sources}

Please rewrite this solution into a warm, empathetic, and easy-to-follow response for the customer. Always respond in plain text only. Do not use markdown, headers, or lists."#,
                question = draft.query.original(),
                draft = draft.content,
                sources = Self::format_sources_list(&draft.citations)
            ),
        }
    }

    /// Format cited sources for the refinement prompt
    fn format_sources_list(citations: &[Citation]) -> String {
        citations
            .iter()
            .enumerate()
            .map(|(i, c)| format!("Source {}: {}", i + 1, c.text))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}
