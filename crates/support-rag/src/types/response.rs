//! Draft and response types

use serde::{Deserialize, Serialize};

use super::document::ScoredDocument;
use super::query::ReformulatedQuery;

/// Reference from a draft to one retrieved document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    /// Retrieved document id
    pub document_id: String,
    /// Full document text, returned to the caller as a source
    pub text: String,
    /// Similarity score of the document for this query
    pub similarity_score: f32,
}

impl Citation {
    pub fn from_scored(scored: &ScoredDocument) -> Self {
        Self {
            document_id: scored.document.id.clone(),
            text: scored.document.content.clone(),
            similarity_score: scored.similarity,
        }
    }
}

/// Technical draft produced by the synthesizer
#[derive(Debug, Clone)]
pub struct Draft {
    /// Query the draft answers
    pub query: ReformulatedQuery,
    /// Draft solution text
    pub content: String,
    /// Documents the draft is grounded on, in retrieval order
    pub citations: Vec<Citation>,
}

impl Draft {
    /// Honest draft for a query with no relevant documentation
    pub fn no_knowledge(query: ReformulatedQuery) -> Self {
        Self {
            query,
            content: "Unable to find specific information in the knowledge base. No relevant \
                      documentation was found for this question."
                .to_string(),
            citations: Vec::new(),
        }
    }

    pub fn has_citations(&self) -> bool {
        !self.citations.is_empty()
    }
}

/// The answer returned to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalResponse {
    /// Customer-friendly answer
    pub final_answer: String,
    /// Source texts the answer is grounded on
    pub sources: Vec<String>,
}

impl FinalResponse {
    /// Build the response for a draft, passing citations through unchanged
    pub fn from_draft(final_answer: String, draft: &Draft) -> Self {
        Self {
            final_answer,
            sources: draft.citations.iter().map(|c| c.text.clone()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{KnowledgeDocument, Query};
    use std::sync::Arc;

    #[test]
    fn test_sources_follow_citation_order() {
        let query = ReformulatedQuery::passthrough(Query::new("router").unwrap());
        let first = ScoredDocument::new(
            Arc::new(KnowledgeDocument::new("kb-2", "Restart the router", vec![1.0])),
            0.8,
        );
        let second = ScoredDocument::new(
            Arc::new(KnowledgeDocument::new("kb-1", "Check cabling", vec![1.0])),
            0.6,
        );
        let draft = Draft {
            query,
            content: "1. Restart. 2. Check cables.".to_string(),
            citations: vec![Citation::from_scored(&first), Citation::from_scored(&second)],
        };

        let response = FinalResponse::from_draft("Let's get you back online!".to_string(), &draft);
        assert_eq!(response.sources, vec!["Restart the router", "Check cabling"]);
    }

    #[test]
    fn test_no_knowledge_draft_has_no_citations() {
        let draft = Draft::no_knowledge(ReformulatedQuery::passthrough(Query::new("x").unwrap()));
        assert!(!draft.has_citations());
        assert!(draft.content.contains("No relevant documentation"));
    }
}
