//! Core types for the support pipeline

pub mod document;
pub mod query;
pub mod response;

pub use document::{EmbeddingVector, KnowledgeDocument, RetrievalResult, ScoredDocument};
pub use query::{Query, ReformulatedQuery, SupportQueryRequest, MAX_QUERY_CHARS};
pub use response::{Citation, Draft, FinalResponse};
