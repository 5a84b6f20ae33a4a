//! Semantic retrieval over the knowledge store

pub mod retriever;

pub use retriever::Retriever;
