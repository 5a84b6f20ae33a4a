//! Knowledge store trait for nearest-neighbour search

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{EmbeddingVector, ScoredDocument};

/// Trait for similarity search over knowledge documents
///
/// A store is a pure index: it returns every candidate it finds, best first,
/// and leaves thresholding and deduplication to the retriever.
///
/// Implementations:
/// - `MemoryKnowledgeStore`: Cosine index over a JSON collection snapshot
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    /// Up to `k` documents sorted by descending similarity
    ///
    /// Fails with `StoreUnavailable` when the store cannot be reached.
    async fn nearest_neighbors(
        &self,
        vector: &EmbeddingVector,
        k: usize,
    ) -> Result<Vec<ScoredDocument>>;

    /// Get total number of documents stored
    async fn len(&self) -> Result<usize>;

    /// Check if store is empty
    async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }

    /// Check if the store is healthy
    async fn health_check(&self) -> Result<bool>;

    /// Get store name for logging
    fn name(&self) -> &str;
}
