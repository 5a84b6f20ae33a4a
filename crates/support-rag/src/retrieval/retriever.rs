//! Embedding + nearest-neighbour retrieval with thresholding

use std::sync::Arc;

use crate::config::RetrievalConfig;
use crate::error::Result;
use crate::providers::{EmbeddingProvider, KnowledgeStore};
use crate::types::RetrievalResult;

/// Turns query text into a ranked, thresholded evidence set
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn KnowledgeStore>,
    top_k: usize,
    similarity_threshold: f32,
}

impl Retriever {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn KnowledgeStore>,
        config: &RetrievalConfig,
    ) -> Self {
        Self {
            embedder,
            store,
            top_k: config.top_k,
            similarity_threshold: config.similarity_threshold,
        }
    }

    /// Retrieve documents for `query`
    ///
    /// An empty result means no relevant knowledge and is not an error.
    /// Embedding and store failures are returned unchanged in kind.
    pub async fn retrieve(&self, query: &str) -> Result<RetrievalResult> {
        let vector = self.embedder.embed(query).await?;
        let candidates = self.store.nearest_neighbors(&vector, self.top_k).await?;
        let candidate_count = candidates.len();

        let result =
            RetrievalResult::from_candidates(candidates, self.top_k, self.similarity_threshold);

        tracing::debug!(
            "Retrieved {} of {} candidates (threshold {:.2})",
            result.len(),
            candidate_count,
            self.similarity_threshold
        );

        Ok(result)
    }
}
