//! In-process knowledge store over a collection snapshot
//!
//! Documents are loaded once from `<url>/<database>/<collection>.json` and
//! searched by brute-force cosine similarity.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::config::KnowledgeStoreConfig;
use crate::error::{Error, Result};
use crate::types::{EmbeddingVector, KnowledgeDocument, ScoredDocument};

use super::knowledge_store::KnowledgeStore;

/// One entry of a collection snapshot
#[derive(Debug, Deserialize)]
struct SnapshotRecord {
    #[serde(default, alias = "_id")]
    id: Option<String>,
    content: String,
    #[serde(default)]
    embedding: Option<Vec<f32>>,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    metadata: HashMap<String, serde_json::Value>,
}

/// Cosine-similarity index held in memory
pub struct MemoryKnowledgeStore {
    documents: Arc<Vec<Arc<KnowledgeDocument>>>,
    dimensions: usize,
}

impl MemoryKnowledgeStore {
    /// Build from documents, skipping any whose embedding has the wrong dimension
    pub fn new(dimensions: usize, documents: Vec<KnowledgeDocument>) -> Self {
        let total = documents.len();
        let documents: Vec<Arc<KnowledgeDocument>> = documents
            .into_iter()
            .filter(|doc| {
                let ok = doc.embedding.dimension() == dimensions;
                if !ok {
                    tracing::warn!(
                        "Skipping document {}: embedding has {} dimensions, expected {}",
                        doc.id,
                        doc.embedding.dimension(),
                        dimensions
                    );
                }
                ok
            })
            .map(Arc::new)
            .collect();

        if documents.len() < total {
            tracing::warn!("Loaded {} of {} documents", documents.len(), total);
        }

        Self {
            documents: Arc::new(documents),
            dimensions,
        }
    }

    /// Load the snapshot named by `config`
    ///
    /// A missing snapshot yields an empty store so the service can still start.
    pub async fn load(config: &KnowledgeStoreConfig, dimensions: usize) -> Result<Self> {
        let path = config.snapshot_path()?;
        if !path.exists() {
            tracing::warn!(
                "Knowledge snapshot {} not found, starting with an empty knowledge base",
                path.display()
            );
            return Ok(Self::new(dimensions, Vec::new()));
        }
        Self::load_file(&path, &config.collection, dimensions).await
    }

    /// Load a snapshot file
    pub async fn load_file(path: &Path, collection: &str, dimensions: usize) -> Result<Self> {
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
            Error::store(format!("Failed to read snapshot {}: {}", path.display(), e))
        })?;
        let records: Vec<SnapshotRecord> = serde_json::from_str(&raw).map_err(|e| {
            Error::config(format!("Invalid snapshot {}: {}", path.display(), e))
        })?;

        let documents = records
            .into_iter()
            .enumerate()
            .filter_map(|(i, record)| record_to_document(record, collection, i))
            .collect();

        let store = Self::new(dimensions, documents);
        tracing::info!(
            "Loaded {} documents from {}",
            store.documents.len(),
            path.display()
        );
        Ok(store)
    }

    pub fn document_count(&self) -> usize {
        self.documents.len()
    }
}

fn record_to_document(
    record: SnapshotRecord,
    collection: &str,
    index: usize,
) -> Option<KnowledgeDocument> {
    let id = record
        .id
        .unwrap_or_else(|| format!("{}-{}", collection, index));

    let embedding = match record.embedding {
        Some(e) if !e.is_empty() => e,
        _ => {
            tracing::warn!("Skipping document {}: no embedding", id);
            return None;
        }
    };

    let mut metadata = record.metadata;
    if let Some(source) = record.source {
        metadata.insert("source".to_string(), serde_json::Value::String(source));
    }
    if let Some(category) = record.category {
        metadata.insert("category".to_string(), serde_json::Value::String(category));
    }

    Some(KnowledgeDocument {
        id,
        content: record.content,
        embedding: EmbeddingVector::new(embedding),
        metadata,
    })
}

#[async_trait]
impl KnowledgeStore for MemoryKnowledgeStore {
    async fn nearest_neighbors(
        &self,
        vector: &EmbeddingVector,
        k: usize,
    ) -> Result<Vec<ScoredDocument>> {
        if vector.dimension() != self.dimensions {
            return Err(Error::DimensionMismatch {
                expected: self.dimensions,
                actual: vector.dimension(),
            });
        }

        let documents = Arc::clone(&self.documents);
        let query = vector.clone();

        tokio::task::spawn_blocking(move || {
            let mut scored: Vec<ScoredDocument> = documents
                .iter()
                .map(|doc| {
                    let similarity = query.cosine_similarity(&doc.embedding);
                    ScoredDocument::new(Arc::clone(doc), similarity)
                })
                .collect();
            scored.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
            scored.truncate(k);
            scored
        })
        .await
        .map_err(|e| Error::store(format!("Search task failed: {}", e)))
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.documents.len())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "memory-cosine"
    }
}
