//! Knowledge document and retrieval types

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Fixed-length embedding of a piece of text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmbeddingVector(Vec<f32>);

impl EmbeddingVector {
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    pub fn dimension(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Cosine similarity in [-1, 1]
    ///
    /// Zero vectors and mismatched lengths score 0.0.
    pub fn cosine_similarity(&self, other: &EmbeddingVector) -> f32 {
        if self.0.len() != other.0.len() || self.0.is_empty() {
            return 0.0;
        }

        let mut dot = 0.0f32;
        let mut norm_a = 0.0f32;
        let mut norm_b = 0.0f32;
        for (a, b) in self.0.iter().zip(other.0.iter()) {
            dot += a * b;
            norm_a += a * a;
            norm_b += b * b;
        }

        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }

        (dot / (norm_a.sqrt() * norm_b.sqrt())).clamp(-1.0, 1.0)
    }
}

impl From<Vec<f32>> for EmbeddingVector {
    fn from(values: Vec<f32>) -> Self {
        Self(values)
    }
}

/// A stored knowledge-base passage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeDocument {
    /// Unique identifier
    pub id: String,
    /// Passage text
    pub content: String,
    /// Embedding of `content`
    pub embedding: EmbeddingVector,
    /// Source, category and any other attributes
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl KnowledgeDocument {
    pub fn new(id: impl Into<String>, content: impl Into<String>, embedding: Vec<f32>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            embedding: EmbeddingVector::new(embedding),
            metadata: HashMap::new(),
        }
    }

    /// Human-readable origin, if the document records one
    pub fn source(&self) -> Option<&str> {
        self.metadata.get("source").and_then(|v| v.as_str())
    }
}

/// A document paired with its similarity to a query
#[derive(Debug, Clone)]
pub struct ScoredDocument {
    /// Shared with the knowledge store
    pub document: Arc<KnowledgeDocument>,
    /// Cosine similarity (-1.0 to 1.0, higher is more similar)
    pub similarity: f32,
}

impl ScoredDocument {
    pub fn new(document: Arc<KnowledgeDocument>, similarity: f32) -> Self {
        Self {
            document,
            similarity,
        }
    }

    pub fn id(&self) -> &str {
        &self.document.id
    }
}

/// Ranked, thresholded and deduplicated evidence for one query
#[derive(Debug, Clone, Default)]
pub struct RetrievalResult {
    documents: Vec<ScoredDocument>,
}

impl RetrievalResult {
    /// Build a result from raw store candidates
    ///
    /// Drops candidates below `threshold`, keeps one entry per document id (the
    /// highest score, first seen on ties), orders by descending similarity and
    /// keeps at most `top_k`.
    pub fn from_candidates(candidates: Vec<ScoredDocument>, top_k: usize, threshold: f32) -> Self {
        let mut best: Vec<ScoredDocument> = Vec::with_capacity(candidates.len());
        let mut index: HashMap<String, usize> = HashMap::new();

        for candidate in candidates {
            if candidate.similarity.is_nan() || candidate.similarity < threshold {
                continue;
            }
            match index.get(candidate.id()) {
                Some(&pos) => {
                    if candidate.similarity > best[pos].similarity {
                        best[pos] = candidate;
                    }
                }
                None => {
                    index.insert(candidate.id().to_string(), best.len());
                    best.push(candidate);
                }
            }
        }

        // Stable sort keeps store order among equal scores
        best.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        best.truncate(top_k);

        Self { documents: best }
    }

    pub fn documents(&self) -> &[ScoredDocument] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// No relevant knowledge was found
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn document_ids(&self) -> HashSet<&str> {
        self.documents.iter().map(|d| d.id()).collect()
    }
}
