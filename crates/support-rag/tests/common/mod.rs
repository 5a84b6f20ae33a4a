//! Deterministic providers shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

use support_rag::config::{RetryConfig, SupportConfig};
use support_rag::providers::{
    EmbeddingProvider, GenerationProvider, GenerationRequest, KnowledgeStore,
    MemoryKnowledgeStore,
};
use support_rag::server::state::AppState;
use support_rag::types::{EmbeddingVector, KnowledgeDocument, ScoredDocument};
use support_rag::{Error, Result};

pub const ROUTER_DOC: &str =
    "Router troubleshooting: restart the router, check for firmware updates, check cabling";
pub const REFORMULATED: &str = "Router intermittent connectivity loss troubleshooting";
pub const DRAFT: &str =
    "1. Restart the router [Source 1]. 2. Flash firmware from manual kb-999 [Source 9].";
pub const ANSWER: &str = "I'm sorry your router keeps dropping! Please restart it and check the \
cables. Let us know if there is anything else we can help with.";

/// Leaked into provider errors to check that callers never see it
pub const SECRET_DETAIL: &str = "db.internal:27017 auth=hunter2";

/// Which stage a generation request belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Reformulate,
    Draft,
    Refine,
}

impl Role {
    pub fn of(request: &GenerationRequest) -> Self {
        if request.system.contains("tier-1") {
            Role::Reformulate
        } else if request.system.contains("technical expert") {
            Role::Draft
        } else {
            Role::Refine
        }
    }
}

/// Canned generator that answers by role and records every request
#[derive(Default)]
pub struct StubGenerator {
    failing: Vec<Role>,
    unhealthy: bool,
    calls: Mutex<Vec<GenerationRequest>>,
}

impl StubGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(mut self, role: Role) -> Self {
        self.failing.push(role);
        self
    }

    pub fn unhealthy(mut self) -> Self {
        self.unhealthy = true;
        self
    }

    pub fn calls(&self) -> Vec<GenerationRequest> {
        self.calls.lock().clone()
    }

    pub fn calls_for(&self, role: Role) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|r| Role::of(r) == role)
            .count()
    }
}

#[async_trait]
impl GenerationProvider for StubGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        self.calls.lock().push(request.clone());

        let role = Role::of(request);
        if self.failing.contains(&role) {
            return Err(Error::generation(format!("HTTP 500 from {}", SECRET_DETAIL)));
        }

        Ok(match role {
            Role::Reformulate => REFORMULATED,
            Role::Draft => DRAFT,
            Role::Refine => ANSWER,
        }
        .to_string())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(!self.unhealthy)
    }

    fn name(&self) -> &str {
        "stub"
    }

    fn model(&self) -> &str {
        "stub-model"
    }
}

/// Embeds every text to the same unit vector
pub struct StubEmbedder {
    texts: Mutex<Vec<String>>,
    model_dimensions: usize,
}

impl StubEmbedder {
    pub fn new() -> Self {
        Self {
            texts: Mutex::new(Vec::new()),
            model_dimensions: 3,
        }
    }

    /// Health checks see a model producing `dimensions`-long vectors
    pub fn with_model_dimensions(mut self, dimensions: usize) -> Self {
        self.model_dimensions = dimensions;
        self
    }

    pub fn embedded_texts(&self) -> Vec<String> {
        self.texts.lock().clone()
    }
}

#[async_trait]
impl EmbeddingProvider for StubEmbedder {
    async fn embed(&self, text: &str) -> Result<EmbeddingVector> {
        self.texts.lock().push(text.to_string());
        Ok(EmbeddingVector::new(vec![1.0, 0.0, 0.0]))
    }

    fn dimensions(&self) -> usize {
        3
    }

    async fn health_check(&self) -> Result<bool> {
        if self.model_dimensions != self.dimensions() {
            return Err(Error::DimensionMismatch {
                expected: self.dimensions(),
                actual: self.model_dimensions,
            });
        }
        Ok(true)
    }

    fn name(&self) -> &str {
        "stub"
    }
}

/// Store whose backend is unreachable
pub struct UnreachableStore;

#[async_trait]
impl KnowledgeStore for UnreachableStore {
    async fn nearest_neighbors(
        &self,
        _vector: &EmbeddingVector,
        _k: usize,
    ) -> Result<Vec<ScoredDocument>> {
        Err(Error::store(format!("connection to {} refused", SECRET_DETAIL)))
    }

    async fn len(&self) -> Result<usize> {
        Err(Error::store("unreachable"))
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(false)
    }

    fn name(&self) -> &str {
        "unreachable"
    }
}

/// Document whose cosine similarity to the stub query vector is `similarity`
pub fn document(id: &str, content: &str, similarity: f32) -> KnowledgeDocument {
    let rest = (1.0 - similarity * similarity).max(0.0).sqrt();
    KnowledgeDocument::new(id, content, vec![similarity, rest, 0.0])
}

pub fn router_store(similarity: f32) -> Arc<MemoryKnowledgeStore> {
    Arc::new(MemoryKnowledgeStore::new(
        3,
        vec![document("kb-router", ROUTER_DOC, similarity)],
    ))
}

/// Configuration with fast, deterministic retries
pub fn test_config(threshold: f32) -> SupportConfig {
    let mut config = SupportConfig::default();
    config.embeddings.dimensions = 3;
    config.retrieval.similarity_threshold = threshold;
    config.retry = RetryConfig {
        initial_backoff_ms: 1,
        max_backoff_ms: 2,
        jitter: false,
        ..Default::default()
    };
    config
}

pub fn state(
    config: SupportConfig,
    embedder: Arc<StubEmbedder>,
    store: Arc<dyn KnowledgeStore>,
    generator: Arc<StubGenerator>,
) -> AppState {
    AppState::from_parts(config, embedder, store, generator)
}
