//! Application state for the support server

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::config::SupportConfig;
use crate::error::{Error, Result};
use crate::pipeline::PipelineOrchestrator;
use crate::providers::{
    build_embedder, build_generator, EmbeddingProvider, GenerationProvider, KnowledgeStore,
    MemoryKnowledgeStore,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: SupportConfig,
    orchestrator: PipelineOrchestrator,
    embedder: Arc<dyn EmbeddingProvider>,
    generator: Arc<dyn GenerationProvider>,
    store: Arc<dyn KnowledgeStore>,
    /// Cancelled on shutdown; every request runs under a child token
    shutdown: CancellationToken,
    started_at: DateTime<Utc>,
}

impl AppState {
    /// Build providers from configuration and load the knowledge snapshot
    pub async fn new(config: SupportConfig) -> Result<Self> {
        tracing::info!(
            "Initializing support state (embeddings: {:?}, generation: {:?})",
            config.embeddings.backend,
            config.generation.backend
        );

        let embedder = build_embedder(&config.embeddings, config.generation.api_key.clone())?;
        tracing::info!(
            "Embedding provider initialized ({}, {} dims)",
            embedder.name(),
            embedder.dimensions()
        );
        match embedder.health_check().await {
            Ok(true) => {}
            Ok(false) => tracing::warn!("Embedding provider is not reachable yet"),
            Err(Error::DimensionMismatch { expected, actual }) => tracing::warn!(
                "Embedding model {} returns {} dimensions but {} are configured; \
                 set EMBEDDING_DIMENSIONS to match the model and the knowledge snapshot",
                config.embeddings.model,
                actual,
                expected
            ),
            Err(e) => tracing::warn!("Embedding health check failed: {}", e),
        }

        let generator = build_generator(&config.generation)?;
        tracing::info!(
            "Generation provider initialized ({}, model {})",
            generator.name(),
            generator.model()
        );

        let store =
            MemoryKnowledgeStore::load(&config.knowledge_store, config.embeddings.dimensions)
                .await?;
        tracing::info!("Knowledge store ready with {} documents", store.document_count());

        Ok(Self::from_parts(config, embedder, Arc::new(store), generator))
    }

    /// Assemble state from already-constructed providers
    pub fn from_parts(
        config: SupportConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn KnowledgeStore>,
        generator: Arc<dyn GenerationProvider>,
    ) -> Self {
        let orchestrator = PipelineOrchestrator::new(
            embedder.clone(),
            store.clone(),
            generator.clone(),
            &config,
        );

        Self {
            inner: Arc::new(AppStateInner {
                config,
                orchestrator,
                embedder,
                generator,
                store,
                shutdown: CancellationToken::new(),
                started_at: Utc::now(),
            }),
        }
    }

    pub fn config(&self) -> &SupportConfig {
        &self.inner.config
    }

    pub fn orchestrator(&self) -> &PipelineOrchestrator {
        &self.inner.orchestrator
    }

    pub fn embedding_provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.inner.embedder
    }

    pub fn generation_provider(&self) -> &Arc<dyn GenerationProvider> {
        &self.inner.generator
    }

    pub fn knowledge_store(&self) -> &Arc<dyn KnowledgeStore> {
        &self.inner.store
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.inner.started_at
    }

    /// Token for one request, cancelled when the server shuts down
    pub fn request_token(&self) -> CancellationToken {
        self.inner.shutdown.child_token()
    }

    /// Cancel every in-flight pipeline run
    pub fn shutdown(&self) {
        self.inner.shutdown.cancel();
    }
}
