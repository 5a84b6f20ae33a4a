//! Sequences the pipeline stages for one support query

use std::future::Future;
use std::sync::Arc;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::SupportConfig;
use crate::error::{Error, Result};
use crate::providers::{EmbeddingProvider, GenerationProvider, KnowledgeStore};
use crate::retrieval::Retriever;
use crate::types::{FinalResponse, Query, ReformulatedQuery};

use super::refiner::ResponseRefiner;
use super::reformulator::QueryReformulator;
use super::retry::RetryPolicy;
use super::state::{
    FailureKind, PipelineFailure, PipelineOutcome, PipelineRun, PipelineStage, StageTracker,
};
use super::synthesizer::DraftSynthesizer;

/// Runs reformulation, retrieval, drafting and refinement for each request
///
/// Stages run strictly in order. Each stage call is retried by the shared
/// [`RetryPolicy`] and raced against the request's cancellation token.
/// Reformulation failures fall back to the raw query; any other stage failure
/// ends the run as `Failed`.
pub struct PipelineOrchestrator {
    reformulator: QueryReformulator,
    retriever: Retriever,
    synthesizer: DraftSynthesizer,
    refiner: ResponseRefiner,
    retry: RetryPolicy,
}

impl PipelineOrchestrator {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn KnowledgeStore>,
        generator: Arc<dyn GenerationProvider>,
        config: &SupportConfig,
    ) -> Self {
        let temperature = config.generation.temperature;

        Self {
            reformulator: QueryReformulator::new(generator.clone(), temperature),
            retriever: Retriever::new(embedder, store, &config.retrieval),
            synthesizer: DraftSynthesizer::new(
                generator.clone(),
                temperature,
                config.retrieval.max_excerpt_chars,
            ),
            refiner: ResponseRefiner::new(generator, temperature),
            retry: RetryPolicy::from_config(&config.retry),
        }
    }

    /// Process a query to completion
    pub async fn process(&self, query: Query) -> PipelineRun {
        self.process_with_cancellation(query, CancellationToken::new())
            .await
    }

    /// Process a query, abandoning remaining stages once `cancel` fires
    pub async fn process_with_cancellation(
        &self,
        query: Query,
        cancel: CancellationToken,
    ) -> PipelineRun {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!("support_query", %request_id);

        self.run(request_id, query, cancel).instrument(span).await
    }

    async fn run(&self, request_id: Uuid, query: Query, cancel: CancellationToken) -> PipelineRun {
        let started = Instant::now();
        let mut tracker = StageTracker::new();
        let mut used_fallback_query = false;

        tracing::info!("Support query received ({} chars)", query.as_str().chars().count());

        let outcome = match self
            .run_stages(&query, &cancel, &mut tracker, &mut used_fallback_query)
            .await
        {
            Ok(response) => {
                tracing::info!(
                    "Support query completed in {:?} with {} sources",
                    started.elapsed(),
                    response.sources.len()
                );
                PipelineOutcome::Completed(response)
            }
            Err(failure) => {
                tracker.fail();
                tracing::error!(
                    "Support query failed in {:?}: {}",
                    started.elapsed(),
                    failure
                );
                PipelineOutcome::Failed(failure)
            }
        };

        PipelineRun {
            request_id,
            outcome,
            transitions: tracker.into_history(),
            used_fallback_query,
        }
    }

    async fn run_stages(
        &self,
        query: &Query,
        cancel: &CancellationToken,
        tracker: &mut StageTracker,
        used_fallback_query: &mut bool,
    ) -> std::result::Result<FinalResponse, PipelineFailure> {
        enter(tracker, PipelineStage::Reformulating)?;
        let reformulated = match cancellable(
            cancel,
            self.retry
                .run("reformulate", || self.reformulator.reformulate(query)),
        )
        .await
        {
            Ok(reformulated) => reformulated,
            Err(Error::Cancelled) => {
                return Err(classify(Error::Cancelled, PipelineStage::Reformulating))
            }
            Err(e) => {
                tracing::warn!("Reformulation failed, using the original query: {}", e);
                ReformulatedQuery::passthrough(query.clone())
            }
        };
        *used_fallback_query = reformulated.is_fallback();

        enter(tracker, PipelineStage::Retrieving)?;
        let retrieved = cancellable(
            cancel,
            self.retry
                .run("retrieve", || self.retriever.retrieve(reformulated.text())),
        )
        .await
        .map_err(|e| classify(e, PipelineStage::Retrieving))?;
        tracing::info!("Retrieved {} relevant documents", retrieved.len());

        enter(tracker, PipelineStage::Drafting)?;
        let draft = cancellable(
            cancel,
            self.retry
                .run("draft", || self.synthesizer.synthesize(&reformulated, &retrieved)),
        )
        .await
        .map_err(|e| classify(e, PipelineStage::Drafting))?;

        enter(tracker, PipelineStage::Refining)?;
        let response = cancellable(
            cancel,
            self.retry.run("refine", || self.refiner.refine(&draft)),
        )
        .await
        .map_err(|e| classify(e, PipelineStage::Refining))?;

        enter(tracker, PipelineStage::Completed)?;
        Ok(response)
    }
}

fn enter(
    tracker: &mut StageTracker,
    stage: PipelineStage,
) -> std::result::Result<(), PipelineFailure> {
    tracker.advance(stage).map_err(|e| {
        tracing::error!("{}", e);
        PipelineFailure::new(FailureKind::Internal, tracker.current())
    })
}

/// Race a stage against the cancellation token
async fn cancellable<T>(
    cancel: &CancellationToken,
    stage: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        result = stage => result,
    }
}

/// Map a stage error to a terminal failure, logging the detail
fn classify(error: Error, stage: PipelineStage) -> PipelineFailure {
    let kind = match (&error, stage) {
        (Error::Cancelled, _) => FailureKind::Cancelled,
        (_, PipelineStage::Retrieving) => FailureKind::RetrievalFailed,
        (_, PipelineStage::Drafting | PipelineStage::Refining) => FailureKind::GenerationFailed,
        _ => FailureKind::Internal,
    };

    if kind == FailureKind::Cancelled {
        tracing::info!("Support query cancelled during {}", stage);
    } else {
        tracing::error!("{} stage failed: {}", stage, error);
    }

    PipelineFailure::new(kind, stage)
}
