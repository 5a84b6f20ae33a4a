//! Pipeline run states and terminal outcomes
//!
//! A run moves strictly forward:
//!
//! ```text
//! Received → Reformulating → Retrieving → Drafting → Refining → Completed
//!     └────────────┴─────────────┴───────────┴──────────┴──────→ Failed
//! ```
//!
//! No stage is skipped and terminal states have no outgoing edges.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use std::fmt;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::FinalResponse;

/// Stage of a single pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Received,
    Reformulating,
    Retrieving,
    Drafting,
    Refining,
    /// Terminal success
    Completed,
    /// Terminal failure
    Failed,
}

impl PipelineStage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineStage::Completed | PipelineStage::Failed)
    }

    /// Validate a move to `next`
    pub fn transition(self, next: PipelineStage) -> Result<PipelineStage> {
        use PipelineStage::*;

        let valid = match (self, next) {
            (Received, Reformulating)
            | (Reformulating, Retrieving)
            | (Retrieving, Drafting)
            | (Drafting, Refining)
            | (Refining, Completed) => true,
            (from, Failed) => !from.is_terminal(),
            _ => false,
        };

        if valid {
            Ok(next)
        } else {
            Err(Error::InvalidTransition {
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Received => "received",
            PipelineStage::Reformulating => "reformulating",
            PipelineStage::Retrieving => "retrieving",
            PipelineStage::Drafting => "drafting",
            PipelineStage::Refining => "refining",
            PipelineStage::Completed => "completed",
            PipelineStage::Failed => "failed",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Records every stage a run passes through
#[derive(Debug, Clone)]
pub struct StageTracker {
    current: PipelineStage,
    history: Vec<PipelineStage>,
}

impl Default for StageTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl StageTracker {
    pub fn new() -> Self {
        Self {
            current: PipelineStage::Received,
            history: vec![PipelineStage::Received],
        }
    }

    pub fn current(&self) -> PipelineStage {
        self.current
    }

    pub fn advance(&mut self, next: PipelineStage) -> Result<()> {
        self.current = self.current.transition(next)?;
        self.history.push(next);
        tracing::debug!("Pipeline stage: {}", next);
        Ok(())
    }

    /// Move to `Failed` unless the run already ended
    pub fn fail(&mut self) {
        if !self.current.is_terminal() {
            self.current = PipelineStage::Failed;
            self.history.push(PipelineStage::Failed);
        }
    }

    pub fn into_history(self) -> Vec<PipelineStage> {
        self.history
    }
}

/// Why a run ended in `Failed`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    RetrievalFailed,
    GenerationFailed,
    Cancelled,
    /// A broken pipeline invariant, never expected at runtime
    Internal,
}

impl FailureKind {
    pub fn status_code(&self) -> StatusCode {
        match self {
            FailureKind::RetrievalFailed => StatusCode::SERVICE_UNAVAILABLE,
            FailureKind::GenerationFailed => StatusCode::BAD_GATEWAY,
            FailureKind::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
            FailureKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::RetrievalFailed => "retrieval_failed",
            FailureKind::GenerationFailed => "generation_failed",
            FailureKind::Cancelled => "cancelled",
            FailureKind::Internal => "internal_error",
        }
    }

    /// Caller-safe message
    pub fn message(&self) -> &'static str {
        match self {
            FailureKind::RetrievalFailed => {
                "We could not search the knowledge base right now. Please try again later."
            }
            FailureKind::GenerationFailed => {
                "We could not generate an answer right now. Please try again later."
            }
            FailureKind::Cancelled => "The request was cancelled before it completed.",
            FailureKind::Internal => {
                "An internal error occurred while processing your request. Please try again later."
            }
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal failure of a run
///
/// Holds only caller-safe text. Provider detail is logged where the failure
/// is classified and never stored here.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} during {stage}")]
pub struct PipelineFailure {
    pub kind: FailureKind,
    /// Stage that was running when the run failed
    pub stage: PipelineStage,
    pub message: String,
}

impl PipelineFailure {
    pub fn new(kind: FailureKind, stage: PipelineStage) -> Self {
        Self {
            kind,
            stage,
            message: kind.message().to_string(),
        }
    }
}

impl IntoResponse for PipelineFailure {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": {
                "type": self.kind.as_str(),
                "message": self.message,
            }
        }));

        (self.kind.status_code(), body).into_response()
    }
}

/// Terminal state of a run
#[derive(Debug, Clone)]
pub enum PipelineOutcome {
    Completed(FinalResponse),
    Failed(PipelineFailure),
}

impl PipelineOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, PipelineOutcome::Completed(_))
    }
}

/// Everything known about a finished run
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub request_id: Uuid,
    pub outcome: PipelineOutcome,
    /// Stages visited, in order, ending with a terminal stage
    pub transitions: Vec<PipelineStage>,
    /// True when reformulation failed and the raw query was used
    pub used_fallback_query: bool,
}

impl PipelineRun {
    pub fn into_result(self) -> std::result::Result<FinalResponse, PipelineFailure> {
        match self.outcome {
            PipelineOutcome::Completed(response) => Ok(response),
            PipelineOutcome::Failed(failure) => Err(failure),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        let mut tracker = StageTracker::new();
        for stage in [
            PipelineStage::Reformulating,
            PipelineStage::Retrieving,
            PipelineStage::Drafting,
            PipelineStage::Refining,
            PipelineStage::Completed,
        ] {
            tracker.advance(stage).unwrap();
        }
        assert_eq!(tracker.current(), PipelineStage::Completed);
        assert_eq!(tracker.into_history().len(), 6);
    }

    #[test]
    fn test_skipping_a_stage_is_rejected() {
        let result = PipelineStage::Reformulating.transition(PipelineStage::Drafting);
        assert!(matches!(result, Err(Error::InvalidTransition { .. })));
        assert!(PipelineStage::Received
            .transition(PipelineStage::Completed)
            .is_err());
        assert!(PipelineStage::Drafting
            .transition(PipelineStage::Retrieving)
            .is_err());
    }

    #[test]
    fn test_terminal_states_are_final() {
        assert!(PipelineStage::Completed
            .transition(PipelineStage::Failed)
            .is_err());
        assert!(PipelineStage::Failed
            .transition(PipelineStage::Reformulating)
            .is_err());
    }

    #[test]
    fn test_any_running_stage_can_fail() {
        for stage in [
            PipelineStage::Received,
            PipelineStage::Reformulating,
            PipelineStage::Retrieving,
            PipelineStage::Drafting,
            PipelineStage::Refining,
        ] {
            assert_eq!(
                stage.transition(PipelineStage::Failed).unwrap(),
                PipelineStage::Failed
            );
        }
    }

    #[test]
    fn test_fail_is_idempotent() {
        let mut tracker = StageTracker::new();
        tracker.fail();
        tracker.fail();
        assert_eq!(
            tracker.into_history(),
            vec![PipelineStage::Received, PipelineStage::Failed]
        );
    }

    #[test]
    fn test_failure_status_codes() {
        let failure = PipelineFailure::new(FailureKind::RetrievalFailed, PipelineStage::Retrieving);
        assert_eq!(failure.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);

        let failure = PipelineFailure::new(FailureKind::GenerationFailed, PipelineStage::Drafting);
        assert_eq!(failure.into_response().status(), StatusCode::BAD_GATEWAY);

        let failure = PipelineFailure::new(FailureKind::Cancelled, PipelineStage::Refining);
        assert_eq!(failure.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
