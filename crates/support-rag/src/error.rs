//! Error types for the support pipeline

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for support pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Support pipeline errors
#[derive(Debug, Error)]
pub enum Error {
    /// Bad caller input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Embedding provider failed or timed out
    #[error("Embedding unavailable: {0}")]
    EmbeddingUnavailable(String),

    /// Embedding length does not match the configured dimension
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Knowledge store unreachable
    #[error("Knowledge store unavailable: {0}")]
    StoreUnavailable(String),

    /// Generation provider failed
    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    /// A stage ran past its elapsed-time budget
    #[error("{operation} timed out after {elapsed:?}")]
    Timeout {
        operation: String,
        elapsed: Duration,
    },

    /// The pipeline run was cancelled
    #[error("Request cancelled")]
    Cancelled,

    /// Pipeline state machine violation
    #[error("Invalid pipeline transition from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an embedding error
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::EmbeddingUnavailable(message.into())
    }

    /// Create a knowledge store error
    pub fn store(message: impl Into<String>) -> Self {
        Self::StoreUnavailable(message.into())
    }

    /// Create a generation error
    pub fn generation(message: impl Into<String>) -> Self {
        Self::GenerationFailed(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Whether a retry can reasonably succeed
    ///
    /// Only provider-side failures are transient. Caller input, configuration and
    /// dimension mismatches fail the same way every time.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            Error::EmbeddingUnavailable(_)
                | Error::StoreUnavailable(_)
                | Error::GenerationFailed(_)
        )
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            Error::Validation(msg) => (StatusCode::BAD_REQUEST, "validation_error", msg.clone()),
            Error::EmbeddingUnavailable(_)
            | Error::StoreUnavailable(_)
            | Error::DimensionMismatch { .. } => (
                StatusCode::SERVICE_UNAVAILABLE,
                "retrieval_failed",
                "We could not search the knowledge base right now. Please try again later."
                    .to_string(),
            ),
            Error::GenerationFailed(_) | Error::Timeout { .. } => (
                StatusCode::BAD_GATEWAY,
                "generation_failed",
                "We could not generate an answer right now. Please try again later.".to_string(),
            ),
            Error::Cancelled => (
                StatusCode::SERVICE_UNAVAILABLE,
                "cancelled",
                "The request was cancelled before it completed.".to_string(),
            ),
            Error::Config(_)
            | Error::InvalidTransition { .. }
            | Error::Io(_)
            | Error::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "An internal error occurred while processing your request. Please try again later."
                    .to_string(),
            ),
        };

        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        let body = Json(json!({
            "error": {
                "type": error_type,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}
