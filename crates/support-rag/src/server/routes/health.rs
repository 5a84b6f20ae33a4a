//! Liveness and readiness endpoints

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use serde_json::{json, Value};

use crate::error::Error;
use crate::server::state::AppState;

/// GET /health - Process liveness, no provider calls
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
        "started_at": state.started_at().to_rfc3339(),
        "components": {
            "query_reformulator": "active",
            "draft_synthesizer": "active",
            "response_refiner": "active",
        }
    }))
}

/// GET /ready - Provider health and knowledge base size
pub async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let (embeddings, generation, store) = tokio::join!(
        state.embedding_provider().health_check(),
        state.generation_provider().health_check(),
        state.knowledge_store().len(),
    );

    let mismatch = match &embeddings {
        Err(Error::DimensionMismatch { expected, actual }) => Some(json!({
            "configured": expected,
            "actual": actual,
        })),
        _ => None,
    };
    let embeddings_label = match (&embeddings, &mismatch) {
        (_, Some(_)) => "dimension_mismatch",
        (Ok(true), _) => "up",
        _ => "down",
    };
    let embeddings_ok = matches!(embeddings, Ok(true));
    let generation_ok = generation.unwrap_or(false);
    let document_count = store.ok();
    let ready = embeddings_ok && generation_ok && document_count.is_some();

    if !ready {
        tracing::warn!(
            "Not ready (embeddings: {}, generation: {}, store: {})",
            embeddings_label,
            generation_ok,
            document_count.is_some()
        );
    }

    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let mut body = json!({
        "ready": ready,
        "providers": {
            "embeddings": embeddings_label,
            "generation": status_label(generation_ok),
            "knowledge_store": status_label(document_count.is_some()),
        },
        "document_count": document_count,
    });
    if let Some(dimensions) = mismatch {
        body["embedding_dimensions"] = dimensions;
    }

    (status, Json(body))
}

fn status_label(ok: bool) -> &'static str {
    if ok {
        "up"
    } else {
        "down"
    }
}
