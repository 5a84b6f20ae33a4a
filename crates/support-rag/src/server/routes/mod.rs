//! HTTP routes for the support server

pub mod health;
pub mod query;

use axum::{
    routing::{get, post},
    Router,
};

use crate::server::state::AppState;

/// Build all routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(info))
        .route("/health", get(health::health))
        .route("/ready", get(health::readiness))
        .route("/support-query", post(query::support_query))
}

/// Service info endpoint
async fn info() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "name": "support-rag",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Customer support answers grounded on a technical knowledge base",
        "endpoints": {
            "POST /support-query": "Answer a customer support query with sources",
            "GET /health": "Process health",
            "GET /ready": "Provider readiness and knowledge base size"
        }
    }))
}
