//! Integration tests for the HTTP endpoints

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use std::sync::Arc;
use tower::ServiceExt;

use common::*;
use support_rag::server::state::AppState;
use support_rag::server::SupportServer;
use support_rag::types::MAX_QUERY_CHARS;

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_raw(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/support-query")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_query(body: serde_json::Value) -> Request<Body> {
    post_raw(&serde_json::to_string(&body).unwrap())
}

async fn send(state: AppState, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let app = SupportServer::with_state(state).router();
    let resp = ServiceExt::<Request<Body>>::oneshot(app, request).await.unwrap();
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), 1_000_000)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    (status, json)
}

fn default_state(generator: Arc<StubGenerator>) -> AppState {
    state(
        test_config(0.3),
        Arc::new(StubEmbedder::new()),
        router_store(0.62),
        generator,
    )
}

// --- GET /health, GET /, GET /ready ---

#[tokio::test]
async fn test_health_needs_no_providers() {
    let generator = Arc::new(StubGenerator::new().unhealthy());
    let state = state(
        test_config(0.3),
        Arc::new(StubEmbedder::new()),
        Arc::new(UnreachableStore),
        generator.clone(),
    );

    let (status, json) = send(state, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert!(json["timestamp"].is_string());
    assert_eq!(json["components"]["draft_synthesizer"], "active");
    assert!(generator.calls().is_empty());
}

#[tokio::test]
async fn test_info_lists_endpoints() {
    let (status, json) = send(default_state(Arc::new(StubGenerator::new())), get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["name"], "support-rag");
    assert!(json["endpoints"]["POST /support-query"].is_string());
}

#[tokio::test]
async fn test_ready_reports_document_count() {
    let (status, json) = send(default_state(Arc::new(StubGenerator::new())), get("/ready")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ready"], true);
    assert_eq!(json["document_count"], 1);
    assert_eq!(json["providers"]["embeddings"], "up");
    assert!(json.get("embedding_dimensions").is_none());
}

#[tokio::test]
async fn test_not_ready_when_generator_is_down() {
    let state = default_state(Arc::new(StubGenerator::new().unhealthy()));
    let (status, json) = send(state, get("/ready")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["providers"]["generation"], "down");
    assert_eq!(json["providers"]["embeddings"], "up");
}

#[tokio::test]
async fn test_not_ready_when_embedding_dimensions_disagree() {
    let state = state(
        test_config(0.3),
        Arc::new(StubEmbedder::new().with_model_dimensions(384)),
        router_store(0.62),
        Arc::new(StubGenerator::new()),
    );

    let (status, json) = send(state, get("/ready")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["ready"], false);
    assert_eq!(json["providers"]["embeddings"], "dimension_mismatch");
    assert_eq!(json["embedding_dimensions"]["configured"], 3);
    assert_eq!(json["embedding_dimensions"]["actual"], 384);
    assert_eq!(json["providers"]["generation"], "up");
}

// --- POST /support-query ---

#[tokio::test]
async fn test_router_query_returns_answer_and_source() {
    let generator = Arc::new(StubGenerator::new());
    let embedder = Arc::new(StubEmbedder::new());
    let state = state(
        test_config(0.3),
        embedder.clone(),
        router_store(0.62),
        generator.clone(),
    );

    let (status, json) = send(
        state,
        post_query(serde_json::json!({"query": "My router keeps disconnecting"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["final_answer"], ANSWER);
    assert_eq!(json["sources"], serde_json::json!([ROUTER_DOC]));
    assert_eq!(embedder.embedded_texts(), vec![REFORMULATED.to_string()]);
    assert_eq!(generator.calls_for(Role::Reformulate), 1);
    assert_eq!(generator.calls_for(Role::Draft), 1);
    assert_eq!(generator.calls_for(Role::Refine), 1);
}

#[tokio::test]
async fn test_empty_query_is_rejected_before_the_pipeline() {
    let generator = Arc::new(StubGenerator::new());
    let state = default_state(generator.clone());

    let (status, json) = send(state, post_query(serde_json::json!({"query": "   "}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["type"], "validation_error");
    assert!(generator.calls().is_empty());
}

#[tokio::test]
async fn test_missing_query_field_is_rejected() {
    let (status, json) = send(
        default_state(Arc::new(StubGenerator::new())),
        post_query(serde_json::json!({"question": "router"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["type"], "validation_error");
}

#[tokio::test]
async fn test_malformed_json_is_rejected() {
    let (status, json) = send(
        default_state(Arc::new(StubGenerator::new())),
        post_raw("{\"query\": "),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["type"], "validation_error");
}

#[tokio::test]
async fn test_oversized_query_is_rejected() {
    let query = "a".repeat(MAX_QUERY_CHARS + 1);
    let (status, _) = send(
        default_state(Arc::new(StubGenerator::new())),
        post_query(serde_json::json!({ "query": query })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_store_outage_is_503_without_detail() {
    let generator = Arc::new(StubGenerator::new());
    let state = state(
        test_config(0.3),
        Arc::new(StubEmbedder::new()),
        Arc::new(UnreachableStore),
        generator.clone(),
    );

    let (status, json) = send(state, post_query(serde_json::json!({"query": "router"}))).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["error"]["type"], "retrieval_failed");
    assert!(!json.to_string().contains(SECRET_DETAIL));
    assert_eq!(generator.calls_for(Role::Draft), 0);
}

#[tokio::test]
async fn test_drafting_outage_is_502_without_partial_answer() {
    let generator = Arc::new(StubGenerator::new().failing(Role::Draft));
    let state = default_state(generator.clone());

    let (status, json) = send(state, post_query(serde_json::json!({"query": "router"}))).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["error"]["type"], "generation_failed");
    assert!(json.get("final_answer").is_none());
    assert!(!json.to_string().contains(SECRET_DETAIL));
    assert_eq!(generator.calls_for(Role::Draft), 3);
    assert_eq!(generator.calls_for(Role::Refine), 0);
}

#[tokio::test]
async fn test_reformulation_outage_still_answers() {
    let generator = Arc::new(StubGenerator::new().failing(Role::Reformulate));
    let embedder = Arc::new(StubEmbedder::new());
    let state = state(
        test_config(0.3),
        embedder.clone(),
        router_store(0.62),
        generator,
    );

    let (status, json) = send(
        state,
        post_query(serde_json::json!({"query": "  My router keeps disconnecting "})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["sources"], serde_json::json!([ROUTER_DOC]));
    assert_eq!(
        embedder.embedded_texts(),
        vec!["My router keeps disconnecting".to_string()]
    );
}

#[tokio::test]
async fn test_high_threshold_answers_without_sources() {
    let generator = Arc::new(StubGenerator::new());
    let state = state(
        test_config(0.9),
        Arc::new(StubEmbedder::new()),
        router_store(0.5),
        generator.clone(),
    );

    let (status, json) = send(state, post_query(serde_json::json!({"query": "router"}))).await;

    assert_eq!(status, StatusCode::OK);
    assert!(json["final_answer"]
        .as_str()
        .unwrap()
        .contains("no documentation was found"));
    assert_eq!(json["sources"], serde_json::json!([]));
    assert_eq!(generator.calls_for(Role::Draft), 0);
    assert_eq!(generator.calls_for(Role::Refine), 0);
}

#[tokio::test]
async fn test_shutdown_cancels_queries() {
    let generator = Arc::new(StubGenerator::new());
    let state = default_state(generator.clone());
    state.shutdown();

    let (status, json) = send(state, post_query(serde_json::json!({"query": "router"}))).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["error"]["type"], "cancelled");
    assert!(generator.calls().is_empty());
}
