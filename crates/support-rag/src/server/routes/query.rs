//! Support query endpoint

use axum::{
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Response},
    Json,
};

use crate::error::Error;
use crate::server::state::AppState;
use crate::types::SupportQueryRequest;

/// POST /support-query - Answer a customer support question
///
/// Validation happens before the pipeline starts. Pipeline failures map to
/// 503 (retrieval or cancellation) and 502 (generation) with generic messages.
pub async fn support_query(
    State(state): State<AppState>,
    payload: Result<Json<SupportQueryRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::debug!("Rejected support query body: {}", rejection.body_text());
            return Error::validation("Request body must be JSON with a 'query' string")
                .into_response();
        }
    };

    let query = match request.into_query() {
        Ok(query) => query,
        Err(e) => return e.into_response(),
    };

    let run = state
        .orchestrator()
        .process_with_cancellation(query, state.request_token())
        .await;

    match run.into_result() {
        Ok(response) => Json(response).into_response(),
        Err(failure) => failure.into_response(),
    }
}
