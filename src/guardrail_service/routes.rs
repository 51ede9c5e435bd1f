//! Guardrail Service HTTP surface: three routes, one `BatchAggregator`
//! behind all of them.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::AppState;

#[derive(Debug, thiserror::Error)]
pub enum GuardrailServiceError {
    #[error(transparent)]
    Aggregator(#[from] super::aggregator::AggregatorError),
    #[error("request body missing a user message to classify")]
    MissingUserMessage,
}

impl IntoResponse for GuardrailServiceError {
    fn into_response(self) -> axum::response::Response {
        (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
    }
}

#[derive(Deserialize)]
pub struct SafecheckRequest {
    text: String,
}

#[derive(Serialize)]
pub struct SafecheckResponse {
    result: String,
}

/// `POST /safecheck` — classify a single text, returning `{"result": "safe"|"unsafe"}`.
pub async fn safecheck(
    State(state): State<AppState>,
    Json(body): Json<SafecheckRequest>,
) -> Result<Json<SafecheckResponse>, GuardrailServiceError> {
    let result = state.aggregator.classify(body.text).await?;
    Ok(Json(SafecheckResponse { result }))
}

#[derive(Deserialize)]
pub struct SafecheckBatchRequest {
    texts: Vec<String>,
}

#[derive(Serialize)]
pub struct SafecheckBatchResponse {
    results: Vec<String>,
}

/// `POST /safecheck_batch` — classify many texts. Each text is enqueued
/// independently and the results are gathered, preserving order.
pub async fn safecheck_batch(
    State(state): State<AppState>,
    Json(body): Json<SafecheckBatchRequest>,
) -> Result<Json<SafecheckBatchResponse>, GuardrailServiceError> {
    let futures = body.texts.into_iter().map(|t| state.aggregator.classify(t));
    let results = futures::future::try_join_all(futures).await?;
    Ok(Json(SafecheckBatchResponse { results }))
}

/// `POST /v1/chat/completions` — the chat-completions-shaped front door the
/// gateway calls. Extracts the trailing user message (the gateway already
/// wraps it as `"User: <window>"`) and wraps the aggregator's verdict back
/// into a chat-completion envelope so the gateway's `parse_safety_output`
/// regex finds what it expects.
pub async fn chat_completions(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, GuardrailServiceError> {
    let text = body["messages"]
        .as_array()
        .and_then(|msgs| msgs.last())
        .and_then(|m| m["content"].as_str())
        .ok_or(GuardrailServiceError::MissingUserMessage)?
        .to_string();

    let result = state.aggregator.classify(text).await?;

    Ok(Json(serde_json::json!({
        "id": format!("chat-{}", uuid::Uuid::new_v4()),
        "object": "chat.completion",
        "choices": [
            {"index": 0, "message": {"role": "assistant", "content": format!("\n\n{result}")}}
        ]
    })))
}
