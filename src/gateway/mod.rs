//! Gateway HTTP surface: router construction, auth, and the streaming
//! request handler.

mod handler;

use std::sync::Arc;

use axum::{
    Router,
    extract::Request,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::{config::GatewayConfig, guardrail_client::GuardrailClassifier, upstream::UpstreamClient};

pub use handler::chat_completions;

/// Shared state injected into every gateway request handler, constructed
/// once at service start rather than rebuilt per request.
#[derive(Clone)]
pub struct AppState {
    pub upstream: Arc<UpstreamClient>,
    pub guardrail: Arc<GuardrailClassifier>,
    pub api_key: Arc<String>,
    pub buffer_size: usize,
    pub flush_interval: std::time::Duration,
}

impl AppState {
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            upstream: Arc::new(UpstreamClient::new(
                config.upstream_url.clone(),
                config.upstream_api_key.clone(),
            )),
            guardrail: Arc::new(GuardrailClassifier::new(
                config.guardrail_url.clone(),
                config.guardrail_model.clone(),
                config.guardrail_api_key.clone(),
            )),
            api_key: Arc::new(config.api_key.clone()),
            buffer_size: config.buffer_size,
            flush_interval: config.flush_interval,
        }
    }
}

/// Build the gateway's axum router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/chat/completions", post(chat_completions))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_bearer_auth))
        .route("/health", get(health))
        .layer(RequestBodyLimitLayer::new(10 * 1024 * 1024))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

/// Exact-string bearer check against the configured `API_KEY`. Runs before
/// any upstream call; a mismatch or missing header returns 401 immediately.
async fn require_bearer_auth(
    axum::extract::State(state): axum::extract::State<AppState>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let expected = format!("Bearer {}", state.api_key);
    let provided = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if provided != expected {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(next.run(request).await)
}
