//! Guardrail Service HTTP surface: router construction and shared state.

pub mod aggregator;
pub mod model;
mod routes;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::config::GuardrailConfig;
use aggregator::BatchAggregator;
use model::{GuardrailModel, HeuristicModel};

pub use aggregator::AggregatorError;

/// Shared state injected into every guardrail-service request handler.
#[derive(Clone)]
pub struct AppState {
    pub aggregator: BatchAggregator,
}

impl AppState {
    pub fn new(config: &GuardrailConfig) -> Self {
        Self::with_model(config, Arc::new(HeuristicModel::new()))
    }

    /// Construct with an explicit model, for operators wiring in a real
    /// model runtime (or tests substituting an instrumented one).
    pub fn with_model(config: &GuardrailConfig, model: Arc<dyn GuardrailModel>) -> Self {
        Self {
            aggregator: BatchAggregator::spawn(model, config.batch_interval),
        }
    }
}

/// Build the guardrail service's axum router. Three front doors share one
/// `BatchAggregator`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/chat/completions", post(routes::chat_completions))
        .route("/safecheck", post(routes::safecheck))
        .route("/safecheck_batch", post(routes::safecheck_batch))
        .route("/health", get(health))
        .layer(RequestBodyLimitLayer::new(10 * 1024 * 1024))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
