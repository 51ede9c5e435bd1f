//! Gateway-facing error type and its HTTP mapping.
//!
//! One `thiserror` enum per concern, each variant mapped to the status code
//! a client should see for it.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Errors the gateway request handler can surface to the client.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Missing or mismatched bearer token.
    #[error("unauthorized")]
    Unauthorized,

    /// Upstream generator could not be reached after exhausting retries,
    /// and no bytes of the response body had been yielded yet.
    #[error("upstream connect failed: {0}")]
    UpstreamUnavailable(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = match &self {
            GatewayError::Unauthorized => StatusCode::UNAUTHORIZED,
            GatewayError::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
        };
        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
