//! Environment-variable configuration for both binaries.
//!
//! The entire configuration surface is environment variables, so each
//! config struct is loaded straight from `std::env` with documented
//! defaults.

use std::time::Duration;

/// Configuration for the `gateway` binary.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Upstream generator endpoint (`VLLM_SERVER_URL`).
    pub upstream_url: String,
    /// Optional bearer token for the upstream generator (`VLLM_API_KEY`).
    pub upstream_api_key: Option<String>,
    /// Guardrail chat-completions endpoint (`SAFETY_SERVICE_URL`).
    pub guardrail_url: String,
    /// Model id sent in the guardrail payload (`SAFETY_MODEL`).
    pub guardrail_model: String,
    /// Optional bearer token for the guardrail service (`SAFETY_API_KEY`).
    pub guardrail_api_key: Option<String>,
    /// Window size in characters (`BUFFER_SIZE`).
    pub buffer_size: usize,
    /// Idle-flush threshold; zero disables time-based flush (`FLUSH_INTERVAL`).
    pub flush_interval: Duration,
    /// Gateway client bearer token (`API_KEY`).
    pub api_key: String,
    /// Host:port to bind the gateway HTTP server to.
    pub bind_addr: String,
}

impl GatewayConfig {
    pub fn from_env() -> Self {
        Self {
            upstream_url: env_string(
                "VLLM_SERVER_URL",
                "http://localhost:8001/v1/chat/completions",
            ),
            upstream_api_key: env_opt_string("VLLM_API_KEY"),
            guardrail_url: env_string(
                "SAFETY_SERVICE_URL",
                "http://localhost:8002/v1/chat/completions",
            ),
            guardrail_model: env_string("SAFETY_MODEL", "llama-guard"),
            guardrail_api_key: env_opt_string("SAFETY_API_KEY"),
            buffer_size: env_parsed("BUFFER_SIZE", 5),
            flush_interval: Duration::from_secs_f64(env_parsed("FLUSH_INTERVAL", 0.5)),
            api_key: env_string("API_KEY", "mysecretapikey"),
            bind_addr: env_string("GATEWAY_BIND_ADDR", "0.0.0.0:8000"),
        }
    }
}

/// Configuration for the `guardrail` binary.
#[derive(Debug, Clone)]
pub struct GuardrailConfig {
    /// Model id the guardrail service reports as loaded (`GUARDRAIL_MODEL_NAME`).
    pub model_name: String,
    /// Batch aggregation tick (`BATCH_INTERVAL`).
    pub batch_interval: Duration,
    /// Host:port to bind the guardrail HTTP server to.
    pub bind_addr: String,
}

impl GuardrailConfig {
    pub fn from_env() -> Self {
        Self {
            model_name: env_string("GUARDRAIL_MODEL_NAME", "meta-llama/LlamaGuard"),
            batch_interval: Duration::from_secs_f64(env_parsed("BATCH_INTERVAL", 0.05)),
            bind_addr: env_string("GUARDRAIL_BIND_ADDR", "0.0.0.0:8002"),
        }
    }
}

fn env_string(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_opt_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn env_parsed<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
