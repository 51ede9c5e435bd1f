//! Guardrail classifier, consumer side.
//!
//! Calls the guardrail service's chat-completions-shaped endpoint and parses
//! a `safe`/`unsafe` verdict out of the free-text response.

use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde_json::{Value, json};

use crate::categories::category_list;

const MAX_RETRIES: u32 = 3;
const PER_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(10);

/// A two-valued classification verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Safe,
    Unsafe,
}

/// Calls the guardrail service to classify a window of text.
pub struct GuardrailClassifier {
    client: Client,
    url: String,
    model: String,
    api_key: Option<String>,
}

impl GuardrailClassifier {
    pub fn new(url: String, model: String, api_key: Option<String>) -> Self {
        let client = Client::builder()
            .build()
            .expect("failed to build guardrail http client");
        Self {
            client,
            url,
            model,
            api_key,
        }
    }

    /// Classify `window`. Retries up to three times on transport failure or
    /// non-200 status with `0.1s * 2^attempt` backoff; after exhaustion,
    /// fails open to `Safe` so the stream keeps flowing.
    pub async fn classify(&self, window: &str) -> Verdict {
        let payload = self.build_payload(window);
        for attempt in 0..MAX_RETRIES {
            match self.try_once(&payload).await {
                Ok(verdict) => return verdict,
                Err(err) => {
                    tracing::warn!(attempt, error = %err, "guardrail classify attempt failed");
                    if attempt + 1 < MAX_RETRIES {
                        let backoff = Duration::from_secs_f64(0.1 * 2f64.powi(attempt as i32));
                        tokio::time::sleep(backoff).await;
                    }
                }
            }
        }
        tracing::error!(
            window_chars = window.chars().count(),
            "guardrail unavailable after all retries, failing open to safe"
        );
        Verdict::Safe
    }

    fn build_payload(&self, window: &str) -> Value {
        json!({
            "model": self.model,
            "messages": [
                {"role": "user", "content": ""},
                {"role": "system", "content": system_preamble()},
                {"role": "user", "content": format!("User: {window}")},
            ],
            "max_tokens": 10,
            "temperature": 1.0,
            "stream": false,
        })
    }

    async fn try_once(&self, payload: &Value) -> Result<Verdict, String> {
        let mut req = self
            .client
            .post(&self.url)
            .json(payload)
            .timeout(PER_ATTEMPT_TIMEOUT);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        let resp = req.send().await.map_err(|e| e.to_string())?;
        if !resp.status().is_success() {
            return Err(format!("guardrail http {}", resp.status()));
        }
        let body: Value = resp.json().await.map_err(|e| e.to_string())?;
        let content = body["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or("");
        Ok(parse_safety_output(content))
    }
}

fn system_preamble() -> String {
    format!(
        "Classify the given prompt as safe or unsafe. For unsafe responses, specify the category \
         (e.g., S1, S13) and provide reasoning behind your choice. Below is the safety policy with \
         the following categories:\n{}",
        category_list()
    )
}

static UNSAFE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)unsafe(?:\nS([1-9]|1[0-5]))?").unwrap());

/// Parse a guardrail's free-text output into a verdict.
///
/// Order matters: `unsafe` must be checked before the bare `safe` substring,
/// since `unsafe` contains `safe`. Unparseable output defaults to `Safe`
/// (fail-open).
pub fn parse_safety_output(content: &str) -> Verdict {
    if UNSAFE_PATTERN.is_match(content) {
        return Verdict::Unsafe;
    }
    if content.to_lowercase().contains("safe") {
        return Verdict::Safe;
    }
    Verdict::Safe
}
