//! Upstream generator stream client.
//!
//! Opens a single POST to the configured upstream and yields response body
//! lines lazily as they arrive.

use std::{pin::Pin, time::Duration};

use futures::Stream;
use reqwest::Client;
use serde_json::Value;

use crate::error::GatewayError;

const MAX_RETRIES: u32 = 3;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// A line-yielding client for the upstream chat-completions generator.
pub struct UpstreamClient {
    client: Client,
    url: String,
    api_key: Option<String>,
}

impl UpstreamClient {
    pub fn new(url: String, api_key: Option<String>) -> Self {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            // No read timeout: generations can run long.
            .build()
            .expect("failed to build upstream http client");
        Self {
            client,
            url,
            api_key,
        }
    }

    /// Open a POST stream to the upstream generator, retrying with
    /// exponential backoff (`0.1s * 2^attempt`) only while no bytes of the
    /// response body have yet been yielded downstream. Once the stream is
    /// returned, connection failures are terminal.
    pub async fn stream_lines(
        &self,
        payload: &Value,
    ) -> Result<Pin<Box<dyn Stream<Item = String> + Send>>, GatewayError> {
        let response = self.connect_with_retry(payload).await?;
        Ok(Box::pin(line_stream(response)))
    }

    async fn connect_with_retry(
        &self,
        payload: &Value,
    ) -> Result<reqwest::Response, GatewayError> {
        let mut last_err = String::new();
        for attempt in 0..MAX_RETRIES {
            let mut req = self.client.post(&self.url).json(payload);
            if let Some(key) = &self.api_key {
                req = req.bearer_auth(key);
            }
            match req.send().await {
                Ok(resp) => return Ok(resp),
                Err(err) => {
                    tracing::warn!(attempt, error = %err, "upstream connect attempt failed");
                    last_err = err.to_string();
                    if attempt + 1 < MAX_RETRIES {
                        let backoff = Duration::from_secs_f64(0.1 * 2f64.powi(attempt as i32));
                        tokio::time::sleep(backoff).await;
                    }
                }
            }
        }
        tracing::error!(error = %last_err, "upstream connect failed after all retries");
        Err(GatewayError::UpstreamUnavailable(last_err))
    }
}

/// Turn a response body into a stream of newline-delimited lines, buffering
/// partial lines across chunk boundaries. The final partial line (if the
/// body ends without a trailing newline) is yielded once on EOF.
fn line_stream(response: reqwest::Response) -> impl Stream<Item = String> {
    futures::stream::unfold(
        (response, String::new(), false),
        |(mut resp, mut buf, eof)| async move {
            loop {
                if let Some(idx) = buf.find('\n') {
                    let line = buf[..idx].trim_end_matches('\r').to_string();
                    buf.drain(..=idx);
                    return Some((line, (resp, buf, eof)));
                }
                if eof {
                    if buf.is_empty() {
                        return None;
                    }
                    let line = std::mem::take(&mut buf);
                    return Some((line, (resp, buf, true)));
                }
                match resp.chunk().await {
                    Ok(Some(bytes)) => buf.push_str(&String::from_utf8_lossy(&bytes)),
                    Ok(None) => return next_on_eof(resp, buf),
                    Err(err) => {
                        tracing::warn!(error = %err, "upstream mid-stream read error");
                        return next_on_eof(resp, buf);
                    }
                }
            }
        },
    )
}

fn next_on_eof(
    resp: reqwest::Response,
    mut buf: String,
) -> Option<(String, (reqwest::Response, String, bool))> {
    if buf.is_empty() {
        None
    } else {
        let line = std::mem::take(&mut buf);
        Some((line, (resp, buf, true)))
    }
}
