//! OpenAI-style chat-completion JSON shapes and SSE line parsing.
//!
//! The request body is treated as opaque JSON and forwarded verbatim; only
//! the response side needs typed shapes.

use serde_json::{Value, json};

/// Extracted content from one upstream SSE data line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamLine {
    /// A delta/message content fragment (possibly empty).
    Content(String),
    /// The `data: [DONE]` sentinel.
    Done,
}

/// Parse the suffix of an SSE `data: ` line (after the prefix has been
/// stripped) into either a content fragment or the done sentinel.
///
/// Returns `None` on JSON parse failure (caller logs and skips the line) or
/// when the payload carries no content under either the streaming
/// (`delta.content`) or non-streaming (`message.content`) shape.
pub fn parse_data_suffix(suffix: &str) -> Option<UpstreamLine> {
    if suffix == "[DONE]" {
        return Some(UpstreamLine::Done);
    }

    let json: Value = serde_json::from_str(suffix).ok()?;
    let choice = json.get("choices")?.as_array()?.first()?;

    let content = choice
        .get("delta")
        .and_then(|d| d.get("content"))
        .and_then(|c| c.as_str())
        .or_else(|| {
            choice
                .get("message")
                .and_then(|m| m.get("content"))
                .and_then(|c| c.as_str())
        })
        .unwrap_or("");

    Some(UpstreamLine::Content(content.to_string()))
}

/// Build a client-visible SSE chunk envelope carrying `content` as the delta.
///
/// `id` is a fresh UUID; `created` is the current Unix-seconds timestamp.
/// Both are passed in so callers (and tests) control them rather than this
/// function reaching for wall-clock/random state itself.
pub fn chunk_envelope(id: &str, created: i64, model: &str, content: &str) -> Value {
    json!({
        "id": id,
        "object": "chat.completion.chunk",
        "created": created,
        "model": model,
        "choices": [{
            "index": 0,
            "delta": { "content": content },
            "finish_reason": Value::Null,
        }],
    })
}

/// Serialize a chunk envelope as a full SSE frame (`data: <json>\n\n`).
pub fn sse_frame(envelope: &Value) -> String {
    format!("data: {}\n\n", envelope)
}
