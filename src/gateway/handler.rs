//! Per-request streaming state machine.
//!
//! `INIT -> STREAMING -> FINALIZING -> DONE`, with `ABORTED` handled
//! implicitly: an axum `Sse` stream stops being polled on client disconnect,
//! which drops the upstream line stream and aborts the in-flight HTTP
//! request without emitting a terminator.

use std::{collections::VecDeque, convert::Infallible, sync::Arc};

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::Stream;
use serde_json::Value;
use tokio::time::Instant;
use uuid::Uuid;

use super::AppState;
use crate::{
    chat::{UpstreamLine, chunk_envelope, parse_data_suffix},
    error::GatewayError,
    guardrail_client::{GuardrailClassifier, Verdict},
    window::WindowBuffer,
};

const INTER_LINE_PAUSE: std::time::Duration = std::time::Duration::from_millis(10);

pub async fn chat_completions(
    State(state): State<AppState>,
    axum::Json(body): axum::Json<Value>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, GatewayError> {
    let model = body
        .get("model")
        .and_then(|m| m.as_str())
        .unwrap_or("unknown")
        .to_string();

    let lines = state.upstream.stream_lines(&body).await?;

    let stream_state = StreamState {
        lines,
        window: WindowBuffer::new(state.buffer_size),
        classifier: state.guardrail.clone(),
        model,
        flush_interval: state.flush_interval,
        last_flush: Instant::now(),
        pending: VecDeque::new(),
        finished: false,
    };

    let stream = futures::stream::unfold(stream_state, drive_state_machine);
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

struct StreamState {
    lines: std::pin::Pin<Box<dyn Stream<Item = String> + Send>>,
    window: WindowBuffer,
    classifier: Arc<GuardrailClassifier>,
    model: String,
    flush_interval: std::time::Duration,
    last_flush: Instant,
    /// Events already resolved, waiting to be handed to the caller one at a
    /// time (a single upstream line can produce a window emission and,
    /// separately, a time-triggered flush emission).
    pending: VecDeque<Event>,
    finished: bool,
}

async fn drive_state_machine(
    mut state: StreamState,
) -> Option<(Result<Event, Infallible>, StreamState)> {
    use futures::StreamExt;

    loop {
        if let Some(event) = state.pending.pop_front() {
            return Some((Ok(event), state));
        }
        if state.finished {
            return None;
        }

        match state.lines.next().await {
            Some(line) => process_line(&mut state, &line).await,
            None => {
                // Upstream closed without `[DONE]`: flush and terminate rather
                // than retry, which would duplicate already-yielded text.
                finalize(&mut state).await;
                state.finished = true;
            }
        }

        tokio::time::sleep(INTER_LINE_PAUSE).await;
    }
}

async fn process_line(state: &mut StreamState, raw_line: &str) {
    let line = raw_line.trim_end();
    if line.is_empty() {
        maybe_time_flush(state).await;
        return;
    }

    let Some(suffix) = line.strip_prefix("data: ") else {
        maybe_time_flush(state).await;
        return;
    };

    match parse_data_suffix(suffix) {
        Some(UpstreamLine::Done) => {
            finalize(state).await;
            state.finished = true;
            return;
        }
        Some(UpstreamLine::Content(content)) => {
            for window in state.window.add(&content) {
                emit_window(state, window).await;
            }
        }
        None => {
            tracing::warn!(line = %line, "skipping malformed upstream JSON line");
        }
    }

    maybe_time_flush(state).await;
}

async fn maybe_time_flush(state: &mut StreamState) {
    if state.flush_interval.is_zero() {
        return;
    }
    let now = Instant::now();
    if now.duration_since(state.last_flush) >= state.flush_interval {
        let leftover = state.window.flush();
        if !leftover.is_empty() {
            emit_window(state, leftover).await;
        }
        state.last_flush = now;
    }
}

/// Flush any remaining buffered text and emit it, then emit the terminator.
async fn finalize(state: &mut StreamState) {
    let leftover = state.window.flush();
    if !leftover.is_empty() {
        emit_window(state, leftover).await;
    }
    state.pending.push_back(terminator_event(&state.model));
}

async fn emit_window(state: &mut StreamState, window: String) {
    let verdict = state.classifier.classify(&window).await;
    let content = match verdict {
        Verdict::Safe => window,
        Verdict::Unsafe => format!("[UNSAFE] {window}"),
    };
    let envelope = chunk_envelope(&Uuid::new_v4().to_string(), now_unix(), &state.model, &content);
    state.pending.push_back(sse_event(&envelope));
}

fn terminator_event(model: &str) -> Event {
    let envelope = chunk_envelope(&Uuid::new_v4().to_string(), now_unix(), model, "[DONE]");
    sse_event(&envelope)
}

fn sse_event(envelope: &Value) -> Event {
    Event::default().data(envelope.to_string())
}

fn now_unix() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
