//! End-to-end scenarios driven against a live gateway router bound to an
//! ephemeral port, with wiremock standing in for both the upstream
//! generator and the guardrail service.

use std::time::Duration;

use streamguard::{config::GatewayConfig, gateway};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_string_contains, method, path},
};

async fn spawn_gateway(state: gateway::AppState) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = gateway::router(state);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn base_config(upstream_url: String, guardrail_url: String) -> GatewayConfig {
    GatewayConfig {
        upstream_url,
        upstream_api_key: None,
        guardrail_url,
        guardrail_model: "llama-guard".to_string(),
        guardrail_api_key: None,
        buffer_size: 5,
        flush_interval: Duration::from_secs_f64(0.5),
        api_key: "test-key".to_string(),
        bind_addr: "127.0.0.1:0".to_string(),
    }
}

async fn mock_guardrail_always(server: &MockServer, content: &str) {
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{"message": {"content": content}}]
        })))
        .mount(server)
        .await;
}

async fn post_chat(base_url: &str, api_key: &str, body: serde_json::Value) -> String {
    let client = reqwest::Client::new();
    client
        .post(format!("{base_url}/v1/chat/completions"))
        .bearer_auth(api_key)
        .json(&body)
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap()
}

fn extract_deltas(sse_body: &str) -> Vec<String> {
    sse_body
        .lines()
        .filter_map(|l| l.strip_prefix("data: "))
        .filter_map(|j| serde_json::from_str::<serde_json::Value>(j).ok())
        .map(|v| {
            v["choices"][0]["delta"]["content"]
                .as_str()
                .unwrap_or_default()
                .to_string()
        })
        .collect()
}

#[tokio::test]
async fn s1_passthrough_splits_into_exact_windows() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            "data: {\"choices\":[{\"delta\":{\"content\":\"hello world!\"}}]}\ndata: [DONE]\n",
            "text/event-stream",
        ))
        .mount(&upstream)
        .await;

    let guardrail = MockServer::start().await;
    mock_guardrail_always(&guardrail, "\n\nsafe").await;

    let config = base_config(
        format!("{}/v1/chat/completions", upstream.uri()),
        format!("{}/v1/chat/completions", guardrail.uri()),
    );
    let state = gateway::AppState::new(&config);
    let base = spawn_gateway(state).await;

    let body = post_chat(&base, "test-key", serde_json::json!({"model": "m", "stream": true})).await;
    let deltas = extract_deltas(&body);

    assert_eq!(deltas, vec!["hello", " worl", "d!", "[DONE]"]);
}

#[tokio::test]
async fn s2_unsafe_window_is_annotated() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            "data: {\"choices\":[{\"delta\":{\"content\":\"hello world!\"}}]}\ndata: [DONE]\n",
            "text/event-stream",
        ))
        .mount(&upstream)
        .await;

    let guardrail = MockServer::start().await;
    // The second window (" worl") is classified unsafe; every other window
    // classifies safe. Matching on request body content (rather than call
    // order) keeps this deterministic regardless of mock dispatch order.
    Mock::given(method("POST"))
        .and(body_string_contains("User:  worl"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{"message": {"content": "\n\nunsafe\nS3"}}]
        })))
        .priority(1)
        .mount(&guardrail)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{"message": {"content": "\n\nsafe"}}]
        })))
        .priority(5)
        .mount(&guardrail)
        .await;

    let config = base_config(
        format!("{}/v1/chat/completions", upstream.uri()),
        format!("{}/v1/chat/completions", guardrail.uri()),
    );
    let state = gateway::AppState::new(&config);
    let base = spawn_gateway(state).await;

    let body = post_chat(&base, "test-key", serde_json::json!({"model": "m", "stream": true})).await;
    let deltas = extract_deltas(&body);

    assert_eq!(deltas, vec!["hello", "[UNSAFE]  worl", "d!", "[DONE]"]);
}

#[tokio::test]
async fn s4_upstream_mid_stream_abort_still_terminates_cleanly() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(
                    "data: {\"choices\":[{\"delta\":{\"content\":\"abcde\"}}]}\n",
                    "text/event-stream",
                ),
        )
        .mount(&upstream)
        .await;

    let guardrail = MockServer::start().await;
    mock_guardrail_always(&guardrail, "\n\nsafe").await;

    let config = base_config(
        format!("{}/v1/chat/completions", upstream.uri()),
        format!("{}/v1/chat/completions", guardrail.uri()),
    );
    let state = gateway::AppState::new(&config);
    let base = spawn_gateway(state).await;

    let body = post_chat(&base, "test-key", serde_json::json!({"model": "m", "stream": true})).await;
    let deltas = extract_deltas(&body);

    assert_eq!(deltas, vec!["abcde", "[DONE]"]);
}

#[tokio::test]
async fn s5_guardrail_down_fails_open_unprefixed() {
    let upstream = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            "data: {\"choices\":[{\"delta\":{\"content\":\"danger\"}}]}\ndata: [DONE]\n",
            "text/event-stream",
        ))
        .mount(&upstream)
        .await;

    let guardrail = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&guardrail)
        .await;

    let config = base_config(
        format!("{}/v1/chat/completions", upstream.uri()),
        format!("{}/v1/chat/completions", guardrail.uri()),
    );
    let state = gateway::AppState::new(&config);
    let base = spawn_gateway(state).await;

    let body = post_chat(&base, "test-key", serde_json::json!({"model": "m", "stream": true})).await;
    let deltas = extract_deltas(&body);

    assert_eq!(deltas, vec!["dange", "r", "[DONE]"]);
}

#[tokio::test]
async fn unauthorized_request_never_reaches_upstream() {
    // No mock mounted on either server: if the gateway incorrectly reached
    // upstream before checking auth, it would get an unmatched-request 404
    // instead of the 401 this test asserts on.
    let upstream = MockServer::start().await;
    let guardrail = MockServer::start().await;

    let config = base_config(
        format!("{}/v1/chat/completions", upstream.uri()),
        format!("{}/v1/chat/completions", guardrail.uri()),
    );
    let state = gateway::AppState::new(&config);
    let base = spawn_gateway(state).await;

    let client = reqwest::Client::new();
    let resp = client
        .post(format!("{base}/v1/chat/completions"))
        .json(&serde_json::json!({"model": "m"}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), reqwest::StatusCode::UNAUTHORIZED);
}
