//! End-to-end guardrail-service scenarios covering batching behavior and
//! all three HTTP front doors, driven against a live router bound to an
//! ephemeral port with an instrumented model standing in for a real guard
//! model.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use streamguard::{
    config::GuardrailConfig,
    guardrail_service::{self, model::GuardrailModel},
};

struct CountingSafeModel {
    calls: Arc<AtomicUsize>,
}

impl GuardrailModel for CountingSafeModel {
    fn predict_batch(&self, texts: &[String]) -> Vec<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        texts.iter().map(|_| "safe".to_string()).collect()
    }
}

async fn spawn_guardrail(state: guardrail_service::AppState) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = guardrail_service::router(state);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn s6_three_concurrent_safechecks_share_one_model_invocation() {
    let calls = Arc::new(AtomicUsize::new(0));
    let config = GuardrailConfig {
        model_name: "m".into(),
        batch_interval: std::time::Duration::from_millis(50),
        bind_addr: "127.0.0.1:0".into(),
    };
    let state = guardrail_service::AppState::with_model(
        &config,
        Arc::new(CountingSafeModel { calls: calls.clone() }),
    );
    let base = spawn_guardrail(state).await;

    let client = reqwest::Client::new();
    let post = |text: &str| {
        let client = client.clone();
        let base = base.clone();
        let text = text.to_string();
        async move {
            client
                .post(format!("{base}/safecheck"))
                .json(&serde_json::json!({"text": text}))
                .send()
                .await
                .unwrap()
        }
    };

    let (r1, r2, r3) = tokio::join!(post("one"), post("two"), post("three"));
    assert!(r1.status().is_success());
    assert!(r2.status().is_success());
    assert!(r3.status().is_success());

    assert_eq!(calls.load(Ordering::SeqCst), 1, "three requests within one interval should share one model call");
}

#[tokio::test]
async fn safecheck_batch_returns_one_result_per_input_in_order() {
    let config = GuardrailConfig {
        model_name: "m".into(),
        batch_interval: std::time::Duration::from_millis(20),
        bind_addr: "127.0.0.1:0".into(),
    };
    let state = guardrail_service::AppState::new(&config);
    let base = spawn_guardrail(state).await;

    let client = reqwest::Client::new();
    let resp = client
        .post(format!("{base}/safecheck_batch"))
        .json(&serde_json::json!({"texts": ["hello", "a bomb threat", "world"]}))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_success());
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["results"], serde_json::json!(["safe", "unsafe", "safe"]));
}

#[tokio::test]
async fn chat_completions_front_door_is_reachable_by_the_gateways_classifier() {
    let config = GuardrailConfig {
        model_name: "m".into(),
        batch_interval: std::time::Duration::from_millis(20),
        bind_addr: "127.0.0.1:0".into(),
    };
    let state = guardrail_service::AppState::new(&config);
    let base = spawn_guardrail(state).await;

    let classifier = streamguard::guardrail_client::GuardrailClassifier::new(
        format!("{base}/v1/chat/completions"),
        "llama-guard".to_string(),
        None,
    );

    let verdict = classifier.classify("a bomb threat").await;
    assert_eq!(verdict, streamguard::guardrail_client::Verdict::Unsafe);
}
