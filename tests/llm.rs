mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
};
use serde_json::{Value, json};
use web_summarizer::config::LlmConfig;
use web_summarizer::error::AppError;
use web_summarizer::llm::{GenerationRequest, LlmClient, TextGenerator};

#[derive(Default)]
struct Captured {
    body: Option<Value>,
    auth: Option<String>,
}

async fn completions(
    State(captured): State<Arc<Mutex<Captured>>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    let mut captured = captured.lock().unwrap();
    captured.auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    captured.body = Some(body);

    Json(json!({
        "choices": [{ "message": { "role": "assistant", "content": "A page about gates." } }]
    }))
}

fn llm_config(base_url: String) -> LlmConfig {
    LlmConfig {
        api_key: "test-key".to_string(),
        base_url,
        model: "gpt-3.5-turbo".to_string(),
        timeout: Duration::from_secs(5),
    }
}

#[tokio::test]
async fn sends_stuffed_prompt_at_zero_temperature() {
    let captured = Arc::new(Mutex::new(Captured::default()));
    let app = Router::new()
        .route("/v1/chat/completions", post(completions))
        .with_state(Arc::clone(&captured));
    let base = common::spawn_server(app).await;

    let client = LlmClient::new(&llm_config(format!("{}/v1/", base))).unwrap();
    let summary = client
        .generate(GenerationRequest {
            chunks: vec!["alpha chunk".to_string(), "beta chunk".to_string()],
            temperature: 0.0,
        })
        .await
        .unwrap();

    assert_eq!(summary, "A page about gates.");

    let captured = captured.lock().unwrap();
    assert_eq!(captured.auth.as_deref(), Some("Bearer test-key"));
    let body = captured.body.as_ref().unwrap();
    assert_eq!(body["model"], "gpt-3.5-turbo");
    assert_eq!(body["temperature"], 0.0);
    let prompt = body["messages"][0]["content"].as_str().unwrap();
    assert!(prompt.find("alpha chunk").unwrap() < prompt.find("beta chunk").unwrap());
}

#[tokio::test]
async fn error_status_is_a_summary_error() {
    let app = Router::new().route(
        "/chat/completions",
        post(|| async { (StatusCode::TOO_MANY_REQUESTS, "rate limited") }),
    );
    let base = common::spawn_server(app).await;

    let client = LlmClient::new(&llm_config(base)).unwrap();
    let err = client
        .generate(GenerationRequest {
            chunks: vec!["text".to_string()],
            temperature: 0.0,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::SummaryError(_)));
    assert!(err.to_string().contains("429"), "{err}");
}

#[tokio::test]
async fn malformed_reply_is_a_summary_error() {
    let app = Router::new().route(
        "/chat/completions",
        post(|| async { Json(json!({ "choices": [] })) }),
    );
    let base = common::spawn_server(app).await;

    let client = LlmClient::new(&llm_config(base)).unwrap();
    let err = client
        .generate(GenerationRequest {
            chunks: vec![],
            temperature: 0.0,
        })
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::SummaryError(_)));
}
