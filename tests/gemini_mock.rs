//! Gemini client tests against a local mock of the generateContent API.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use compute_landscape::config::IntelligenceConfig;
use compute_landscape::core::intelligence::{Intelligence, IntelligenceError};
use compute_landscape::gemini::GeminiClient;

#[derive(Clone, Default)]
struct MockState {
    calls: Arc<AtomicUsize>,
    last_body: Arc<Mutex<Option<Value>>>,
    last_model: Arc<Mutex<Option<String>>>,
}

fn candidate(text: &str) -> Value {
    json!({
        "candidates": [{
            "content": { "role": "model", "parts": [{ "text": text }] },
            "finishReason": "STOP"
        }]
    })
}

/// Answers based on the model name and the request shape:
/// - model `denied` → 403
/// - model `flaky` → 503 on the first call, then success
/// - model `broken` → 400
/// - model `throttled` → 429 with `Retry-After: 0` on the first call, then success
/// - model `prose` → non-JSON text for structured requests
async fn handle_generate(
    State(state): State<MockState>,
    Path(call): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let n = state.calls.fetch_add(1, Ordering::SeqCst);
    let model = call.split_once(':').map(|(m, _)| m).unwrap_or(&call).to_string();
    *state.last_model.lock().unwrap() = Some(model.clone());
    *state.last_body.lock().unwrap() = Some(body.clone());

    if headers.get("x-goog-api-key").and_then(|v| v.to_str().ok()) != Some("test-key") {
        return (StatusCode::UNAUTHORIZED, "missing key").into_response();
    }
    match model.as_str() {
        "denied" => return (StatusCode::FORBIDDEN, "denied").into_response(),
        "broken" => return (StatusCode::BAD_REQUEST, "invalid argument").into_response(),
        "flaky" if n == 0 => return (StatusCode::SERVICE_UNAVAILABLE, "busy").into_response(),
        "throttled" if n == 0 => {
            return (
                StatusCode::TOO_MANY_REQUESTS,
                [(axum::http::header::RETRY_AFTER, "0")],
                "quota",
            )
                .into_response()
        }
        _ => {}
    }

    let schema_props = &body["generationConfig"]["responseSchema"]["properties"];
    let text = if model == "prose" {
        "I think Cerebras is the leader.".to_string()
    } else if schema_props.get("results").is_some() {
        json!({
            "results": [{
                "segmentId": "ep-photonic",
                "analysis": { "companies": [], "summary": "Photonics", "trends": ["Optical I/O"] }
            }]
        })
        .to_string()
    } else if schema_props.get("companies").is_some() {
        let analysis = json!({
            "companies": [{ "name": "Cerebras", "specialization": "WSE-3", "description": "Wafer-scale" }],
            "summary": "Wafer scale is shipping",
            "trends": ["On-wafer SRAM"]
        });
        format!("```json\n{}\n```", analysis)
    } else if schema_props.get("answer").is_some() {
        json!({ "answer": "HBM is scarce", "relatedTopics": ["CoWoS"] }).to_string()
    } else if body.get("tools").is_some() {
        let mut resp = candidate("Cerebras leads wafer scale.");
        resp["candidates"][0]["groundingMetadata"] = json!({
            "groundingChunks": [{ "web": { "uri": "https://news.example/wse3", "title": "WSE-3" } }]
        });
        return Json(resp).into_response();
    } else {
        "Based on the research data, Cerebras.".to_string()
    };

    Json(candidate(&text)).into_response()
}

async fn start_mock() -> (String, MockState) {
    let state = MockState::default();
    let app = Router::new()
        .route("/v1beta/models/{call}", post(handle_generate))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}/v1beta", addr), state)
}

fn client(base_url: &str, model: &str, max_retries: u32) -> GeminiClient {
    let cfg = IntelligenceConfig {
        provider: "gemini".into(),
        model: model.into(),
        bulk_model: "bulk-model".into(),
        base_url: Some(base_url.to_string()),
        timeout_secs: 5,
        max_retries,
        ..Default::default()
    };
    GeminiClient::new_with_key(&cfg, "test-key".into()).unwrap()
}

#[tokio::test]
async fn test_structured_extract_accepts_fenced_json() {
    let (base, state) = start_mock().await;
    let gemini = client(&base, "flash", 0);

    let analysis = gemini
        .structured_extract("Wafer Scale", "Cerebras notes")
        .await
        .unwrap();
    assert_eq!(analysis.companies[0].name, "Cerebras");
    assert_eq!(analysis.trends, vec!["On-wafer SRAM".to_string()]);

    let body = state.last_body.lock().unwrap().clone().unwrap();
    assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
    let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
    assert!(prompt.contains("Wafer Scale"));
    assert!(prompt.contains("Cerebras notes"));
}

#[tokio::test]
async fn test_bulk_uses_bulk_model() {
    let (base, state) = start_mock().await;
    let gemini = client(&base, "flash", 0);

    let ids = vec!["ep-photonic".to_string()];
    let research = gemini.bulk_extract("narrative", &ids).await.unwrap();
    assert_eq!(research["ep-photonic"].summary, "Photonics");
    assert_eq!(state.last_model.lock().unwrap().as_deref(), Some("bulk-model"));
}

#[tokio::test]
async fn test_contextual_query_returns_citations() {
    let (base, state) = start_mock().await;
    let gemini = client(&base, "flash", 0);

    let answer = gemini.contextual_query("Wafer Scale", "who leads?").await.unwrap();
    assert_eq!(answer.answer_text, "Cerebras leads wafer scale.");
    assert_eq!(answer.citations.len(), 1);
    assert_eq!(answer.citations[0].url, "https://news.example/wse3");

    let body = state.last_body.lock().unwrap().clone().unwrap();
    assert!(body["tools"][0].get("googleSearch").is_some());
}

#[tokio::test]
async fn test_free_text_and_assistant() {
    let (base, _) = start_mock().await;
    let gemini = client(&base, "flash", 0);

    let answer = gemini.free_text_query("HBM?").await.unwrap();
    assert_eq!(answer.answer_text, "HBM is scarce");
    assert_eq!(answer.related_topics, vec!["CoWoS".to_string()]);

    let reply = gemini
        .assistant_query("Wafer Scale", "Summary: x", "who?")
        .await
        .unwrap();
    assert_eq!(reply, "Based on the research data, Cerebras.");
}

#[tokio::test]
async fn test_prose_is_shape_mismatch() {
    let (base, _) = start_mock().await;
    let gemini = client(&base, "prose", 0);

    let err = gemini
        .structured_extract("Wafer Scale", "notes")
        .await
        .unwrap_err();
    assert!(matches!(err, IntelligenceError::ShapeMismatch { .. }));

    // Free text keeps prose as the answer.
    let answer = gemini.free_text_query("who?").await.unwrap();
    assert_eq!(answer.answer_text, "I think Cerebras is the leader.");
    assert!(answer.related_topics.is_empty());
}

#[tokio::test]
async fn test_auth_failure_is_not_retried() {
    let (base, state) = start_mock().await;
    let gemini = client(&base, "denied", 3);

    let err = gemini.free_text_query("q").await.unwrap_err();
    assert!(matches!(err, IntelligenceError::Auth { .. }));
    assert_eq!(state.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_client_error_is_rejected() {
    let (base, state) = start_mock().await;
    let gemini = client(&base, "broken", 3);

    let err = gemini.assistant_query("t", "c", "q").await.unwrap_err();
    assert_eq!(
        err,
        IntelligenceError::Rejected {
            status: 400,
            message: "invalid argument".into()
        }
    );
    assert_eq!(state.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_server_error_is_retried() {
    let (base, state) = start_mock().await;
    let gemini = client(&base, "flaky", 1);

    let reply = gemini.assistant_query("t", "c", "q").await.unwrap();
    assert!(!reply.is_empty());
    assert_eq!(state.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_retries_exhausted_is_transient() {
    let (base, state) = start_mock().await;
    let gemini = client(&base, "flaky", 0);

    let err = gemini.assistant_query("t", "c", "q").await.unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(state.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_rate_limit_reports_retry_after() {
    let (base, state) = start_mock().await;
    let gemini = client(&base, "throttled", 0);

    let err = gemini.assistant_query("t", "c", "q").await.unwrap_err();
    assert_eq!(
        err,
        IntelligenceError::RateLimited {
            retry_after_secs: Some(0)
        }
    );
    assert_eq!(state.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_rate_limit_waits_retry_after_then_succeeds() {
    let (base, state) = start_mock().await;
    let gemini = client(&base, "throttled", 1);

    let started = std::time::Instant::now();
    let reply = gemini.assistant_query("t", "c", "q").await.unwrap();
    assert!(!reply.is_empty());
    assert_eq!(state.calls.load(Ordering::SeqCst), 2);
    // Retry-After: 0 replaces the 1s exponential step.
    assert!(started.elapsed() < std::time::Duration::from_millis(900));
}
