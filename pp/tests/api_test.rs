//! Integration tests for the planning API
//!
//! These drive the axum router end-to-end with a scripted completion
//! collaborator, covering the planning fallback, the confirm & execute
//! flow, and the error surface.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use runstore::Store;

use planpilot::config::ExtractConfig;
use planpilot::extract::CandidateExtractor;
use planpilot::llm::{CompletionRequest, CompletionResponse, LlmClient, LlmError, StopReason, TokenUsage};
use planpilot::planner::{EnrichmentGenerator, MockPlanner, PlanGenerator};
use planpilot::prompts::PromptLoader;
use planpilot::server::{router, AppState};
use planpilot::Executor;

/// A completion collaborator that always fails, as if the provider timed out
struct TimedOutLlm;

#[async_trait]
impl LlmClient for TimedOutLlm {
    async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        Err(LlmError::InvalidResponse(
            "request timed out after 60000ms".to_string(),
        ))
    }
}

/// A collaborator that replays one fixed text response forever
struct FixedLlm(String);

#[async_trait]
impl LlmClient for FixedLlm {
    async fn complete(&self, _request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        Ok(CompletionResponse {
            content: Some(self.0.clone()),
            stop_reason: StopReason::EndTurn,
            usage: TokenUsage::default(),
        })
    }
}

fn app_state(llm: Option<Arc<dyn LlmClient>>) -> Arc<AppState> {
    let config = ExtractConfig::default();
    let prompts = PromptLoader::embedded_only();
    let extractor = CandidateExtractor::new(config.task_labels.clone(), config.max_candidates);
    let store = Store::new();

    let generator = PlanGenerator::new(llm.clone(), prompts.clone(), extractor.clone(), 1024, 0.2);
    let enricher = EnrichmentGenerator::new(llm, prompts, 1024);
    let executor = Executor::new(store.clone(), enricher, extractor, None);

    Arc::new(AppState {
        store,
        generator,
        mock: MockPlanner::from_config(&config),
        executor,
    })
}

async fn request_json(
    app: axum::Router,
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let request = match body {
        Some(json) => Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn test_health() {
    let app = router(app_state(None));
    let (status, body) = request_json(app, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_create_run_times_out_and_falls_back_to_mock() {
    let app = router(app_state(Some(Arc::new(TimedOutLlm))));

    let (status, body) = request_json(
        app,
        "POST",
        "/api/runs",
        Some(serde_json::json!({ "input": "My plan for next week. Task: Gym, Reading" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["_fallback"], "mock");
    assert!(body["_ai_error"].as_str().unwrap().contains("timed out"));
    assert_eq!(body["detected_intent"]["intent"], "create_tasks");
    assert_eq!(
        body["preview"]["task_candidates"],
        serde_json::json!(["Gym", "Reading"])
    );
    assert!(body["runId"].as_str().unwrap().starts_with("run_"));
}

#[tokio::test]
async fn test_create_run_with_valid_model_plan() {
    let plan_text = r#"{
        "detected_intent": {
            "intent": "create_tasks",
            "confidence": 0.82,
            "entities": { "time_range": { "type": "preset", "value": "next_week" } },
            "missing_fields": [],
            "requires_confirmation": false
        },
        "actions": [
            { "id": "a1", "type": "create_task_list",
              "input": { "time_range": { "type": "preset", "value": "next_week" } } }
        ],
        "preview": { "task_candidates": ["Gym", "Reading"] }
    }"#;
    let app = router(app_state(Some(Arc::new(FixedLlm(plan_text.to_string())))));

    let (status, body) = request_json(
        app,
        "POST",
        "/api/runs",
        Some(serde_json::json!({ "input": "Task: Gym, Reading" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.get("_fallback").is_none());
    assert_eq!(body["detected_intent"]["intent"], "create_tasks");
    // Post-processing synthesized the send_email step
    assert_eq!(body["actions"].as_array().unwrap().len(), 2);
    assert_eq!(body["actions"][1]["type"], "send_email");
    assert_eq!(body["actions"][1]["depends_on"], serde_json::json!(["a1"]));
}

#[tokio::test]
async fn test_create_run_input_boundary() {
    // Exactly 4000 characters is accepted
    let state = app_state(None);
    let (status, _) = request_json(
        router(state.clone()),
        "POST",
        "/api/runs",
        Some(serde_json::json!({ "input": "x".repeat(4000) })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // 4001 characters is rejected with a 400 and field detail
    let (status, body) = request_json(
        router(state),
        "POST",
        "/api/runs",
        Some(serde_json::json!({ "input": "x".repeat(4001) })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("input"));
}

#[tokio::test]
async fn test_create_run_empty_input_rejected() {
    let (status, body) = request_json(
        router(app_state(None)),
        "POST",
        "/api/runs",
        Some(serde_json::json!({ "input": "" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.get("error").is_some());
}

#[tokio::test]
async fn test_execute_unknown_run_is_404() {
    let (status, body) = request_json(
        router(app_state(None)),
        "POST",
        "/api/runs/unknown_id/execute",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Run not found");
}

#[tokio::test]
async fn test_plan_then_execute_flow() {
    let state = app_state(None);

    let (_, created) = request_json(
        router(state.clone()),
        "POST",
        "/api/runs",
        Some(serde_json::json!({ "input": "Task: Gym, Reading" })),
    )
    .await;
    let run_id = created["runId"].as_str().unwrap();

    let (status, body) = request_json(
        router(state),
        "POST",
        &format!("/api/runs/{}/execute", run_id),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["runId"], run_id);
    assert_eq!(body["results"]["tasks"][0]["title"], "Gym");
    assert_eq!(body["results"]["tasks"][0]["priority"], "high");
    assert_eq!(body["results"]["time_range"]["value"], "next_week");
    assert_eq!(body["logs"][0]["status"], "done");
    assert!(body.get("email_status").is_none());
}

#[tokio::test]
async fn test_execute_twice_both_succeed() {
    let state = app_state(None);

    let (_, created) = request_json(
        router(state.clone()),
        "POST",
        "/api/runs",
        Some(serde_json::json!({ "input": "Task: Gym" })),
    )
    .await;
    let run_id = created["runId"].as_str().unwrap().to_string();

    let uri = format!("/api/runs/{}/execute", run_id);
    let (status1, body1) = request_json(router(state.clone()), "POST", &uri, None).await;
    let (status2, body2) = request_json(router(state), "POST", &uri, None).await;

    assert_eq!(status1, StatusCode::OK);
    assert_eq!(status2, StatusCode::OK);
    assert_eq!(body1["status"], "success");
    assert_eq!(body2["status"], "success");
    assert_eq!(body1["results"]["tasks"], body2["results"]["tasks"]);
}

#[tokio::test]
async fn test_email_before_execute_is_400() {
    let state = app_state(None);

    let (_, created) = request_json(
        router(state.clone()),
        "POST",
        "/api/runs",
        Some(serde_json::json!({ "input": "Task: Gym" })),
    )
    .await;
    let run_id = created["runId"].as_str().unwrap();

    let (status, body) = request_json(
        router(state),
        "POST",
        &format!("/api/runs/{}/email", run_id),
        Some(serde_json::json!({ "to": "user@example.com" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Run is not executed yet");
}

#[tokio::test]
async fn test_email_after_execute_reports_unconfigured_delivery() {
    let state = app_state(None);

    let (_, created) = request_json(
        router(state.clone()),
        "POST",
        "/api/runs",
        Some(serde_json::json!({ "input": "Task: Gym" })),
    )
    .await;
    let run_id = created["runId"].as_str().unwrap().to_string();

    request_json(
        router(state.clone()),
        "POST",
        &format!("/api/runs/{}/execute", run_id),
        None,
    )
    .await;

    let (status, body) = request_json(
        router(state),
        "POST",
        &format!("/api/runs/{}/email", run_id),
        Some(serde_json::json!({ "to": "user@example.com" })),
    )
    .await;

    // Delivery is unconfigured in tests: the request succeeds and the
    // status reports the failure verbatim
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["runId"], run_id);
    assert_eq!(body["email_status"]["sent"], false);
    assert_eq!(body["email_status"]["to"], "user@example.com");
    assert!(body["email_status"]["error"]
        .as_str()
        .unwrap()
        .contains("not configured"));
}

#[tokio::test]
async fn test_email_with_invalid_address_is_400() {
    let state = app_state(None);

    let (_, created) = request_json(
        router(state.clone()),
        "POST",
        "/api/runs",
        Some(serde_json::json!({ "input": "Task: Gym" })),
    )
    .await;
    let run_id = created["runId"].as_str().unwrap();

    let (status, _) = request_json(
        router(state),
        "POST",
        &format!("/api/runs/{}/email", run_id),
        Some(serde_json::json!({ "to": "not-an-address" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_run_roundtrip() {
    let state = app_state(None);

    let (_, created) = request_json(
        router(state.clone()),
        "POST",
        "/api/runs",
        Some(serde_json::json!({ "input": "Task: Gym" })),
    )
    .await;
    let run_id = created["runId"].as_str().unwrap().to_string();

    let (status, body) = request_json(
        router(state.clone()),
        "GET",
        &format!("/api/runs/{}", run_id),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["runId"], run_id);
    assert_eq!(body["input"], "Task: Gym");
    assert_eq!(body["executed"], false);

    let (status, _) = request_json(router(state), "GET", "/api/runs/run_missing", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_execute_with_inline_email() {
    let state = app_state(None);

    let (_, created) = request_json(
        router(state.clone()),
        "POST",
        "/api/runs",
        Some(serde_json::json!({ "input": "Task: Gym" })),
    )
    .await;
    let run_id = created["runId"].as_str().unwrap();

    let (status, body) = request_json(
        router(state),
        "POST",
        &format!("/api/runs/{}/execute", run_id),
        Some(serde_json::json!({ "email": "user@example.com" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["email_status"]["to"], "user@example.com");
    assert_eq!(body["email_status"]["sent"], false);
}
