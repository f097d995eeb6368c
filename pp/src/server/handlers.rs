//! HTTP handlers for the planning API

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;
use validator::Validate;

use crate::domain::Run;
use crate::schema::{Action, DetectedIntent, EmailStatus, ExecuteResult, Preview};

use super::error::ApiError;
use super::AppState;

/// Body of `POST /api/runs`
#[derive(Debug, Deserialize, Validate)]
pub struct CreateRunBody {
    #[validate(length(min = 1, max = 4000, message = "must be 1 to 4000 characters"))]
    pub input: String,

    #[serde(rename = "dryRun", default = "default_dry_run")]
    pub dry_run: bool,
}

fn default_dry_run() -> bool {
    true
}

/// Response of `POST /api/runs`
#[derive(Debug, Serialize)]
pub struct CreateRunResponse {
    #[serde(rename = "runId")]
    pub run_id: String,
    pub detected_intent: DetectedIntent,
    pub actions: Vec<Action>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<Preview>,
    #[serde(rename = "_fallback", skip_serializing_if = "Option::is_none")]
    pub fallback: Option<&'static str>,
    #[serde(rename = "_ai_error", skip_serializing_if = "Option::is_none")]
    pub ai_error: Option<String>,
}

/// Planning: classify the input and store a run awaiting confirmation
///
/// Planner hard failure is not an HTTP failure: the mock planner takes
/// over and the response is tagged with `_fallback` and `_ai_error`.
pub async fn create_run(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateRunBody>,
) -> Result<Json<CreateRunResponse>, ApiError> {
    body.validate()?;

    let (plan, fallback, ai_error) = match state.generator.plan(&body.input).await {
        Ok(plan) => (plan, None, None),
        Err(e) => {
            warn!(error = %e, "planning failed, falling back to mock plan");
            (state.mock.plan(&body.input), Some("mock"), Some(e.to_string()))
        }
    };

    let run = Run::new(&body.input, body.dry_run, plan.clone());
    let run_id = state.store.create(run).await.map_err(ApiError::internal)?;

    Ok(Json(CreateRunResponse {
        run_id,
        detected_intent: plan.detected_intent,
        actions: plan.actions,
        preview: plan.preview,
        fallback,
        ai_error,
    }))
}

/// Response of `GET /api/runs/{id}`
#[derive(Debug, Serialize)]
pub struct RunResponse {
    #[serde(rename = "runId")]
    pub run_id: String,
    pub input: String,
    pub detected_intent: DetectedIntent,
    pub actions: Vec<Action>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<Preview>,
    pub executed: bool,
}

/// Fetch a stored run
pub async fn get_run(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<RunResponse>, ApiError> {
    let run = state
        .store
        .get(&id)
        .await
        .ok_or_else(|| ApiError::NotFound("Run not found".to_string()))?;

    Ok(Json(RunResponse {
        run_id: run.id.clone(),
        input: run.input.clone(),
        executed: run.executed_ok(),
        detected_intent: run.plan.detected_intent,
        actions: run.plan.actions,
        preview: run.plan.preview,
    }))
}

/// Optional body of `POST /api/runs/{id}/execute`
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ExecuteBody {
    #[validate(email(message = "must be an email address"))]
    pub email: Option<String>,
}

/// Response of `POST /api/runs/{id}/execute`
#[derive(Debug, Serialize)]
pub struct ExecuteResponse {
    #[serde(rename = "runId")]
    pub run_id: String,
    #[serde(flatten)]
    pub result: ExecuteResult,
}

/// Confirm & execute: run the first step of the stored plan
pub async fn execute_run(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Option<Json<ExecuteBody>>,
) -> Result<Json<ExecuteResponse>, ApiError> {
    let email = match body {
        Some(Json(b)) => {
            b.validate()?;
            b.email
        }
        None => None,
    };

    let mut result = state.executor.execute(&id).await?;

    // Inline dispatch when the caller supplied an address with the confirm
    if let Some(to) = email {
        result.email_status = Some(state.executor.send_email(&id, &to).await?);
    }

    Ok(Json(ExecuteResponse { run_id: id, result }))
}

/// Body of `POST /api/runs/{id}/email`
#[derive(Debug, Deserialize, Validate)]
pub struct EmailBody {
    #[validate(email(message = "must be an email address"))]
    pub to: String,
}

/// Response of `POST /api/runs/{id}/email`
#[derive(Debug, Serialize)]
pub struct EmailResponse {
    #[serde(rename = "runId")]
    pub run_id: String,
    pub email_status: EmailStatus,
}

/// Send the stored execution results by email
pub async fn email_run(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<EmailBody>,
) -> Result<Json<EmailResponse>, ApiError> {
    body.validate()?;

    let email_status = state.executor.send_email(&id, &body.to).await?;

    Ok(Json(EmailResponse {
        run_id: id,
        email_status,
    }))
}

/// Liveness probe
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_run_body_length_bounds() {
        let ok = CreateRunBody {
            input: "x".repeat(4000),
            dry_run: true,
        };
        assert!(ok.validate().is_ok());

        let too_long = CreateRunBody {
            input: "x".repeat(4001),
            dry_run: true,
        };
        assert!(too_long.validate().is_err());

        let empty = CreateRunBody {
            input: String::new(),
            dry_run: true,
        };
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_create_run_body_dry_run_defaults_true() {
        let body: CreateRunBody = serde_json::from_str(r#"{"input": "hello"}"#).unwrap();
        assert!(body.dry_run);

        let body: CreateRunBody =
            serde_json::from_str(r#"{"input": "hello", "dryRun": false}"#).unwrap();
        assert!(!body.dry_run);
    }

    #[test]
    fn test_email_body_validation() {
        let ok = EmailBody {
            to: "user@example.com".to_string(),
        };
        assert!(ok.validate().is_ok());

        let bad = EmailBody {
            to: "not-an-address".to_string(),
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_execute_body_optional_email() {
        let none = ExecuteBody::default();
        assert!(none.validate().is_ok());

        let some: ExecuteBody =
            serde_json::from_str(r#"{"email": "user@example.com"}"#).unwrap();
        assert!(some.validate().is_ok());

        let bad: ExecuteBody = serde_json::from_str(r#"{"email": "nope"}"#).unwrap();
        assert!(bad.validate().is_err());
    }
}
