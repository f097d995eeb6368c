//! HTTP error mapping
//!
//! The error taxonomy of the API surface. LLM-dependent paths never reach
//! this module: planning falls back to the mock planner and enrichment to
//! the deterministic path, so the only true user-visible failures are
//! malformed client input, unknown run ids, and precondition violations.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;
use validator::ValidationErrors;

use crate::executor::ExecError;

/// API-surface errors with their HTTP mapping
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed request body (400 with field-level detail)
    #[error("{0}")]
    InvalidBody(String),

    /// Unknown run id (404)
    #[error("{0}")]
    NotFound(String),

    /// Request out of order or unsupported plan shape (400)
    #[error("{0}")]
    Precondition(String),

    /// Anything that should never surface (500)
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal(err: impl std::fmt::Display) -> Self {
        ApiError::Internal(err.to_string())
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidBody(_) | ApiError::Precondition(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let mut details: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(fld, errs)| {
                errs.iter().map(move |e| {
                    let message = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string());
                    format!("{}: {}", fld, message)
                })
            })
            .collect();
        details.sort();
        ApiError::InvalidBody(details.join("; "))
    }
}

impl From<ExecError> for ApiError {
    fn from(err: ExecError) -> Self {
        match err {
            ExecError::NotFound => ApiError::NotFound(err.to_string()),
            ExecError::NoActions | ExecError::UnsupportedAction(_) | ExecError::NotExecuted => {
                ApiError::Precondition(err.to_string())
            }
            ExecError::Store(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exec_error_mapping() {
        assert_eq!(
            ApiError::from(ExecError::NotFound).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(ExecError::NoActions).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(ExecError::NotExecuted).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(ExecError::UnsupportedAction("summarize_text".to_string()))
                .to_string(),
            "Unsupported action type: summarize_text"
        );
    }

    #[test]
    fn test_not_executed_message() {
        let err = ApiError::from(ExecError::NotExecuted);
        assert_eq!(err.to_string(), "Run is not executed yet");
    }
}
