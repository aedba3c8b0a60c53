use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::any::Any;
use thiserror::Error;

use crate::llm_client::LlmError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
/// None of these are retried; each maps to a user-facing message and a remediation hint.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Failed to extract text from resume: {0}")]
    Extraction(String),

    #[error("Resume text is invalid: {0}")]
    Validation(String),

    #[error("Provider not configured: {0}")]
    Configuration(String),

    #[error("AI analysis failed: {0}")]
    Request(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Extraction(_) => "EXTRACTION_ERROR",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::Request(_) => "REQUEST_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// What the user can do about it.
    pub fn suggestion(&self) -> &'static str {
        match self {
            AppError::Extraction(_) => {
                "Make sure the file is a text-based PDF, or paste the resume text instead."
            }
            AppError::Validation(_) => {
                "Check that the full resume was provided; very short inputs cannot be reviewed."
            }
            AppError::Configuration(_) => {
                "Set the API key for the selected provider, or choose a provider that is configured."
            }
            AppError::Request(_) => {
                "This might be due to API rate limits or network issues. Please try again."
            }
            AppError::NotFound(_) => "Run an analysis first, then request the result.",
            AppError::Internal(_) => "Please try again. If the issue persists, contact support.",
        }
    }
}

impl From<LlmError> for AppError {
    fn from(err: LlmError) -> Self {
        AppError::Request(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Extraction(_) => (StatusCode::UNPROCESSABLE_ENTITY, self.to_string()),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            AppError::Configuration(msg) => {
                tracing::warn!("Configuration error: {msg}");
                (StatusCode::SERVICE_UNAVAILABLE, self.to_string())
            }
            AppError::Request(msg) => {
                tracing::error!("Provider request error: {msg}");
                (StatusCode::BAD_GATEWAY, self.to_string())
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An unexpected error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": message,
                "suggestion": self.suggestion()
            }
        }));

        (status, body).into_response()
    }
}

/// Response for a handler that panicked. The client gets a generic message plus
/// the panic text as a diagnostic; the panic itself is logged.
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let diagnostic = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    tracing::error!("Request handler panicked: {diagnostic}");

    let body = Json(json!({
        "error": {
            "code": "UNEXPECTED_ERROR",
            "message": "An unexpected error occurred while processing your resume. Please try again.",
            "suggestion": "Please try again. If the issue persists, contact support.",
            "diagnostic": diagnostic
        }
    }));
    (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
}
