use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::interview::status::SubmissionError;
use crate::llm_client::LlmError;
use crate::models::session::InvalidSessionId;
use crate::store::StoreError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("An answer is required at this stage of the interview")]
    MissingAnswer,

    #[error("Session has already ended")]
    SessionEnded,

    #[error(transparent)]
    InvalidSessionId(#[from] InvalidSessionId),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Store operation '{0}' timed out")]
    StoreTimeout(&'static str),

    #[error("Request cancelled before the interviewer replied")]
    Cancelled,

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<SubmissionError> for AppError {
    fn from(err: SubmissionError) -> Self {
        match err {
            SubmissionError::SessionEnded => AppError::SessionEnded,
            SubmissionError::MissingAnswer => AppError::MissingAnswer,
        }
    }
}

impl From<LlmError> for AppError {
    fn from(err: LlmError) -> Self {
        AppError::Llm(err.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::SessionNotFound(_) | StoreError::AggregateNotFound(_) => {
                AppError::NotFound(err.to_string())
            }
            StoreError::AggregateExists(_) | StoreError::Invariant(_) => {
                AppError::Conflict(err.to_string())
            }
            StoreError::Timeout(operation) => AppError::StoreTimeout(operation),
            StoreError::CorruptStatus { .. } => AppError::Internal(anyhow::Error::new(err)),
            StoreError::Database(e) => AppError::Database(e),
        }
    }
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::MissingAnswer => (
                StatusCode::BAD_REQUEST,
                "MISSING_ANSWER",
                "Please provide an answer (received an empty string)".to_string(),
            ),
            AppError::SessionEnded => (
                StatusCode::BAD_REQUEST,
                "SESSION_ENDED",
                "Session has already ended".to_string(),
            ),
            AppError::InvalidSessionId(e) => {
                (StatusCode::BAD_REQUEST, "INVALID_SESSION_ID", e.to_string())
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Conflict(msg) => {
                tracing::warn!("Conflict: {msg}");
                (StatusCode::CONFLICT, "CONFLICT", msg.clone())
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Llm(msg) => {
                tracing::error!("LLM error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "LLM_ERROR",
                    "An AI processing error occurred".to_string(),
                )
            }
            AppError::StoreTimeout(operation) => {
                tracing::error!("Store operation {operation} timed out");
                (
                    StatusCode::GATEWAY_TIMEOUT,
                    "STORE_TIMEOUT",
                    "The conversation store did not respond in time".to_string(),
                )
            }
            AppError::Cancelled => (
                StatusCode::from_u16(499).unwrap_or(StatusCode::BAD_REQUEST),
                "CANCELLED",
                "Request cancelled".to_string(),
            ),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        let body = Json(json!({
            "status": status.as_u16(),
            "message": message,
            "code": code
        }));

        (status, body).into_response()
    }
}
