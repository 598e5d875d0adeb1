// src/errors.rs
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Application error taxonomy for the dream analysis boundary.
///
/// Every failure is converted to a JSON `{"error": <message>}` envelope with
/// a mapped status code; nothing here crashes the process.
#[derive(Error, Debug, Clone)]
pub enum AppError {
    // --- Request/Input Errors ---
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // --- Authentication Errors ---
    #[error("Missing authorization header")]
    MissingAuthHeader,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    // --- External Service Errors ---
    #[error("Upstream completion error: {0}")]
    UpstreamUnavailable(String),

    #[error("Malformed AI response: {0}")]
    MalformedAiResponse(String),

    #[error("Incomplete AI response: {0}")]
    IncompleteAiResponse(String),

    // --- Catch-all Internal Errors ---
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<genai::Error> for AppError {
    fn from(err: genai::Error) -> Self {
        Self::UpstreamUnavailable(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            // 4xx Client Errors
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::MissingAuthHeader => (
                StatusCode::UNAUTHORIZED,
                "Missing authorization header".to_string(),
            ),
            AppError::Unauthorized(detail) => {
                // Detail stays in the logs; clients get a fixed message.
                tracing::warn!("Token verification failed: {}", detail);
                (
                    StatusCode::UNAUTHORIZED,
                    "Unauthorized - Invalid token".to_string(),
                )
            }

            // 5xx Server Errors
            AppError::UpstreamUnavailable(msg) => {
                error!("Upstream completion error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
            AppError::MalformedAiResponse(detail) => {
                error!("Failed to parse AI response: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Invalid JSON response from AI".to_string(),
                )
            }
            AppError::IncompleteAiResponse(detail) => {
                error!("Invalid analysis structure: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "AI response missing required fields".to_string(),
                )
            }
            AppError::Internal(msg) => {
                error!("Internal server error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

// --- Convenience Result Type ---
pub type Result<T, E = AppError> = std::result::Result<T, E>;
