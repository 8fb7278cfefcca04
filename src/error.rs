use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{error, warn};

/// Failures surfaced at the HTTP boundary. None of them are retried.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Malformed or missing client input.
    #[error("{0}")]
    Validation(String),
    /// The text-generation service failed or produced unusable data.
    #[error("Failed to analyze food with AI: {0}")]
    Estimation(String),
    /// The backing store failed.
    #[error("storage error: {0}")]
    Storage(String),
    #[error("{0}")]
    NotFound(String),
    /// A server-side step outside storage failed.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::Estimation(_) => StatusCode::BAD_REQUEST,
            AppError::Storage(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    /// Text placed in the `{message}` body.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Storage(_) => "Failed to access food log".to_string(),
            AppError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Storage(e.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            AppError::Storage(detail) => error!(error = %detail, "storage failure"),
            AppError::Internal(detail) => error!(error = %detail, "internal failure"),
            AppError::Estimation(detail) => warn!(error = %detail, "estimation failure"),
            other => warn!(error = %other, "request rejected"),
        }
        (status, Json(json!({ "message": self.public_message() }))).into_response()
    }
}
