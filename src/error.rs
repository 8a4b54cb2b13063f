//! Error types for the Preproom server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Business rule violation: {0}")]
    BusinessRule(String),

    #[error("Service unavailable: {0}")]
    Maintenance(String),
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NotFound", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "Validation", msg.clone()),
            AppError::Database(e) => {
                // Storage-layer detail stays in the log, never in the body.
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database",
                    "Database error".to_string(),
                )
            }
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "Conflict", msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BadRequest", msg.clone()),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal",
                    "Internal server error".to_string(),
                )
            }
            AppError::BusinessRule(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "BusinessRule", msg.clone())
            }
            AppError::Maintenance(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "Maintenance", msg.clone())
            }
        };

        let body = Json(ErrorResponse {
            error: error.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

/// Collector for batch operations which must not abort on the first failure.
///
/// The retention sweeps walk many rows and report everything that went wrong
/// at the end. An empty collector converts back to `Ok(())` so the usual
/// `?` idiom keeps working for callers.
#[derive(Debug, Default)]
pub struct CumulativeError {
    errors: Vec<AppError>,
}

impl CumulativeError {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a new error onto the back of the stack.
    pub fn push(&mut self, err: AppError) {
        self.errors.push(err);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Convert into the value a caller should return: `Ok(())` when nothing
    /// was collected, otherwise a single error carrying every message.
    pub fn into_result(self) -> AppResult<()> {
        if self.errors.is_empty() {
            return Ok(());
        }
        Err(AppError::Internal(self.to_string()))
    }
}

impl std::fmt::Display for CumulativeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for e in &self.errors {
            writeln!(f, "\t- {}", e)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_cumulative_is_ok() {
        let c = CumulativeError::new();
        assert!(c.is_empty());
        assert!(c.into_result().is_ok());
    }

    #[test]
    fn cumulative_formats_one_line_per_error() {
        let mut c = CumulativeError::new();
        c.push(AppError::NotFound("booking 1".into()));
        c.push(AppError::BusinessRule("bad window".into()));
        assert_eq!(c.len(), 2);

        let msg = c.to_string();
        assert_eq!(msg.lines().count(), 2);
        assert!(msg.contains("booking 1"));
        assert!(msg.contains("bad window"));
        assert!(c.into_result().is_err());
    }
}
