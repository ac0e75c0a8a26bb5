use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::batch::orchestrator::BatchReport;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required column is missing or the workbook cannot be read at all.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// A cell could not be coerced, or is out of range. `row` is the 1-based worksheet row.
    #[error("Invalid value in row {row}, column {column}: {value}")]
    InvalidValue {
        row: usize,
        column: String,
        value: String,
    },

    #[error("Render error for {employee}: {reason}")]
    Render { employee: String, reason: String },

    #[error("Resource unavailable: {0}")]
    ResourceUnavailable(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{} of {} records failed", .0.failed.len(), .0.total())]
    BatchFailed(BatchReport),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Stable machine-readable code, shared by HTTP bodies and per-record failure entries.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::MalformedInput(_) => "MALFORMED_INPUT",
            AppError::InvalidValue { .. } => "INVALID_VALUE",
            AppError::Render { .. } => "RENDER_ERROR",
            AppError::ResourceUnavailable(_) => "RESOURCE_UNAVAILABLE",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::BatchFailed(_) => "BATCH_FAILED",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.code();
        let (status, message, details) = match &self {
            AppError::MalformedInput(_) | AppError::Validation(_) => {
                (StatusCode::BAD_REQUEST, self.to_string(), None)
            }
            AppError::InvalidValue { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, self.to_string(), None)
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone(), None),
            AppError::Render { .. } => {
                tracing::error!("Render error: {self}");
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string(), None)
            }
            AppError::ResourceUnavailable(msg) => {
                tracing::error!("Resource unavailable: {msg}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Payslip storage is not writable".to_string(),
                    None,
                )
            }
            AppError::BatchFailed(report) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                self.to_string(),
                serde_json::to_value(report).ok(),
            ),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal server error occurred".to_string(),
                    None,
                )
            }
        };

        let mut error = json!({
            "code": code,
            "message": message
        });
        if let Some(details) = details {
            error["details"] = details;
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}
