use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use relay_core::error::CoreError;
use relay_outbox::OutboxError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Implements [`IntoResponse`] to produce the invoker-facing JSON shape
/// `{ "success": false, "error": <CODE>, "message": <text> }`.
/// Validation and authentication failures are rejected before any
/// store access and map to distinct 4xx statuses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `relay_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// An invocation-level failure from the outbox subsystem.
    #[error(transparent)]
    Outbox(#[from] OutboxError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Core(core) => match core {
                CoreError::Validation(msg) => {
                    (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
                }
                CoreError::Unauthorized(msg) => {
                    (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone())
                }
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} with id {id} not found"),
                ),
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "An internal error occurred".to_string(),
                    )
                }
            },

            AppError::Outbox(err) => {
                tracing::error!(error = %err, "Outbox invocation failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "PROCESSING_ERROR",
                    "Outbox processing failed".to_string(),
                )
            }

            AppError::Database(err) => {
                tracing::error!(error = %err, "Database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = json!({
            "success": false,
            "error": code,
            "message": message,
        });

        (status, axum::Json(body)).into_response()
    }
}
