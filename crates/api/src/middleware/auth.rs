//! Shared-secret authentication extractor for the internal endpoints.
//!
//! The trigger surface is invoked by a scheduler, not end users, so it
//! authenticates with a single bearer secret validated before any
//! store access. End-user authentication lives outside this service.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use relay_core::error::CoreError;

use crate::error::AppError;
use crate::state::AppState;

/// Proof that the caller presented the processor shared secret.
///
/// Use as an extractor parameter in any internal handler:
///
/// ```ignore
/// async fn trigger(_auth: ProcessorAuth) -> AppResult<Json<()>> { ... }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ProcessorAuth;

impl FromRequestParts<AppState> for ProcessorAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(
                    "Missing Authorization header".into(),
                ))
            })?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid Authorization format. Expected: Bearer <secret>".into(),
            ))
        })?;

        if token != state.config.processor_secret {
            return Err(AppError::Core(CoreError::Unauthorized(
                "Invalid processor secret".into(),
            )));
        }

        Ok(ProcessorAuth)
    }
}
