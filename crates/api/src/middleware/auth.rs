//! Authentication extractors for Axum handlers.

use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;
use gala_core::error::CoreError;
use gala_core::types::DbId;

use gala_core::token::{verify_continuation_token, CONTINUATION_TOKEN_HEADER};

use crate::auth::jwt::validate_token;
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated user extracted from a JWT Bearer token in the
/// `Authorization` header.
///
/// Use this as an extractor parameter in any handler that requires
/// end-user authentication.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The user's internal database id (from `claims.sub`).
    pub user_id: DbId,
    /// The user's role name (e.g. `"admin"`, `"organizer"`).
    pub role: String,
}

impl FromRequestParts<AppState> for AuthUser {
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
                "Invalid Authorization format. Expected: Bearer <token>".into(),
            ))
        })?;

        let claims = validate_token(token, &state.config.jwt).map_err(|_| {
            AppError::Core(CoreError::Unauthorized("Invalid or expired token".into()))
        })?;

        Ok(AuthUser {
            user_id: claims.sub,
            role: claims.role,
        })
    }
}

/// Authorization for the processor invocation endpoint.
///
/// Accepts either the internal continuation token (self re-invocations
/// and the watchdog) or an end-user Bearer token. Neither present or
/// valid means the request is rejected before the job is ever read.
#[derive(Debug, Clone)]
pub enum ProcessAuth {
    /// End-user credential; ownership is checked against the job row.
    User(AuthUser),
    /// Internal channel, already scoped to the job id in the path.
    Internal,
}

impl FromRequestParts<AppState> for ProcessAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Path(job_id) = Path::<DbId>::from_request_parts(parts, state)
            .await
            .map_err(|_| AppError::BadRequest("Invalid job id".into()))?;

        if let Some(token) = parts
            .headers
            .get(CONTINUATION_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
        {
            if verify_continuation_token(&state.config.internal_token_secret, job_id, token) {
                return Ok(Self::Internal);
            }
            return Err(AppError::Core(CoreError::Unauthorized(
                "Invalid continuation token".into(),
            )));
        }

        let user = AuthUser::from_request_parts(parts, state).await?;
        Ok(Self::User(user))
    }
}
