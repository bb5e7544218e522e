//! The processor invocation endpoint.
//!
//! One call runs one time-budgeted pipeline invocation. Callers are
//! either the job owner / an admin (initial trigger, manual retry) or
//! the server itself via the internal continuation channel.

use std::time::Duration;

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;

use gala_core::error::CoreError;
use gala_core::types::DbId;
use gala_db::repositories::UploadJobRepo;
use gala_pipeline::budget::WallClockBudget;
use gala_pipeline::Outcome;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::ProcessAuth;
use crate::response::DataResponse;
use crate::state::AppState;

/// Response payload of a processor invocation.
#[derive(Debug, Serialize)]
pub struct ProcessResponse {
    /// `completed`, `continue`, `failed`, `cancelled`, or
    /// `already_terminal`.
    pub status: &'static str,
    pub message: String,
    pub total_photos: Option<i32>,
    pub processed_photos: i32,
    pub failed_photos: i32,
}

/// POST /api/v1/uploads/{id}/process
pub async fn invoke(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    auth: ProcessAuth,
) -> AppResult<Json<DataResponse<ProcessResponse>>> {
    let job = UploadJobRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "UploadJob",
            id,
        }))?;

    if let ProcessAuth::User(user) = &auth {
        if user.user_id != job.owner_id && user.role != crate::auth::ROLE_ADMIN {
            return Err(AppError::Core(CoreError::Forbidden(
                "Not the owner of this upload job".into(),
            )));
        }
    }

    let config = state.orchestrator.config();
    let budget = WallClockBudget::start(
        Duration::from_secs(config.execution_ceiling_secs),
        Duration::from_secs(config.safety_buffer_secs),
    );

    let outcome = state.orchestrator.run_invocation(id, &budget).await?;

    if outcome == Outcome::Continue {
        state.reinvoker.dispatch(id);
    }

    let message = match &outcome {
        Outcome::Completed => "All entries processed".to_string(),
        Outcome::Continue => "Time budget exhausted, continuation dispatched".to_string(),
        Outcome::Failed(error) => error.clone(),
        Outcome::Cancelled => "Upload job was cancelled".to_string(),
        Outcome::AlreadyTerminal => "Upload job already finished".to_string(),
    };

    // Counters as they stand after this invocation.
    let job = UploadJobRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "UploadJob",
            id,
        }))?;

    Ok(Json(DataResponse {
        data: ProcessResponse {
            status: outcome.label(),
            message,
            total_photos: job.total_photos,
            processed_photos: job.processed_photos,
            failed_photos: job.failed_photos,
        },
    }))
}
