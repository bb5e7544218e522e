//! Handlers for the upload-job resource.
//!
//! Job creation, status reads, listing, and the client-issued direct
//! cancellation. Processing itself lives in
//! [`process`](crate::handlers::process).

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use validator::Validate;

use gala_core::error::CoreError;
use gala_core::types::{DbId, Timestamp};
use gala_db::models::upload_job::{CreateUploadJob, EntryError, UploadJob};
use gala_db::repositories::UploadJobRepo;
use gala_events::JobEvent;

use crate::auth::ROLE_ADMIN;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for creating an upload job. The archive itself was
/// already placed in temporary storage by the client.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUploadRequest {
    /// Key of the uploaded archive in the archive bucket.
    #[validate(length(min = 1, max = 512))]
    pub archive_path: String,
    /// Original file name of the archive as picked by the user.
    #[validate(length(min = 1, max = 255))]
    pub archive_name: String,
    /// Archive size in bytes as reported by the client.
    #[validate(range(min = 1))]
    pub archive_size_bytes: i64,
}

/// Public view of an upload job.
#[derive(Debug, Serialize)]
pub struct UploadJobResponse {
    pub id: DbId,
    pub event_id: DbId,
    pub owner_id: DbId,
    /// Status name, e.g. `"processing"`.
    pub status: String,
    pub archive_name: String,
    pub archive_size_bytes: i64,
    pub total_photos: Option<i32>,
    pub processed_photos: i32,
    pub failed_photos: i32,
    /// Number of entries in the persisted resume checkpoint.
    pub checkpointed_entries: usize,
    pub entry_errors: Vec<EntryError>,
    pub error_message: Option<String>,
    pub created_at: Timestamp,
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
}

impl From<UploadJob> for UploadJobResponse {
    fn from(job: UploadJob) -> Self {
        let status = job
            .status()
            .map(|s| s.name().to_string())
            .unwrap_or_else(|| "unknown".to_string());
        Self {
            status,
            checkpointed_entries: job.entries().len(),
            entry_errors: job.errors(),
            id: job.id,
            event_id: job.event_id,
            owner_id: job.owner_id,
            archive_name: job.archive_name,
            archive_size_bytes: job.archive_size_bytes,
            total_photos: job.total_photos,
            processed_photos: job.processed_photos,
            failed_photos: job.failed_photos,
            error_message: job.error_message,
            created_at: job.created_at,
            started_at: job.started_at,
            completed_at: job.completed_at,
        }
    }
}

/// Reject users that neither own the job nor hold the admin role.
fn authorize(user: &AuthUser, job: &UploadJob) -> Result<(), AppError> {
    if user.user_id == job.owner_id || user.role == ROLE_ADMIN {
        Ok(())
    } else {
        Err(AppError::Core(CoreError::Forbidden(
            "Not the owner of this upload job".into(),
        )))
    }
}

/// POST /api/v1/events/{event_id}/uploads
///
/// Create a job in `pending` for an archive already sitting in temporary
/// storage. Processing starts with the first call to the processor
/// endpoint.
pub async fn create(
    State(state): State<AppState>,
    Path(event_id): Path<DbId>,
    user: AuthUser,
    Json(input): Json<CreateUploadRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<UploadJobResponse>>)> {
    input
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let job = UploadJobRepo::create(
        &state.pool,
        &CreateUploadJob {
            event_id,
            owner_id: user.user_id,
            archive_path: input.archive_path,
            archive_name: input.archive_name,
            archive_size_bytes: input.archive_size_bytes,
        },
    )
    .await?;

    tracing::info!(job_id = job.id, event_id, owner_id = user.user_id, "Upload job created");

    Ok((
        StatusCode::CREATED,
        Json(DataResponse { data: job.into() }),
    ))
}

/// GET /api/v1/uploads/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    user: AuthUser,
) -> AppResult<Json<DataResponse<UploadJobResponse>>> {
    let job = UploadJobRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "UploadJob",
            id,
        }))?;
    authorize(&user, &job)?;
    Ok(Json(DataResponse { data: job.into() }))
}

/// GET /api/v1/events/{event_id}/uploads
///
/// Admins see every job for the event; everyone else only their own.
pub async fn list_by_event(
    State(state): State<AppState>,
    Path(event_id): Path<DbId>,
    user: AuthUser,
) -> AppResult<Json<DataResponse<Vec<UploadJobResponse>>>> {
    let jobs = UploadJobRepo::list_by_event(&state.pool, event_id).await?;
    let visible: Vec<UploadJobResponse> = jobs
        .into_iter()
        .filter(|job| user.role == ROLE_ADMIN || job.owner_id == user.user_id)
        .map(UploadJobResponse::from)
        .collect();
    Ok(Json(DataResponse { data: visible }))
}

/// POST /api/v1/uploads/{id}/cancel
///
/// The one status write that bypasses the orchestrator: a conditional
/// update restricted to non-terminal jobs. An in-flight invocation
/// observes the new status at its next batch boundary and stops.
pub async fn cancel(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    user: AuthUser,
) -> AppResult<Json<DataResponse<UploadJobResponse>>> {
    let job = UploadJobRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "UploadJob",
            id,
        }))?;
    authorize(&user, &job)?;

    let cancelled = UploadJobRepo::cancel(&state.pool, id).await?;
    if !cancelled {
        return Err(AppError::Core(CoreError::Conflict(
            "Upload job already finished".into(),
        )));
    }

    let job = UploadJobRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "UploadJob",
            id,
        }))?;

    tracing::info!(job_id = id, user_id = user.user_id, "Upload job cancelled");
    state.event_bus.publish(
        JobEvent::new(job.id, job.event_id, job.owner_id, "cancelled").with_progress(
            job.total_photos,
            job.processed_photos,
            job.failed_photos,
        ),
    );

    Ok(Json(DataResponse { data: job.into() }))
}
