//! Repository for the `upload_jobs` table.
//!
//! Every status mutation is a conditional update guarded by the expected
//! current status (or by the non-terminal set), so a stale continuation
//! can never overwrite a cancellation. Progress counters only move
//! forward; `GREATEST` guards enforce that at the SQL level.

use sqlx::PgPool;

use gala_core::types::DbId;

use crate::models::status::{StatusId, UploadJobStatus, TERMINAL_STATUSES};
use crate::models::upload_job::{CreateUploadJob, EntryError, UploadJob};

/// Column list for `upload_jobs` queries.
const COLUMNS: &str = "\
    id, event_id, owner_id, status_id, \
    archive_path, archive_name, archive_size_bytes, \
    total_photos, processed_photos, failed_photos, \
    file_list, entry_errors, error_message, \
    created_at, started_at, completed_at, updated_at";

/// Provides CRUD operations for upload jobs.
pub struct UploadJobRepo;

impl UploadJobRepo {
    /// Create a new job in `pending` status.
    pub async fn create(pool: &PgPool, input: &CreateUploadJob) -> Result<UploadJob, sqlx::Error> {
        let query = format!(
            "INSERT INTO upload_jobs \
                 (event_id, owner_id, status_id, archive_path, archive_name, archive_size_bytes) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UploadJob>(&query)
            .bind(input.event_id)
            .bind(input.owner_id)
            .bind(UploadJobStatus::Pending.id())
            .bind(&input.archive_path)
            .bind(&input.archive_name)
            .bind(input.archive_size_bytes)
            .fetch_one(pool)
            .await
    }

    /// Find a job by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<UploadJob>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM upload_jobs WHERE id = $1");
        sqlx::query_as::<_, UploadJob>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List jobs for an event, newest first.
    pub async fn list_by_event(
        pool: &PgPool,
        event_id: DbId,
    ) -> Result<Vec<UploadJob>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM upload_jobs WHERE event_id = $1 ORDER BY created_at DESC");
        sqlx::query_as::<_, UploadJob>(&query)
            .bind(event_id)
            .fetch_all(pool)
            .await
    }

    /// Read just the current status of a job.
    ///
    /// Cheap enough to call at every batch boundary.
    pub async fn status_of(pool: &PgPool, id: DbId) -> Result<Option<StatusId>, sqlx::Error> {
        sqlx::query_scalar::<_, StatusId>("SELECT status_id FROM upload_jobs WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Conditionally transition a job from `from` to `to`.
    ///
    /// Returns `None` when the job was not in the expected status (for
    /// example because a cancellation landed first). `started_at` is
    /// stamped on the first transition out of `pending`; `completed_at`
    /// is stamped when `to` is terminal.
    pub async fn transition(
        pool: &PgPool,
        id: DbId,
        from: UploadJobStatus,
        to: UploadJobStatus,
    ) -> Result<Option<UploadJob>, sqlx::Error> {
        let query = format!(
            "UPDATE upload_jobs \
             SET status_id = $3, \
                 started_at = CASE WHEN $4 THEN COALESCE(started_at, NOW()) ELSE started_at END, \
                 completed_at = CASE WHEN $5 THEN NOW() ELSE completed_at END, \
                 updated_at = NOW() \
             WHERE id = $1 AND status_id = $2 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UploadJob>(&query)
            .bind(id)
            .bind(from.id())
            .bind(to.id())
            .bind(from == UploadJobStatus::Pending)
            .bind(to.is_terminal())
            .fetch_optional(pool)
            .await
    }

    /// Persist the extraction result: total entry count and the ordered
    /// entry list. Set exactly once; a second call is a no-op returning
    /// `None`.
    pub async fn set_manifest(
        pool: &PgPool,
        id: DbId,
        total_photos: i32,
        file_list: &[String],
    ) -> Result<Option<UploadJob>, sqlx::Error> {
        let query = format!(
            "UPDATE upload_jobs \
             SET total_photos = $2, file_list = $3, updated_at = NOW() \
             WHERE id = $1 AND total_photos IS NULL \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UploadJob>(&query)
            .bind(id)
            .bind(total_photos)
            .bind(serde_json::json!(file_list))
            .fetch_optional(pool)
            .await
    }

    /// Durably checkpoint progress counters and the per-entry error list.
    ///
    /// Counters are clamped with `GREATEST` so a replayed checkpoint can
    /// never move progress backwards. Only applies while the job is
    /// still `processing`.
    pub async fn checkpoint(
        pool: &PgPool,
        id: DbId,
        processed_photos: i32,
        failed_photos: i32,
        entry_errors: &[EntryError],
    ) -> Result<Option<UploadJob>, sqlx::Error> {
        let query = format!(
            "UPDATE upload_jobs \
             SET processed_photos = GREATEST(processed_photos, $2), \
                 failed_photos = GREATEST(failed_photos, $3), \
                 entry_errors = $4, \
                 updated_at = NOW() \
             WHERE id = $1 AND status_id = $5 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UploadJob>(&query)
            .bind(id)
            .bind(processed_photos)
            .bind(failed_photos)
            .bind(serde_json::json!(entry_errors))
            .bind(UploadJobStatus::Processing.id())
            .fetch_optional(pool)
            .await
    }

    /// Mark a job as failed with an error message, unless it already
    /// reached a terminal status.
    pub async fn fail(
        pool: &PgPool,
        id: DbId,
        error_message: &str,
    ) -> Result<Option<UploadJob>, sqlx::Error> {
        let query = format!(
            "UPDATE upload_jobs \
             SET status_id = $2, error_message = $3, completed_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND status_id NOT IN ($4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, UploadJob>(&query)
            .bind(id)
            .bind(UploadJobStatus::Failed.id())
            .bind(error_message)
            .bind(TERMINAL_STATUSES[0])
            .bind(TERMINAL_STATUSES[1])
            .bind(TERMINAL_STATUSES[2])
            .fetch_optional(pool)
            .await
    }

    /// Cancel a job if it is not already in a terminal state.
    ///
    /// Returns `true` if the job was cancelled, `false` if it was already
    /// completed, failed, or cancelled. This is the one status write that
    /// does not go through the orchestrator.
    pub async fn cancel(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE upload_jobs \
             SET status_id = $2, completed_at = NOW(), updated_at = NOW() \
             WHERE id = $1 AND status_id NOT IN ($3, $4, $5)",
        )
        .bind(id)
        .bind(UploadJobStatus::Cancelled.id())
        .bind(TERMINAL_STATUSES[0])
        .bind(TERMINAL_STATUSES[1])
        .bind(TERMINAL_STATUSES[2])
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// List non-terminal jobs whose last update is older than
    /// `stale_after_secs`. Used by the watchdog to re-dispatch stalled
    /// continuations.
    pub async fn list_stalled(
        pool: &PgPool,
        stale_after_secs: i64,
    ) -> Result<Vec<UploadJob>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM upload_jobs \
             WHERE status_id NOT IN ($2, $3, $4) \
               AND updated_at < NOW() - $1 * INTERVAL '1 second' \
             ORDER BY updated_at ASC"
        );
        sqlx::query_as::<_, UploadJob>(&query)
            .bind(stale_after_secs)
            .bind(TERMINAL_STATUSES[0])
            .bind(TERMINAL_STATUSES[1])
            .bind(TERMINAL_STATUSES[2])
            .fetch_all(pool)
            .await
    }
}
