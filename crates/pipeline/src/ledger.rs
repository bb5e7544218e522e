//! Persistence seams for the pipeline.
//!
//! [`JobLedger`] is the durable job record (status machine + checkpoint);
//! [`PhotoLedger`] is the photo catalog. The production implementation
//! ([`PgLedger`]) delegates to the repositories in `gala-db`; tests use
//! [`MemoryLedger`](crate::memory::MemoryLedger).

use async_trait::async_trait;

use gala_core::types::DbId;
use gala_db::models::photo::{CreatePhoto, Photo};
use gala_db::models::status::{StatusId, UploadJobStatus};
use gala_db::models::upload_job::{EntryError, UploadJob};
use gala_db::repositories::{PhotoRepo, UploadJobRepo};
use gala_db::DbPool;

/// Durable upload-job state. All mutating operations carry the same
/// conditional semantics as the SQL layer: they return `None` when the
/// expected-status guard did not match.
#[async_trait]
pub trait JobLedger: Send + Sync {
    async fn find(&self, id: DbId) -> Result<Option<UploadJob>, sqlx::Error>;

    /// Cheap status-only read, called at every batch boundary.
    async fn status_of(&self, id: DbId) -> Result<Option<StatusId>, sqlx::Error>;

    /// Conditionally move a job from `from` to `to`.
    async fn transition(
        &self,
        id: DbId,
        from: UploadJobStatus,
        to: UploadJobStatus,
    ) -> Result<Option<UploadJob>, sqlx::Error>;

    /// Persist the extraction result exactly once.
    async fn set_manifest(
        &self,
        id: DbId,
        total_photos: i32,
        file_list: &[String],
    ) -> Result<Option<UploadJob>, sqlx::Error>;

    /// Durably checkpoint progress counters and the error list.
    async fn checkpoint(
        &self,
        id: DbId,
        processed_photos: i32,
        failed_photos: i32,
        entry_errors: &[EntryError],
    ) -> Result<Option<UploadJob>, sqlx::Error>;

    /// Terminal failure with a persisted message.
    async fn fail(&self, id: DbId, message: &str) -> Result<Option<UploadJob>, sqlx::Error>;
}

/// Photo catalog writes.
#[async_trait]
pub trait PhotoLedger: Send + Sync {
    /// Insert a catalog row; display order is assigned by the ledger.
    async fn insert(&self, input: &CreatePhoto) -> Result<Photo, sqlx::Error>;
}

/// PostgreSQL-backed ledger over the `gala-db` repositories.
pub struct PgLedger {
    pool: DbPool,
}

impl PgLedger {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobLedger for PgLedger {
    async fn find(&self, id: DbId) -> Result<Option<UploadJob>, sqlx::Error> {
        UploadJobRepo::find_by_id(&self.pool, id).await
    }

    async fn status_of(&self, id: DbId) -> Result<Option<StatusId>, sqlx::Error> {
        UploadJobRepo::status_of(&self.pool, id).await
    }

    async fn transition(
        &self,
        id: DbId,
        from: UploadJobStatus,
        to: UploadJobStatus,
    ) -> Result<Option<UploadJob>, sqlx::Error> {
        UploadJobRepo::transition(&self.pool, id, from, to).await
    }

    async fn set_manifest(
        &self,
        id: DbId,
        total_photos: i32,
        file_list: &[String],
    ) -> Result<Option<UploadJob>, sqlx::Error> {
        UploadJobRepo::set_manifest(&self.pool, id, total_photos, file_list).await
    }

    async fn checkpoint(
        &self,
        id: DbId,
        processed_photos: i32,
        failed_photos: i32,
        entry_errors: &[EntryError],
    ) -> Result<Option<UploadJob>, sqlx::Error> {
        UploadJobRepo::checkpoint(&self.pool, id, processed_photos, failed_photos, entry_errors)
            .await
    }

    async fn fail(&self, id: DbId, message: &str) -> Result<Option<UploadJob>, sqlx::Error> {
        UploadJobRepo::fail(&self.pool, id, message).await
    }
}

#[async_trait]
impl PhotoLedger for PgLedger {
    async fn insert(&self, input: &CreatePhoto) -> Result<Photo, sqlx::Error> {
        PhotoRepo::create(&self.pool, input).await
    }
}
