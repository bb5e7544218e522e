//! In-memory ledger implementation.
//!
//! Mirrors the conditional-update semantics of the SQL repositories so
//! the scenario tests exercise the same state machine the production
//! ledger enforces. Also usable for local development without Postgres.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use gala_core::types::DbId;
use gala_db::models::photo::{CreatePhoto, Photo};
use gala_db::models::status::{StatusId, UploadJobStatus};
use gala_db::models::upload_job::{CreateUploadJob, EntryError, UploadJob};

use crate::ledger::{JobLedger, PhotoLedger};

#[derive(Default)]
struct Inner {
    jobs: HashMap<DbId, UploadJob>,
    photos: Vec<Photo>,
    next_job_id: DbId,
    next_photo_id: DbId,
}

/// Map-backed [`JobLedger`] + [`PhotoLedger`].
#[derive(Default)]
pub struct MemoryLedger {
    inner: RwLock<Inner>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a job in `pending` status, like
    /// [`UploadJobRepo::create`](gala_db::repositories::UploadJobRepo::create).
    pub async fn create_job(&self, input: &CreateUploadJob) -> UploadJob {
        let mut inner = self.inner.write().await;
        inner.next_job_id += 1;
        let now = chrono::Utc::now();
        let job = UploadJob {
            id: inner.next_job_id,
            event_id: input.event_id,
            owner_id: input.owner_id,
            status_id: UploadJobStatus::Pending.id(),
            archive_path: input.archive_path.clone(),
            archive_name: input.archive_name.clone(),
            archive_size_bytes: input.archive_size_bytes,
            total_photos: None,
            processed_photos: 0,
            failed_photos: 0,
            file_list: None,
            entry_errors: serde_json::json!([]),
            error_message: None,
            created_at: now,
            started_at: None,
            completed_at: None,
            updated_at: now,
        };
        inner.jobs.insert(job.id, job.clone());
        job
    }

    /// The tracker's direct cancellation write: terminal `cancelled`
    /// unless the job already reached a terminal status.
    pub async fn cancel(&self, id: DbId) -> bool {
        let mut inner = self.inner.write().await;
        match inner.jobs.get_mut(&id) {
            Some(job)
                if !job
                    .status()
                    .map(UploadJobStatus::is_terminal)
                    .unwrap_or(true) =>
            {
                job.status_id = UploadJobStatus::Cancelled.id();
                job.completed_at = Some(chrono::Utc::now());
                job.updated_at = chrono::Utc::now();
                true
            }
            _ => false,
        }
    }

    /// Fetch a job that must exist (test convenience).
    pub async fn find_job(&self, id: DbId) -> UploadJob {
        self.inner
            .read()
            .await
            .jobs
            .get(&id)
            .cloned()
            .expect("job exists")
    }

    pub async fn photos_for_event(&self, event_id: DbId) -> Vec<Photo> {
        let mut photos: Vec<Photo> = self
            .inner
            .read()
            .await
            .photos
            .iter()
            .filter(|p| p.event_id == event_id)
            .cloned()
            .collect();
        photos.sort_by_key(|p| p.display_order);
        photos
    }

    pub async fn photo_count(&self) -> usize {
        self.inner.read().await.photos.len()
    }
}

#[async_trait]
impl JobLedger for MemoryLedger {
    async fn find(&self, id: DbId) -> Result<Option<UploadJob>, sqlx::Error> {
        Ok(self.inner.read().await.jobs.get(&id).cloned())
    }

    async fn status_of(&self, id: DbId) -> Result<Option<StatusId>, sqlx::Error> {
        Ok(self.inner.read().await.jobs.get(&id).map(|j| j.status_id))
    }

    async fn transition(
        &self,
        id: DbId,
        from: UploadJobStatus,
        to: UploadJobStatus,
    ) -> Result<Option<UploadJob>, sqlx::Error> {
        let mut inner = self.inner.write().await;
        let Some(job) = inner.jobs.get_mut(&id) else {
            return Ok(None);
        };
        if job.status_id != from.id() {
            return Ok(None);
        }
        let now = chrono::Utc::now();
        job.status_id = to.id();
        if from == UploadJobStatus::Pending {
            job.started_at.get_or_insert(now);
        }
        if to.is_terminal() {
            job.completed_at = Some(now);
        }
        job.updated_at = now;
        Ok(Some(job.clone()))
    }

    async fn set_manifest(
        &self,
        id: DbId,
        total_photos: i32,
        file_list: &[String],
    ) -> Result<Option<UploadJob>, sqlx::Error> {
        let mut inner = self.inner.write().await;
        let Some(job) = inner.jobs.get_mut(&id) else {
            return Ok(None);
        };
        if job.total_photos.is_some() {
            return Ok(None);
        }
        job.total_photos = Some(total_photos);
        job.file_list = Some(serde_json::json!(file_list));
        job.updated_at = chrono::Utc::now();
        Ok(Some(job.clone()))
    }

    async fn checkpoint(
        &self,
        id: DbId,
        processed_photos: i32,
        failed_photos: i32,
        entry_errors: &[EntryError],
    ) -> Result<Option<UploadJob>, sqlx::Error> {
        let mut inner = self.inner.write().await;
        let Some(job) = inner.jobs.get_mut(&id) else {
            return Ok(None);
        };
        if job.status_id != UploadJobStatus::Processing.id() {
            return Ok(None);
        }
        job.processed_photos = job.processed_photos.max(processed_photos);
        job.failed_photos = job.failed_photos.max(failed_photos);
        job.entry_errors = serde_json::json!(entry_errors);
        job.updated_at = chrono::Utc::now();
        Ok(Some(job.clone()))
    }

    async fn fail(&self, id: DbId, message: &str) -> Result<Option<UploadJob>, sqlx::Error> {
        let mut inner = self.inner.write().await;
        let Some(job) = inner.jobs.get_mut(&id) else {
            return Ok(None);
        };
        if job
            .status()
            .map(UploadJobStatus::is_terminal)
            .unwrap_or(true)
        {
            return Ok(None);
        }
        let now = chrono::Utc::now();
        job.status_id = UploadJobStatus::Failed.id();
        job.error_message = Some(message.to_string());
        job.completed_at = Some(now);
        job.updated_at = now;
        Ok(Some(job.clone()))
    }
}

#[async_trait]
impl PhotoLedger for MemoryLedger {
    async fn insert(&self, input: &CreatePhoto) -> Result<Photo, sqlx::Error> {
        let mut inner = self.inner.write().await;
        inner.next_photo_id += 1;
        let display_order = inner
            .photos
            .iter()
            .filter(|p| p.event_id == input.event_id)
            .map(|p| p.display_order)
            .max()
            .unwrap_or(0)
            + 1;
        let photo = Photo {
            id: inner.next_photo_id,
            event_id: input.event_id,
            original_path: input.original_path.clone(),
            display_path: input.display_path.clone(),
            thumbnail_path: input.thumbnail_path.clone(),
            file_name: input.file_name.clone(),
            size_bytes: input.size_bytes,
            width: input.width,
            height: input.height,
            display_order,
            created_at: chrono::Utc::now(),
        };
        inner.photos.push(photo.clone());
        Ok(photo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_input() -> CreateUploadJob {
        CreateUploadJob {
            event_id: 1,
            owner_id: 2,
            archive_path: "archives/1.zip".into(),
            archive_name: "a.zip".into(),
            archive_size_bytes: 10,
        }
    }

    #[tokio::test]
    async fn transition_enforces_expected_status() {
        let ledger = MemoryLedger::new();
        let job = ledger.create_job(&create_input()).await;

        // Wrong expected status is rejected.
        let denied = ledger
            .transition(job.id, UploadJobStatus::Processing, UploadJobStatus::Completed)
            .await
            .unwrap();
        assert!(denied.is_none());

        let moved = ledger
            .transition(job.id, UploadJobStatus::Pending, UploadJobStatus::Uploading)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(moved.status(), Some(UploadJobStatus::Uploading));
        assert!(moved.started_at.is_some());
    }

    #[tokio::test]
    async fn manifest_is_set_exactly_once() {
        let ledger = MemoryLedger::new();
        let job = ledger.create_job(&create_input()).await;

        let first = ledger
            .set_manifest(job.id, 2, &["a.jpg".into(), "b.jpg".into()])
            .await
            .unwrap();
        assert!(first.is_some());

        let second = ledger.set_manifest(job.id, 99, &["x.jpg".into()]).await.unwrap();
        assert!(second.is_none());

        let row = ledger.find(job.id).await.unwrap().unwrap();
        assert_eq!(row.total_photos, Some(2));
    }

    #[tokio::test]
    async fn checkpoint_never_moves_backwards() {
        let ledger = MemoryLedger::new();
        let job = ledger.create_job(&create_input()).await;
        for (from, to) in [
            (UploadJobStatus::Pending, UploadJobStatus::Uploading),
            (UploadJobStatus::Uploading, UploadJobStatus::Extracting),
            (UploadJobStatus::Extracting, UploadJobStatus::Processing),
        ] {
            ledger.transition(job.id, from, to).await.unwrap();
        }

        ledger.checkpoint(job.id, 10, 2, &[]).await.unwrap();
        let row = ledger.checkpoint(job.id, 5, 1, &[]).await.unwrap().unwrap();
        assert_eq!(row.processed_photos, 10);
        assert_eq!(row.failed_photos, 2);
    }

    #[tokio::test]
    async fn cancel_only_applies_to_non_terminal_jobs() {
        let ledger = MemoryLedger::new();
        let job = ledger.create_job(&create_input()).await;

        assert!(ledger.cancel(job.id).await);
        assert!(!ledger.cancel(job.id).await);

        let row = ledger.find(job.id).await.unwrap().unwrap();
        assert_eq!(row.status(), Some(UploadJobStatus::Cancelled));
        assert!(row.completed_at.is_some());
    }

    #[tokio::test]
    async fn fail_is_blocked_after_cancellation() {
        let ledger = MemoryLedger::new();
        let job = ledger.create_job(&create_input()).await;
        ledger.cancel(job.id).await;

        let denied = ledger.fail(job.id, "boom").await.unwrap();
        assert!(denied.is_none());
        let row = ledger.find(job.id).await.unwrap().unwrap();
        assert_eq!(row.status(), Some(UploadJobStatus::Cancelled));
    }

    #[tokio::test]
    async fn display_order_is_strictly_increasing_per_event() {
        let ledger = MemoryLedger::new();
        for i in 0..3 {
            let photo = ledger
                .insert(&CreatePhoto {
                    event_id: 7,
                    original_path: format!("originals/7/{i}.jpg"),
                    display_path: format!("derived/7/{i}_display.jpg"),
                    thumbnail_path: format!("derived/7/{i}_thumb.jpg"),
                    file_name: format!("{i}.jpg"),
                    size_bytes: 100,
                    width: 10,
                    height: 10,
                })
                .await
                .unwrap();
            assert_eq!(photo.display_order, i + 1);
        }

        // A different event starts its own sequence.
        let other = ledger
            .insert(&CreatePhoto {
                event_id: 8,
                original_path: "originals/8/x.jpg".into(),
                display_path: "derived/8/x_display.jpg".into(),
                thumbnail_path: "derived/8/x_thumb.jpg".into(),
                file_name: "x.jpg".into(),
                size_bytes: 100,
                width: 10,
                height: 10,
            })
            .await
            .unwrap();
        assert_eq!(other.display_order, 1);
    }
}
