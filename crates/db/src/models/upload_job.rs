//! Upload job entity model and DTOs.

use gala_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::status::{StatusId, UploadJobStatus};

/// A recorded failure for a single archive entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryError {
    pub entry_name: String,
    pub message: String,
}

/// A row from the `upload_jobs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UploadJob {
    pub id: DbId,
    pub event_id: DbId,
    pub owner_id: DbId,
    pub status_id: StatusId,
    pub archive_path: String,
    pub archive_name: String,
    pub archive_size_bytes: i64,
    pub total_photos: Option<i32>,
    pub processed_photos: i32,
    pub failed_photos: i32,
    /// Ordered, filtered entry names (the resume checkpoint). JSON array
    /// of strings; `NULL` until extraction has run.
    pub file_list: Option<serde_json::Value>,
    /// JSON array of [`EntryError`] objects.
    pub entry_errors: serde_json::Value,
    pub error_message: Option<String>,
    pub created_at: Timestamp,
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub updated_at: Timestamp,
}

impl UploadJob {
    /// Typed view of `status_id`. `None` only for rows written by a newer
    /// schema revision.
    pub fn status(&self) -> Option<UploadJobStatus> {
        UploadJobStatus::from_id(self.status_id)
    }

    /// Decode the checkpointed entry list. Empty until extraction has run.
    pub fn entries(&self) -> Vec<String> {
        self.file_list
            .as_ref()
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default()
    }

    /// Decode the per-entry error list.
    pub fn errors(&self) -> Vec<EntryError> {
        serde_json::from_value(self.entry_errors.clone()).unwrap_or_default()
    }
}

/// DTO for creating a new upload job.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUploadJob {
    pub event_id: DbId,
    pub owner_id: DbId,
    pub archive_path: String,
    pub archive_name: String,
    pub archive_size_bytes: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job_with(file_list: Option<serde_json::Value>, entry_errors: serde_json::Value) -> UploadJob {
        UploadJob {
            id: 1,
            event_id: 2,
            owner_id: 3,
            status_id: UploadJobStatus::Processing.id(),
            archive_path: "tmp/archives/1.zip".into(),
            archive_name: "wedding.zip".into(),
            archive_size_bytes: 1024,
            total_photos: Some(2),
            processed_photos: 1,
            failed_photos: 0,
            file_list,
            entry_errors,
            error_message: None,
            created_at: chrono::Utc::now(),
            started_at: None,
            completed_at: None,
            updated_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_entries_decode() {
        let job = job_with(
            Some(serde_json::json!(["a.jpg", "b.jpg"])),
            serde_json::json!([]),
        );
        assert_eq!(job.entries(), vec!["a.jpg", "b.jpg"]);
    }

    #[test]
    fn test_entries_empty_before_extraction() {
        let job = job_with(None, serde_json::json!([]));
        assert!(job.entries().is_empty());
    }

    #[test]
    fn test_errors_decode() {
        let job = job_with(
            None,
            serde_json::json!([{"entry_name": "x.jpg", "message": "too large"}]),
        );
        let errors = job.errors();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].entry_name, "x.jpg");
        assert_eq!(errors[0].message, "too large");
    }
}
