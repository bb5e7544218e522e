//! Wire types exchanged with the gala API.

use gala_core::types::DbId;
use serde::{Deserialize, Serialize};

/// Status names that end a job's lifecycle.
pub const TERMINAL_STATUS_NAMES: &[&str] = &["completed", "failed", "cancelled"];

/// A recorded per-entry failure, as rendered by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryErrorView {
    pub entry_name: String,
    pub message: String,
}

/// The tracker's local view of one upload job, as returned by
/// `GET /api/v1/uploads/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobView {
    pub id: DbId,
    pub event_id: DbId,
    /// Status name, e.g. `"processing"`.
    pub status: String,
    pub total_photos: Option<i32>,
    pub processed_photos: i32,
    pub failed_photos: i32,
    pub error_message: Option<String>,
    #[serde(default)]
    pub entry_errors: Vec<EntryErrorView>,
}

impl JobView {
    /// Whether the job has reached a terminal status.
    pub fn is_terminal(&self) -> bool {
        TERMINAL_STATUS_NAMES.contains(&self.status.as_str())
    }

    /// Progress fraction in `0.0..=1.0`; zero until the total is known.
    pub fn progress_fraction(&self) -> f32 {
        match self.total_photos {
            Some(total) if total > 0 => {
                (self.processed_photos + self.failed_photos) as f32 / total as f32
            }
            _ => 0.0,
        }
    }

    /// Merge a push frame into the view.
    pub fn apply(&mut self, update: &JobUpdate) {
        self.status = update.status.clone();
        self.total_photos = update.total_photos;
        self.processed_photos = update.processed_photos;
        self.failed_photos = update.failed_photos;
        if update.error_message.is_some() {
            self.error_message = update.error_message.clone();
        }
    }
}

/// One `job.updated` push frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobUpdate {
    pub job_id: DbId,
    pub event_id: DbId,
    pub owner_id: DbId,
    pub status: String,
    pub total_photos: Option<i32>,
    pub processed_photos: i32,
    pub failed_photos: i32,
    pub error_message: Option<String>,
}

/// Server-to-client WebSocket frames.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum PushFrame {
    #[serde(rename = "job.updated")]
    JobUpdated { job: JobUpdate },
}

/// Client-to-server WebSocket frames.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum ClientFrame {
    #[serde(rename = "watch")]
    Watch { job_id: DbId },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(status: &str) -> JobView {
        JobView {
            id: 1,
            event_id: 2,
            status: status.to_string(),
            total_photos: Some(20),
            processed_photos: 8,
            failed_photos: 2,
            error_message: None,
            entry_errors: Vec::new(),
        }
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(view("completed").is_terminal());
        assert!(view("failed").is_terminal());
        assert!(view("cancelled").is_terminal());
        assert!(!view("pending").is_terminal());
        assert!(!view("processing").is_terminal());
    }

    #[test]
    fn test_progress_fraction() {
        assert!((view("processing").progress_fraction() - 0.5).abs() < f32::EPSILON);

        let mut unknown = view("extracting");
        unknown.total_photos = None;
        assert_eq!(unknown.progress_fraction(), 0.0);
    }

    #[test]
    fn test_apply_replaces_counters() {
        let mut current = view("extracting");
        current.apply(&JobUpdate {
            job_id: 1,
            event_id: 2,
            owner_id: 3,
            status: "processing".into(),
            total_photos: Some(20),
            processed_photos: 15,
            failed_photos: 3,
            error_message: None,
        });
        assert_eq!(current.status, "processing");
        assert_eq!(current.processed_photos, 15);
        assert_eq!(current.failed_photos, 3);
    }

    #[test]
    fn test_push_frame_parses() {
        let raw = serde_json::json!({
            "type": "job.updated",
            "job": {
                "job_id": 9,
                "event_id": 4,
                "owner_id": 7,
                "status": "failed",
                "total_photos": null,
                "processed_photos": 0,
                "failed_photos": 0,
                "error_message": "Archive is not a ZIP file"
            }
        });
        let frame: PushFrame = serde_json::from_value(raw).unwrap();
        let PushFrame::JobUpdated { job } = frame;
        assert_eq!(job.job_id, 9);
        assert_eq!(job.status, "failed");
        assert_eq!(job.error_message.as_deref(), Some("Archive is not a ZIP file"));
    }

    #[test]
    fn test_watch_frame_serializes() {
        let frame = ClientFrame::Watch { job_id: 12 };
        assert_eq!(
            serde_json::to_value(&frame).unwrap(),
            serde_json::json!({"type": "watch", "job_id": 12})
        );
    }
}
