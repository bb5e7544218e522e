//! In-process job event bus backed by a `tokio::sync::broadcast` channel.

use chrono::{DateTime, Utc};
use gala_core::types::DbId;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

// ---------------------------------------------------------------------------
// JobEvent
// ---------------------------------------------------------------------------

/// A snapshot of an upload job's observable state, published on every
/// status transition and progress checkpoint.
///
/// The payload is intentionally self-contained: a subscriber can render
/// progress without a follow-up fetch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobEvent {
    pub job_id: DbId,
    pub event_id: DbId,
    pub owner_id: DbId,
    /// Status name, e.g. `"processing"`.
    pub status: String,
    pub total_photos: Option<i32>,
    pub processed_photos: i32,
    pub failed_photos: i32,
    /// Present only after a job-fatal failure.
    pub error_message: Option<String>,
    /// When the event was published (UTC).
    pub timestamp: DateTime<Utc>,
}

impl JobEvent {
    /// Create an event for the given job identity and status; counters
    /// default to zero and can be filled with [`with_progress`](Self::with_progress).
    pub fn new(job_id: DbId, event_id: DbId, owner_id: DbId, status: impl Into<String>) -> Self {
        Self {
            job_id,
            event_id,
            owner_id,
            status: status.into(),
            total_photos: None,
            processed_photos: 0,
            failed_photos: 0,
            error_message: None,
            timestamp: Utc::now(),
        }
    }

    /// Attach progress counters.
    pub fn with_progress(mut self, total: Option<i32>, processed: i32, failed: i32) -> Self {
        self.total_photos = total;
        self.processed_photos = processed;
        self.failed_photos = failed;
        self
    }

    /// Attach a job-fatal error message.
    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }
}

// ---------------------------------------------------------------------------
// JobEventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out bus for [`JobEvent`]s.
///
/// Wraps a [`broadcast::Sender`] so any number of subscribers can
/// independently receive every published event. Designed to be shared via
/// `Arc<JobEventBus>`.
pub struct JobEventBus {
    sender: broadcast::Sender<JobEvent>,
}

impl JobEventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full the oldest un-consumed events are dropped
    /// and slow receivers observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// If there are no active subscribers the event is silently dropped;
    /// the job row remains the durable source of truth.
    pub fn publish(&self, event: JobEvent) {
        // Ignore the SendError — it only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<JobEvent> {
        self.sender.subscribe()
    }
}

impl Default for JobEventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_and_receive_single_subscriber() {
        let bus = JobEventBus::default();
        let mut rx = bus.subscribe();

        bus.publish(
            JobEvent::new(9, 4, 7, "processing").with_progress(Some(25), 10, 1),
        );

        let received = rx.recv().await.expect("should receive the event");
        assert_eq!(received.job_id, 9);
        assert_eq!(received.event_id, 4);
        assert_eq!(received.owner_id, 7);
        assert_eq!(received.status, "processing");
        assert_eq!(received.total_photos, Some(25));
        assert_eq!(received.processed_photos, 10);
        assert_eq!(received.failed_photos, 1);
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_event() {
        let bus = JobEventBus::default();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(JobEvent::new(1, 1, 1, "completed"));

        assert_eq!(rx1.recv().await.unwrap().status, "completed");
        assert_eq!(rx2.recv().await.unwrap().status, "completed");
    }

    #[test]
    fn publish_with_no_subscribers_does_not_panic() {
        let bus = JobEventBus::default();
        bus.publish(JobEvent::new(1, 1, 1, "pending"));
    }

    #[test]
    fn error_event_carries_message() {
        let event = JobEvent::new(3, 2, 1, "failed").with_error("bad archive signature");
        assert_eq!(event.error_message.as_deref(), Some("bad archive signature"));
    }
}
