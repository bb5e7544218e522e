//! Job-event-to-WebSocket routing.
//!
//! [`JobNotificationRouter`] subscribes to the job event bus and pushes a
//! `job.updated` frame to the owning user's connections (and to any
//! connection explicitly watching the job).

use std::sync::Arc;

use axum::extract::ws::Message;
use tokio::sync::broadcast;

use gala_events::JobEvent;

use crate::ws::WsManager;

/// Routes job events to WebSocket clients.
pub struct JobNotificationRouter {
    ws_manager: Arc<WsManager>,
}

impl JobNotificationRouter {
    pub fn new(ws_manager: Arc<WsManager>) -> Self {
        Self { ws_manager }
    }

    /// Run the main routing loop.
    ///
    /// Consumes events from `receiver` until the channel is closed (i.e.
    /// the [`JobEventBus`](gala_events::JobEventBus) is dropped).
    pub async fn run(self, mut receiver: broadcast::Receiver<JobEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => self.route_event(&event).await,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Notification router lagged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, notification router shutting down");
                    break;
                }
            }
        }
    }

    async fn route_event(&self, event: &JobEvent) {
        let frame = serde_json::json!({
            "type": "job.updated",
            "job": event,
        });
        let payload = match serde_json::to_string(&frame) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(error = %e, "Failed to encode job event frame");
                return;
            }
        };

        let delivered = self
            .ws_manager
            .send_job_update(event.owner_id, event.job_id, Message::Text(payload.into()))
            .await;
        tracing::trace!(
            job_id = event.job_id,
            status = %event.status,
            delivered,
            "Routed job event"
        );
    }
}
