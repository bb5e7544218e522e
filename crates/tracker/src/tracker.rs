//! The job tracker: push subscription with a polling fallback.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use futures::{SinkExt, StreamExt};
use tokio::sync::watch;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use gala_core::types::DbId;

use crate::client::{ApiClient, TrackerError};
use crate::messages::{ClientFrame, JobView, PushFrame};

/// Tunable tracker behaviour.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Fixed polling interval.
    pub poll_interval: Duration,
    /// How recently a push frame must have arrived for a poll tick to be
    /// skipped.
    pub freshness_window: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            freshness_window: Duration::from_secs(10),
        }
    }
}

/// Decide whether a poll tick needs the network.
///
/// A tick is skipped when the push channel delivered a frame within the
/// freshness window; polling resumes automatically if the channel goes
/// quiet.
pub fn poll_due(last_push_age: Option<Duration>, freshness_window: Duration) -> bool {
    match last_push_age {
        Some(age) => age >= freshness_window,
        None => true,
    }
}

/// Tracks one upload job until it reaches a terminal status.
///
/// Consumers read the live view through the [`watch::Receiver`] returned
/// by [`start`](Self::start).
pub struct JobTracker {
    client: ApiClient,
    job_id: DbId,
    view_tx: Arc<watch::Sender<JobView>>,
    shutdown: CancellationToken,
    tasks: Vec<tokio::task::JoinHandle<()>>,
}

impl JobTracker {
    /// Seed the view with an initial fetch, open the push channel, and
    /// start the polling fallback.
    pub async fn start(
        client: ApiClient,
        job_id: DbId,
        config: TrackerConfig,
    ) -> Result<(Self, watch::Receiver<JobView>), TrackerError> {
        let initial = client.fetch_job(job_id).await?;
        let (view_tx, view_rx) = watch::channel(initial);
        let view_tx = Arc::new(view_tx);
        let shutdown = CancellationToken::new();
        let last_push: Arc<Mutex<Option<Instant>>> = Arc::new(Mutex::new(None));

        let mut tasks = Vec::new();
        tasks.push(tokio::spawn(push_loop(
            client.clone(),
            job_id,
            Arc::clone(&view_tx),
            Arc::clone(&last_push),
            shutdown.clone(),
        )));
        tasks.push(tokio::spawn(poll_loop(
            client.clone(),
            job_id,
            Arc::clone(&view_tx),
            Arc::clone(&last_push),
            config,
            shutdown.clone(),
        )));

        Ok((
            Self {
                client,
                job_id,
                view_tx,
                shutdown,
                tasks,
            },
            view_rx,
        ))
    }

    /// Current snapshot of the job view.
    pub fn view(&self) -> JobView {
        self.view_tx.borrow().clone()
    }

    /// User-initiated cancellation: writes `cancelled` directly through
    /// the API, then tears the subscription down.
    pub async fn cancel(mut self) -> Result<(), TrackerError> {
        self.client.cancel_job(self.job_id).await?;
        self.view_tx.send_modify(|view| {
            view.status = "cancelled".to_string();
        });
        self.teardown();
        Ok(())
    }

    /// Stop both background tasks without touching the job.
    pub fn shutdown(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        self.shutdown.cancel();
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

impl Drop for JobTracker {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Push channel loop: connect, scope the subscription to the job, and
/// fold `job.updated` frames into the view.
///
/// Exits quietly on connection loss; the poll loop keeps the view
/// correct from then on.
async fn push_loop(
    client: ApiClient,
    job_id: DbId,
    view_tx: Arc<watch::Sender<JobView>>,
    last_push: Arc<Mutex<Option<Instant>>>,
    shutdown: CancellationToken,
) {
    let url = client.ws_url();
    let (mut stream, _response) = match connect_async(&url).await {
        Ok(connected) => connected,
        Err(e) => {
            tracing::warn!(job_id, error = %e, "Push channel unavailable, relying on polling");
            return;
        }
    };

    // Scope the subscription to this job.
    let watch_frame = match serde_json::to_string(&ClientFrame::Watch { job_id }) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::warn!(job_id, error = %e, "Failed to encode watch frame");
            return;
        }
    };
    if let Err(e) = stream.send(Message::Text(watch_frame.into())).await {
        tracing::warn!(job_id, error = %e, "Failed to send watch frame");
        return;
    }
    tracing::debug!(job_id, "Push channel subscribed");

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                let _ = stream.send(Message::Close(None)).await;
                return;
            }
            frame = stream.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<PushFrame>(text.as_str()) {
                            Ok(PushFrame::JobUpdated { job }) if job.job_id == job_id => {
                                *last_push.lock().expect("last_push lock") = Some(Instant::now());
                                view_tx.send_modify(|view| view.apply(&job));
                            }
                            Ok(_) => {}
                            Err(e) => {
                                tracing::debug!(job_id, error = %e, "Ignoring unparseable frame");
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::info!(job_id, "Push channel closed, relying on polling");
                        return;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::warn!(job_id, error = %e, "Push channel error, relying on polling");
                        return;
                    }
                }
            }
        }
    }
}

/// Polling fallback loop: runs only while the job is non-terminal, and
/// skips the network call while the push channel is fresh.
async fn poll_loop(
    client: ApiClient,
    job_id: DbId,
    view_tx: Arc<watch::Sender<JobView>>,
    last_push: Arc<Mutex<Option<Instant>>>,
    config: TrackerConfig,
    shutdown: CancellationToken,
) {
    let mut interval = tokio::time::interval(config.poll_interval);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => return,
            _ = interval.tick() => {}
        }

        if view_tx.borrow().is_terminal() {
            tracing::debug!(job_id, "Job terminal, poll loop stopping");
            return;
        }

        let age = last_push
            .lock()
            .expect("last_push lock")
            .map(|at| at.elapsed());
        if !poll_due(age, config.freshness_window) {
            continue;
        }

        match client.fetch_job(job_id).await {
            Ok(view) => {
                view_tx.send_replace(view);
            }
            Err(e) => {
                tracing::warn!(job_id, error = %e, "Poll fetch failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_due_without_any_push() {
        assert!(poll_due(None, Duration::from_secs(10)));
    }

    #[test]
    fn test_poll_skipped_while_channel_fresh() {
        assert!(!poll_due(
            Some(Duration::from_secs(3)),
            Duration::from_secs(10)
        ));
    }

    #[test]
    fn test_poll_resumes_when_channel_goes_quiet() {
        assert!(poll_due(
            Some(Duration::from_secs(11)),
            Duration::from_secs(10)
        ));
        assert!(poll_due(
            Some(Duration::from_secs(10)),
            Duration::from_secs(10)
        ));
    }

    #[test]
    fn test_default_config_relationship() {
        let config = TrackerConfig::default();
        // The freshness window must outlast one poll interval, otherwise
        // every tick would poll even with a healthy push channel.
        assert!(config.freshness_window > config.poll_interval);
    }
}
