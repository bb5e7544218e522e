//! Continuation self-invocation.
//!
//! When an invocation ends with work remaining, the server calls its own
//! processor endpoint so progress resumes without an external scheduler.
//! [`Reinvoker`] is the one-time-initialized capability that performs
//! this call; it is constructed at startup and carried in `AppState`.

use std::sync::Arc;

use gala_core::token::{continuation_token, CONTINUATION_TOKEN_HEADER};
use gala_core::types::DbId;

/// Dispatches authenticated continuation calls back to this server.
pub struct Reinvoker {
    http: reqwest::Client,
    base_url: String,
    secret: String,
}

impl Reinvoker {
    /// `base_url` is the externally reachable address of this server;
    /// `secret` signs the job-scoped continuation tokens.
    pub fn new(base_url: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            secret: secret.into(),
        }
    }

    /// Fire-and-forget continuation dispatch.
    ///
    /// A failed dispatch is logged and not retried here: the job stays in
    /// its current non-terminal status until the watchdog re-dispatches
    /// it.
    pub fn dispatch(self: &Arc<Self>, job_id: DbId) {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            match this.invoke(job_id).await {
                Ok(()) => tracing::debug!(job_id, "Continuation dispatched"),
                Err(e) => {
                    tracing::error!(job_id, error = %e, "Continuation dispatch failed; job awaits the watchdog");
                }
            }
        });
    }

    async fn invoke(&self, job_id: DbId) -> Result<(), reqwest::Error> {
        let url = format!("{}/api/v1/uploads/{job_id}/process", self.base_url);
        self.http
            .post(&url)
            .header(
                CONTINUATION_TOKEN_HEADER,
                continuation_token(&self.secret, job_id),
            )
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
