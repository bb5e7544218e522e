//! HTTP client for the gala upload API.

use gala_core::types::DbId;
use serde::Deserialize;

use crate::messages::JobView;

/// Errors surfaced by the tracker.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    /// Transport-level HTTP failure.
    #[error("Request error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Failed to establish the push channel.
    #[error("Connection error: {0}")]
    Connection(String),
}

/// `{ "data": ... }` response envelope used by the API.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

/// Authenticated REST client for one user session.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl ApiClient {
    /// Create a client for `base_url` (e.g. `http://localhost:3000`)
    /// authenticating with a bearer token.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    /// Fetch the full job record.
    pub async fn fetch_job(&self, job_id: DbId) -> Result<JobView, TrackerError> {
        let url = format!("{}/api/v1/uploads/{job_id}", self.base_url);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;
        Self::check(&response).await?;
        Ok(response.json::<Envelope<JobView>>().await?.data)
    }

    /// Request cancellation of a non-terminal job.
    pub async fn cancel_job(&self, job_id: DbId) -> Result<(), TrackerError> {
        let url = format!("{}/api/v1/uploads/{job_id}/cancel", self.base_url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;
        Self::check(&response).await
    }

    /// The WebSocket endpoint matching this client's base URL.
    pub fn ws_url(&self) -> String {
        let ws_base = if let Some(rest) = self.base_url.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = self.base_url.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            self.base_url.clone()
        };
        format!("{ws_base}/api/v1/ws?token={}", self.token)
    }

    async fn check(response: &reqwest::Response) -> Result<(), TrackerError> {
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(TrackerError::Api {
                status: status.as_u16(),
                message: status
                    .canonical_reason()
                    .unwrap_or("unexpected response")
                    .to_string(),
            })
        }
    }
}
