//! Stalled-job watchdog.
//!
//! A continuation dispatch can fail without anyone noticing, leaving a
//! job parked in a non-terminal status forever. The watchdog closes that
//! gap: it periodically scans for non-terminal jobs that have not been
//! touched recently and re-dispatches them through the processor
//! endpoint using the internal continuation channel.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use gala_core::token::{continuation_token, CONTINUATION_TOKEN_HEADER};
use gala_core::types::DbId;
use gala_db::repositories::UploadJobRepo;
use gala_db::DbPool;

/// Watchdog configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct WatchdogConfig {
    /// Seconds between scans (default: `300`).
    pub scan_interval_secs: u64,
    /// A non-terminal job untouched for this long counts as stalled
    /// (default: `900`). Must comfortably exceed the pipeline execution
    /// ceiling so healthy in-flight invocations are never re-dispatched.
    pub stall_after_secs: i64,
    /// Base URL of the API server (default: `http://127.0.0.1:3000`).
    pub api_base_url: String,
    /// Shared secret for signing continuation tokens.
    pub internal_token_secret: String,
}

impl WatchdogConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                  | Required | Default                 |
    /// |--------------------------|----------|-------------------------|
    /// | `WATCHDOG_INTERVAL_SECS` | no       | `300`                   |
    /// | `WATCHDOG_STALL_SECS`    | no       | `900`                   |
    /// | `API_BASE_URL`           | no       | `http://127.0.0.1:3000` |
    /// | `INTERNAL_TOKEN_SECRET`  | **yes**  | --                      |
    ///
    /// # Panics
    ///
    /// Panics on malformed values or a missing secret.
    pub fn from_env() -> Self {
        let scan_interval_secs: u64 = std::env::var("WATCHDOG_INTERVAL_SECS")
            .unwrap_or_else(|_| "300".into())
            .parse()
            .expect("WATCHDOG_INTERVAL_SECS must be a valid u64");

        let stall_after_secs: i64 = std::env::var("WATCHDOG_STALL_SECS")
            .unwrap_or_else(|_| "900".into())
            .parse()
            .expect("WATCHDOG_STALL_SECS must be a valid i64");

        let api_base_url = std::env::var("API_BASE_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:3000".into())
            .trim_end_matches('/')
            .to_string();

        let internal_token_secret = std::env::var("INTERNAL_TOKEN_SECRET")
            .expect("INTERNAL_TOKEN_SECRET must be set in the environment");

        Self {
            scan_interval_secs,
            stall_after_secs,
            api_base_url,
            internal_token_secret,
        }
    }
}

/// Background service that re-dispatches stalled upload jobs.
pub struct Watchdog {
    pool: DbPool,
    http: reqwest::Client,
    config: WatchdogConfig,
}

impl Watchdog {
    pub fn new(pool: DbPool, config: WatchdogConfig) -> Self {
        Self {
            pool,
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Run the scan loop until the token is cancelled.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut interval =
            tokio::time::interval(Duration::from_secs(self.config.scan_interval_secs));

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Watchdog cancelled");
                    break;
                }
                _ = interval.tick() => {
                    if let Err(e) = self.scan().await {
                        tracing::error!(error = %e, "Watchdog scan failed");
                    }
                }
            }
        }
    }

    /// One scan: find stalled jobs and re-dispatch each.
    async fn scan(&self) -> Result<(), sqlx::Error> {
        let stalled =
            UploadJobRepo::list_stalled(&self.pool, self.config.stall_after_secs).await?;

        for job in &stalled {
            tracing::warn!(
                job_id = job.id,
                status_id = job.status_id,
                updated_at = %job.updated_at,
                "Re-dispatching stalled upload job"
            );
            if let Err(e) = self.dispatch(job.id).await {
                tracing::error!(job_id = job.id, error = %e, "Re-dispatch failed");
            }
        }

        if !stalled.is_empty() {
            tracing::info!(count = stalled.len(), "Watchdog re-dispatched stalled jobs");
        }

        Ok(())
    }

    async fn dispatch(&self, job_id: DbId) -> Result<(), reqwest::Error> {
        let url = format!("{}/api/v1/uploads/{job_id}/process", self.config.api_base_url);
        self.http
            .post(&url)
            .header(
                CONTINUATION_TOKEN_HEADER,
                continuation_token(&self.config.internal_token_secret, job_id),
            )
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
