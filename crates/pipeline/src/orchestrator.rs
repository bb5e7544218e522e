//! The job orchestrator: owns the upload-job state machine.
//!
//! One [`run_invocation`](Orchestrator::run_invocation) call advances a
//! job as far as its time budget allows and reports how it stopped. All
//! status writes are conditional on the expected current status, so a
//! cancellation issued by the client between two invocations (or two
//! batches) always wins.

use std::sync::Arc;

use gala_core::types::DbId;
use gala_db::models::status::UploadJobStatus;
use gala_db::models::upload_job::UploadJob;
use gala_events::{JobEvent, JobEventBus};
use gala_storage::ObjectStore;

use crate::batch::{BatchOutcome, BatchProcessor};
use crate::budget::InvocationBudget;
use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::ledger::{JobLedger, PhotoLedger};
use crate::validate;

/// How an invocation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// All entries accounted for; the job is `completed`.
    Completed,
    /// Work remains; the caller must dispatch a continuation.
    Continue,
    /// The job hit a fatal error and is now `failed`.
    Failed(String),
    /// A cancellation was observed; the job is `cancelled`.
    Cancelled,
    /// The job was already terminal when the invocation started.
    AlreadyTerminal,
}

impl Outcome {
    /// Short label for HTTP responses and logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Continue => "continue",
            Self::Failed(_) => "failed",
            Self::Cancelled => "cancelled",
            Self::AlreadyTerminal => "already_terminal",
        }
    }
}

/// Drives upload jobs through their state machine.
pub struct Orchestrator {
    ledger: Arc<dyn JobLedger>,
    photos: Arc<dyn PhotoLedger>,
    storage: Arc<dyn ObjectStore>,
    bus: Arc<JobEventBus>,
    config: PipelineConfig,
}

impl Orchestrator {
    pub fn new(
        ledger: Arc<dyn JobLedger>,
        photos: Arc<dyn PhotoLedger>,
        storage: Arc<dyn ObjectStore>,
        bus: Arc<JobEventBus>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            ledger,
            photos,
            storage,
            bus,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run one invocation for `job_id` under the given budget.
    pub async fn run_invocation(
        &self,
        job_id: DbId,
        budget: &dyn InvocationBudget,
    ) -> Result<Outcome, PipelineError> {
        let job = self
            .ledger
            .find(job_id)
            .await?
            .ok_or(PipelineError::JobNotFound(job_id))?;
        let status = job
            .status()
            .ok_or(PipelineError::UnknownStatus(job.status_id))?;

        tracing::info!(
            job_id,
            status = %status,
            processed = job.processed_photos,
            failed = job.failed_photos,
            "Pipeline invocation started"
        );

        match status {
            UploadJobStatus::Completed | UploadJobStatus::Failed | UploadJobStatus::Cancelled => {
                Ok(Outcome::AlreadyTerminal)
            }
            UploadJobStatus::Pending | UploadJobStatus::Uploading | UploadJobStatus::Extracting => {
                self.extract_and_process(job, status, budget).await
            }
            UploadJobStatus::Processing => self.resume(job, budget).await,
        }
    }

    /// Pre-download checks, archive download, entry extraction, then
    /// (budget permitting) fall through into batch processing.
    async fn extract_and_process(
        &self,
        mut job: UploadJob,
        mut current: UploadJobStatus,
        budget: &dyn InvocationBudget,
    ) -> Result<Outcome, PipelineError> {
        if current == UploadJobStatus::Pending {
            // Storage-reported size check before any download.
            match self
                .storage
                .head(&self.config.archive_bucket, &job.archive_path)
                .await
            {
                Ok(Some(size)) if size > self.config.max_archive_bytes => {
                    return self
                        .fail_job(
                            &job,
                            PipelineError::ArchiveTooLarge {
                                size,
                                limit: self.config.max_archive_bytes,
                            },
                        )
                        .await;
                }
                Ok(Some(_)) => {}
                Ok(None) => {
                    return self
                        .fail_job(&job, PipelineError::ArchiveMissing(job.archive_path.clone()))
                        .await;
                }
                Err(e) => {
                    return self.fail_job(&job, PipelineError::Storage(e)).await;
                }
            }

            job = match self
                .advance(job.id, UploadJobStatus::Pending, UploadJobStatus::Uploading)
                .await?
            {
                Some(row) => row,
                None => return self.lost_race(job.id).await,
            };
            current = UploadJobStatus::Uploading;
        }

        if current == UploadJobStatus::Uploading {
            job = match self
                .advance(job.id, UploadJobStatus::Uploading, UploadJobStatus::Extracting)
                .await?
            {
                Some(row) => row,
                None => return self.lost_race(job.id).await,
            };
        }

        // Download the container; a failure here is job-fatal.
        let archive_bytes = match self
            .storage
            .get(&self.config.archive_bucket, &job.archive_path)
            .await
        {
            Ok(bytes) => bytes,
            Err(e) => return self.fail_job(&job, PipelineError::Storage(e)).await,
        };

        let entries = match validate::extract_entry_list(&archive_bytes, &self.config) {
            Ok(entries) => entries,
            Err(e) => return self.fail_job(&job, e).await,
        };

        // Persist the manifest once; a crashed earlier attempt may have
        // written it already, in which case the original stands.
        job = match self
            .ledger
            .set_manifest(job.id, entries.len() as i32, &entries)
            .await?
        {
            Some(row) => row,
            None => self
                .ledger
                .find(job.id)
                .await?
                .ok_or(PipelineError::JobNotFound(job.id))?,
        };

        job = match self
            .advance(job.id, UploadJobStatus::Extracting, UploadJobStatus::Processing)
            .await?
        {
            Some(row) => row,
            None => return self.lost_race(job.id).await,
        };

        if !budget.has_remaining() {
            return Ok(Outcome::Continue);
        }
        self.run_batches(job, &archive_bytes, budget).await
    }

    /// Resume a `processing` job from its checkpoint.
    async fn resume(
        &self,
        job: UploadJob,
        budget: &dyn InvocationBudget,
    ) -> Result<Outcome, PipelineError> {
        let archive_bytes = match self
            .storage
            .get(&self.config.archive_bucket, &job.archive_path)
            .await
        {
            Ok(bytes) => bytes,
            Err(e) => return self.fail_job(&job, PipelineError::Storage(e)).await,
        };
        self.run_batches(job, &archive_bytes, budget).await
    }

    async fn run_batches(
        &self,
        job: UploadJob,
        archive_bytes: &[u8],
        budget: &dyn InvocationBudget,
    ) -> Result<Outcome, PipelineError> {
        let processor = BatchProcessor::new(
            self.ledger.as_ref(),
            self.photos.as_ref(),
            self.storage.as_ref(),
            self.bus.as_ref(),
            &self.config,
        );

        match processor.run(&job, archive_bytes, budget).await? {
            BatchOutcome::AllProcessed => {
                let completed = match self
                    .advance(job.id, UploadJobStatus::Processing, UploadJobStatus::Completed)
                    .await?
                {
                    Some(row) => row,
                    None => return self.lost_race(job.id).await,
                };

                // The temp container is only removed once no further
                // continuation can need it.
                if let Err(e) = self
                    .storage
                    .delete(&self.config.archive_bucket, &completed.archive_path)
                    .await
                {
                    tracing::warn!(job_id = job.id, error = %e, "Failed to delete processed archive");
                }

                tracing::info!(
                    job_id = job.id,
                    processed = completed.processed_photos,
                    failed = completed.failed_photos,
                    "Upload job completed"
                );
                Ok(Outcome::Completed)
            }
            BatchOutcome::BudgetExhausted => {
                tracing::info!(job_id = job.id, "Budget exhausted, continuation required");
                Ok(Outcome::Continue)
            }
            BatchOutcome::Cancelled => Ok(Outcome::Cancelled),
        }
    }

    /// Conditional transition + event publication.
    async fn advance(
        &self,
        job_id: DbId,
        from: UploadJobStatus,
        to: UploadJobStatus,
    ) -> Result<Option<UploadJob>, PipelineError> {
        let row = self.ledger.transition(job_id, from, to).await?;
        if let Some(row) = &row {
            self.publish(row);
        }
        Ok(row)
    }

    /// An expected-status guard failed: report what actually happened.
    async fn lost_race(&self, job_id: DbId) -> Result<Outcome, PipelineError> {
        match self
            .ledger
            .status_of(job_id)
            .await?
            .and_then(UploadJobStatus::from_id)
        {
            Some(UploadJobStatus::Cancelled) => Ok(Outcome::Cancelled),
            _ => Ok(Outcome::AlreadyTerminal),
        }
    }

    /// Job-fatal path: persist the message, clean up the temp container,
    /// publish the terminal event.
    async fn fail_job(
        &self,
        job: &UploadJob,
        error: PipelineError,
    ) -> Result<Outcome, PipelineError> {
        let message = error.to_string();
        tracing::error!(job_id = job.id, error = %message, "Upload job failed");

        let row = self.ledger.fail(job.id, &message).await?;

        if let Err(e) = self
            .storage
            .delete(&self.config.archive_bucket, &job.archive_path)
            .await
        {
            tracing::warn!(job_id = job.id, error = %e, "Failed to delete archive of failed job");
        }

        if let Some(row) = row {
            self.publish(&row);
        }
        Ok(Outcome::Failed(message))
    }

    fn publish(&self, job: &UploadJob) {
        let status = job.status().map(|s| s.name()).unwrap_or("unknown");
        let mut event = JobEvent::new(job.id, job.event_id, job.owner_id, status).with_progress(
            job.total_photos,
            job.processed_photos,
            job.failed_photos,
        );
        if let Some(message) = &job.error_message {
            event = event.with_error(message.clone());
        }
        self.bus.publish(event);
    }
}
