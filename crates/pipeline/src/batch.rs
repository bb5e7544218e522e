//! The per-invocation batch loop.
//!
//! Consumes the checkpointed entry list in fixed-size slices, running
//! Validator -> Transformer -> Artifact Writer for each entry. Progress
//! is checkpointed durably after every slice, so a crash between slices
//! loses at most one slice's work. Job status is re-read before every
//! slice; a cancellation written by the client stops the loop at that
//! boundary.

use gala_core::naming::sanitize_file_name;
use gala_core::types::DbId;
use gala_db::models::photo::Photo;
use gala_db::models::status::UploadJobStatus;
use gala_db::models::upload_job::{EntryError, UploadJob};
use gala_events::{JobEvent, JobEventBus};
use gala_storage::ObjectStore;

use crate::budget::InvocationBudget;
use crate::config::PipelineConfig;
use crate::error::{EntryFailure, PipelineError};
use crate::ledger::{JobLedger, PhotoLedger};
use crate::transform;
use crate::validate::{self, Archive};
use crate::writer::ArtifactWriter;

/// Why the batch loop handed control back to the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOutcome {
    /// Every entry in the checkpointed list is accounted for.
    AllProcessed,
    /// The time budget ran out; a continuation must finish the rest.
    BudgetExhausted,
    /// The job left `processing` under us (user cancellation).
    Cancelled,
}

/// Runs the batch loop for one invocation.
pub struct BatchProcessor<'a> {
    ledger: &'a dyn JobLedger,
    photos: &'a dyn PhotoLedger,
    storage: &'a dyn ObjectStore,
    bus: &'a JobEventBus,
    config: &'a PipelineConfig,
}

impl<'a> BatchProcessor<'a> {
    pub fn new(
        ledger: &'a dyn JobLedger,
        photos: &'a dyn PhotoLedger,
        storage: &'a dyn ObjectStore,
        bus: &'a JobEventBus,
        config: &'a PipelineConfig,
    ) -> Self {
        Self {
            ledger,
            photos,
            storage,
            bus,
            config,
        }
    }

    /// Process entries until the list is exhausted, the budget runs out,
    /// or the job is cancelled.
    pub async fn run(
        &self,
        job: &UploadJob,
        archive_bytes: &[u8],
        budget: &dyn InvocationBudget,
    ) -> Result<BatchOutcome, PipelineError> {
        let entries = job.entries();
        let mut processed = job.processed_photos;
        let mut failed = job.failed_photos;
        let mut errors = job.errors();

        let mut archive = validate::open_archive(archive_bytes)?;
        let writer = ArtifactWriter::new(self.storage, self.photos, &self.config.media_bucket);

        loop {
            // Cancellation check at the batch boundary.
            let status = self
                .ledger
                .status_of(job.id)
                .await?
                .and_then(UploadJobStatus::from_id);
            if status != Some(UploadJobStatus::Processing) {
                tracing::info!(job_id = job.id, ?status, "Job left processing, stopping batch loop");
                return Ok(BatchOutcome::Cancelled);
            }

            let offset = (processed + failed) as usize;
            if offset >= entries.len() {
                return Ok(BatchOutcome::AllProcessed);
            }
            if !budget.has_remaining() {
                return Ok(BatchOutcome::BudgetExhausted);
            }

            let slice_end = (offset + self.config.batch_size).min(entries.len());
            let mut out_of_time = false;

            for entry_name in &entries[offset..slice_end] {
                // Mid-slice budget re-check: remaining entries are
                // skipped for this invocation, not failed.
                if !budget.has_remaining() {
                    out_of_time = true;
                    break;
                }

                match self
                    .process_entry(&mut archive, job.event_id, entry_name, &writer)
                    .await
                {
                    Ok(photo) => {
                        processed += 1;
                        tracing::debug!(
                            job_id = job.id,
                            entry = %entry_name,
                            photo_id = photo.id,
                            "Entry processed"
                        );
                    }
                    Err(failure) => {
                        failed += 1;
                        tracing::warn!(
                            job_id = job.id,
                            entry = %entry_name,
                            error = %failure,
                            "Entry failed"
                        );
                        errors.push(EntryError {
                            entry_name: entry_name.clone(),
                            message: failure.to_string(),
                        });
                    }
                }
            }

            // Durable checkpoint after every slice.
            match self
                .ledger
                .checkpoint(job.id, processed, failed, &errors)
                .await?
            {
                Some(row) => self.bus.publish(
                    JobEvent::new(row.id, row.event_id, row.owner_id, "processing")
                        .with_progress(row.total_photos, row.processed_photos, row.failed_photos),
                ),
                // Guard rejected the write: the job is no longer processing.
                None => return Ok(BatchOutcome::Cancelled),
            }

            if out_of_time {
                return Ok(BatchOutcome::BudgetExhausted);
            }
        }
    }

    /// Validator -> Transformer -> Artifact Writer for one entry.
    async fn process_entry(
        &self,
        archive: &mut Archive<'_>,
        event_id: DbId,
        entry_name: &str,
        writer: &ArtifactWriter<'_>,
    ) -> Result<Photo, EntryFailure> {
        let bytes = validate::read_entry(archive, entry_name, self.config.max_entry_bytes)?;

        let base_name = entry_name.rsplit(['/', '\\']).next().unwrap_or(entry_name);
        let file_name = sanitize_file_name(base_name).ok_or(EntryFailure::EmptyName)?;

        let kind = validate::sniff_entry(&bytes)?;

        // Decode/resize/encode is CPU-bound; keep it off the async
        // executor threads.
        let config = self.config.clone();
        let (bytes, transformed) = tokio::task::spawn_blocking(move || {
            let result = transform::process_image(&bytes, &config);
            (bytes, result)
        })
        .await
        .map_err(|e| EntryFailure::Decode(format!("transform task failed: {e}")))?;
        let transformed = transformed?;

        writer
            .store_photo(event_id, &file_name, kind, bytes, &transformed)
            .await
    }
}
