//! Pipeline error taxonomy.
//!
//! Two distinct families:
//!
//! - [`PipelineError`] — job-fatal: the whole job transitions to `failed`.
//! - [`EntryFailure`] — scoped to one archive entry: recorded in the job's
//!   error list and counted, the batch loop continues.

use gala_core::types::DbId;
use gala_storage::StorageError;

use gala_db::models::status::StatusId;

/// Job-fatal pipeline failures.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Upload job {0} not found")]
    JobNotFound(DbId),

    #[error("Upload job carries unknown status id {0}")]
    UnknownStatus(StatusId),

    #[error("Archive object missing at {0}")]
    ArchiveMissing(String),

    #[error("Archive is not a ZIP file")]
    BadArchiveSignature,

    #[error("Archive size {size} bytes exceeds the {limit} byte ceiling")]
    ArchiveTooLarge { size: u64, limit: u64 },

    #[error("Archive could not be read: {0}")]
    ArchiveUnreadable(String),

    #[error("Archive contains no processable image entries")]
    NoEntries,

    #[error("Archive contains {count} image entries, above the {limit} entry ceiling")]
    TooManyEntries { count: usize, limit: usize },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] sqlx::Error),
}

/// Failures scoped to a single archive entry.
///
/// The rendered message is what lands in the job's `entry_errors` list.
#[derive(Debug, thiserror::Error)]
pub enum EntryFailure {
    #[error("Entry missing from archive")]
    Missing,

    #[error("Entry size {size} bytes exceeds the {limit} byte ceiling")]
    TooLarge { size: u64, limit: u64 },

    #[error("Bytes do not match any supported image format")]
    UnknownFormat,

    #[error("File name is empty after sanitization")]
    EmptyName,

    #[error("Image decode failed: {0}")]
    Decode(String),

    #[error("Image encode failed: {0}")]
    Encode(String),

    #[error("Artifact upload failed: {0}")]
    Upload(String),

    #[error("Catalog insert failed: {0}")]
    Catalog(String),
}
