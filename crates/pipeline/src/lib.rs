//! The resumable bulk photo-processing pipeline.
//!
//! An uploaded archive moves through a fixed state machine
//! (`pending -> uploading -> extracting -> processing -> completed`)
//! driven by repeated, time-budgeted invocations of the
//! [`Orchestrator`](orchestrator::Orchestrator). Each invocation:
//!
//! 1. Validates and (once) extracts the archive's entry manifest.
//! 2. Processes entries in fixed-size batches: validate, transform
//!    (resize + watermark + re-encode), and persist three artifacts plus
//!    one catalog row per photo.
//! 3. Checkpoints progress after every batch so the next invocation can
//!    resume where this one ran out of time.
//!
//! The hosting runtime enforces a hard wall-clock ceiling per invocation;
//! the [`budget`] module models the remaining allowance and the
//! orchestrator reports [`Outcome::Continue`](orchestrator::Outcome) when
//! the job needs another invocation.

pub mod batch;
pub mod budget;
pub mod config;
pub mod error;
pub mod ledger;
pub mod memory;
pub mod orchestrator;
pub mod transform;
pub mod validate;
pub mod watermark;
pub mod writer;

pub use config::{PipelineConfig, WatermarkConfig};
pub use error::{EntryFailure, PipelineError};
pub use orchestrator::{Orchestrator, Outcome};
