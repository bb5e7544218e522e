//! Client-side upload job tracker.
//!
//! Mirrors the server's job state machine in real time:
//!
//! - Seeds a local view with an initial fetch.
//! - Subscribes to the push channel (WebSocket) scoped to the job.
//! - Runs a fixed-interval poll that is skipped while the push channel
//!   is fresh, so the view stays correct even when the channel silently
//!   stops delivering.
//! - Supports user-initiated cancellation of an in-flight job.

pub mod client;
pub mod messages;
pub mod tracker;

pub use client::{ApiClient, TrackerError};
pub use messages::{JobUpdate, JobView};
pub use tracker::{JobTracker, TrackerConfig};
