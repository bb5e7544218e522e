//! Job progress event infrastructure.
//!
//! [`JobEventBus`] is the in-process publish/subscribe hub the pipeline
//! uses to announce every upload-job status transition and checkpoint.
//! The API server subscribes and forwards events to WebSocket clients.

pub mod bus;

pub use bus::{JobEvent, JobEventBus};
