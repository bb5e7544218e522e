//! Pure domain logic shared across the gala backend.
//!
//! No I/O, no async, no database access. This crate provides:
//!
//! - Shared id and timestamp aliases ([`types`]).
//! - The domain error enum ([`error::CoreError`]).
//! - Archive container/entry validation primitives ([`archive`]).
//! - Raster format sniffing by magic bytes ([`sniff`]).
//! - File name sanitization ([`naming`]).
//! - Continuation token signing/verification ([`token`]).

pub mod archive;
pub mod error;
pub mod naming;
pub mod sniff;
pub mod token;
pub mod types;
