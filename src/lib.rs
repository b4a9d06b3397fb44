//! # deduplicater
//!
//! Finds duplicate files by content checksum or perceptual image hash,
//! and moves the extra copies out of the way.
//!
//! ## Workflow
//! 1. **Index** a directory tree: every file gets an MD5 digest and/or
//!    an image hash, saved to `.duplicate-index.json`
//! 2. **Find** clusters of files sharing a signature in a loaded index
//! 3. **Move** all but one file of each cluster under a target directory
//!
//! Nothing is ever deleted.
//!
//! ## Architecture
//! - `core` - The indexing, finding and moving engine
//! - `events` - Progress reporting over a channel
//! - `error` - Error types

pub mod core;
pub mod error;
pub mod events;

pub use crate::core::deduper::{is_dir_exist, Deduper, DeduperBuilder};
pub use error::{DeduperError, Result};

/// Initialize tracing for the binary.
///
/// Reads the filter from `RUST_LOG`. Calling it twice is harmless.
pub fn init_tracing() {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
