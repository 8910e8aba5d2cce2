//! # Bodytrace Server
//!
//! Transport and supervision around the bodytrace pipeline:
//!
//! - **frames channel** ([`ingest`]): websocket ingest of raw sensor
//!   messages, one logical tracked scene per process
//! - **app channel** ([`fanout`]): fire-and-forget fan-out of processed
//!   frame envelopes to open listeners
//! - **replay** ([`replay`]): feeding recorded messages through the same
//!   pipeline with their original timing
//! - **sensor** ([`sensor`]): lifecycle of the remote segmentation process
//!
//! Per-message failures are logged and dropped; only startup failures
//! (unbindable ports, unusable replay directories) are fatal.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod fanout;
pub mod ingest;
pub mod replay;
pub mod sensor;
pub mod state;

pub use state::SceneState;

use std::path::PathBuf;

/// Errors that abort server startup.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ServerError {
    /// Underlying I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The replay directory exists but holds no recordings
    #[error("no frame recordings found in {path}")]
    EmptyReplayDir {
        /// The scanned directory
        path: PathBuf,
    },
}
