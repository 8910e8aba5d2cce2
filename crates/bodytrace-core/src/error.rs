//! Error types for the bodytrace system.
//!
//! Two tiers, following the recovery model of the pipeline:
//!
//! - [`DecodeError`]: a single inbound sensor message could not be decoded.
//!   Always recoverable: the message is dropped, the connection stays up,
//!   and tracking history is left untouched.
//! - [`CoreError`]: top-level error type covering decoding plus validation
//!   failures surfaced by the data model itself.
//!
//! Degenerate geometry (empty heatmaps, contours claimed by no pose) is
//! deliberately *not* an error anywhere in this crate; those cases produce
//! valid empty or partial results.

use thiserror::Error;

/// A specialized `Result` type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Top-level error type for the bodytrace core.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum CoreError {
    /// Inbound message decoding error
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Validation error for input data
    #[error("validation error: {message}")]
    Validation {
        /// Description of what validation failed
        message: String,
    },
}

impl CoreError {
    /// Creates a new validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Returns `true` if the failed operation may simply be retried with the
    /// next message.
    ///
    /// Every decode error is recoverable by dropping the offending message.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Decode(_) => true,
            Self::Validation { .. } => false,
        }
    }
}

/// Errors raised while decoding one inbound sensor message.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum DecodeError {
    /// The message body was not valid JSON for the expected shape
    #[error("malformed message: {0}")]
    Json(#[from] serde_json::Error),

    /// Heatmap rows disagree on column count
    #[error("ragged heatmap: row {row} has {actual} columns, expected {expected}")]
    RaggedHeatmap {
        /// Index of the offending row
        row: usize,
        /// Column count of row 0
        expected: usize,
        /// Column count of the offending row
        actual: usize,
    },

    /// Keypoint body-part index outside the 17-part skeleton
    #[error("invalid keypoint index: {index}")]
    KeypointIndex {
        /// The out-of-range index
        index: u8,
    },
}
