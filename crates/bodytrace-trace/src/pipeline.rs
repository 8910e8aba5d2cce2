//! Per-message pipeline orchestration.
//!
//! One decoded sensor message in, one fully processed [`Frame`] out,
//! synchronously and with no internal concurrency: extraction, normalization,
//! grouping, and tracking complete before the caller sees the frame. The
//! transport layer owns socket lifecycle and calls this once per inbound
//! message; a failed message leaves tracking history untouched.

use chrono::Utc;

use bodytrace_core::wire::SensorMessage;
use bodytrace_core::{CoreResult, DecodeError, Frame, Heatmap};

use crate::assemble::assemble_person_groups;
use crate::contour::extract_contours;
use crate::normalize::{normalize_contours, normalize_pose};
use crate::tracker::FrameTracker;

/// The full heatmap-to-tracked-frame pipeline for one logical scene.
pub struct FramePipeline {
    tracker: FrameTracker,
}

impl FramePipeline {
    /// Creates a pipeline with a fresh tracking context.
    #[must_use]
    pub fn new() -> Self {
        Self::with_tracker(FrameTracker::new())
    }

    /// Creates a pipeline around an existing tracking context.
    #[must_use]
    pub fn with_tracker(tracker: FrameTracker) -> Self {
        Self { tracker }
    }

    /// Decodes and processes one raw message body.
    ///
    /// # Errors
    ///
    /// Returns a decode error for malformed JSON, ragged heatmap rows, or
    /// out-of-range keypoint indices. History is not touched on failure.
    pub fn process_raw(&mut self, message: &str) -> CoreResult<Frame> {
        let decoded: SensorMessage =
            serde_json::from_str(message).map_err(DecodeError::from)?;
        self.process(&decoded)
    }

    /// Processes one decoded message, stamping the frame with the current
    /// wall-clock time.
    ///
    /// # Errors
    ///
    /// See [`Self::process_raw`].
    pub fn process(&mut self, message: &SensorMessage) -> CoreResult<Frame> {
        self.process_at(message, Utc::now().timestamp_millis())
    }

    /// Processes one decoded message with an explicit timestamp.
    ///
    /// # Errors
    ///
    /// See [`Self::process_raw`].
    pub fn process_at(&mut self, message: &SensorMessage, t: i64) -> CoreResult<Frame> {
        let heatmap = Heatmap::from_rows(&message.heatmap)?;
        let width = heatmap.width();
        let height = heatmap.height();

        let poses = message
            .poses
            .iter()
            .map(|raw| normalize_pose(raw, width, height))
            .collect::<CoreResult<Vec<_>>>()?;

        let contours = normalize_contours(extract_contours(&heatmap), width, height);
        let person_groups = assemble_person_groups(contours, poses);

        let mut frame = Frame {
            t,
            width,
            height,
            person_groups,
        };
        self.tracker.process(&mut frame);

        tracing::debug!(
            t = frame.t,
            width,
            height,
            groups = frame.person_groups.len(),
            "processed frame"
        );
        Ok(frame)
    }

    /// Clears the scene's tracking context.
    pub fn reset(&mut self) {
        self.tracker.reset();
    }

    /// Read access to the tracking context.
    #[must_use]
    pub fn tracker(&self) -> &FrameTracker {
        &self.tracker
    }
}

impl Default for FramePipeline {
    fn default() -> Self {
        Self::new()
    }
}
