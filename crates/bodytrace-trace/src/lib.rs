//! # Bodytrace Trace
//!
//! The bodytrace processing pipeline: silhouette extraction from
//! body-segmentation heatmaps, pose-to-silhouette fusion, and cross-frame
//! identity tracking.
//!
//! Data flows strictly forward through the modules:
//!
//! ```text
//! Heatmap ──contour──▶ pixel contours ──normalize──▶ unit contours/poses
//!         ──assemble──▶ person groups ──tracker──▶ identified frame
//! ```
//!
//! [`FramePipeline`] wires the stages together, one inbound sensor message
//! to one processed [`Frame`](bodytrace_core::Frame), and owns the per-scene
//! [`FrameTracker`] context that persists between frames.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod assemble;
pub mod contour;
pub mod normalize;
pub mod pipeline;
pub mod tracker;

pub use assemble::{assemble_person_groups, PRIORITY_KEYPOINTS};
pub use contour::extract_contours;
pub use normalize::{normalize_contours, normalize_pose};
pub use pipeline::FramePipeline;
pub use tracker::{FrameTracker, TrackerConfig};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
