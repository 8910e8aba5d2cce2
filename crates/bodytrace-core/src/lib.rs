//! # Bodytrace Core
//!
//! Core types, geometry, and wire formats for the bodytrace person-tracing
//! system.
//!
//! This crate provides the foundational building blocks used throughout the
//! bodytrace workspace:
//!
//! - **Data types**: [`Heatmap`], [`Contour`], [`Pose`], [`PersonGroup`],
//!   and [`Frame`] for representing one sensor sample on its way from raw
//!   confidence grid to tracked scene snapshot.
//! - **Geometry**: point-in-polygon containment and the fixed-precision
//!   coordinate truncation applied after normalization.
//! - **Wire formats**: the inbound sensor message and the outbound frame
//!   envelope, in the [`wire`] module.
//! - **Errors**: the decode/validation taxonomy in the [`error`] module.
//!
//! ## Example
//!
//! ```rust
//! use bodytrace_core::{Heatmap, KeypointKind};
//!
//! let map = Heatmap::from_rows(&[vec![0.0, 0.8], vec![0.9, 1.0]]).unwrap();
//! assert!(map.is_foreground(1, 0));
//! assert!(!map.is_foreground(0, 0));
//! assert_eq!(KeypointKind::try_from(0).unwrap(), KeypointKind::Nose);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod geometry;
pub mod types;
pub mod wire;

pub use error::{CoreError, CoreResult, DecodeError};
pub use geometry::{point_in_polygon, truncate4};
pub use types::{
    BoundingBox, Contour, Frame, Heatmap, Keypoint, KeypointKind, PersonGroup, Pose, Vertex,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Number of body keypoints per skeleton (COCO format)
pub const MAX_KEYPOINTS: usize = 17;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{CoreError, CoreResult, DecodeError};
    pub use crate::geometry::{point_in_polygon, truncate4};
    pub use crate::types::{
        BoundingBox, Contour, Frame, Heatmap, Keypoint, KeypointKind, PersonGroup, Pose, Vertex,
    };
    pub use crate::wire::{FrameMessage, RawKeypoint, RawPose, ScoreValue, SensorMessage};
}
