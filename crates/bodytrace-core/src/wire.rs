//! Wire formats for the two external interfaces.
//!
//! Upstream, the edge sensor publishes one JSON message per sample:
//!
//! ```json
//! { "heatmap": [[0.0, 0.9], [0.3, 1.0]],
//!   "poses": [ { "keypoints": [ { "ki": 0, "pos": [12.0, 30.5], "score": "0.87" } ] } ] }
//! ```
//!
//! Keypoint scores arrive either numeric or textual; [`ScoreValue`] absorbs
//! both and the normalizer coerces to a truncated numeric value.
//!
//! Downstream, processed frames are wrapped in a typed envelope and fanned
//! out verbatim to every open listener.

use serde::{Deserialize, Serialize};

use crate::types::Frame;

// ---------------------------------------------------------------------------
// Upstream
// ---------------------------------------------------------------------------

/// One decoded sensor sample: a heatmap plus candidate skeletons.
#[derive(Debug, Clone, Deserialize)]
pub struct SensorMessage {
    /// Row-major confidence grid, `heatmap[y][x]`
    pub heatmap: Vec<Vec<f32>>,
    /// Candidate skeletons in detection order
    pub poses: Vec<RawPose>,
}

/// A skeleton as published by the sensor, prior to normalization.
#[derive(Debug, Clone, Deserialize)]
pub struct RawPose {
    /// Keypoints in detection order
    pub keypoints: Vec<RawKeypoint>,
}

/// A keypoint as published by the sensor: pixel position, raw score.
#[derive(Debug, Clone, Deserialize)]
pub struct RawKeypoint {
    /// Body-part index, 0-16
    pub ki: u8,
    /// Pixel-space position `[x, y]`
    pub pos: [f64; 2],
    /// Confidence, numeric or textual
    pub score: ScoreValue,
}

/// A confidence score that may arrive as a JSON number or string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ScoreValue {
    /// Plain numeric score
    Number(f64),
    /// Textual score, e.g. `"0.87"`
    Text(String),
}

impl ScoreValue {
    /// Numeric value of the score; unparseable text reads as 0.0.
    #[must_use]
    pub fn as_f64(&self) -> f64 {
        match self {
            Self::Number(n) => *n,
            Self::Text(s) => s.trim().parse().unwrap_or(0.0),
        }
    }
}

// ---------------------------------------------------------------------------
// Downstream
// ---------------------------------------------------------------------------

/// Envelope wrapping a processed frame for broadcast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameMessage {
    /// Message discriminator, always `"frame"`
    #[serde(rename = "type")]
    pub kind: String,
    /// The processed frame
    pub payload: Frame,
}

impl FrameMessage {
    /// Wraps a frame in the broadcast envelope.
    #[must_use]
    pub fn new(payload: Frame) -> Self {
        Self {
            kind: "frame".to_string(),
            payload,
        }
    }
}
