//! Core data types for the bodytrace pipeline.
//!
//! # Type Categories
//!
//! - **Grid types**: [`Heatmap`], the per-pixel confidence grid
//! - **Geometry types**: [`Vertex`], [`Contour`], [`BoundingBox`]
//! - **Pose types**: [`Keypoint`], [`KeypointKind`], [`Pose`]
//! - **Scene types**: [`PersonGroup`], [`Frame`]
//!
//! Coordinates live in two spaces: pixel space while contours are being
//! extracted from the heatmap, and unit space ([0,1] per axis, truncated to
//! four decimal digits) everywhere downstream. The types themselves do not
//! distinguish the two; the pipeline normalizes exactly once per frame.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, DecodeError};
use crate::MAX_KEYPOINTS;

// =============================================================================
// Grid Types
// =============================================================================

/// Row-major grid of confidence scores in [0, 1].
///
/// Lookups are bounds-checked: any coordinate outside the grid reads as an
/// empty cell (score 0.0), so boundary walking never needs a separate
/// out-of-range branch.
#[derive(Debug, Clone)]
pub struct Heatmap {
    scores: Array2<f32>,
}

impl Heatmap {
    /// Builds a heatmap from decoded message rows.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::RaggedHeatmap`] if the rows disagree on column
    /// count. An empty row list is valid and yields a 0x0 grid.
    pub fn from_rows(rows: &[Vec<f32>]) -> Result<Self, DecodeError> {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);

        let mut flat = Vec::with_capacity(width * height);
        for (row_idx, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(DecodeError::RaggedHeatmap {
                    row: row_idx,
                    expected: width,
                    actual: row.len(),
                });
            }
            flat.extend_from_slice(row);
        }

        let scores = Array2::from_shape_vec((height, width), flat)
            .expect("shape checked row by row above");
        Ok(Self { scores })
    }

    /// Grid width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.scores.ncols() as u32
    }

    /// Grid height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.scores.nrows() as u32
    }

    /// Confidence score at `(x, y)`, or 0.0 outside the grid.
    #[must_use]
    pub fn score(&self, x: i64, y: i64) -> f32 {
        if x < 0 || y < 0 {
            return 0.0;
        }
        self.scores
            .get((y as usize, x as usize))
            .copied()
            .unwrap_or(0.0)
    }

    /// `true` if the cell holds any body confidence at all.
    #[must_use]
    pub fn is_foreground(&self, x: i64, y: i64) -> bool {
        self.score(x, y) != 0.0
    }
}

// =============================================================================
// Geometry Types
// =============================================================================

/// A 2-D point, serialized on the wire as a `[x, y]` pair.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Vertex {
    /// Horizontal coordinate
    pub x: f64,
    /// Vertical coordinate
    pub y: f64,
}

impl Vertex {
    /// Creates a vertex.
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Component-wise difference `self - other`.
    #[must_use]
    pub fn delta(&self, other: &Self) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }

    /// Euclidean distance to another vertex.
    #[must_use]
    pub fn distance_to(&self, other: &Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

impl From<[f64; 2]> for Vertex {
    fn from([x, y]: [f64; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Vertex> for [f64; 2] {
    fn from(v: Vertex) -> Self {
        [v.x, v.y]
    }
}

/// An ordered closed polygon boundary; the edge from the last vertex back to
/// the first is implicit. Fewer than 3 vertices is geometrically degenerate
/// and contains no points.
pub type Contour = Vec<Vertex>;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Top-left corner
    pub min: Vertex,
    /// Bottom-right corner
    pub max: Vertex,
}

impl BoundingBox {
    /// Smallest box covering all vertices, or `None` for an empty set.
    #[must_use]
    pub fn around(vertices: &[Vertex]) -> Option<Self> {
        let first = vertices.first()?;
        let mut min = *first;
        let mut max = *first;
        for v in &vertices[1..] {
            min.x = min.x.min(v.x);
            min.y = min.y.min(v.y);
            max.x = max.x.max(v.x);
            max.y = max.y.max(v.y);
        }
        Some(Self { min, max })
    }

    /// Box width.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    /// Box height.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }
}

// =============================================================================
// Pose Types
// =============================================================================

/// Body keypoint kinds following COCO ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
#[repr(u8)]
pub enum KeypointKind {
    /// Nose
    Nose = 0,
    /// Left eye
    LeftEye = 1,
    /// Right eye
    RightEye = 2,
    /// Left ear
    LeftEar = 3,
    /// Right ear
    RightEar = 4,
    /// Left shoulder
    LeftShoulder = 5,
    /// Right shoulder
    RightShoulder = 6,
    /// Left elbow
    LeftElbow = 7,
    /// Right elbow
    RightElbow = 8,
    /// Left wrist
    LeftWrist = 9,
    /// Right wrist
    RightWrist = 10,
    /// Left hip
    LeftHip = 11,
    /// Right hip
    RightHip = 12,
    /// Left knee
    LeftKnee = 13,
    /// Right knee
    RightKnee = 14,
    /// Left ankle
    LeftAnkle = 15,
    /// Right ankle
    RightAnkle = 16,
}

impl KeypointKind {
    /// All keypoint kinds in wire order.
    #[must_use]
    pub fn all() -> &'static [Self; MAX_KEYPOINTS] {
        &[
            Self::Nose,
            Self::LeftEye,
            Self::RightEye,
            Self::LeftEar,
            Self::RightEar,
            Self::LeftShoulder,
            Self::RightShoulder,
            Self::LeftElbow,
            Self::RightElbow,
            Self::LeftWrist,
            Self::RightWrist,
            Self::LeftHip,
            Self::RightHip,
            Self::LeftKnee,
            Self::RightKnee,
            Self::LeftAnkle,
            Self::RightAnkle,
        ]
    }

    /// Keypoint name as a string.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Nose => "nose",
            Self::LeftEye => "left_eye",
            Self::RightEye => "right_eye",
            Self::LeftEar => "left_ear",
            Self::RightEar => "right_ear",
            Self::LeftShoulder => "left_shoulder",
            Self::RightShoulder => "right_shoulder",
            Self::LeftElbow => "left_elbow",
            Self::RightElbow => "right_elbow",
            Self::LeftWrist => "left_wrist",
            Self::RightWrist => "right_wrist",
            Self::LeftHip => "left_hip",
            Self::RightHip => "right_hip",
            Self::LeftKnee => "left_knee",
            Self::RightKnee => "right_knee",
            Self::LeftAnkle => "left_ankle",
            Self::RightAnkle => "right_ankle",
        }
    }
}

impl TryFrom<u8> for KeypointKind {
    type Error = CoreError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        KeypointKind::all()
            .get(value as usize)
            .copied()
            .ok_or_else(|| DecodeError::KeypointIndex { index: value }.into())
    }
}

impl From<KeypointKind> for u8 {
    fn from(kind: KeypointKind) -> Self {
        kind as u8
    }
}

/// A single body keypoint with position, score, and derived motion fields.
///
/// `dpos`, `dt`, and `mv` stay `None` until the tracker matches the keypoint
/// against a predecessor in an earlier frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    /// Body-part kind (wire index 0-16)
    #[serde(rename = "ki")]
    pub kind: KeypointKind,
    /// Position; unit space once normalized
    pub pos: Vertex,
    /// Detection confidence in [0, 1]
    pub score: f64,
    /// Unit-space displacement since the matched predecessor
    pub dpos: Option<Vertex>,
    /// Milliseconds elapsed since the matched predecessor's frame
    pub dt: Option<f64>,
    /// Movement magnitude in body-heights per second
    pub mv: Option<f64>,
}

impl Keypoint {
    /// Creates a keypoint without motion fields.
    #[must_use]
    pub fn new(kind: KeypointKind, pos: Vertex, score: f64) -> Self {
        Self {
            kind,
            pos,
            score,
            dpos: None,
            dt: None,
            mv: None,
        }
    }
}

/// One candidate skeleton: an ordered collection of keypoints.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    /// The detected keypoints
    pub keypoints: Vec<Keypoint>,
}

impl Pose {
    /// First keypoint of the given kind, if detected.
    #[must_use]
    pub fn keypoint(&self, kind: KeypointKind) -> Option<&Keypoint> {
        self.keypoints.iter().find(|kp| kp.kind == kind)
    }
}

// =============================================================================
// Scene Types
// =============================================================================

/// A fused person entity: one silhouette, its interior holes, the skeletons
/// attributed to it, and a persistent identity.
///
/// The identity persists across frames through the tracker; the group itself
/// is owned by the [`Frame`] that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonGroup {
    /// Persistent identity, unique within a frame, never reused
    pub id: u64,
    /// Outer silhouette contour
    pub contour: Contour,
    /// Interior gap contours
    pub holes: Vec<Contour>,
    /// Skeletons attributed to this silhouette
    pub poses: Vec<Pose>,
    /// Bounding box over the outer contour; internal, not part of the wire
    #[serde(skip)]
    pub bbox: BoundingBox,
}

/// One fully processed snapshot. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Capture timestamp, epoch milliseconds
    pub t: i64,
    /// Source heatmap width in pixels
    pub width: u32,
    /// Source heatmap height in pixels
    pub height: u32,
    /// Tracked person entities
    #[serde(rename = "personGroups")]
    pub person_groups: Vec<PersonGroup>,
}
