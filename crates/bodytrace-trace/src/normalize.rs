//! Rescaling of pixel-space geometry into the unit coordinate system.
//!
//! Both operations divide x by the frame width and y by the frame height and
//! truncate the result to four decimal digits. They are one-shot by
//! contract: reapplying them would divide already-normalized coordinates a
//! second time, so the pipeline normalizes exactly once per frame.

use bodytrace_core::wire::RawPose;
use bodytrace_core::{truncate4, Contour, CoreResult, Keypoint, KeypointKind, Pose, Vertex};

/// Maps every contour vertex from pixel space into unit space.
#[must_use]
pub fn normalize_contours(contours: Vec<Contour>, width: u32, height: u32) -> Vec<Contour> {
    let w = f64::from(width);
    let h = f64::from(height);
    contours
        .into_iter()
        .map(|contour| {
            contour
                .into_iter()
                .map(|v| Vertex::new(truncate4(v.x / w), truncate4(v.y / h)))
                .collect()
        })
        .collect()
}

/// Maps a raw sensor pose into unit space, coercing textual scores to
/// truncated numeric values.
///
/// # Errors
///
/// Fails when a keypoint carries a body-part index outside 0-16.
pub fn normalize_pose(raw: &RawPose, width: u32, height: u32) -> CoreResult<Pose> {
    let w = f64::from(width);
    let h = f64::from(height);
    let keypoints = raw
        .keypoints
        .iter()
        .map(|kp| {
            let kind = KeypointKind::try_from(kp.ki)?;
            let pos = Vertex::new(truncate4(kp.pos[0] / w), truncate4(kp.pos[1] / h));
            Ok(Keypoint::new(kind, pos, truncate4(kp.score.as_f64())))
        })
        .collect::<CoreResult<Vec<_>>>()?;

    Ok(Pose { keypoints })
}

#[cfg(test)]
mod tests {
    use super::*;
    use bodytrace_core::wire::{RawKeypoint, ScoreValue};

    #[test]
    fn contours_land_in_unit_space() {
        let contours = vec![vec![
            Vertex::new(0.0, 0.0),
            Vertex::new(640.0, 0.0),
            Vertex::new(640.0, 480.0),
        ]];
        let normalized = normalize_contours(contours, 640, 480);
        assert_eq!(
            normalized[0].as_slice(),
            &[
                Vertex::new(0.0, 0.0),
                Vertex::new(1.0, 0.0),
                Vertex::new(1.0, 1.0),
            ]
        );
    }

    #[test]
    fn denormalizing_recovers_pixels_within_tolerance() {
        let (width, height) = (768u32, 576u32);
        let original = vec![vec![
            Vertex::new(123.0, 45.0),
            Vertex::new(700.25, 500.5),
            Vertex::new(1.0, 575.0),
        ]];
        let normalized = normalize_contours(original.clone(), width, height);

        for (orig, norm) in original[0].iter().zip(&normalized[0]) {
            let x = norm.x * f64::from(width);
            let y = norm.y * f64::from(height);
            // Truncation to 1e-4 in unit space costs < 1e-4 * dimension in px.
            assert!((x - orig.x).abs() <= 1e-4 * f64::from(width));
            assert!((y - orig.y).abs() <= 1e-4 * f64::from(height));
            assert!(norm.x >= 0.0 && norm.x <= 1.0);
            assert!(norm.y >= 0.0 && norm.y <= 1.0);
        }
    }

    #[test]
    fn textual_scores_match_numeric_ones() {
        let raw = RawPose {
            keypoints: vec![
                RawKeypoint {
                    ki: 0,
                    pos: [320.0, 240.0],
                    score: ScoreValue::Number(0.87),
                },
                RawKeypoint {
                    ki: 1,
                    pos: [320.0, 240.0],
                    score: ScoreValue::Text("0.87".into()),
                },
            ],
        };
        let pose = normalize_pose(&raw, 640, 480).unwrap();
        assert_eq!(pose.keypoints[0].score, pose.keypoints[1].score);
        assert_eq!(pose.keypoints[0].pos, Vertex::new(0.5, 0.5));
    }

    #[test]
    fn out_of_range_keypoint_index_is_rejected() {
        let raw = RawPose {
            keypoints: vec![RawKeypoint {
                ki: 17,
                pos: [0.0, 0.0],
                score: ScoreValue::Number(1.0),
            }],
        };
        assert!(normalize_pose(&raw, 640, 480).is_err());
    }
}
