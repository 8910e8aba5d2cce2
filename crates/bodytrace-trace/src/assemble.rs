//! Fusion of silhouette contours and skeletons into person groups.
//!
//! Attribution is greedy and order-dependent by design: poses are visited in
//! input order, contours in input order, and the priority keypoints in their
//! fixed order; the first containment hit claims the pose's outer contour.
//! No exhaustive best-overlap search is performed.
//!
//! Hole detection tests only a candidate's first vertex against the claimed
//! contours, a deliberate shortcut: a hole whose first vertex sits exactly
//! on a silhouette edge may be misclassified either way.

use bodytrace_core::{point_in_polygon, BoundingBox, Contour, KeypointKind, PersonGroup, Pose};

/// Keypoints consulted for pose-to-silhouette attribution, in consultation
/// order. Torso-adjacent parts are the ones most reliably inside their own
/// silhouette.
pub const PRIORITY_KEYPOINTS: [KeypointKind; 9] = [
    KeypointKind::Nose,
    KeypointKind::LeftEye,
    KeypointKind::RightEye,
    KeypointKind::LeftShoulder,
    KeypointKind::RightShoulder,
    KeypointKind::LeftKnee,
    KeypointKind::RightKnee,
    KeypointKind::LeftHip,
    KeypointKind::RightHip,
];

/// Fuses normalized contours and poses into person groups.
///
/// Groups come back in contour input order with identity 0; the tracker
/// assigns persistent identities afterwards. Contours claimed by no pose and
/// nested in no claimed silhouette are discarded as noise. A pose with no
/// keypoint inside any contour contributes nothing; that is a normal frame,
/// not an error.
#[must_use]
pub fn assemble_person_groups(contours: Vec<Contour>, poses: Vec<Pose>) -> Vec<PersonGroup> {
    let mut claims: Vec<Vec<usize>> = vec![Vec::new(); contours.len()];

    'poses: for (pose_idx, pose) in poses.iter().enumerate() {
        for (contour_idx, contour) in contours.iter().enumerate() {
            for kind in PRIORITY_KEYPOINTS {
                if let Some(kp) = pose.keypoint(kind) {
                    if point_in_polygon(&kp.pos, contour) {
                        claims[contour_idx].push(pose_idx);
                        continue 'poses;
                    }
                }
            }
        }
    }

    let mut pose_slots: Vec<Option<Pose>> = poses.into_iter().map(Some).collect();
    let mut groups: Vec<PersonGroup> = Vec::new();
    let mut unclaimed: Vec<Contour> = Vec::new();

    for (contour_idx, contour) in contours.into_iter().enumerate() {
        if claims[contour_idx].is_empty() {
            unclaimed.push(contour);
            continue;
        }
        let group_poses: Vec<Pose> = claims[contour_idx]
            .iter()
            .filter_map(|&pose_idx| pose_slots[pose_idx].take())
            .collect();
        let bbox = BoundingBox::around(&contour).unwrap_or_default();
        groups.push(PersonGroup {
            id: 0,
            contour,
            holes: Vec::new(),
            poses: group_poses,
            bbox,
        });
    }

    for candidate in unclaimed {
        let Some(first) = candidate.first().copied() else {
            continue;
        };
        if let Some(group) = groups
            .iter_mut()
            .find(|g| point_in_polygon(&first, &g.contour))
        {
            group.holes.push(candidate);
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use bodytrace_core::{Keypoint, Vertex};

    fn square(x0: f64, y0: f64, x1: f64, y1: f64) -> Contour {
        vec![
            Vertex::new(x0, y0),
            Vertex::new(x1, y0),
            Vertex::new(x1, y1),
            Vertex::new(x0, y1),
        ]
    }

    fn pose_with(kind: KeypointKind, x: f64, y: f64) -> Pose {
        Pose {
            keypoints: vec![Keypoint::new(kind, Vertex::new(x, y), 0.9)],
        }
    }

    #[test]
    fn nose_inside_unit_square_forms_one_group() {
        let groups = assemble_person_groups(
            vec![square(0.0, 0.0, 1.0, 1.0)],
            vec![pose_with(KeypointKind::Nose, 0.5, 0.5)],
        );
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].poses.len(), 1);
        assert_eq!(groups[0].bbox.min, Vertex::new(0.0, 0.0));
        assert_eq!(groups[0].bbox.max, Vertex::new(1.0, 1.0));
        assert!(groups[0].holes.is_empty());
    }

    #[test]
    fn uncontained_pose_contributes_nothing() {
        let groups = assemble_person_groups(
            vec![square(0.0, 0.0, 0.4, 0.4)],
            vec![pose_with(KeypointKind::Nose, 0.9, 0.9)],
        );
        assert!(groups.is_empty());
    }

    #[test]
    fn poses_sharing_a_silhouette_merge() {
        let groups = assemble_person_groups(
            vec![square(0.0, 0.0, 1.0, 1.0)],
            vec![
                pose_with(KeypointKind::Nose, 0.25, 0.25),
                pose_with(KeypointKind::Nose, 0.75, 0.75),
            ],
        );
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].poses.len(), 2);
    }

    #[test]
    fn first_containing_contour_wins() {
        // Both contours contain the nose; input order decides.
        let groups = assemble_person_groups(
            vec![square(0.0, 0.0, 1.0, 1.0), square(0.2, 0.2, 0.8, 0.8)],
            vec![pose_with(KeypointKind::Nose, 0.5, 0.5)],
        );
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].contour, square(0.0, 0.0, 1.0, 1.0));
        // The inner square was claimed by no pose and becomes a hole.
        assert_eq!(groups[0].holes.len(), 1);
    }

    #[test]
    fn non_priority_keypoints_never_claim() {
        // An ankle is not in the priority set; this pose claims nothing.
        let groups = assemble_person_groups(
            vec![square(0.0, 0.0, 1.0, 1.0)],
            vec![pose_with(KeypointKind::LeftAnkle, 0.5, 0.5)],
        );
        assert!(groups.is_empty());
    }

    #[test]
    fn stray_contour_is_discarded() {
        // Claimed silhouette on the left, an unclaimed far-away contour on
        // the right: the stray appears in neither groups nor holes.
        let groups = assemble_person_groups(
            vec![square(0.0, 0.0, 0.4, 0.4), square(0.6, 0.6, 0.9, 0.9)],
            vec![pose_with(KeypointKind::Nose, 0.2, 0.2)],
        );
        assert_eq!(groups.len(), 1);
        assert!(groups[0].holes.is_empty());
    }

    #[test]
    fn nested_unclaimed_contour_becomes_hole() {
        let groups = assemble_person_groups(
            vec![square(0.0, 0.0, 1.0, 1.0), square(0.3, 0.3, 0.6, 0.6)],
            vec![pose_with(KeypointKind::LeftHip, 0.1, 0.1)],
        );
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].holes.len(), 1);
        assert_eq!(groups[0].holes[0], square(0.3, 0.3, 0.6, 0.6));
    }
}
