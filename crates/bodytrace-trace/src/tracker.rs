//! Cross-frame identity correlation and motion signals.
//!
//! The tracker owns the only state that persists between frames: a bounded
//! most-recent-first history of processed frames and a monotonically
//! increasing identity counter. One tracker instance corresponds to one
//! logical scene; independent scenes (and tests) construct their own.
//!
//! Matching is similarity-based with a body-height-relative gate: a current
//! keypoint matches the nearest prior keypoint of the same body part within
//! `0.1` body heights. The relative threshold keeps matching behavior
//! independent of how far the subject stands from the camera, and the
//! 3-frame lookback rides out transient keypoint dropout from the upstream
//! pose estimator without breaking identity continuity.

use std::collections::{HashSet, VecDeque};

use bodytrace_core::{Frame, Keypoint};

/// Configuration for [`FrameTracker`] behaviour.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Maximum retained history frames (default: 5)
    pub history_limit: usize,
    /// History frames examined when matching (default: 3)
    pub lookback: usize,
    /// Match gate as a fraction of body height (default: 0.1)
    pub match_distance_ratio: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            history_limit: 5,
            lookback: 3,
            match_distance_ratio: 0.1,
        }
    }
}

/// Per-scene tracking context: bounded frame history plus identity counter.
#[derive(Debug)]
pub struct FrameTracker {
    config: TrackerConfig,
    /// Most-recent-first processed frames.
    history: VecDeque<Frame>,
    /// Next identity candidate; only ever grows.
    next_id: u64,
}

impl FrameTracker {
    /// Creates a tracker with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(TrackerConfig::default())
    }

    /// Creates a tracker with the provided configuration.
    #[must_use]
    pub fn with_config(config: TrackerConfig) -> Self {
        Self {
            config,
            history: VecDeque::new(),
            next_id: 0,
        }
    }

    /// Clears history and restarts identity issue order.
    pub fn reset(&mut self) {
        self.history.clear();
        self.next_id = 0;
    }

    /// Number of retained history frames.
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Assigns identities and motion fields to the frame's person groups,
    /// then records the frame in history.
    ///
    /// Per group:
    /// 1. Matches each keypoint against candidates of the same body part in
    ///    the most recent `lookback` history frames, nearest first-found
    ///    candidate within the body-height gate; matched keypoints get their
    ///    `dpos`/`dt`/`mv` fields and are not rematched by older frames.
    /// 2. The prior group with the strictly greatest matched-keypoint count
    ///    carries its identity over (first-found wins ties); otherwise a
    ///    fresh identity is allocated.
    ///
    /// The frame is pushed to the front of history afterwards and history is
    /// truncated to the configured limit. Frames that fail earlier in the
    /// pipeline never reach this point, so history only ever holds fully
    /// processed frames.
    pub fn process(&mut self, frame: &mut Frame) {
        let w = f64::from(frame.width);
        let h = f64::from(frame.height);
        let mut used_ids: HashSet<u64> = HashSet::new();

        for group in &mut frame.person_groups {
            let body_height_px = group.bbox.height() * h;
            // (identity, matched keypoint count) of the best prior group
            let mut best: Option<(u64, usize)> = None;

            for prior_frame in self.history.iter().take(self.config.lookback) {
                let dt = (frame.t - prior_frame.t) as f64;

                for prior_group in &prior_frame.person_groups {
                    let mut matched = 0usize;

                    for pose in &mut group.poses {
                        for kp in &mut pose.keypoints {
                            if kp.dpos.is_some() {
                                continue;
                            }
                            if match_keypoint(
                                kp,
                                prior_group.poses.iter().flat_map(|p| &p.keypoints),
                                w,
                                h,
                                body_height_px,
                                self.config.match_distance_ratio,
                                dt,
                            ) {
                                matched += 1;
                            }
                        }
                    }

                    if matched > 0 && best.map_or(true, |(_, count)| matched > count) {
                        best = Some((prior_group.id, matched));
                    }
                }
            }

            group.id = match best {
                Some((id, _)) => id,
                None => self.fresh_id(&used_ids),
            };
            used_ids.insert(group.id);
        }

        self.history.push_front(frame.clone());
        self.history.truncate(self.config.history_limit);
    }

    /// Allocates the next identity at or above the counter that no group in
    /// the current frame holds, advancing the counter through each attempt.
    fn fresh_id(&mut self, used: &HashSet<u64>) -> u64 {
        loop {
            let candidate = self.next_id;
            self.next_id += 1;
            if !used.contains(&candidate) {
                return candidate;
            }
        }
    }
}

impl Default for FrameTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Matches one current keypoint against prior candidates of the same body
/// part. On a gate pass, fills the keypoint's motion fields and returns
/// `true`.
fn match_keypoint<'a>(
    kp: &mut Keypoint,
    candidates: impl Iterator<Item = &'a Keypoint>,
    w: f64,
    h: f64,
    body_height_px: f64,
    gate_ratio: f64,
    dt: f64,
) -> bool {
    let cur_x = kp.pos.x * w;
    let cur_y = kp.pos.y * h;

    // Nearest same-part candidate; ties keep the first encountered.
    let mut nearest: Option<(&Keypoint, f64)> = None;
    for candidate in candidates {
        if candidate.kind != kp.kind {
            continue;
        }
        let dx = cur_x - candidate.pos.x * w;
        let dy = cur_y - candidate.pos.y * h;
        let dist = (dx * dx + dy * dy).sqrt();
        if nearest.map_or(true, |(_, best)| dist < best) {
            nearest = Some((candidate, dist));
        }
    }

    let Some((prior, dist)) = nearest else {
        return false;
    };
    if body_height_px <= 0.0 || dist / body_height_px > gate_ratio {
        return false;
    }

    let dpos = kp.pos.delta(&prior.pos);
    let displacement_px = ((dpos.x * w).powi(2) + (dpos.y * h).powi(2)).sqrt();
    kp.dpos = Some(dpos);
    kp.dt = Some(dt);
    kp.mv = Some(if dt > 0.0 {
        displacement_px / dt / body_height_px * 1000.0
    } else {
        0.0
    });
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use bodytrace_core::{BoundingBox, KeypointKind, PersonGroup, Pose, Vertex};

    const WIDTH: u32 = 640;
    const HEIGHT: u32 = 480;

    /// A person group whose silhouette is 0.5 frame-heights tall (240 px)
    /// with a single nose keypoint.
    fn group_with_nose(x: f64, y: f64) -> PersonGroup {
        let contour = vec![
            Vertex::new(x - 0.1, y - 0.25),
            Vertex::new(x + 0.1, y - 0.25),
            Vertex::new(x + 0.1, y + 0.25),
            Vertex::new(x - 0.1, y + 0.25),
        ];
        let bbox = BoundingBox::around(&contour).unwrap();
        PersonGroup {
            id: 0,
            contour,
            holes: Vec::new(),
            poses: vec![Pose {
                keypoints: vec![Keypoint::new(KeypointKind::Nose, Vertex::new(x, y), 0.9)],
            }],
            bbox,
        }
    }

    fn frame(t: i64, groups: Vec<PersonGroup>) -> Frame {
        Frame {
            t,
            width: WIDTH,
            height: HEIGHT,
            person_groups: groups,
        }
    }

    #[test]
    fn small_motion_keeps_identity_and_reports_movement() {
        let mut tracker = FrameTracker::new();

        let mut first = frame(1_000, vec![group_with_nose(0.5, 0.5)]);
        tracker.process(&mut first);
        let id = first.person_groups[0].id;

        // 10 px to the right over 100 ms; body height is 240 px.
        let moved_x = 0.5 + 10.0 / f64::from(WIDTH);
        let mut second = frame(1_100, vec![group_with_nose(moved_x, 0.5)]);
        tracker.process(&mut second);

        let group = &second.person_groups[0];
        assert_eq!(group.id, id);

        let kp = &group.poses[0].keypoints[0];
        let expected_mv = 10.0 / 100.0 / 240.0 * 1000.0;
        assert_eq!(kp.dt, Some(100.0));
        assert!((kp.mv.unwrap() - expected_mv).abs() < 1e-9);
        let dpos = kp.dpos.unwrap();
        assert!((dpos.x - 10.0 / f64::from(WIDTH)).abs() < 1e-12);
        assert!(dpos.y.abs() < 1e-12);
    }

    #[test]
    fn large_motion_allocates_a_fresh_identity() {
        let mut tracker = FrameTracker::new();

        let mut first = frame(1_000, vec![group_with_nose(0.3, 0.5)]);
        tracker.process(&mut first);
        let first_id = first.person_groups[0].id;

        // 30 px exceeds the 24 px gate (0.1 * 240 px body height).
        let moved_x = 0.3 + 30.0 / f64::from(WIDTH);
        let mut second = frame(1_100, vec![group_with_nose(moved_x, 0.5)]);
        tracker.process(&mut second);

        let second_id = second.person_groups[0].id;
        assert_ne!(second_id, first_id);
        assert!(second_id > first_id);
        assert!(second.person_groups[0].poses[0].keypoints[0].dpos.is_none());
    }

    #[test]
    fn identities_within_a_frame_are_unique() {
        let mut tracker = FrameTracker::new();
        let mut frame = frame(
            1_000,
            vec![group_with_nose(0.2, 0.5), group_with_nose(0.8, 0.5)],
        );
        tracker.process(&mut frame);
        assert_ne!(frame.person_groups[0].id, frame.person_groups[1].id);
    }

    #[test]
    fn dropout_within_lookback_keeps_identity() {
        let mut tracker = FrameTracker::new();

        let mut seen = frame(1_000, vec![group_with_nose(0.5, 0.5)]);
        tracker.process(&mut seen);
        let id = seen.person_groups[0].id;

        // Two empty frames: detector dropout, person still present.
        tracker.process(&mut frame(1_100, Vec::new()));
        tracker.process(&mut frame(1_200, Vec::new()));

        let mut back = frame(1_300, vec![group_with_nose(0.5, 0.5)]);
        tracker.process(&mut back);
        assert_eq!(back.person_groups[0].id, id);
    }

    #[test]
    fn dropout_beyond_lookback_loses_identity() {
        let mut tracker = FrameTracker::new();

        let mut seen = frame(1_000, vec![group_with_nose(0.5, 0.5)]);
        tracker.process(&mut seen);
        let id = seen.person_groups[0].id;

        for i in 1..=3 {
            tracker.process(&mut frame(1_000 + i * 100, Vec::new()));
        }

        let mut back = frame(1_400, vec![group_with_nose(0.5, 0.5)]);
        tracker.process(&mut back);
        assert_ne!(back.person_groups[0].id, id);
    }

    #[test]
    fn history_never_exceeds_limit() {
        let mut tracker = FrameTracker::new();
        for i in 0..12 {
            tracker.process(&mut frame(1_000 + i * 50, Vec::new()));
        }
        assert_eq!(tracker.history_len(), 5);
    }

    #[test]
    fn fresh_identities_are_monotonic() {
        let mut tracker = FrameTracker::new();
        let mut issued = Vec::new();
        for i in 0..4 {
            // Each frame shows a person far from every previous position.
            let x = 0.1 + 0.2 * f64::from(i);
            let mut f = frame(1_000 + i64::from(i) * 2_000, vec![group_with_nose(x, 0.5)]);
            tracker.process(&mut f);
            issued.push(f.person_groups[0].id);
        }
        for pair in issued.windows(2) {
            assert!(pair[1] > pair[0]);
        }
    }

    #[test]
    fn reset_clears_history_and_identity_order() {
        let mut tracker = FrameTracker::new();
        let mut f = frame(1_000, vec![group_with_nose(0.5, 0.5)]);
        tracker.process(&mut f);
        assert_eq!(tracker.history_len(), 1);

        tracker.reset();
        assert_eq!(tracker.history_len(), 0);

        let mut again = frame(5_000, vec![group_with_nose(0.5, 0.5)]);
        tracker.process(&mut again);
        assert_eq!(again.person_groups[0].id, 0);
    }
}
