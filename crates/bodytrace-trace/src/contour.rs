//! Silhouette boundary extraction from a confidence grid.
//!
//! A pixel is *foreground* when its score is non-zero, and a *boundary pixel*
//! when at least one of its 4-connected neighbors is empty (zero score or
//! outside the grid). The walker traces the grid-corner vertices along the
//! border between boundary pixels and their empty neighbors, producing one
//! closed polygon per connected stretch of border.
//!
//! Each emitted corner is pushed toward the empty neighbor by
//! `0.5 * sqrt(1 - score)` pixels, so a fully confident pixel keeps its exact
//! grid corners while weaker pixels get a softened, slightly expanded edge.
//!
//! Walk order is deterministic: 4-neighbors are scanned N, E, S, W; when the
//! current pixel offers no further neighbor sharing the last emitted corner,
//! the 8-neighborhood is scanned N, NE, E, SE, S, SW, W, NW and the first
//! unfinished boundary pixel that can extend from that corner continues the
//! same open contour.
//!
//! Per-pixel bookkeeping (which empty neighbors a pixel has already
//! contributed) is a flat bitmask array parallel to the grid; all grid
//! lookups are bounds-checked with an empty-cell sentinel.

use bodytrace_core::{Contour, Heatmap, Vertex};

/// 4-connected neighbor offsets in scan order: N, E, S, W.
const NEIGHBORS_4: [(i64, i64); 4] = [(0, -1), (1, 0), (0, 1), (-1, 0)];

/// 8-connected neighbor offsets in scan order: N, NE, E, SE, S, SW, W, NW.
const NEIGHBORS_8: [(i64, i64); 8] = [
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
];

/// Corner pair (as offsets from the pixel origin) shared with each
/// 4-neighbor, ordered so that consuming the sides N, E, S, W in sequence
/// walks the pixel clockwise.
const SHARED_CORNERS: [[(i64, i64); 2]; 4] = [
    [(0, 0), (1, 0)], // N: top edge
    [(1, 0), (1, 1)], // E: right edge
    [(1, 1), (0, 1)], // S: bottom edge
    [(0, 1), (0, 0)], // W: left edge
];

/// Extracts all silhouette contours from a heatmap, in pixel space.
///
/// Returns an empty list for an all-zero or zero-size heatmap. An isolated
/// single foreground pixel yields a minimal 4-vertex contour.
#[must_use]
pub fn extract_contours(map: &Heatmap) -> Vec<Contour> {
    let mut walker = Walker::new(map);
    let mut contours = Vec::new();

    for y in 0..walker.height {
        for x in 0..walker.width {
            if walker.is_boundary(x, y) && walker.has_unconsumed_side(x, y) {
                let contour = walker.walk(x, y);
                if !contour.is_empty() {
                    contours.push(contour);
                }
            }
        }
    }

    contours
}

/// Boundary walker over one heatmap.
struct Walker<'a> {
    map: &'a Heatmap,
    width: i64,
    height: i64,
    /// Bitmask per pixel; bit `d` set once the empty neighbor in direction
    /// `d` has contributed its corners to a contour.
    consumed: Vec<u8>,
}

impl<'a> Walker<'a> {
    fn new(map: &'a Heatmap) -> Self {
        let width = i64::from(map.width());
        let height = i64::from(map.height());
        Self {
            map,
            width,
            height,
            consumed: vec![0; (width * height) as usize],
        }
    }

    fn index(&self, x: i64, y: i64) -> usize {
        (y * self.width + x) as usize
    }

    fn is_empty(&self, x: i64, y: i64) -> bool {
        !self.map.is_foreground(x, y)
    }

    fn is_boundary(&self, x: i64, y: i64) -> bool {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return false;
        }
        self.map.is_foreground(x, y)
            && NEIGHBORS_4
                .iter()
                .any(|(dx, dy)| self.is_empty(x + dx, y + dy))
    }

    fn is_consumed(&self, x: i64, y: i64, dir: usize) -> bool {
        self.consumed[self.index(x, y)] & (1 << dir) != 0
    }

    fn mark_consumed(&mut self, x: i64, y: i64, dir: usize) {
        let idx = self.index(x, y);
        self.consumed[idx] |= 1 << dir;
    }

    /// `true` while the pixel still has an empty neighbor it has not
    /// contributed to any contour. A boundary pixel with no such side left
    /// is finished.
    fn has_unconsumed_side(&self, x: i64, y: i64) -> bool {
        (0..4).any(|dir| {
            let (dx, dy) = NEIGHBORS_4[dir];
            self.is_empty(x + dx, y + dy) && !self.is_consumed(x, y, dir)
        })
    }

    /// Traces one contour starting from the given boundary pixel.
    fn walk(&mut self, start_x: i64, start_y: i64) -> Contour {
        let mut vertices: Contour = Vec::new();
        let mut first_corner: Option<(i64, i64)> = None;
        let mut last_corner: Option<(i64, i64)> = None;
        let (mut cx, mut cy) = (start_x, start_y);

        loop {
            if let Some(corner) =
                self.consume_side(cx, cy, last_corner, &mut first_corner, &mut vertices)
            {
                last_corner = Some(corner);
                continue;
            }

            // The current pixel has no further side sharing the cursor
            // corner; hand the open contour to an adjacent boundary pixel.
            let Some(corner) = last_corner else { break };
            match self.find_continuation(cx, cy, corner) {
                Some((nx, ny)) => {
                    cx = nx;
                    cy = ny;
                }
                None => break,
            }
        }

        // The walk closing back onto its starting corner re-emits it.
        if vertices.len() > 1 && first_corner == last_corner {
            vertices.pop();
        }

        compress_colinear(vertices)
    }

    /// Consumes the first unconsumed empty side of `(x, y)` whose corner
    /// pair contains the cursor corner, emitting the corner(s) not already
    /// at the cursor. Returns the new cursor corner, or `None` when no side
    /// qualifies.
    fn consume_side(
        &mut self,
        x: i64,
        y: i64,
        last: Option<(i64, i64)>,
        first: &mut Option<(i64, i64)>,
        out: &mut Contour,
    ) -> Option<(i64, i64)> {
        let score = f64::from(self.map.score(x, y));

        for dir in 0..4 {
            let (dx, dy) = NEIGHBORS_4[dir];
            if !self.is_empty(x + dx, y + dy) || self.is_consumed(x, y, dir) {
                continue;
            }

            let pair = SHARED_CORNERS[dir].map(|(ox, oy)| (x + ox, y + oy));
            if let Some(cursor) = last {
                if pair[0] != cursor && pair[1] != cursor {
                    continue;
                }
            }

            self.mark_consumed(x, y, dir);
            let mut cursor = last;
            for corner in pair {
                if last == Some(corner) {
                    continue;
                }
                out.push(softened_vertex(corner, (dx, dy), score));
                if first.is_none() {
                    *first = Some(corner);
                }
                cursor = Some(corner);
            }
            return cursor;
        }

        None
    }

    /// First unfinished boundary pixel in the 8-neighborhood of `(x, y)`
    /// that can extend the contour from the given corner.
    fn find_continuation(&self, x: i64, y: i64, corner: (i64, i64)) -> Option<(i64, i64)> {
        for (dx, dy) in NEIGHBORS_8 {
            let (nx, ny) = (x + dx, y + dy);
            if self.is_boundary(nx, ny) && self.can_extend_from(nx, ny, corner) {
                return Some((nx, ny));
            }
        }
        None
    }

    /// `true` if the pixel has an unconsumed empty side whose corner pair
    /// contains `corner`, guaranteeing the walk makes progress there.
    fn can_extend_from(&self, x: i64, y: i64, corner: (i64, i64)) -> bool {
        (0..4).any(|dir| {
            let (dx, dy) = NEIGHBORS_4[dir];
            if !self.is_empty(x + dx, y + dy) || self.is_consumed(x, y, dir) {
                return false;
            }
            let pair = SHARED_CORNERS[dir].map(|(ox, oy)| (x + ox, y + oy));
            pair[0] == corner || pair[1] == corner
        })
    }
}

/// Pushes a grid corner toward the empty neighbor by `0.5 * sqrt(1 - score)`
/// pixels: confidence-weighted softening of the boundary.
fn softened_vertex(corner: (i64, i64), toward: (i64, i64), score: f64) -> Vertex {
    let softness = 0.5 * (1.0 - score).max(0.0).sqrt();
    Vertex::new(
        corner.0 as f64 + toward.0 as f64 * softness,
        corner.1 as f64 + toward.1 as f64 * softness,
    )
}

/// Removes the middle vertex of every exactly colinear consecutive triple,
/// including the triples spanning the implicit closing edge.
fn compress_colinear(vertices: Contour) -> Contour {
    let mut out: Contour = Vec::with_capacity(vertices.len());
    for v in vertices {
        while out.len() >= 2 && colinear(&out[out.len() - 2], &out[out.len() - 1], &v) {
            out.pop();
        }
        out.push(v);
    }

    // Wrap-around: last vertex between its predecessor and the first, then
    // first vertex between the last and the second.
    while out.len() >= 3 && colinear(&out[out.len() - 2], &out[out.len() - 1], &out[0]) {
        out.pop();
    }
    while out.len() >= 3 && colinear(&out[out.len() - 1], &out[0], &out[1]) {
        out.remove(0);
    }

    out
}

/// Exact equal-slope test via the cross product.
fn colinear(a: &Vertex, b: &Vertex, c: &Vertex) -> bool {
    (b.y - a.y) * (c.x - b.x) == (c.y - b.y) * (b.x - a.x)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn heatmap(rows: &[Vec<f32>]) -> Heatmap {
        Heatmap::from_rows(rows).unwrap()
    }

    #[test]
    fn all_zero_heatmap_yields_nothing() {
        let map = heatmap(&vec![vec![0.0; 4]; 3]);
        assert!(extract_contours(&map).is_empty());
    }

    #[test]
    fn zero_size_heatmap_yields_nothing() {
        let map = heatmap(&[]);
        assert!(extract_contours(&map).is_empty());
    }

    #[test]
    fn full_three_by_three_is_one_rectangle() {
        let map = heatmap(&vec![vec![1.0; 3]; 3]);
        let contours = extract_contours(&map);
        assert_eq!(contours.len(), 1);

        let contour = &contours[0];
        assert_eq!(
            contour.as_slice(),
            &[
                Vertex::new(0.0, 0.0),
                Vertex::new(3.0, 0.0),
                Vertex::new(3.0, 3.0),
                Vertex::new(0.0, 3.0),
            ]
        );
    }

    #[test]
    fn isolated_pixel_is_minimal_quad() {
        let map = heatmap(&[
            vec![0.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![0.0, 0.0, 0.0],
        ]);
        let contours = extract_contours(&map);
        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0].len(), 4);
    }

    #[test]
    fn weak_pixel_edges_are_softened() {
        // sqrt(1 - 0.75) = 0.5, so every corner shifts 0.25px outward.
        let map = heatmap(&[vec![0.75]]);
        let contours = extract_contours(&map);
        assert_eq!(contours.len(), 1);
        assert_eq!(
            contours[0].as_slice(),
            &[
                Vertex::new(0.0, -0.25),
                Vertex::new(1.0, -0.25),
                Vertex::new(1.25, 1.0),
                Vertex::new(0.0, 1.25),
            ]
        );
    }

    #[test]
    fn separate_regions_trace_separately() {
        let map = heatmap(&[
            vec![1.0, 0.0, 0.0, 1.0],
            vec![0.0, 0.0, 0.0, 0.0],
        ]);
        let contours = extract_contours(&map);
        assert_eq!(contours.len(), 2);
        assert_eq!(contours[0].len(), 4);
        assert_eq!(contours[1].len(), 4);
    }

    #[test]
    fn bar_compresses_to_quad() {
        let map = heatmap(&[vec![1.0; 5]]);
        let contours = extract_contours(&map);
        assert_eq!(contours.len(), 1);
        assert_eq!(
            contours[0].as_slice(),
            &[
                Vertex::new(0.0, 0.0),
                Vertex::new(5.0, 0.0),
                Vertex::new(5.0, 1.0),
                Vertex::new(0.0, 1.0),
            ]
        );
    }

    #[test]
    fn every_border_side_is_traced_once() {
        // A 2x2 block: 8 border sides, one closed quad after compression.
        let map = heatmap(&[
            vec![0.0, 0.0, 0.0, 0.0],
            vec![0.0, 1.0, 1.0, 0.0],
            vec![0.0, 1.0, 1.0, 0.0],
            vec![0.0, 0.0, 0.0, 0.0],
        ]);
        let contours = extract_contours(&map);
        assert_eq!(contours.len(), 1);
        assert_eq!(
            contours[0].as_slice(),
            &[
                Vertex::new(1.0, 1.0),
                Vertex::new(3.0, 1.0),
                Vertex::new(3.0, 3.0),
                Vertex::new(1.0, 3.0),
            ]
        );
    }
}
