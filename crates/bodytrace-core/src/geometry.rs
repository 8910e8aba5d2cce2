//! Geometric predicates shared across the pipeline.

use crate::types::{Contour, Vertex};

/// Number of decimal digits kept after normalization.
const PRECISION_DIGITS: f64 = 1e4;

/// Truncates (not rounds) a coordinate to four decimal digits.
#[must_use]
pub fn truncate4(value: f64) -> f64 {
    (value * PRECISION_DIGITS).trunc() / PRECISION_DIGITS
}

/// Ray-casting point-in-polygon test.
///
/// Casts a horizontal ray from `point` and counts edge crossings, including
/// the implicit closing edge. A polygon with fewer than 3 vertices contains
/// nothing. Points exactly on an edge may land on either side; the pipeline
/// tolerates that per the stated truncation tolerance.
#[must_use]
pub fn point_in_polygon(point: &Vertex, polygon: &Contour) -> bool {
    if polygon.len() < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = polygon.len() - 1;
    for i in 0..polygon.len() {
        let a = &polygon[i];
        let b = &polygon[j];
        if (a.y > point.y) != (b.y > point.y) {
            let x_cross = (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x;
            if point.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}
