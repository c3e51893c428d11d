//! Path segmentation.
//!
//! Turns a sequence of points into segments annotated with their cumulative
//! distance range along the path and their heading.

use std::f64::consts::PI;

use crate::geometry::Point;

/// One straight piece of a path.
///
/// `dist_a` and `dist_b` are distances from the start of the path to `a`
/// and `b`, so `dist_b - dist_a` is the segment length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub a: Point,
    pub b: Point,
    pub dist_a: f64,
    pub dist_b: f64,
    /// Degrees in `[0, 360)`, 0 pointing up (negative y) in screen space.
    pub heading: f64,
}

impl Segment {
    #[inline]
    pub fn length(&self) -> f64 {
        self.dist_b - self.dist_a
    }
}

/// Heading from `a` to `b`, in degrees.
///
/// This is the atan2 angle rotated by +90°, so a segment running to the
/// right has heading 90 and one running down the screen has heading 180.
#[inline]
pub fn segment_heading(a: Point, b: Point) -> f64 {
    ((b.y - a.y).atan2(b.x - a.x) * 180.0 / PI + 90.0 + 360.0) % 360.0
}

/// Total length of a point path.
pub fn path_length(points: &[Point]) -> f64 {
    points.windows(2).map(|w| w[0].distance(w[1])).sum()
}

/// Split a path into segments.
///
/// Consecutive duplicate points are skipped: they have no direction.
/// Returns an empty vec for paths with fewer than two distinct points.
///
/// ## Rust Lesson #9: Iterators vs Indexing
///
/// `windows(2)` yields overlapping pairs `[p0, p1], [p1, p2], ...`
/// without any index arithmetic.
pub fn to_segments(points: &[Point]) -> Vec<Segment> {
    let mut segments = Vec::with_capacity(points.len().saturating_sub(1));
    let mut dist_a = 0.0;

    for pair in points.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        if a == b {
            continue;
        }

        let dist_ab = a.distance(b);
        segments.push(Segment {
            a,
            b,
            dist_a,
            dist_b: dist_a + dist_ab,
            heading: segment_heading(a, b),
        });
        dist_a += dist_ab;
    }

    segments
}

// ============================================================================
// TESTS
// ============================================================================
