//! Viewport handling for decoration.
//!
//! Two ways to avoid emitting symbols nobody can see:
//! - **filter**: project the whole path, then drop direction points outside
//!   a padded viewport;
//! - **clip**: cut the path into the pieces that cross the viewport and
//!   project each piece separately, shifting the pattern phase so that
//!   symbols stay on the same grid as on the full path.
//!
//! All coordinates here are pixels.

use crate::geometry::{Bounds, Point};
use crate::log::debug;
use crate::project::{DirectionPoint, project_pattern_on_points};
use crate::ratio::{Pattern, PatternParameter, ProjectionRatios};
use crate::segment::path_length;

/// How a decorator treats the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ViewportMode {
    /// Ignore the viewport, decorate whole paths.
    #[default]
    Full,
    /// Decorate whole paths, keep points within the viewport grown by
    /// `padding` pixels.
    Filter { padding: f64 },
    /// Decorate only the visible pieces of each path.
    Clip,
}

/// A visible piece of a path.
#[derive(Debug, Clone, PartialEq)]
pub struct ClippedPath {
    pub points: Vec<Point>,
    /// Distance from the start of the source path to the first point.
    pub offset: f64,
}

// ============================================================================
// SEGMENT CLIPPING (Liang-Barsky)
// ============================================================================

/// Clip segment `a -> b` to `bounds`.
///
/// Returns the visible part, in the same direction as the input, or `None`
/// if the segment misses the bounds. Endpoints inside the bounds are
/// returned unchanged so that consecutive clipped segments still join
/// exactly.
pub fn clip_segment(a: Point, b: Point, bounds: &Bounds) -> Option<(Point, Point)> {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let mut t0: f64 = 0.0;
    let mut t1: f64 = 1.0;

    // (p, q) pairs for the left, right, top and bottom edges.
    let edges = [
        (-dx, a.x - bounds.min.x),
        (dx, bounds.max.x - a.x),
        (-dy, a.y - bounds.min.y),
        (dy, bounds.max.y - a.y),
    ];

    for (p, q) in edges {
        if p == 0.0 {
            // Parallel to this edge: either fully outside or irrelevant.
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }

    let start = if t0 == 0.0 { a } else { Point::new(a.x + t0 * dx, a.y + t0 * dy) };
    let end = if t1 == 1.0 { b } else { Point::new(a.x + t1 * dx, a.y + t1 * dy) };
    Some((start, end))
}

/// Cut a path into its visible pieces.
///
/// Each piece remembers how far along the source path it starts. A path
/// entirely inside the bounds comes back as a single piece at offset 0.
pub fn clip_path(path: &[Point], bounds: &Bounds) -> Vec<ClippedPath> {
    match Bounds::from_points(path) {
        None => return Vec::new(),
        Some(extent) if bounds.contains(&extent) => {
            return vec![ClippedPath { points: path.to_vec(), offset: 0.0 }];
        }
        Some(_) => {}
    }

    let mut pieces = Vec::new();
    let mut current: Option<ClippedPath> = None;
    let mut distance = 0.0;

    for pair in path.windows(2) {
        let (a, b) = (pair[0], pair[1]);

        if let Some((p1, p2)) = clip_segment(a, b, bounds) {
            let offset = distance + a.distance(p1);
            match current.as_mut() {
                Some(piece) if piece.points.last() == Some(&p1) => piece.points.push(p2),
                _ => {
                    if let Some(done) = current.take() {
                        pieces.push(done);
                    }
                    current = Some(ClippedPath { points: vec![p1, p2], offset });
                }
            }
        }

        distance += a.distance(b);
    }

    if let Some(done) = current {
        pieces.push(done);
    }
    pieces
}

// ============================================================================
// PATTERN PHASE ON CLIPPED PIECES
// ============================================================================

/// Distances (and repeat counts) this close are the same grid position.
const GRID_EPSILON: f64 = 1e-9;

fn to_pixels(param: PatternParameter, full_length: f64) -> f64 {
    match param {
        PatternParameter::Absolute(px) => px,
        PatternParameter::Relative(ratio) => ratio * full_length,
    }
}

/// Ratios (relative to the clipped piece) that reproduce, on the piece, the
/// symbols `pattern` would place on the full path.
///
/// Returns `None` when no symbol of the full path falls on the piece.
pub fn clipped_ratios(
    pattern: &Pattern,
    full_length: f64,
    piece: &ClippedPath,
) -> Option<ProjectionRatios> {
    let piece_length = path_length(&piece.points);
    if piece_length == 0.0 || full_length == 0.0 {
        return None;
    }

    let repeat_px = to_pixels(pattern.repeat, full_length);
    let offset_px = to_pixels(pattern.offset, full_length).max(0.0);
    let end_px = to_pixels(pattern.end_offset, full_length).max(0.0);
    let limit = full_length - end_px;

    let is_first_symbol = piece.offset <= offset_px;
    let local_offset = if is_first_symbol {
        offset_px - piece.offset
    } else if repeat_px > 0.0 {
        let behind = piece.offset - offset_px;
        // A viewport edge on a symbol must not push the phase a whole repeat.
        let steps = behind / repeat_px;
        let steps = if (steps - steps.round()).abs() < GRID_EPSILON {
            steps.round()
        } else {
            steps.ceil()
        };
        (steps * repeat_px - behind).max(0.0)
    } else {
        return None;
    };

    if local_offset > piece_length + GRID_EPSILON {
        return None;
    }
    // Only the very first symbol may sit past the end limit.
    if !is_first_symbol && piece.offset + local_offset >= limit - GRID_EPSILON {
        return None;
    }

    let local_end = (piece.offset + piece_length - limit).max(0.0);

    Some(ProjectionRatios {
        offset: local_offset / piece_length,
        end_offset: local_end / piece_length,
        repeat: repeat_px / piece_length,
    })
}

/// Project `pattern` only on the parts of `path` inside `viewport`.
pub fn project_pattern_clipped(
    path: &[Point],
    pattern: &Pattern,
    viewport: &Bounds,
) -> Vec<DirectionPoint> {
    let full_length = path_length(path);
    if full_length == 0.0 {
        return Vec::new();
    }

    let pieces = clip_path(path, viewport);
    debug!(pieces = pieces.len(), full_length, "clipped path to viewport");

    pieces
        .iter()
        .filter_map(|piece| {
            clipped_ratios(pattern, full_length, piece)
                .map(|ratios| project_pattern_on_points(&piece.points, &ratios))
        })
        .flatten()
        .collect()
}

/// Keep the direction points that lie within `viewport` grown by `padding`.
pub fn filter_by_bounds(
    points: &[DirectionPoint],
    viewport: &Bounds,
    padding: f64,
) -> Vec<DirectionPoint> {
    let padded = viewport.pad(padding);
    points
        .iter()
        .filter(|dp| padded.contains_point(dp.point))
        .copied()
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================
