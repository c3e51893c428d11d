//! Pattern projection: from a path and a pattern to direction points.
//!
//! This is the HOT PATH of decoration. A projection call:
//! 1. splits the path into segments,
//! 2. generates the offsets (in pixels from the path start) of each symbol,
//! 3. walks the segments once, interpolating a point and taking the
//!    segment heading for each offset.
//!
//! Everything here is a pure function of its inputs: calling it twice with
//! the same arguments yields bit-identical results.

use crate::geometry::Point;
use crate::log::{debug, warn};
use crate::ratio::{Pattern, ProjectionRatios};
use crate::segment::{Segment, to_segments};
use crate::transform::PointTransform;

/// A placement along a path: where a symbol goes and which way it faces.
///
/// `C` is the coordinate type: [`Point`] in pixel space, or whatever the
/// caller's transform unprojects to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionPoint<C = Point> {
    pub point: C,
    /// Degrees in `[0, 360)`, see [`crate::segment::segment_heading`].
    pub heading: f64,
}

impl<C> DirectionPoint<C> {
    pub fn new(point: C, heading: f64) -> Self {
        Self { point, heading }
    }

    /// Same heading, point mapped through `f`.
    pub fn map<D>(self, f: impl FnOnce(C) -> D) -> DirectionPoint<D> {
        DirectionPoint {
            point: f(self.point),
            heading: self.heading,
        }
    }
}

/// Most symbols placed on a single path.
pub const MAX_SYMBOLS_PER_PATH: usize = 1 << 20;

/// Offsets (pixels from the path start) at which symbols are placed.
///
/// The first offset is always emitted, even without a repeat interval.
/// Further offsets follow every `repeat` while they stay strictly before
/// `total_length - end_offset`, up to [`MAX_SYMBOLS_PER_PATH`].
pub fn pattern_offsets(total_length: f64, ratios: &ProjectionRatios) -> Vec<f64> {
    let repeat_px = total_length * ratios.repeat;
    let start_px = if ratios.offset > 0.0 { total_length * ratios.offset } else { 0.0 };
    let end_px = if ratios.end_offset > 0.0 { total_length * ratios.end_offset } else { 0.0 };
    let limit = total_length - end_px;

    let mut offsets = vec![start_px];
    let mut offset = start_px;
    loop {
        let next = offset + repeat_px;
        // A repeat too small to move the offset would loop forever.
        if !(repeat_px > 0.0 && next < limit) || next == offset {
            break;
        }
        if offsets.len() == MAX_SYMBOLS_PER_PATH {
            warn!(total_length, repeat_px, "symbol limit reached, truncating pattern");
            break;
        }
        offsets.push(next);
        offset = next;
    }
    offsets
}

/// Point at `ratio` of the way from `a` to `b`.
#[inline]
pub fn interpolate_between_points(a: Point, b: Point, ratio: f64) -> Point {
    if b.x != a.x {
        return Point::new(a.x + ratio * (b.x - a.x), a.y + ratio * (b.y - a.y));
    }
    // Same vertical axis.
    Point::new(a.x, a.y + (b.y - a.y) * ratio)
}

/// Direction point at `offset` pixels along an owning segment.
#[inline]
fn point_on_segment(segment: &Segment, offset: f64) -> DirectionPoint {
    let ratio = (offset - segment.dist_a) / (segment.dist_b - segment.dist_a);
    DirectionPoint::new(
        interpolate_between_points(segment.a, segment.b, ratio),
        segment.heading,
    )
}

/// Project a pattern, already normalized to ratios, onto a pixel path.
///
/// Returns an empty vec for paths with no length (empty, single point,
/// all points coincident).
pub fn project_pattern_on_points(points: &[Point], ratios: &ProjectionRatios) -> Vec<DirectionPoint> {
    let segments = to_segments(points);
    let (Some(first), Some(last)) = (segments.first(), segments.last()) else {
        return Vec::new();
    };

    let total_length = last.dist_b;
    if total_length == 0.0 {
        return Vec::new();
    }

    let offsets = pattern_offsets(total_length, ratios);
    debug!(
        segments = segments.len(),
        total_length,
        symbols = offsets.len(),
        "projecting pattern"
    );

    // ## Rust Lesson #11: Closures capturing mutable state
    //
    // `segment_index` only moves forward: offsets are non-decreasing, so the
    // owning segment of the next offset is never before the current one.
    let mut segment_index = 0;
    offsets
        .into_iter()
        .map(|offset| {
            if offset <= 0.0 {
                return DirectionPoint::new(first.a, first.heading);
            }
            if offset >= total_length {
                return DirectionPoint::new(last.b, last.heading);
            }

            while offset > segments[segment_index].dist_b && segment_index < segments.len() - 1 {
                segment_index += 1;
            }
            point_on_segment(&segments[segment_index], offset)
        })
        .collect()
}

/// Normalize `pattern` against the length of a pixel path and project it.
pub fn project_pattern(points: &[Point], pattern: &Pattern) -> Vec<DirectionPoint> {
    let total_length = crate::segment::path_length(points);
    if total_length == 0.0 {
        return Vec::new();
    }
    project_pattern_on_points(points, &pattern.ratios(total_length))
}

/// Project a pattern onto a path given in caller coordinates.
///
/// Coordinates go through `transform.project`, the pattern is normalized
/// against the resulting pixel length, and the placements come back through
/// `transform.unproject`.
pub fn project_pattern_on_path<T: PointTransform>(
    coords: &[T::Coord],
    pattern: &Pattern,
    transform: &T,
) -> Vec<DirectionPoint<T::Coord>> {
    let pixels: Vec<Point> = coords.iter().map(|&c| transform.project(c)).collect();
    project_pattern(&pixels, pattern)
        .into_iter()
        .map(|dp| dp.map(|p| transform.unproject(p)))
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ratio::PatternParameter;
    use crate::segment::path_length;
    use crate::transform::{LatLng, WebMercator};

    fn pts(coords: &[(f64, f64)]) -> Vec<Point> {
        coords.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    fn ratios(offset: f64, end_offset: f64, repeat: f64) -> ProjectionRatios {
        ProjectionRatios { offset, end_offset, repeat }
    }

    fn assert_close(a: Point, b: Point) {
        assert!(
            (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9,
            "expected {:?}, got {:?}",
            b,
            a
        );
    }

    /// Distance along `points` to the projection of `p`, assuming `p` lies on
    /// the path. Used to check ordering invariants.
    fn distance_along(points: &[Point], p: Point) -> f64 {
        let mut best = (f64::INFINITY, 0.0);
        for seg in to_segments(points) {
            let len = seg.length();
            let t = (((p.x - seg.a.x) * (seg.b.x - seg.a.x) + (p.y - seg.a.y) * (seg.b.y - seg.a.y))
                / (len * len))
                .clamp(0.0, 1.0);
            let q = interpolate_between_points(seg.a, seg.b, t);
            let d = q.distance(p);
            if d < best.0 - 1e-9 {
                best = (d, seg.dist_a + t * len);
            }
        }
        best.1
    }

    #[test]
    fn quarter_repeat_on_horizontal_line() {
        let path = pts(&[(0.0, 0.0), (100.0, 0.0)]);
        let result = project_pattern_on_points(&path, &ratios(0.0, 0.0, 0.25));

        assert_eq!(result.len(), 4);
        for (dp, x) in result.iter().zip([0.0, 25.0, 50.0, 75.0]) {
            assert_close(dp.point, Point::new(x, 0.0));
            assert!((dp.heading - 90.0).abs() < 1e-9);
        }
    }

    #[test]
    fn vertical_line_single_symbol() {
        let path = pts(&[(0.0, 0.0), (0.0, 100.0)]);
        let result = project_pattern_on_points(&path, &ratios(0.0, 0.0, 0.0));

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].point, Point::new(0.0, 0.0));
        assert!((result[0].heading - 180.0).abs() < 1e-9);
    }

    #[test]
    fn vertical_interpolation_stays_on_axis() {
        let path = pts(&[(3.0, 0.0), (3.0, 10.0)]);
        let result = project_pattern_on_points(&path, &ratios(0.3, 0.0, 0.0));
        assert_eq!(result[0].point.x, 3.0);
        assert!((result[0].point.y - 3.0).abs() < 1e-12);
    }

    #[test]
    fn no_repeat_means_one_point() {
        let path = pts(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)]);
        for offset in [0.0, 0.3, 0.9] {
            for end_offset in [0.0, 0.5, 2.0] {
                let result = project_pattern_on_points(&path, &ratios(offset, end_offset, 0.0));
                assert_eq!(result.len(), 1, "offset {} end {}", offset, end_offset);
            }
        }
    }

    #[test]
    fn tiny_repeat_is_capped() {
        let offsets = pattern_offsets(100.0, &ratios(0.0, 0.0, 1e-9));
        assert_eq!(offsets.len(), MAX_SYMBOLS_PER_PATH);
        assert!(offsets.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn end_offset_past_start_keeps_only_start() {
        let path = pts(&[(0.0, 0.0), (100.0, 0.0)]);
        let result = project_pattern_on_points(&path, &ratios(0.6, 0.5, 0.1));
        assert_eq!(result.len(), 1);
        assert_close(result[0].point, Point::new(60.0, 0.0));
    }

    #[test]
    fn end_offset_stops_repetition() {
        let path = pts(&[(0.0, 0.0), (100.0, 0.0)]);
        let result = project_pattern_on_points(&path, &ratios(0.0, 0.2, 0.25));
        // Limit is 80: 75 fits, 100 does not.
        let xs: Vec<f64> = result.iter().map(|dp| dp.point.x).collect();
        assert_eq!(xs, vec![0.0, 25.0, 50.0, 75.0]);

        let result = project_pattern_on_points(&path, &ratios(0.0, 0.3, 0.25));
        let xs: Vec<f64> = result.iter().map(|dp| dp.point.x).collect();
        assert_eq!(xs, vec![0.0, 25.0, 50.0]);
    }

    #[test]
    fn negative_offset_clamps_to_start() {
        let path = pts(&[(5.0, 5.0), (15.0, 5.0), (15.0, 15.0)]);
        let result = project_pattern_on_points(&path, &ratios(-0.5, 0.0, 0.0));
        assert_eq!(result[0].point, Point::new(5.0, 5.0));
        assert!((result[0].heading - 90.0).abs() < 1e-9);
    }

    #[test]
    fn offset_past_end_clamps_to_last_point() {
        let path = pts(&[(5.0, 5.0), (15.0, 5.0), (15.0, 15.0)]);
        for offset in [1.0, 1.5] {
            let result = project_pattern_on_points(&path, &ratios(offset, 0.0, 0.0));
            assert_eq!(result[0].point, Point::new(15.0, 15.0));
            assert!((result[0].heading - 180.0).abs() < 1e-9);
        }
    }

    #[test]
    fn boundary_offset_belongs_to_ending_segment() {
        // Corner at distance 10: heading of the first segment, not the second.
        let path = pts(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)]);
        let result = project_pattern_on_points(&path, &ratios(0.5, 0.0, 0.0));
        assert_close(result[0].point, Point::new(10.0, 0.0));
        assert!((result[0].heading - 90.0).abs() < 1e-9);
    }

    #[test]
    fn headings_follow_owning_segment() {
        let path = pts(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)]);
        let result = project_pattern_on_points(&path, &ratios(0.0, 0.0, 0.1));
        let headings: Vec<f64> = result.iter().map(|dp| dp.heading.round()).collect();
        assert_eq!(headings, vec![90.0, 90.0, 90.0, 90.0, 90.0, 90.0, 180.0, 180.0, 180.0, 180.0]);
    }

    #[test]
    fn distances_are_ordered_and_bounded() {
        let path = pts(&[(0.0, 0.0), (30.0, 40.0), (30.0, 0.0), (90.0, 10.0), (60.0, 60.0)]);
        let total = path_length(&path);
        let result = project_pattern_on_points(&path, &ratios(0.03, 0.05, 0.07));
        assert!(result.len() > 5);

        let mut previous = -1.0;
        for dp in &result {
            let d = distance_along(&path, dp.point);
            assert!(d >= previous - 1e-9, "distance went backwards: {} < {}", d, previous);
            assert!((0.0..=total + 1e-9).contains(&d));
            previous = d;
        }
    }

    #[test]
    fn duplicate_points_are_ignored() {
        let with_dup = pts(&[(0.0, 0.0), (0.0, 0.0), (10.0, 0.0)]);
        let without = pts(&[(0.0, 0.0), (10.0, 0.0)]);
        let r = ratios(0.1, 0.0, 0.2);
        assert_eq!(
            project_pattern_on_points(&with_dup, &r),
            project_pattern_on_points(&without, &r)
        );
    }

    #[test]
    fn degenerate_paths_give_nothing() {
        let r = ratios(0.0, 0.0, 0.1);
        assert!(project_pattern_on_points(&[], &r).is_empty());
        assert!(project_pattern_on_points(&pts(&[(1.0, 2.0)]), &r).is_empty());
        assert!(project_pattern_on_points(&pts(&[(1.0, 2.0), (1.0, 2.0)]), &r).is_empty());
        assert!(project_pattern(&pts(&[(1.0, 2.0), (1.0, 2.0)]), &Pattern::new(5.0, 0.0, 5.0)).is_empty());
    }

    #[test]
    fn percent_and_pixels_agree() {
        let path = pts(&[(0.0, 0.0), (40.0, 30.0), (40.0, 90.0), (-20.0, 90.0)]);
        let total = path_length(&path);

        let relative = Pattern::new("50%", 0.0, 0.0);
        let absolute = Pattern::new(total * 0.5, 0.0, 0.0);
        assert_eq!(project_pattern(&path, &relative), project_pattern(&path, &absolute));
    }

    #[test]
    fn projection_is_idempotent() {
        let path = pts(&[(0.0, 0.0), (13.0, 7.0), (21.0, -4.0), (40.0, 2.0)]);
        let pattern = Pattern::new(3.0, "10%", 4.5);
        assert_eq!(project_pattern(&path, &pattern), project_pattern(&path, &pattern));
    }

    #[test]
    fn offsets_do_while() {
        assert_eq!(pattern_offsets(100.0, &ratios(0.0, 0.0, 0.25)), vec![0.0, 25.0, 50.0, 75.0]);
        assert_eq!(pattern_offsets(100.0, &ratios(0.2, 0.0, 0.0)), vec![20.0]);
        assert_eq!(pattern_offsets(100.0, &ratios(0.0, 0.0, -0.1)), vec![0.0]);
        assert_eq!(pattern_offsets(100.0, &ratios(2.0, 0.0, 0.1)), vec![200.0]);
    }

    #[test]
    fn offsets_survive_vanishing_repeat() {
        let offsets = pattern_offsets(1e20, &ratios(0.5, 0.0, 1e-40));
        assert_eq!(offsets.len(), 1);
    }

    #[test]
    fn nan_ratios_place_a_single_symbol_at_start() {
        let offsets = pattern_offsets(100.0, &ratios(f64::NAN, f64::NAN, f64::NAN));
        assert_eq!(offsets, vec![0.0]);
    }

    #[test]
    fn path_in_geographic_coordinates() {
        let mercator = WebMercator::new(6.0);
        let path = [LatLng::new(57.0, -19.0), LatLng::new(60.0, -12.0)];
        let pattern = Pattern {
            offset: PatternParameter::Relative(0.0),
            end_offset: PatternParameter::Relative(0.0),
            repeat: PatternParameter::Relative(0.5),
        };

        let result = project_pattern_on_path(&path, &pattern, &mercator);
        assert_eq!(result.len(), 2);
        assert!((result[0].point.lat - 57.0).abs() < 1e-9);
        assert!((result[0].point.lng + 19.0).abs() < 1e-9);
        // Heading is north-east-ish in screen space.
        assert!(result[0].heading > 0.0 && result[0].heading < 90.0);
        assert_eq!(result[0].heading, result[1].heading);
    }

    #[test]
    fn pixel_patterns_depend_on_zoom() {
        let path = [LatLng::new(50.0, 0.0), LatLng::new(50.0, 10.0)];
        let pattern = Pattern::new(0.0, 0.0, 100.0);
        let low = project_pattern_on_path(&path, &pattern, &WebMercator::new(3.0));
        let high = project_pattern_on_path(&path, &pattern, &WebMercator::new(4.0));
        assert!(high.len() > low.len());
    }
}
