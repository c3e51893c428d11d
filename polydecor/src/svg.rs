//! SVG parsing - extract decoratable paths from SVG files.
//!
//! Uses usvg for complete SVG resolution (CSS, transforms, shapes to paths)
//! then walks the tree and turns every subpath into a polyline.
//!
//! ## Curve Flattening
//!
//! SVG paths contain Bézier curves (cubic and quadratic). Symbols are placed
//! along straight segments, so curves are flattened with lyon_geom at a
//! fixed tolerance.

use lyon_geom::{CubicBezierSegment, QuadraticBezierSegment, point};
use usvg::tiny_skia_path::PathSegment;

use crate::error::SvgError;
use crate::geometry::Point;

/// One polyline extracted from an SVG subpath.
#[derive(Debug, Clone, PartialEq)]
pub struct SvgPath {
    /// Vertices in document units. Closed rings repeat their first point.
    pub points: Vec<Point>,
    /// True if the subpath ended with a close command.
    pub closed: bool,
    /// `id` of the source element, if any.
    pub id: Option<String>,
}

/// Tolerance for curve flattening, in document units.
const CURVE_TOLERANCE: f32 = 0.1;

/// Extract all paths from an SVG document.
///
/// ## Rust Lesson #21: The ? Operator
///
/// `expression?` is sugar for:
/// ```text
/// match expression {
///     Ok(v) => v,
///     Err(e) => return Err(e.into()),
/// }
/// ```
pub fn extract_paths_from_svg(svg_content: &str) -> Result<Vec<SvgPath>, SvgError> {
    let options = usvg::Options::default();
    let tree = usvg::Tree::from_str(svg_content, &options)
        .map_err(|e| SvgError::ParseError(e.to_string()))?;

    let mut paths = Vec::new();
    extract_from_group(tree.root(), &mut paths);

    if paths.is_empty() {
        Err(SvgError::NoPaths)
    } else {
        Ok(paths)
    }
}

fn extract_from_group(group: &usvg::Group, paths: &mut Vec<SvgPath>) {
    for child in group.children() {
        match child {
            usvg::Node::Group(group) => extract_from_group(group, paths),
            usvg::Node::Path(path) => paths.extend(subpaths(path)),
            // Text is converted to paths by usvg only with fonts loaded;
            // images carry no geometry.
            _ => {}
        }
    }
}

/// Split a usvg path into one [`SvgPath`] per subpath, in absolute
/// document coordinates.
fn subpaths(path: &usvg::Path) -> Vec<SvgPath> {
    let id = (!path.id().is_empty()).then(|| path.id().to_string());
    let data = path
        .data()
        .clone()
        .transform(path.abs_transform())
        .unwrap_or_else(|| path.data().clone());

    let mut result = Vec::new();
    let mut points: Vec<Point> = Vec::new();
    let mut last: Option<(f32, f32)> = None;

    let mut finish = |points: &mut Vec<Point>, closed: bool| {
        if let Some(path) = finish_subpath(std::mem::take(points), closed, id.clone()) {
            result.push(path);
        }
    };

    for segment in data.segments() {
        match segment {
            PathSegment::MoveTo(p) => {
                finish(&mut points, false);
                points.push(Point::new(p.x as f64, p.y as f64));
                last = Some((p.x, p.y));
            }
            PathSegment::LineTo(p) => {
                points.push(Point::new(p.x as f64, p.y as f64));
                last = Some((p.x, p.y));
            }
            PathSegment::QuadTo(ctrl, p) => {
                if let Some((lx, ly)) = last {
                    let curve = QuadraticBezierSegment {
                        from: point(lx, ly),
                        ctrl: point(ctrl.x, ctrl.y),
                        to: point(p.x, p.y),
                    };
                    curve.for_each_flattened(CURVE_TOLERANCE, &mut |line| {
                        points.push(Point::new(line.to.x as f64, line.to.y as f64));
                    });
                } else {
                    points.push(Point::new(p.x as f64, p.y as f64));
                }
                last = Some((p.x, p.y));
            }
            PathSegment::CubicTo(ctrl1, ctrl2, p) => {
                if let Some((lx, ly)) = last {
                    let curve = CubicBezierSegment {
                        from: point(lx, ly),
                        ctrl1: point(ctrl1.x, ctrl1.y),
                        ctrl2: point(ctrl2.x, ctrl2.y),
                        to: point(p.x, p.y),
                    };
                    curve.for_each_flattened(CURVE_TOLERANCE, &mut |line| {
                        points.push(Point::new(line.to.x as f64, line.to.y as f64));
                    });
                } else {
                    points.push(Point::new(p.x as f64, p.y as f64));
                }
                last = Some((p.x, p.y));
            }
            PathSegment::Close => {
                // Drawing resumes from the subpath start after a close.
                let start = points.first().map(|p| (p.x as f32, p.y as f32));
                finish(&mut points, true);
                last = start;
                if let Some((x, y)) = start {
                    points.push(Point::new(x as f64, y as f64));
                }
            }
        }
    }
    finish(&mut points, false);

    result
}

fn finish_subpath(mut points: Vec<Point>, closed: bool, id: Option<String>) -> Option<SvgPath> {
    // Curve flattening can emit duplicate consecutive points.
    points.dedup_by(|a, b| (a.x - b.x).abs() < 1e-6 && (a.y - b.y).abs() < 1e-6);

    if let (true, Some(&first), Some(&last)) = (closed, points.first(), points.last()) {
        if first != last {
            points.push(first);
        }
    }

    (points.len() >= 2).then_some(SvgPath { points, closed, id })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_rect_as_closed_ring() {
        let svg = r#"
            <svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 100">
                <rect id="box" x="10" y="10" width="80" height="80"/>
            </svg>
        "#;

        let paths = extract_paths_from_svg(svg).unwrap();
        assert_eq!(paths.len(), 1);
        assert!(paths[0].closed);
        assert_eq!(paths[0].points.len(), 5);
        assert_eq!(paths[0].points.first(), paths[0].points.last());
        assert_eq!(paths[0].id.as_deref(), Some("box"));
    }

    #[test]
    fn parse_open_polyline() {
        let svg = r#"
            <svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 100">
                <polyline points="0,0 50,0 50,50" fill="none" stroke="black"/>
            </svg>
        "#;

        let paths = extract_paths_from_svg(svg).unwrap();
        assert_eq!(paths.len(), 1);
        assert!(!paths[0].closed);
        assert_eq!(
            paths[0].points,
            vec![Point::new(0.0, 0.0), Point::new(50.0, 0.0), Point::new(50.0, 50.0)]
        );
        assert_eq!(paths[0].id, None);
    }

    #[test]
    fn subpaths_are_split() {
        let svg = r#"
            <svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 100">
                <path d="M 0,0 L 10,0 M 20,20 L 30,20 L 30,30" fill="none" stroke="black"/>
            </svg>
        "#;

        let paths = extract_paths_from_svg(svg).unwrap();
        assert_eq!(paths.len(), 2);
        assert_eq!(paths[0].points.len(), 2);
        assert_eq!(paths[1].points.len(), 3);
    }

    #[test]
    fn group_transforms_are_applied() {
        let svg = r#"
            <svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 100">
                <g transform="translate(10 5)">
                    <line x1="0" y1="0" x2="20" y2="0" stroke="black"/>
                </g>
            </svg>
        "#;

        let paths = extract_paths_from_svg(svg).unwrap();
        assert_eq!(paths[0].points, vec![Point::new(10.0, 5.0), Point::new(30.0, 5.0)]);
    }

    #[test]
    fn no_paths_error() {
        let svg = r#"
            <svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 100">
            </svg>
        "#;

        assert!(matches!(extract_paths_from_svg(svg), Err(SvgError::NoPaths)));
    }

    #[test]
    fn invalid_document_error() {
        assert!(matches!(extract_paths_from_svg("not svg"), Err(SvgError::ParseError(_))));
    }

    #[test]
    fn curve_flattening_circle() {
        let svg = r#"
            <svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 100 100">
                <circle cx="50" cy="50" r="40"/>
            </svg>
        "#;

        let paths = extract_paths_from_svg(svg).unwrap();
        assert_eq!(paths.len(), 1);
        assert!(paths[0].closed);
        assert!(
            paths[0].points.len() > 20,
            "Circle should have many points from curve flattening, got {}",
            paths[0].points.len()
        );
    }
}
