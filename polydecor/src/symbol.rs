//! Symbol builders.
//!
//! A symbol turns one pixel-space direction point into concrete geometry:
//! a dash across the path, an arrow head, or a marker. Builders never see
//! the whole path, only the placement, its index and the symbol count.

use std::f64::consts::PI;

use crate::error::ColorError;
use crate::geometry::Point;
use crate::project::DirectionPoint;

const DEG_TO_RAD: f64 = PI / 180.0;

/// An RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` or the short `#rgb` form (the `#` is optional).
    pub fn from_hex(hex: &str) -> Result<Self, ColorError> {
        let digits = hex.trim().trim_start_matches('#');
        let expanded: String = match digits.len() {
            3 => digits.chars().flat_map(|c| [c, c]).collect(),
            6 => digits.to_string(),
            _ => return Err(ColorError(hex.to_string())),
        };

        let channel = |i: usize| {
            expanded
                .get(i..i + 2)
                .and_then(|s| u8::from_str_radix(s, 16).ok())
                .ok_or_else(|| ColorError(hex.to_string()))
        };
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Linear blend: `t = 0` is `self`, `t = 1` is `other`.
    pub fn lerp(&self, other: Rgb, t: f64) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).trunc() as u8;
        Rgb::new(mix(self.r, other.r), mix(self.g, other.g), mix(self.b, other.b))
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Symbol kinds and their options.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Symbol {
    /// A dash across the placement, `pixel_size` long, aligned with the path.
    /// A size of 1 or less draws a dot.
    Dash { pixel_size: f64 },
    /// Two strokes meeting at the placement, opening backwards along the
    /// path. `head_angle` is the full opening angle in degrees.
    ArrowHead {
        pixel_size: f64,
        head_angle: f64,
        polygon: bool,
    },
    /// A point marker, optionally rotated to the path heading.
    Marker { rotate: bool },
    /// A dash whose color moves from `start` to `end` along the path.
    GradientDash { pixel_size: f64, start: Rgb, end: Rgb },
}

/// Geometry produced by a symbol, in pixels.
#[derive(Debug, Clone, PartialEq)]
pub enum SymbolShape {
    Polyline { points: Vec<Point>, color: Option<Rgb> },
    Polygon { points: Vec<Point> },
    Marker { at: Point, rotation: Option<f64> },
}

impl Symbol {
    pub fn dash(pixel_size: f64) -> Self {
        Symbol::Dash { pixel_size }
    }

    pub fn arrow_head(pixel_size: f64) -> Self {
        Symbol::ArrowHead { pixel_size, head_angle: 60.0, polygon: true }
    }

    pub fn marker() -> Self {
        Symbol::Marker { rotate: false }
    }

    /// Name used by recipes and the CLI.
    pub fn kind(&self) -> &'static str {
        match self {
            Symbol::Dash { .. } => "dash",
            Symbol::ArrowHead { .. } => "arrow_head",
            Symbol::Marker { .. } => "marker",
            Symbol::GradientDash { .. } => "gradient_dash",
        }
    }

    /// All symbol kinds with a short description.
    pub fn kinds() -> &'static [(&'static str, &'static str)] {
        &[
            ("dash", "Dash across the path (dot when pixel_size <= 1)"),
            ("arrow_head", "Arrow head pointing along the path"),
            ("marker", "Point marker, optionally rotated to the heading"),
            ("gradient_dash", "Dash colored along a start/end gradient"),
        ]
    }

    /// True if the symbol's geometry is sized in pixels, so it must be
    /// rebuilt whenever the zoom changes.
    pub fn is_zoom_dependent(&self) -> bool {
        !matches!(self, Symbol::Marker { .. })
    }

    /// Build the geometry for the `index`-th of `total` placements.
    pub fn build(&self, dir: &DirectionPoint, index: usize, total: usize) -> SymbolShape {
        match *self {
            Symbol::Dash { pixel_size } => SymbolShape::Polyline {
                points: dash_points(dir, pixel_size),
                color: None,
            },
            Symbol::GradientDash { pixel_size, start, end } => {
                let t = (index + 1) as f64 / total.max(1) as f64;
                SymbolShape::Polyline {
                    points: dash_points(dir, pixel_size),
                    color: Some(start.lerp(end, t)),
                }
            }
            Symbol::ArrowHead { pixel_size, head_angle, polygon } => {
                let points = arrow_head_points(dir, pixel_size, head_angle);
                if polygon {
                    SymbolShape::Polygon { points }
                } else {
                    SymbolShape::Polyline { points, color: None }
                }
            }
            Symbol::Marker { rotate } => SymbolShape::Marker {
                at: dir.point,
                rotation: rotate.then_some(dir.heading),
            },
        }
    }
}

/// Path direction in radians, counterclockwise from +x with y pointing up.
#[inline]
fn direction_radians(heading: f64) -> f64 {
    -(heading - 90.0) * DEG_TO_RAD
}

fn dash_points(dir: &DirectionPoint, pixel_size: f64) -> Vec<Point> {
    let mid = dir.point;
    if pixel_size <= 1.0 {
        return vec![mid, mid];
    }

    let angle = direction_radians(dir.heading);
    let a = Point::new(
        mid.x + pixel_size * (angle + PI).cos() / 2.0,
        mid.y + pixel_size * angle.sin() / 2.0,
    );
    // Second end by central symmetry.
    vec![a, a.mirror(mid)]
}

fn arrow_head_points(dir: &DirectionPoint, pixel_size: f64, head_angle: f64) -> Vec<Point> {
    let tip = dir.point;
    let direction = direction_radians(dir.heading);
    let half_angle = head_angle / 2.0 * DEG_TO_RAD;

    let side = |angle: f64| {
        Point::new(
            tip.x - pixel_size * angle.cos(),
            tip.y + pixel_size * angle.sin(),
        )
    };
    vec![side(direction + half_angle), tip, side(direction - half_angle)]
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Point, b: Point) -> bool {
        (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9
    }

    fn polyline(shape: SymbolShape) -> Vec<Point> {
        match shape {
            SymbolShape::Polyline { points, .. } | SymbolShape::Polygon { points } => points,
            SymbolShape::Marker { .. } => panic!("expected line geometry"),
        }
    }

    #[test]
    fn dash_on_horizontal_path() {
        let dir = DirectionPoint::new(Point::new(50.0, 10.0), 90.0);
        let points = polyline(Symbol::dash(10.0).build(&dir, 0, 1));
        assert!(close(points[0], Point::new(45.0, 10.0)), "{:?}", points);
        assert!(close(points[1], Point::new(55.0, 10.0)), "{:?}", points);
    }

    #[test]
    fn dash_on_vertical_path() {
        let dir = DirectionPoint::new(Point::new(0.0, 0.0), 180.0);
        let points = polyline(Symbol::dash(4.0).build(&dir, 0, 1));
        assert!(close(points[0], Point::new(0.0, -2.0)), "{:?}", points);
        assert!(close(points[1], Point::new(0.0, 2.0)), "{:?}", points);
    }

    #[test]
    fn small_dash_is_a_dot() {
        let dir = DirectionPoint::new(Point::new(3.0, 4.0), 33.0);
        let points = polyline(Symbol::dash(0.0).build(&dir, 0, 1));
        assert_eq!(points, vec![Point::new(3.0, 4.0); 2]);
    }

    #[test]
    fn arrow_head_opens_backwards() {
        let dir = DirectionPoint::new(Point::new(100.0, 0.0), 90.0);
        let shape = Symbol::arrow_head(10.0).build(&dir, 0, 1);
        assert!(matches!(shape, SymbolShape::Polygon { .. }));

        let points = polyline(shape);
        assert_eq!(points.len(), 3);
        assert_eq!(points[1], Point::new(100.0, 0.0));
        // Both wings behind the tip, mirrored across the path.
        assert!(points[0].x < 100.0 && points[2].x < 100.0);
        assert!((points[0].y + points[2].y).abs() < 1e-9);
        assert!((points[0].distance(points[1]) - 10.0).abs() < 1e-9);
        // 60 degree opening: wings are 10 apart.
        assert!((points[0].distance(points[2]) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn open_arrow_head_is_a_polyline() {
        let sym = Symbol::ArrowHead { pixel_size: 8.0, head_angle: 90.0, polygon: false };
        let dir = DirectionPoint::new(Point::new(0.0, 0.0), 180.0);
        match sym.build(&dir, 0, 1) {
            SymbolShape::Polyline { points, color } => {
                assert!(color.is_none());
                // Going down the screen, wings are above the tip.
                assert!(points[0].y < 0.0 && points[2].y < 0.0);
            }
            other => panic!("unexpected shape {:?}", other),
        }
    }

    #[test]
    fn marker_rotation() {
        let dir = DirectionPoint::new(Point::new(1.0, 2.0), 45.0);
        assert_eq!(
            Symbol::marker().build(&dir, 0, 1),
            SymbolShape::Marker { at: Point::new(1.0, 2.0), rotation: None }
        );
        assert_eq!(
            Symbol::Marker { rotate: true }.build(&dir, 0, 1),
            SymbolShape::Marker { at: Point::new(1.0, 2.0), rotation: Some(45.0) }
        );
        assert!(!Symbol::marker().is_zoom_dependent());
        assert!(Symbol::dash(1.0).is_zoom_dependent());
    }

    #[test]
    fn gradient_dash_colors() {
        let sym = Symbol::GradientDash {
            pixel_size: 6.0,
            start: Rgb::from_hex("#ff0000").unwrap(),
            end: Rgb::from_hex("#00ff00").unwrap(),
        };
        let dir = DirectionPoint::new(Point::new(0.0, 0.0), 90.0);
        let color_at = |i| match sym.build(&dir, i, 4) {
            SymbolShape::Polyline { color: Some(c), .. } => c,
            other => panic!("unexpected shape {:?}", other),
        };
        assert_eq!(color_at(1), Rgb::new(127, 127, 0));
        assert_eq!(color_at(3), Rgb::new(0, 255, 0));
    }

    #[test]
    fn hex_colors() {
        assert_eq!(Rgb::from_hex("#0f8"), Ok(Rgb::new(0, 255, 136)));
        assert_eq!(Rgb::from_hex("1a2B3c").unwrap().to_hex(), "#1a2b3c");
        assert!(Rgb::from_hex("#12345").is_err());
        assert!(Rgb::from_hex("#zzzzzz").is_err());
    }

    #[test]
    fn kinds_match_names() {
        let names: Vec<&str> = Symbol::kinds().iter().map(|(n, _)| *n).collect();
        assert!(names.contains(&Symbol::dash(1.0).kind()));
        assert!(names.contains(&Symbol::arrow_head(1.0).kind()));
        assert!(names.contains(&Symbol::marker().kind()));
    }
}
