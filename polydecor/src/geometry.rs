//! Core geometry types for polydecor.
//!
//! ## Rust Lesson #3: Structs & Derives
//!
//! In JS you'd write: `const point = { x: 1.0, y: 2.0 }`
//! In Rust, we define a `struct` with explicit types.
//!
//! The `#[derive(...)]` macro auto-generates common functionality:
//! - `Debug` = like console.log, lets you print with `{:?}`
//! - `Clone` = can duplicate the value (like spread: `{...obj}`)
//! - `Copy` = can copy implicitly (small stack values only)
//! - `PartialEq` = can compare with `==`

/// A 2D point in planar (pixel) space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// An axis-aligned rectangle, used for viewports and path extents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Point,
    pub max: Point,
}

impl Point {
    /// Create a new point.
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    ///
    /// `other: Point` takes the point by value, but Point is `Copy`,
    /// so the caller keeps its own copy.
    #[inline]
    pub fn distance(&self, other: Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Point reflected through `center` (central symmetry).
    #[inline]
    pub fn mirror(&self, center: Point) -> Point {
        Point::new(2.0 * center.x - self.x, 2.0 * center.y - self.y)
    }
}

impl Bounds {
    #[inline]
    pub fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    /// Build bounds from an origin and a size.
    pub fn from_rect(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(Point::new(x, y), Point::new(x + width, y + height))
    }

    /// Smallest bounds containing every point, or `None` for an empty slice.
    ///
    /// ## Rust Lesson #6: Option<T>
    ///
    /// Rust has no `null` or `undefined`. Instead, we use `Option<T>`:
    /// - `Some(value)` = we have a value
    /// - `None` = no value
    pub fn from_points(points: &[Point]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }

        let min_x = points.iter().map(|p| p.x).fold(f64::INFINITY, f64::min);
        let min_y = points.iter().map(|p| p.y).fold(f64::INFINITY, f64::min);
        let max_x = points.iter().map(|p| p.x).fold(f64::NEG_INFINITY, f64::max);
        let max_y = points.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);

        Some(Self::new(Point::new(min_x, min_y), Point::new(max_x, max_y)))
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    #[inline]
    pub fn center(&self) -> Point {
        Point::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
        )
    }

    /// Inclusive point containment.
    #[inline]
    pub fn contains_point(&self, p: Point) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// True if `other` lies entirely inside these bounds.
    #[inline]
    pub fn contains(&self, other: &Bounds) -> bool {
        self.contains_point(other.min) && self.contains_point(other.max)
    }

    /// Bounds grown by `padding` on every side.
    pub fn pad(&self, padding: f64) -> Bounds {
        Bounds::new(
            Point::new(self.min.x - padding, self.min.y - padding),
            Point::new(self.max.x + padding, self.max.y + padding),
        )
    }

    /// Union of two bounds.
    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds::new(
            Point::new(self.min.x.min(other.min.x), self.min.y.min(other.min.y)),
            Point::new(self.max.x.max(other.max.x), self.max.y.max(other.max.y)),
        )
    }
}

// ============================================================================
// TESTS
// ============================================================================
