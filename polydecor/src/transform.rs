//! Point transforms between a caller's coordinate space and pixel space.
//!
//! The projection engine works on planar pixels. Paths usually live in some
//! other space (geographic lat/lng, SVG document units), so every projection
//! call goes through a [`PointTransform`] on the way in and on the way out.

use std::f64::consts::PI;

use crate::geometry::Point;

/// Forward and inverse mapping between caller coordinates and pixels.
///
/// Both directions must be deterministic for the lifetime of one
/// projection call. A host may swap the transform between calls (zoom, pan).
///
/// ## Rust Lesson #14: Associated Types
///
/// `type Coord` lets each transform pick its own coordinate type, and the
/// compiler checks that paths and transforms agree on it.
pub trait PointTransform {
    type Coord: Copy;

    /// Caller coordinate -> pixel.
    fn project(&self, coord: Self::Coord) -> Point;

    /// Pixel -> caller coordinate.
    fn unproject(&self, point: Point) -> Self::Coord;
}

/// Paths that are already in pixel space.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Identity;

impl PointTransform for Identity {
    type Coord = Point;

    #[inline]
    fn project(&self, coord: Point) -> Point {
        coord
    }

    #[inline]
    fn unproject(&self, point: Point) -> Point {
        point
    }
}

/// Uniform scale followed by a translation: `pixel = doc * scale + offset`.
///
/// This is what a zoomable/pannable canvas does with document coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub scale: f64,
    pub offset: Point,
}

impl Viewport {
    pub fn new(scale: f64, offset: Point) -> Self {
        Self { scale, offset }
    }

    /// Viewport that fits `content` (document units) into a `width` x
    /// `height` pixel canvas with `padding`, then applies `zoom` around the
    /// content center and shifts by `pan` (document units).
    pub fn fit(
        content: &crate::geometry::Bounds,
        width: f64,
        height: f64,
        padding: f64,
        zoom: f64,
        pan: Point,
    ) -> Self {
        let content_w = content.width().max(f64::EPSILON);
        let content_h = content.height().max(f64::EPSILON);
        let base_scale = ((width - padding * 2.0) / content_w).min((height - padding * 2.0) / content_h);
        let scale = base_scale * zoom;

        let center = content.center();
        let offset = Point::new(
            width / 2.0 - center.x * scale - pan.x * scale,
            height / 2.0 - center.y * scale - pan.y * scale,
        );
        Self { scale, offset }
    }
}

impl PointTransform for Viewport {
    type Coord = Point;

    #[inline]
    fn project(&self, coord: Point) -> Point {
        Point::new(
            coord.x * self.scale + self.offset.x,
            coord.y * self.scale + self.offset.y,
        )
    }

    #[inline]
    fn unproject(&self, point: Point) -> Point {
        Point::new(
            (point.x - self.offset.x) / self.scale,
            (point.y - self.offset.y) / self.scale,
        )
    }
}

/// A geographic coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    #[inline]
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Spherical Web Mercator (EPSG:3857) at a zoom level, in the pixel space
/// of a 256px tile pyramid: the whole world is `256 * 2^zoom` pixels wide.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WebMercator {
    pub zoom: f64,
}

impl WebMercator {
    /// Latitude beyond which the projection is clamped.
    pub const MAX_LATITUDE: f64 = 85.0511287798;
    pub const TILE_SIZE: f64 = 256.0;

    pub fn new(zoom: f64) -> Self {
        Self { zoom }
    }

    /// World size in pixels at this zoom.
    #[inline]
    pub fn world_size(&self) -> f64 {
        Self::TILE_SIZE * 2f64.powf(self.zoom)
    }
}

impl PointTransform for WebMercator {
    type Coord = LatLng;

    fn project(&self, coord: LatLng) -> Point {
        let size = self.world_size();
        let lat = coord.lat.clamp(-Self::MAX_LATITUDE, Self::MAX_LATITUDE) * PI / 180.0;
        let x = size * (coord.lng / 360.0 + 0.5);
        let y = size * (0.5 - (PI / 4.0 + lat / 2.0).tan().ln() / (2.0 * PI));
        Point::new(x, y)
    }

    fn unproject(&self, point: Point) -> LatLng {
        let size = self.world_size();
        let lng = (point.x / size - 0.5) * 360.0;
        let lat = (2.0 * ((0.5 - point.y / size) * 2.0 * PI).exp().atan() - PI / 2.0) * 180.0 / PI;
        LatLng::new(lat, lng)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Bounds;

    #[test]
    fn identity_round_trip() {
        let p = Point::new(3.5, -2.0);
        assert_eq!(Identity.unproject(Identity.project(p)), p);
    }

    #[test]
    fn viewport_round_trip() {
        let vp = Viewport::new(2.5, Point::new(10.0, -4.0));
        let p = Point::new(7.0, 3.0);
        let px = vp.project(p);
        assert_eq!(px, Point::new(27.5, 3.5));
        let back = vp.unproject(px);
        assert!((back.x - p.x).abs() < 1e-12 && (back.y - p.y).abs() < 1e-12);
    }

    #[test]
    fn viewport_fit_centers_content() {
        let content = Bounds::from_rect(0.0, 0.0, 100.0, 50.0);
        let vp = Viewport::fit(&content, 220.0, 220.0, 10.0, 1.0, Point::new(0.0, 0.0));
        assert!((vp.scale - 2.0).abs() < 1e-12);
        let c = vp.project(content.center());
        assert!((c.x - 110.0).abs() < 1e-9 && (c.y - 110.0).abs() < 1e-9);

        let zoomed = Viewport::fit(&content, 220.0, 220.0, 10.0, 2.0, Point::new(0.0, 0.0));
        assert!((zoomed.scale - 4.0).abs() < 1e-12);
    }

    #[test]
    fn mercator_origin_is_world_center() {
        let m = WebMercator::new(0.0);
        let p = m.project(LatLng::new(0.0, 0.0));
        assert!((p.x - 128.0).abs() < 1e-9);
        assert!((p.y - 128.0).abs() < 1e-9);
    }

    #[test]
    fn mercator_round_trip() {
        let m = WebMercator::new(5.0);
        let ll = LatLng::new(52.0, -11.0);
        let back = m.unproject(m.project(ll));
        assert!((back.lat - ll.lat).abs() < 1e-9, "lat {}", back.lat);
        assert!((back.lng - ll.lng).abs() < 1e-9, "lng {}", back.lng);
    }

    #[test]
    fn mercator_zoom_doubles_pixel_distances() {
        let a = LatLng::new(50.0, 10.0);
        let b = LatLng::new(51.0, 12.0);
        let d4 = WebMercator::new(4.0).project(a).distance(WebMercator::new(4.0).project(b));
        let d5 = WebMercator::new(5.0).project(a).distance(WebMercator::new(5.0).project(b));
        assert!((d5 / d4 - 2.0).abs() < 1e-9);
    }

    #[test]
    fn mercator_clamps_poles() {
        let m = WebMercator::new(0.0);
        let p = m.project(LatLng::new(90.0, 0.0));
        assert!(p.y.is_finite());
        assert!(p.y.abs() < 1e-6, "north edge should map to y=0, got {}", p.y);
    }
}
