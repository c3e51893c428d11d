//! The decorator: paths + patterns + a direction point cache.
//!
//! A [`Decorator`] owns a set of paths (in caller coordinates) and a set of
//! pattern definitions. Drawing projects every pattern on every path through
//! the caller's transform, builds a symbol at each placement and hands it to
//! a render callback.
//!
//! Direction points are cached per `(pattern, zoom, path)`. Patterns given
//! entirely in relative units place symbols at the same coordinates at any
//! zoom, so they share a single cache entry across zoom levels. The cache is
//! dropped whenever paths or patterns change, or on [`Decorator::redraw`].

use std::collections::HashMap;

use crate::clip::{ViewportMode, filter_by_bounds, project_pattern_clipped};
use crate::geometry::{Bounds, Point};
use crate::log::{debug, warn};
use crate::project::{DirectionPoint, project_pattern_on_path};
use crate::ratio::Pattern;
use crate::symbol::{Symbol, SymbolShape};
use crate::transform::PointTransform;

/// A pattern and the symbol drawn at each of its placements.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatternDef {
    pub pattern: Pattern,
    pub symbol: Symbol,
}

impl PatternDef {
    pub fn new(pattern: Pattern, symbol: Symbol) -> Self {
        Self { pattern, symbol }
    }

    /// True if zooming changes either the placements or the symbol geometry.
    pub fn is_zoom_dependent(&self) -> bool {
        self.pattern.is_in_pixels() || self.symbol.is_zoom_dependent()
    }
}

/// Cache key for one pattern on one path at one zoom level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub pattern: usize,
    pub zoom: i32,
    pub path: usize,
}

/// A symbol ready to render, in pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedSymbol {
    pub pattern: usize,
    pub path: usize,
    pub index: usize,
    pub shape: SymbolShape,
}

/// Paths, patterns, and the cached projections between them.
#[derive(Debug, Clone)]
pub struct Decorator<C> {
    paths: Vec<Vec<C>>,
    patterns: Vec<PatternDef>,
    mode: ViewportMode,
    cache: HashMap<CacheKey, Vec<DirectionPoint<C>>>,
}

impl<C: Copy> Default for Decorator<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Copy> Decorator<C> {
    pub fn new() -> Self {
        Self {
            paths: Vec::new(),
            patterns: Vec::new(),
            mode: ViewportMode::Full,
            cache: HashMap::new(),
        }
    }

    /// Builder-style viewport mode.
    pub fn with_viewport_mode(mut self, mode: ViewportMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn viewport_mode(&self) -> ViewportMode {
        self.mode
    }

    pub fn set_viewport_mode(&mut self, mode: ViewportMode) {
        self.mode = mode;
    }

    /// Add an open path.
    pub fn add_polyline(&mut self, coords: Vec<C>) {
        self.paths.push(coords);
        self.cache.clear();
    }

    /// Add a polygon ring. The first vertex is repeated at the end so the
    /// closing edge gets decorated too; an already closed ring just gains a
    /// zero-length edge, which projection ignores.
    pub fn add_polygon(&mut self, mut ring: Vec<C>) {
        if let Some(&first) = ring.first() {
            ring.push(first);
        }
        self.add_polyline(ring);
    }

    /// Remove every path.
    pub fn clear_paths(&mut self) {
        self.paths.clear();
        self.cache.clear();
    }

    /// Replace all paths with the given open paths.
    pub fn set_paths(&mut self, paths: Vec<Vec<C>>) {
        self.paths = paths;
        self.cache.clear();
    }

    /// Replace all patterns.
    pub fn set_patterns(&mut self, patterns: Vec<PatternDef>) {
        self.patterns = patterns;
        self.cache.clear();
    }

    pub fn add_pattern(&mut self, pattern: PatternDef) {
        self.patterns.push(pattern);
    }

    pub fn paths(&self) -> &[Vec<C>] {
        &self.paths
    }

    pub fn patterns(&self) -> &[PatternDef] {
        &self.patterns
    }

    /// True if any pattern has to be recomputed when the zoom changes.
    pub fn is_zoom_dependent(&self) -> bool {
        self.patterns.iter().any(PatternDef::is_zoom_dependent)
    }

    /// Drop every cached projection.
    pub fn redraw(&mut self) {
        debug!(entries = self.cache.len(), "invalidating direction point cache");
        self.cache.clear();
    }

    /// Number of cached projections.
    pub fn cached_entries(&self) -> usize {
        self.cache.len()
    }

    fn cache_key(&self, pattern: usize, zoom: i32, path: usize) -> CacheKey {
        let zoom = if self.patterns[pattern].pattern.is_in_pixels() { zoom } else { 0 };
        CacheKey { pattern, zoom, path }
    }

    /// Placements of `pattern` along the whole of `path`, in caller
    /// coordinates. Computed once per cache key.
    ///
    /// Returns `None` if either index is out of range.
    pub fn direction_points<T>(
        &mut self,
        pattern: usize,
        path: usize,
        transform: &T,
        zoom: i32,
    ) -> Option<&[DirectionPoint<C>]>
    where
        T: PointTransform<Coord = C>,
    {
        let (Some(coords), Some(def)) = (self.paths.get(path), self.patterns.get(pattern)) else {
            warn!(pattern, path, "no such pattern or path");
            return None;
        };
        let key = self.cache_key(pattern, zoom, path);

        let points = self.cache.entry(key).or_insert_with(|| {
            debug!(?key, "direction point cache miss");
            project_pattern_on_path(coords, &def.pattern, transform)
        });
        Some(points.as_slice())
    }

    /// Placements honoring the viewport mode, in pixels.
    fn pixel_direction_points<T>(
        &mut self,
        pattern: usize,
        path: usize,
        transform: &T,
        zoom: i32,
        viewport: Option<&Bounds>,
    ) -> Option<Vec<DirectionPoint>>
    where
        T: PointTransform<Coord = C>,
    {
        match (self.mode, viewport) {
            (ViewportMode::Clip, Some(view)) => {
                let (Some(coords), Some(def)) = (self.paths.get(path), self.patterns.get(pattern)) else {
                    warn!(pattern, path, "no such pattern or path");
                    return None;
                };
                let pixels: Vec<Point> = coords.iter().map(|&c| transform.project(c)).collect();
                Some(project_pattern_clipped(&pixels, &def.pattern, view))
            }
            (ViewportMode::Filter { padding }, Some(view)) => {
                let all = self.projected(pattern, path, transform, zoom)?;
                Some(filter_by_bounds(&all, view, padding))
            }
            _ => self.projected(pattern, path, transform, zoom),
        }
    }

    fn projected<T>(&mut self, pattern: usize, path: usize, transform: &T, zoom: i32) -> Option<Vec<DirectionPoint>>
    where
        T: PointTransform<Coord = C>,
    {
        let points = self.direction_points(pattern, path, transform, zoom)?;
        Some(points.iter().map(|dp| dp.map(|c| transform.project(c))).collect())
    }

    /// Placements of `pattern` on `path` after applying the viewport mode,
    /// in caller coordinates. `None` if either index is out of range.
    pub fn visible_direction_points<T>(
        &mut self,
        pattern: usize,
        path: usize,
        transform: &T,
        zoom: i32,
        viewport: Option<&Bounds>,
    ) -> Option<Vec<DirectionPoint<C>>>
    where
        T: PointTransform<Coord = C>,
    {
        let points = self.pixel_direction_points(pattern, path, transform, zoom, viewport)?;
        Some(points.into_iter().map(|dp| dp.map(|p| transform.unproject(p))).collect())
    }

    /// Build every symbol of every pattern on every path and pass each one
    /// to `render`, pattern by pattern.
    pub fn draw<T, F>(&mut self, transform: &T, zoom: i32, viewport: Option<&Bounds>, mut render: F)
    where
        T: PointTransform<Coord = C>,
        F: FnMut(PlacedSymbol),
    {
        for pattern in 0..self.patterns.len() {
            let symbol = self.patterns[pattern].symbol;
            for path in 0..self.paths.len() {
                let points = self
                    .pixel_direction_points(pattern, path, transform, zoom, viewport)
                    .unwrap_or_default();
                let total = points.len();
                for (index, dp) in points.iter().enumerate() {
                    render(PlacedSymbol {
                        pattern,
                        path,
                        index,
                        shape: symbol.build(dp, index, total),
                    });
                }
            }
        }
    }

    /// [`Decorator::draw`], collected.
    pub fn build_symbols<T>(&mut self, transform: &T, zoom: i32, viewport: Option<&Bounds>) -> Vec<PlacedSymbol>
    where
        T: PointTransform<Coord = C>,
    {
        let mut symbols = Vec::new();
        self.draw(transform, zoom, viewport, |s| symbols.push(s));
        symbols
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::{Identity, LatLng, Viewport, WebMercator};

    fn pts(coords: &[(f64, f64)]) -> Vec<Point> {
        coords.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    fn decorator_with(pattern: Pattern, symbol: Symbol) -> Decorator<Point> {
        let mut d = Decorator::new();
        d.add_polyline(pts(&[(0.0, 0.0), (100.0, 0.0)]));
        d.set_patterns(vec![PatternDef::new(pattern, symbol)]);
        d
    }

    #[test]
    fn draws_one_symbol_per_placement() {
        let mut d = decorator_with(Pattern::new(0.0, 0.0, "25%"), Symbol::dash(4.0));
        let symbols = d.build_symbols(&Identity, 0, None);
        assert_eq!(symbols.len(), 4);
        assert_eq!(symbols.iter().map(|s| s.index).collect::<Vec<_>>(), vec![0, 1, 2, 3]);
        assert!(symbols.iter().all(|s| s.pattern == 0 && s.path == 0));
    }

    #[test]
    fn polygons_are_closed() {
        let mut d = Decorator::new();
        d.add_polygon(pts(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]));
        assert_eq!(d.paths()[0].len(), 5);
        assert_eq!(d.paths()[0][4], Point::new(0.0, 0.0));

        d.set_patterns(vec![PatternDef::new(Pattern::new(0.0, 0.0, 10.0), Symbol::marker())]);
        // 40px perimeter, every 10px: 0, 10, 20, 30.
        assert_eq!(d.build_symbols(&Identity, 0, None).len(), 4);
    }

    #[test]
    fn cache_is_reused_until_redraw() {
        let mut d = decorator_with(Pattern::new(0.0, 0.0, 10.0), Symbol::dash(2.0));
        d.build_symbols(&Identity, 3, None);
        assert_eq!(d.cached_entries(), 1);
        d.build_symbols(&Identity, 3, None);
        assert_eq!(d.cached_entries(), 1);

        d.redraw();
        assert_eq!(d.cached_entries(), 0);
    }

    #[test]
    fn pixel_patterns_cache_per_zoom() {
        let mut d = decorator_with(Pattern::new(0.0, 0.0, 10.0), Symbol::dash(2.0));
        d.build_symbols(&Viewport::new(1.0, Point::new(0.0, 0.0)), 0, None);
        d.build_symbols(&Viewport::new(2.0, Point::new(0.0, 0.0)), 1, None);
        assert_eq!(d.cached_entries(), 2);
    }

    #[test]
    fn relative_patterns_share_one_entry() {
        let mut d = decorator_with(Pattern::new("10%", 0.0, "20%"), Symbol::dash(2.0));
        let a = d.build_symbols(&Viewport::new(1.0, Point::new(0.0, 0.0)), 0, None).len();
        let b = d.build_symbols(&Viewport::new(2.0, Point::new(0.0, 0.0)), 1, None).len();
        assert_eq!(d.cached_entries(), 1);
        assert_eq!(a, b);
    }

    #[test]
    fn changing_patterns_invalidates() {
        let mut d = decorator_with(Pattern::new(0.0, 0.0, 10.0), Symbol::dash(2.0));
        d.build_symbols(&Identity, 0, None);
        d.set_patterns(vec![PatternDef::new(Pattern::new(0.0, 0.0, 50.0), Symbol::dash(2.0))]);
        assert_eq!(d.cached_entries(), 0);
        assert_eq!(d.build_symbols(&Identity, 0, None).len(), 2);

        d.set_paths(vec![pts(&[(0.0, 0.0), (0.0, 200.0)])]);
        assert_eq!(d.cached_entries(), 0);
        assert_eq!(d.build_symbols(&Identity, 0, None).len(), 4);
    }

    #[test]
    fn zoom_dependency() {
        let marker = PatternDef::new(Pattern::new("5%", 0.0, "10%"), Symbol::marker());
        let dash = PatternDef::new(Pattern::new("5%", 0.0, "10%"), Symbol::dash(3.0));
        let pixels = PatternDef::new(Pattern::new(12.0, 0.0, 25.0), Symbol::marker());
        assert!(!marker.is_zoom_dependent());
        assert!(dash.is_zoom_dependent());
        assert!(pixels.is_zoom_dependent());

        let mut d: Decorator<Point> = Decorator::new();
        d.set_patterns(vec![marker]);
        assert!(!d.is_zoom_dependent());
        d.add_pattern(pixels);
        assert!(d.is_zoom_dependent());
    }

    #[test]
    fn filter_mode_drops_offscreen_symbols() {
        let mut d = decorator_with(Pattern::new(0.0, 0.0, 10.0), Symbol::marker())
            .with_viewport_mode(ViewportMode::Filter { padding: 0.0 });
        let view = Bounds::from_rect(0.0, -5.0, 35.0, 10.0);
        assert_eq!(d.build_symbols(&Identity, 0, Some(&view)).len(), 4);
        // Without a viewport nothing is filtered.
        assert_eq!(d.build_symbols(&Identity, 0, None).len(), 10);
    }

    #[test]
    fn clip_mode_projects_visible_pieces() {
        let mut d = decorator_with(Pattern::new(0.0, 0.0, 20.0), Symbol::marker())
            .with_viewport_mode(ViewportMode::Clip);
        let view = Bounds::from_rect(30.0, -10.0, 40.0, 20.0);
        let visible = d.visible_direction_points(0, 0, &Identity, 0, Some(&view)).unwrap();
        let xs: Vec<f64> = visible.iter().map(|dp| dp.point.x.round()).collect();
        assert_eq!(xs, vec![40.0, 60.0]);
        assert_eq!(d.cached_entries(), 0);
    }

    #[test]
    fn unknown_indices_give_none() {
        let mut d = decorator_with(Pattern::new(0.0, 0.0, 10.0), Symbol::marker());
        assert!(d.direction_points(1, 0, &Identity, 0).is_none());
        assert!(d.direction_points(0, 1, &Identity, 0).is_none());
        assert_eq!(d.direction_points(0, 0, &Identity, 0).map(|p| p.len()), Some(10));

        let view = Bounds::from_rect(0.0, -5.0, 35.0, 10.0);
        d.set_viewport_mode(ViewportMode::Clip);
        assert!(d.visible_direction_points(0, 3, &Identity, 0, Some(&view)).is_none());
        d.set_viewport_mode(ViewportMode::Filter { padding: 0.0 });
        assert!(d.visible_direction_points(2, 0, &Identity, 0, Some(&view)).is_none());
        assert_eq!(d.cached_entries(), 1);
    }

    #[test]
    fn geographic_paths() {
        let mut d: Decorator<LatLng> = Decorator::new();
        d.add_polyline(vec![LatLng::new(57.0, -19.0), LatLng::new(60.0, -12.0)]);
        d.set_patterns(vec![PatternDef::new(
            Pattern::new("0%", 0.0, 0.0),
            Symbol::ArrowHead { pixel_size: 15.0, head_angle: 60.0, polygon: false },
        )]);

        let points = d.direction_points(0, 0, &WebMercator::new(5.0), 5).unwrap().to_vec();
        assert_eq!(points.len(), 1);
        assert!((points[0].point.lat - 57.0).abs() < 1e-9);

        let symbols = d.build_symbols(&WebMercator::new(5.0), 5, None);
        assert!(matches!(symbols[0].shape, SymbolShape::Polyline { ref points, .. } if points.len() == 3));
    }
}
