//! # polydecor
//!
//! Pattern projection along polylines and polygons: dashes, arrow heads and
//! markers placed at offsets and repeat intervals given in pixels or as a
//! percentage of the path length.
//!
//! The pipeline is
//! 1. [`segment`]: a path becomes segments with cumulative distances and
//!    headings;
//! 2. [`ratio`]: pattern parameters are normalized against the path length;
//! 3. [`project`]: offsets are walked along the segments into
//!    [`DirectionPoint`]s;
//! 4. [`symbol`]: each direction point becomes geometry.
//!
//! [`Decorator`] ties these together with caching and viewport handling.
//!
//! ## Rust Lesson #7: Modules
//!
//! - `mod foo;` = load from `foo.rs` or `foo/mod.rs`
//! - `pub mod foo;` = also export it publicly
//! - `pub use foo::Bar;` = re-export Bar at this level

pub mod clip;
pub mod decorator;
pub mod error;
pub mod geometry;
pub mod log;
pub mod project;
pub mod ratio;
pub mod segment;
pub mod svg;
pub mod symbol;
pub mod transform;

// Re-export common types at crate root for convenience.
pub use clip::{ViewportMode, project_pattern_clipped};
pub use decorator::{Decorator, PatternDef, PlacedSymbol};
pub use error::{ColorError, ParameterError, SvgError};
pub use geometry::{Bounds, Point};
pub use project::{DirectionPoint, MAX_SYMBOLS_PER_PATH, project_pattern, project_pattern_on_path};
pub use ratio::{Pattern, PatternParameter, ProjectionRatios};
pub use segment::{Segment, to_segments};
pub use svg::{SvgPath, extract_paths_from_svg};
pub use symbol::{Rgb, Symbol, SymbolShape};
pub use transform::{Identity, LatLng, PointTransform, Viewport, WebMercator};
