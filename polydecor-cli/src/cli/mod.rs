//! CLI command implementations.
//!
//! - `decorate` - Decorate the paths of an SVG with a recipe
//! - `project` - Project a pattern onto points given on the command line
//! - `render` - Rasterize a decorated SVG to PNG
//! - `symbols` - List available symbol kinds

pub mod common;
pub mod decorate;
pub mod project;
pub mod recipe;
pub mod render;

pub use decorate::cmd_decorate;
pub use project::cmd_project;
pub use render::cmd_render;
