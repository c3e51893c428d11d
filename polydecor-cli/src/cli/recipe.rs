//! Decoration recipes.
//!
//! Recipes are YAML files listing the patterns to draw along every path,
//! each with its spacing, symbol and style.
//!
//! ```yaml
//! name: Route arrows
//! defaults:
//!   color: "#333333"
//!   stroke_width: 1.5
//! viewport:
//!   filter: 20
//! patterns:
//!   - name: arrows
//!     offset: 25
//!     repeat: "10%"
//!     symbol: { type: arrow_head, pixel_size: 12 }
//!   - name: ticks
//!     repeat: 8
//!     symbol: { type: dash, pixel_size: 4 }
//!     style: { color: red }
//! ```
//!
//! Notes:
//! - `filter` padding is in pixels at the output zoom, not a fraction of
//!   the view size.
//! - A `gradient_dash` blends from `start` toward `end` along each path and
//!   reaches exactly `end` on the last symbol.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use polydecor::{Pattern, PatternDef, PatternParameter, Rgb, Symbol, ViewportMode};

/// A complete recipe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipe {
    /// Recipe name/title
    pub name: String,

    /// Optional description
    #[serde(default)]
    pub description: Option<String>,

    /// Default style applied to all patterns (can be overridden)
    #[serde(default)]
    pub defaults: PatternStyle,

    /// How the viewport limits decoration (default: full paths)
    #[serde(default)]
    pub viewport: Option<ViewportConfig>,

    /// Patterns, drawn in order
    pub patterns: Vec<PatternConfig>,
}

/// A pattern parameter as written in YAML: a pixel count (`20`, `"20"`) or
/// a percentage string (`"12.5%"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Number(f64),
    Text(String),
}

impl Default for ParamValue {
    fn default() -> Self {
        ParamValue::Number(0.0)
    }
}

impl ParamValue {
    fn to_parameter(&self) -> Result<PatternParameter, String> {
        match self {
            ParamValue::Number(n) => Ok(PatternParameter::from(*n)),
            ParamValue::Text(s) => PatternParameter::try_parse(s).map_err(|e| e.to_string()),
        }
    }
}

/// A single pattern entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternConfig {
    /// Pattern name (for identification)
    pub name: String,

    /// Distance to the first symbol
    #[serde(default)]
    pub offset: ParamValue,

    /// Distance from the path end where repetition stops
    #[serde(default)]
    pub end_offset: ParamValue,

    /// Interval between symbols (0 = single symbol)
    #[serde(default)]
    pub repeat: ParamValue,

    /// Symbol drawn at each placement
    pub symbol: SymbolConfig,

    /// Pattern style (merged with defaults)
    #[serde(default)]
    pub style: PatternStyle,

    /// Whether this pattern is enabled
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

fn default_pixel_size() -> f64 {
    10.0
}

fn default_head_angle() -> f64 {
    60.0
}

/// Symbol options, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SymbolConfig {
    Dash {
        #[serde(default = "default_pixel_size")]
        pixel_size: f64,
    },
    ArrowHead {
        #[serde(default = "default_pixel_size")]
        pixel_size: f64,
        #[serde(default = "default_head_angle")]
        head_angle: f64,
        #[serde(default = "default_enabled")]
        polygon: bool,
    },
    Marker {
        #[serde(default)]
        rotate: bool,
    },
    /// Blends from `start` toward `end`; the last symbol is `end`.
    GradientDash {
        #[serde(default = "default_pixel_size")]
        pixel_size: f64,
        start: String,
        end: String,
    },
}

impl SymbolConfig {
    pub fn to_symbol(&self) -> Result<Symbol, String> {
        Ok(match self {
            SymbolConfig::Dash { pixel_size } => Symbol::dash(*pixel_size),
            SymbolConfig::ArrowHead { pixel_size, head_angle, polygon } => Symbol::ArrowHead {
                pixel_size: *pixel_size,
                head_angle: *head_angle,
                polygon: *polygon,
            },
            SymbolConfig::Marker { rotate } => Symbol::Marker { rotate: *rotate },
            SymbolConfig::GradientDash { pixel_size, start, end } => Symbol::GradientDash {
                pixel_size: *pixel_size,
                start: Rgb::from_hex(start).map_err(|e| e.to_string())?,
                end: Rgb::from_hex(end).map_err(|e| e.to_string())?,
            },
        })
    }
}

/// Viewport handling: `full`, `clip`, or `{ filter: PADDING }` with the
/// padding in pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ViewportConfig {
    Mode(String),
    Filter { filter: f64 },
}

impl ViewportConfig {
    pub fn to_mode(&self) -> Result<ViewportMode, String> {
        match self {
            ViewportConfig::Filter { filter } => Ok(ViewportMode::Filter { padding: *filter }),
            ViewportConfig::Mode(name) => match name.to_lowercase().as_str() {
                "full" => Ok(ViewportMode::Full),
                "clip" => Ok(ViewportMode::Clip),
                "filter" => Ok(ViewportMode::Filter { padding: 0.0 }),
                other => Err(format!(
                    "Unknown viewport mode '{}'. Use 'full', 'clip' or {{ filter: PADDING }}.",
                    other
                )),
            },
        }
    }
}

/// Style properties for a pattern.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternStyle {
    /// Stroke color
    #[serde(default)]
    pub color: Option<String>,

    /// Stroke width in pixels
    #[serde(default)]
    pub stroke_width: Option<f64>,

    /// Opacity (0.0 to 1.0)
    #[serde(default)]
    pub opacity: Option<f64>,
}

impl PatternStyle {
    /// Merge this style with defaults, preferring self's values.
    pub fn merge_with(&self, defaults: &PatternStyle) -> PatternStyle {
        PatternStyle {
            color: self.color.clone().or_else(|| defaults.color.clone()),
            stroke_width: self.stroke_width.or(defaults.stroke_width),
            opacity: self.opacity.or(defaults.opacity),
        }
    }

    /// Get color with fallback.
    pub fn color_or(&self, fallback: &str) -> String {
        self.color.clone().unwrap_or_else(|| fallback.to_string())
    }

    /// Get stroke width with fallback.
    pub fn stroke_width_or(&self, fallback: f64) -> f64 {
        self.stroke_width.unwrap_or(fallback)
    }

    /// Get opacity with fallback.
    pub fn opacity_or(&self, fallback: f64) -> f64 {
        self.opacity.unwrap_or(fallback)
    }
}

/// An enabled pattern, validated and ready for the decorator.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeLayer {
    pub name: String,
    pub def: PatternDef,
    pub style: PatternStyle,
}

impl Recipe {
    /// Load a recipe from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| format!("Failed to read recipe file: {}", e))?;

        Self::from_yaml(&content)
    }

    /// Parse a recipe from YAML text.
    pub fn from_yaml(content: &str) -> Result<Self, String> {
        serde_yaml::from_str(content)
            .map_err(|e| format!("Failed to parse recipe YAML: {}", e))
    }

    /// Viewport mode, `Full` when the recipe does not set one.
    pub fn viewport_mode(&self) -> Result<ViewportMode, String> {
        self.viewport
            .as_ref()
            .map_or(Ok(ViewportMode::Full), ViewportConfig::to_mode)
    }

    /// Validate every enabled pattern and merge its style with the defaults.
    pub fn layers(&self) -> Result<Vec<RecipeLayer>, String> {
        self.patterns
            .iter()
            .filter(|p| p.enabled)
            .map(|p| {
                let context = |e: String| format!("Pattern '{}': {}", p.name, e);
                let pattern = Pattern {
                    offset: p.offset.to_parameter().map_err(context)?,
                    end_offset: p.end_offset.to_parameter().map_err(context)?,
                    repeat: p.repeat.to_parameter().map_err(context)?,
                };
                let symbol = p.symbol.to_symbol().map_err(context)?;

                Ok(RecipeLayer {
                    name: p.name.clone(),
                    def: PatternDef::new(pattern, symbol),
                    style: p.style.merge_with(&self.defaults),
                })
            })
            .collect()
    }
}

// ============================================================================
// TESTS
// ============================================================================
