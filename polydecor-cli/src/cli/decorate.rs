//! Decorate command implementation.

use std::time::Instant;

use serde::Serialize;
use tracing::debug;

use polydecor::{
    Bounds, Decorator, Point, PointTransform, SvgPath, Viewport, ViewportMode, extract_paths_from_svg,
};

use super::common::{
    DecoratedLayer, JsonDirectionPoint, OutputFormat, SvgFrame, decorated_svg, extract_viewbox,
    parse_number, parse_rect, read_svg_input, unproject_shape, viewbox_bounds, write_output,
};
use super::recipe::{Recipe, RecipeLayer};

/// Direction points of one pattern on one path.
#[derive(Serialize)]
struct JsonPathPoints {
    index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    points: Vec<JsonDirectionPoint>,
}

/// One pattern in JSON output.
#[derive(Serialize)]
struct JsonPattern {
    name: String,
    symbol: &'static str,
    paths: Vec<JsonPathPoints>,
}

/// JSON output: direction points in document units, grouped by pattern.
#[derive(Serialize)]
struct JsonOutput {
    recipe: String,
    zoom: i32,
    patterns: Vec<JsonPattern>,
}

/// Run every enabled pattern over the decorator's paths and collect the
/// symbols per layer, in pixels.
pub fn decorate_layers<T>(
    decorator: &mut Decorator<Point>,
    layers: &[RecipeLayer],
    transform: &T,
    zoom: i32,
    viewport: Option<&Bounds>,
) -> Vec<DecoratedLayer>
where
    T: PointTransform<Coord = Point>,
{
    let mut out: Vec<DecoratedLayer> = layers
        .iter()
        .map(|layer| DecoratedLayer {
            name: layer.name.clone(),
            style: layer.style.clone(),
            shapes: Vec::new(),
        })
        .collect();

    decorator.draw(transform, zoom, viewport, |placed| {
        if let Some(layer) = out.get_mut(placed.pattern) {
            layer.shapes.push(placed.shape);
        }
    });
    out
}

/// An SVG document and a recipe, ready to decorate.
pub struct Decoration {
    pub svg_content: String,
    pub paths: Vec<SvgPath>,
    pub recipe: Recipe,
    pub layers: Vec<RecipeLayer>,
    pub mode: ViewportMode,
}

impl Decoration {
    pub fn load(svg_path: &str, recipe_path: &str) -> Result<Self, String> {
        let svg_content = read_svg_input(svg_path)?;
        let paths = extract_paths_from_svg(&svg_content)
            .map_err(|e| format!("Failed to parse SVG: {}", e))?;
        eprintln!("Loaded {} paths", paths.len());

        let recipe = Recipe::load(recipe_path)?;
        let layers = recipe.layers()?;
        let mode = recipe.viewport_mode()?;
        eprintln!("Recipe '{}': {} patterns", recipe.name, layers.len());

        Ok(Decoration { svg_content, paths, recipe, layers, mode })
    }

    /// Source paths as plain point lists.
    pub fn point_paths(&self) -> Vec<Vec<Point>> {
        self.paths.iter().map(|p| p.points.clone()).collect()
    }

    /// The document's viewBox, or the bounds of its paths.
    pub fn view_box(&self) -> Bounds {
        extract_viewbox(&self.svg_content)
            .and_then(|vb| viewbox_bounds(&vb))
            .or_else(|| {
                self.paths
                    .iter()
                    .filter_map(|p| Bounds::from_points(&p.points))
                    .reduce(|a, b| a.union(&b))
            })
            .unwrap_or_else(|| Bounds::from_rect(0.0, 0.0, 1000.0, 1000.0))
    }

    /// A decorator holding every path and enabled pattern.
    pub fn decorator(&self, mode: ViewportMode) -> Decorator<Point> {
        let mut decorator = Decorator::new().with_viewport_mode(mode);
        decorator.set_paths(self.point_paths());
        decorator.set_patterns(self.layers.iter().map(|l| l.def).collect());
        decorator
    }

    /// Decorated SVG in document units.
    ///
    /// Pixel sizes in the recipe are measured at `zoom`, where one document
    /// unit is `2^zoom` pixels. `viewport` is in document units.
    pub fn to_svg(&self, mode: ViewportMode, zoom: i32, viewport: Option<Bounds>) -> String {
        let transform = zoom_transform(zoom);
        let pixel_view = viewport.map(|v| project_bounds(&v, &transform));
        let mut decorator = self.decorator(mode);

        let start = Instant::now();
        let layers: Vec<DecoratedLayer> =
            decorate_layers(&mut decorator, &self.layers, &transform, zoom, pixel_view.as_ref())
                .into_iter()
                .map(|layer| DecoratedLayer {
                    shapes: layer.shapes.iter().map(|s| unproject_shape(s, &transform)).collect(),
                    ..layer
                })
                .collect();

        let total: usize = layers.iter().map(|l| l.shapes.len()).sum();
        eprintln!("Placed {} symbols in {:?}", total, start.elapsed());

        let vb = self.view_box();
        let frame = SvgFrame {
            view_box: format!("{} {} {} {}", vb.min.x, vb.min.y, vb.width(), vb.height()),
            size: None,
            unit: 1.0 / transform.scale,
            background: false,
        };
        decorated_svg(&frame, &self.point_paths(), &layers)
    }

    fn to_json(&self, mode: ViewportMode, zoom: i32, viewport: Option<Bounds>) -> Result<String, String> {
        let transform = zoom_transform(zoom);
        let pixel_view = viewport.map(|v| project_bounds(&v, &transform));
        let mut decorator = self.decorator(mode);

        let patterns = self
            .layers
            .iter()
            .enumerate()
            .map(|(pattern, layer)| {
                let paths = self
                    .paths
                    .iter()
                    .enumerate()
                    .map(|(index, path)| JsonPathPoints {
                        index,
                        id: path.id.clone(),
                        points: decorator
                            .visible_direction_points(pattern, index, &transform, zoom, pixel_view.as_ref())
                            .unwrap_or_default()
                            .iter()
                            .map(JsonDirectionPoint::from)
                            .collect(),
                    })
                    .collect();
                JsonPattern { name: layer.name.clone(), symbol: layer.def.symbol.kind(), paths }
            })
            .collect();

        let output = JsonOutput { recipe: self.recipe.name.clone(), zoom, patterns };
        serde_json::to_string(&output).map_err(|e| format!("Failed to serialize JSON: {}", e))
    }
}

/// Document units to pixels at an integer zoom level.
pub fn zoom_transform(zoom: i32) -> Viewport {
    Viewport::new(2f64.powi(zoom), Point::new(0.0, 0.0))
}

/// Bounds mapped through a transform (axis-aligned result).
pub fn project_bounds<T>(bounds: &Bounds, transform: &T) -> Bounds
where
    T: PointTransform<Coord = Point>,
{
    let a = transform.project(bounds.min);
    let b = transform.project(bounds.max);
    Bounds::new(
        Point::new(a.x.min(b.x), a.y.min(b.y)),
        Point::new(a.x.max(b.x), a.y.max(b.y)),
    )
}

/// Execute the decorate command.
pub fn cmd_decorate(args: &[String]) -> Result<(), String> {
    let mut svg_path: Option<&str> = None;
    let mut recipe_path: Option<&str> = None;
    let mut output_path: Option<&str> = None;
    let mut format = OutputFormat::Svg;
    let mut zoom: i32 = 0;
    let mut viewport: Option<Bounds> = None;
    let mut mode_override: Option<ViewportMode> = None;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-r" | "--recipe" => {
                i += 1;
                recipe_path = args.get(i).map(String::as_str);
            }
            "-o" | "--output" => {
                i += 1;
                output_path = args.get(i).map(String::as_str);
            }
            "-f" | "--format" => {
                i += 1;
                format = OutputFormat::from_name(args.get(i).map_or("", String::as_str))?;
            }
            "--zoom" => {
                i += 1;
                zoom = parse_number("--zoom", args.get(i))?;
            }
            "--viewport" => {
                i += 1;
                viewport = Some(parse_rect(args.get(i).map_or("", String::as_str))?);
            }
            "--clip" => {
                mode_override = Some(ViewportMode::Clip);
            }
            "--filter" => {
                i += 1;
                mode_override = Some(ViewportMode::Filter {
                    padding: parse_number("--filter", args.get(i))?,
                });
            }
            path => {
                if svg_path.is_none() {
                    svg_path = Some(path);
                }
            }
        }
        i += 1;
    }

    let svg_path = svg_path.ok_or("SVG file required (use '-' for stdin)")?;
    let recipe_path = recipe_path.ok_or("Recipe required (-r <recipe.yaml>)")?;

    let decoration = Decoration::load(svg_path, recipe_path)?;
    let mode = mode_override.unwrap_or(decoration.mode);

    // Clip and filter need a viewport; default to the whole document.
    let viewport = match (mode, viewport) {
        (ViewportMode::Full, v) => v,
        (_, Some(v)) => Some(v),
        (_, None) => Some(decoration.view_box()),
    };
    debug!(?mode, zoom, ?viewport, "decorating");

    let output = match format {
        OutputFormat::Svg => decoration.to_svg(mode, zoom, viewport),
        OutputFormat::Json => decoration.to_json(mode, zoom, viewport)?,
    };

    write_output(output_path, &output)
}

// ============================================================================
// TESTS
// ============================================================================
