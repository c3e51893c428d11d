//! Common utilities shared across CLI commands.

use std::fs;
use std::io::{self, Read};

use quick_xml::escape::escape;
use resvg::usvg;
use serde::Serialize;
use tiny_skia::Pixmap;

use polydecor::{Bounds, DirectionPoint, Point, PointTransform, Rgb, SymbolShape};

use super::recipe::PatternStyle;

/// Output format for decorated paths.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum OutputFormat {
    Svg,
    Json,
}

impl OutputFormat {
    pub fn from_name(name: &str) -> Result<Self, String> {
        match name.to_lowercase().as_str() {
            "svg" => Ok(OutputFormat::Svg),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("Unknown format: {}. Use 'svg' or 'json'.", other)),
        }
    }
}

/// A direction point in JSON output format.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct JsonDirectionPoint {
    pub x: f64,
    pub y: f64,
    pub heading: f64,
}

impl From<&DirectionPoint> for JsonDirectionPoint {
    fn from(dp: &DirectionPoint) -> Self {
        JsonDirectionPoint { x: dp.point.x, y: dp.point.y, heading: dp.heading }
    }
}

/// Read SVG content from a file, or from stdin when `path` is `-`.
pub fn read_svg_input(path: &str) -> Result<String, String> {
    if path == "-" {
        eprintln!("Reading SVG from stdin...");
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|e| format!("Failed to read from stdin: {}", e))?;
        Ok(buffer)
    } else {
        eprintln!("Loading: {}", path);
        fs::read_to_string(path).map_err(|e| format!("Failed to read {}: {}", path, e))
    }
}

/// Write to a file, or to stdout for `None` / `-`.
pub fn write_output(output_path: Option<&str>, content: &str) -> Result<(), String> {
    match output_path {
        Some("-") | None => {
            println!("{}", content);
            Ok(())
        }
        Some(path) => {
            fs::write(path, content).map_err(|e| format!("Failed to write {}: {}", path, e))?;
            eprintln!("Wrote: {}", path);
            Ok(())
        }
    }
}

/// Parse a flag value as a number.
pub fn parse_number<T: std::str::FromStr>(flag: &str, value: Option<&String>) -> Result<T, String> {
    let value = value.ok_or_else(|| format!("{} requires a value", flag))?;
    value
        .trim()
        .parse()
        .map_err(|_| format!("Invalid value for {}: {}", flag, value))
}

/// Parse `"x,y x,y ..."` into points.
pub fn parse_points(text: &str) -> Result<Vec<Point>, String> {
    text.split_whitespace()
        .map(|pair| {
            let (x, y) = pair
                .split_once(',')
                .ok_or_else(|| format!("Invalid point '{}', expected x,y", pair))?;
            let x = x.trim().parse().map_err(|_| format!("Invalid x in '{}'", pair))?;
            let y = y.trim().parse().map_err(|_| format!("Invalid y in '{}'", pair))?;
            Ok(Point::new(x, y))
        })
        .collect()
}

/// Parse `"x,y,w,h"` into bounds.
pub fn parse_rect(text: &str) -> Result<Bounds, String> {
    let values: Vec<f64> = text
        .split([',', ' '])
        .filter(|s| !s.is_empty())
        .map(|s| s.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|_| format!("Invalid rectangle '{}', expected x,y,w,h", text))?;

    match values.as_slice() {
        [x, y, w, h] if *w >= 0.0 && *h >= 0.0 => Ok(Bounds::from_rect(*x, *y, *w, *h)),
        _ => Err(format!("Invalid rectangle '{}', expected x,y,w,h", text)),
    }
}

/// Extract viewBox from SVG content.
pub fn extract_viewbox(svg: &str) -> Option<String> {
    for attr in ["viewBox=\"", "viewbox=\""] {
        if let Some(start) = svg.find(attr) {
            let rest = &svg[start + attr.len()..];
            if let Some(end) = rest.find('"') {
                return Some(rest[..end].to_string());
            }
        }
    }
    None
}

/// Bounds described by a viewBox string.
pub fn viewbox_bounds(viewbox: &str) -> Option<Bounds> {
    parse_rect(viewbox).ok()
}

/// All symbols of one recipe pattern, with the pattern's style.
#[derive(Debug, Clone)]
pub struct DecoratedLayer {
    pub name: String,
    pub style: PatternStyle,
    pub shapes: Vec<SymbolShape>,
}

/// Map a pixel-space shape back through `transform`.
pub fn unproject_shape<T>(shape: &SymbolShape, transform: &T) -> SymbolShape
where
    T: PointTransform<Coord = Point>,
{
    let map = |points: &[Point]| -> Vec<Point> { points.iter().map(|&p| transform.unproject(p)).collect() };
    match shape {
        SymbolShape::Polyline { points, color } => SymbolShape::Polyline { points: map(points), color: *color },
        SymbolShape::Polygon { points } => SymbolShape::Polygon { points: map(points) },
        SymbolShape::Marker { at, rotation } => SymbolShape::Marker {
            at: transform.unproject(*at),
            rotation: *rotation,
        },
    }
}

/// Where decorated output lands.
pub struct SvgFrame {
    pub view_box: String,
    /// Explicit pixel size; omitted for document output.
    pub size: Option<(u32, u32)>,
    /// Document units per pixel, used to size strokes and markers.
    pub unit: f64,
    /// Paint a white background.
    pub background: bool,
}

const SOURCE_COLOR: &str = "#cccccc";
const DEFAULT_COLOR: &str = "black";
const DEFAULT_STROKE_WIDTH: f64 = 1.0;

fn points_attr(points: &[Point]) -> String {
    points
        .iter()
        .map(|p| format!("{:.2},{:.2}", p.x, p.y))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Build an SVG with the source paths (gray) and every decorated layer on
/// top, one `<g>` per layer.
pub fn decorated_svg(frame: &SvgFrame, paths: &[Vec<Point>], layers: &[DecoratedLayer]) -> String {
    let mut svg = String::new();
    let size = frame
        .size
        .map(|(w, h)| format!(" width=\"{}\" height=\"{}\"", w, h))
        .unwrap_or_default();
    svg.push_str(&format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg"{} viewBox="{}">
"#,
        size,
        escape(frame.view_box.as_str())
    ));
    if frame.background {
        svg.push_str("<rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n");
    }

    svg.push_str(&format!(
        "<g id=\"source\" stroke=\"{}\" stroke-width=\"{}\" fill=\"none\">\n",
        SOURCE_COLOR, frame.unit
    ));
    for path in paths.iter().filter(|p| p.len() >= 2) {
        svg.push_str(&format!("  <polyline points=\"{}\"/>\n", points_attr(path)));
    }
    svg.push_str("</g>\n");

    // Names and colors come from recipes: escape them as attribute values.
    for layer in layers {
        let color = layer.style.color_or(DEFAULT_COLOR);
        let color = escape(color.as_str()).into_owned();
        let width = layer.style.stroke_width_or(DEFAULT_STROKE_WIDTH) * frame.unit;
        svg.push_str(&format!(
            r#"<g id="{}" stroke="{}" stroke-width="{}" opacity="{}" fill="none" stroke-linecap="round" stroke-linejoin="round">
"#,
            escape(layer.name.as_str()),
            color,
            width,
            layer.style.opacity_or(1.0)
        ));
        for shape in &layer.shapes {
            push_shape(&mut svg, shape, &color, width);
        }
        svg.push_str("</g>\n");
    }

    svg.push_str("</svg>\n");
    svg
}

fn push_shape(svg: &mut String, shape: &SymbolShape, color: &str, width: f64) {
    match shape {
        SymbolShape::Polyline { points, color: None } => {
            svg.push_str(&format!("  <polyline points=\"{}\"/>\n", points_attr(points)));
        }
        SymbolShape::Polyline { points, color: Some(rgb) } => {
            svg.push_str(&format!(
                "  <polyline points=\"{}\" stroke=\"{}\"/>\n",
                points_attr(points),
                Rgb::to_hex(rgb)
            ));
        }
        SymbolShape::Polygon { points } => {
            svg.push_str(&format!(
                "  <polygon points=\"{}\" fill=\"{}\"/>\n",
                points_attr(points),
                color
            ));
        }
        SymbolShape::Marker { at, rotation } => {
            let r = width * 2.0;
            svg.push_str(&format!(
                "  <circle cx=\"{:.2}\" cy=\"{:.2}\" r=\"{}\" fill=\"{}\" stroke=\"none\"/>\n",
                at.x, at.y, r, color
            ));
            if let Some(heading) = rotation {
                // Heading 90 points along +x, 180 along +y.
                let angle = (heading - 90.0).to_radians();
                let tip = Point::new(at.x + r * 2.0 * angle.cos(), at.y + r * 2.0 * angle.sin());
                svg.push_str(&format!(
                    "  <line x1=\"{:.2}\" y1=\"{:.2}\" x2=\"{:.2}\" y2=\"{:.2}\"/>\n",
                    at.x, at.y, tip.x, tip.y
                ));
            }
        }
    }
}

/// Rasterize SVG text into a `width` x `height` pixmap, scaled to fit.
pub fn render_svg(svg: &str, width: u32, height: u32) -> Result<Pixmap, String> {
    let options = usvg::Options::default();
    let tree = usvg::Tree::from_str(svg, &options)
        .map_err(|e| format!("Failed to parse generated SVG: {}", e))?;

    let mut pixmap = Pixmap::new(width.max(1), height.max(1))
        .ok_or_else(|| format!("Failed to create {}x{} pixmap", width, height))?;

    let size = tree.size();
    let scale = (width as f32 / size.width()).min(height as f32 / size.height());
    resvg::render(&tree, tiny_skia::Transform::from_scale(scale, scale), &mut pixmap.as_mut());

    Ok(pixmap)
}

// ============================================================================
// TESTS
// ============================================================================
