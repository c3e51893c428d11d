//! Render command: rasterize a decorated SVG to PNG.

use std::time::Instant;

use polydecor::{Bounds, ViewportMode};

use super::common::{parse_number, render_svg};
use super::decorate::Decoration;

const DEFAULT_WIDTH: u32 = 1200;

/// Output height keeping the document's aspect ratio.
pub fn fitted_height(view_box: &Bounds, width: u32) -> u32 {
    if view_box.width() <= 0.0 {
        return width;
    }
    ((width as f64 * view_box.height() / view_box.width()).round() as u32).max(1)
}

/// Execute the render command.
pub fn cmd_render(args: &[String]) -> Result<(), String> {
    let mut svg_path: Option<&str> = None;
    let mut recipe_path: Option<&str> = None;
    let mut output_path: Option<&str> = None;
    let mut zoom: i32 = 0;
    let mut width = DEFAULT_WIDTH;

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
            "--zoom" => {
                i += 1;
                zoom = parse_number("--zoom", args.get(i))?;
            }
            "-w" | "--width" => {
                i += 1;
                width = parse_number("--width", args.get(i))?;
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
    let output_path = output_path.ok_or("Output PNG required (-o <file.png>)")?;

    let decoration = Decoration::load(svg_path, recipe_path)?;
    let view_box = decoration.view_box();
    let viewport = (decoration.mode != ViewportMode::Full).then_some(view_box);
    let svg = decoration.to_svg(decoration.mode, zoom, viewport);

    let start = Instant::now();
    let height = fitted_height(&view_box, width);
    let pixmap = render_svg(&svg, width, height)?;
    pixmap
        .save_png(output_path)
        .map_err(|e| format!("Failed to write {}: {}", output_path, e))?;
    eprintln!("Rendered {}x{} in {:?}", width, height, start.elapsed());
    eprintln!("Wrote: {}", output_path);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn height_follows_aspect_ratio() {
        assert_eq!(fitted_height(&Bounds::from_rect(0.0, 0.0, 200.0, 100.0), 1200), 600);
        assert_eq!(fitted_height(&Bounds::from_rect(0.0, 0.0, 100.0, 300.0), 100), 300);
        assert_eq!(fitted_height(&Bounds::from_rect(0.0, 0.0, 0.0, 10.0), 64), 64);
    }
}
