//! polydecor - decorate SVG paths with dashes, arrow heads and markers
//!
//! Usage:
//!   polydecor decorate <svg> -r <recipe.yaml>   Decorate every path
//!   polydecor project --points "x,y x,y ..."    Project a pattern on points
//!   polydecor render <svg> -r <recipe> -o <png> Rasterize the decoration
//!   polydecor symbols                           List symbol kinds
//!   polydecor view <svg> -r <recipe.yaml>       Launch TUI preview

mod cli;

use std::env;
use std::io::{self, stdout};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use image::{DynamicImage, RgbaImage};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};
use ratatui_image::{picker::{Picker, ProtocolType}, protocol::StatefulProtocol, StatefulImage};
use tracing::debug;

use polydecor::{Bounds, Decorator, Point, PointTransform, Symbol, Viewport, ViewportMode};

use cli::common::{DecoratedLayer, SvgFrame, decorated_svg, render_svg};
use cli::decorate::{Decoration, decorate_layers};
use cli::recipe::RecipeLayer;

// Preview image size - wide aspect ratio for terminal display
const IMAGE_WIDTH: u32 = 1600;
const IMAGE_HEIGHT: u32 = 900;
const PADDING: f64 = 20.0;
const ZOOM_FACTOR: f64 = 1.25;
const MIN_ZOOM_STEP: i32 = -3;
const MAX_ZOOM_STEP: i32 = 12;

/// Render decorated layers (already in image pixels) to an image using resvg
fn render_to_image(paths: &[Vec<Point>], layers: &[DecoratedLayer]) -> Result<DynamicImage, String> {
    let frame = SvgFrame {
        view_box: format!("0 0 {} {}", IMAGE_WIDTH, IMAGE_HEIGHT),
        size: Some((IMAGE_WIDTH, IMAGE_HEIGHT)),
        unit: 1.0,
        background: true,
    };
    let svg = decorated_svg(&frame, paths, layers);
    let pixmap = render_svg(&svg, IMAGE_WIDTH, IMAGE_HEIGHT)?;

    let rgba = RgbaImage::from_raw(IMAGE_WIDTH, IMAGE_HEIGHT, pixmap.take())
        .ok_or("Failed to create image")?;
    Ok(DynamicImage::ImageRgba8(rgba))
}

/// Result from background decoration
struct DecorateResult {
    /// The decorator comes back with its cache filled
    decorator: Decorator<Point>,
    layers: Vec<DecoratedLayer>,
    transform: Viewport,
    gen_time_ms: f64,
}

/// Application state for TUI
struct App {
    /// Source paths in document units
    paths: Vec<Vec<Point>>,
    /// Bounding box of all paths
    bounds: Bounds,
    /// Recipe patterns and whether each is shown
    layers: Vec<RecipeLayer>,
    enabled: Vec<bool>,
    pattern_state: ListState,
    recipe_name: String,
    mode: ViewportMode,
    /// Owned by the worker thread while a decoration runs
    decorator: Option<Decorator<Point>>,
    /// Pattern toggles not yet applied to the decorator
    patterns_dirty: bool,
    /// Cache flush requested while the decorator was busy
    needs_redraw: bool,
    /// Latest decoration, in image pixels
    decorated: Vec<DecoratedLayer>,
    /// Transform the latest decoration was built with
    shown_transform: Viewport,
    cached_entries: usize,
    gen_time_ms: f64,
    should_quit: bool,
    svg_path: String,
    is_loading: bool,
    needs_regenerate: bool,
    result_rx: Receiver<DecorateResult>,
    result_tx: Sender<DecorateResult>,
    spinner_frame: usize,
    picker: Picker,
    image_state: Option<Box<dyn StatefulProtocol>>,
    needs_image_update: bool,
    status: Option<String>,
    /// Zoom step; the zoom factor is 1.25^step and the step is the cache key
    zoom_step: i32,
    /// Pan offset in document units
    pan: Point,
}

impl App {
    fn new(svg_path: &str, recipe_path: &str) -> Result<Self, String> {
        let decoration = Decoration::load(svg_path, recipe_path)?;
        let paths = decoration.point_paths();

        let bounds = paths
            .iter()
            .filter_map(|p| Bounds::from_points(p))
            .reduce(|a, b| a.union(&b))
            .ok_or("No paths found in SVG")?;

        let mut pattern_state = ListState::default();
        pattern_state.select(Some(0));

        let (result_tx, result_rx) = mpsc::channel();

        // Initialize image picker - force Sixel protocol
        let mut picker = Picker::from_termios()
            .unwrap_or_else(|_| Picker::new((8, 16)));
        picker.protocol_type = ProtocolType::Sixel;

        let mode = decoration.mode;
        let mut app = App {
            bounds,
            enabled: vec![true; decoration.layers.len()],
            decorator: Some(decoration.decorator(mode)),
            layers: decoration.layers,
            pattern_state,
            recipe_name: decoration.recipe.name,
            mode,
            paths,
            patterns_dirty: false,
            needs_redraw: false,
            decorated: Vec::new(),
            shown_transform: Viewport::new(1.0, Point::new(0.0, 0.0)),
            cached_entries: 0,
            gen_time_ms: 0.0,
            should_quit: false,
            svg_path: svg_path.to_string(),
            is_loading: false,
            needs_regenerate: false,
            result_rx,
            result_tx,
            spinner_frame: 0,
            picker,
            image_state: None,
            needs_image_update: true,
            status: None,
            zoom_step: 0,
            pan: Point::new(0.0, 0.0),
        };

        app.regenerate();
        Ok(app)
    }

    fn zoom(&self) -> f64 {
        ZOOM_FACTOR.powi(self.zoom_step)
    }

    fn transform(&self) -> Viewport {
        Viewport::fit(
            &self.bounds,
            IMAGE_WIDTH as f64,
            IMAGE_HEIGHT as f64,
            PADDING,
            self.zoom(),
            self.pan,
        )
    }

    fn active_layers(&self) -> Vec<RecipeLayer> {
        self.layers
            .iter()
            .zip(&self.enabled)
            .filter(|(_, on)| **on)
            .map(|(layer, _)| layer.clone())
            .collect()
    }

    fn regenerate(&mut self) {
        // Skip if already running - mark for regeneration after completion
        if self.is_loading {
            self.needs_regenerate = true;
            return;
        }
        let Some(mut decorator) = self.decorator.take() else {
            return;
        };

        self.needs_regenerate = false;
        let layers = self.active_layers();
        if self.patterns_dirty {
            decorator.set_patterns(layers.iter().map(|l| l.def).collect());
            self.patterns_dirty = false;
        }
        if self.needs_redraw {
            decorator.redraw();
            self.needs_redraw = false;
        }

        let transform = self.transform();
        let zoom = self.zoom_step;
        let tx = self.result_tx.clone();
        debug!(zoom, patterns = layers.len(), "regenerating preview");

        self.is_loading = true;

        thread::spawn(move || {
            let start = Instant::now();
            let view = Bounds::from_rect(0.0, 0.0, IMAGE_WIDTH as f64, IMAGE_HEIGHT as f64);
            let decorated = decorate_layers(&mut decorator, &layers, &transform, zoom, Some(&view));

            let gen_time_ms = start.elapsed().as_secs_f64() * 1000.0;
            let _ = tx.send(DecorateResult { decorator, layers: decorated, transform, gen_time_ms });
        });
    }

    fn check_result(&mut self) {
        // Drain all pending results, keep only the latest
        let mut latest: Option<DecorateResult> = None;
        while let Ok(result) = self.result_rx.try_recv() {
            latest = Some(result);
        }

        if let Some(result) = latest {
            self.cached_entries = result.decorator.cached_entries();
            self.decorator = Some(result.decorator);
            self.decorated = result.layers;
            self.shown_transform = result.transform;
            self.gen_time_ms = result.gen_time_ms;
            self.is_loading = false;
            self.needs_image_update = true;

            // If the user changed the view while we were decorating, go again
            if self.needs_regenerate {
                self.regenerate();
            }
        }
    }

    fn update_image(&mut self) {
        if self.needs_image_update && !self.is_loading {
            let transform = self.shown_transform;
            let pixel_paths: Vec<Vec<Point>> = self
                .paths
                .iter()
                .map(|p| p.iter().map(|&pt| transform.project(pt)).collect())
                .collect();

            match render_to_image(&pixel_paths, &self.decorated) {
                Ok(img) => {
                    self.image_state = Some(self.picker.new_resize_protocol(img));
                    self.status = None;
                }
                Err(e) => self.status = Some(e),
            }
            self.needs_image_update = false;
        }
    }

    fn zoom_in(&mut self) {
        self.zoom_step = (self.zoom_step + 1).min(MAX_ZOOM_STEP);
        self.regenerate();
    }

    fn zoom_out(&mut self) {
        self.zoom_step = (self.zoom_step - 1).max(MIN_ZOOM_STEP);
        // Reset pan if zooming out to fit
        if self.zoom_step <= 0 {
            self.pan = Point::new(0.0, 0.0);
        }
        self.regenerate();
    }

    fn reset_view(&mut self) {
        self.zoom_step = 0;
        self.pan = Point::new(0.0, 0.0);
        self.regenerate();
    }

    fn redraw(&mut self) {
        self.needs_redraw = true;
        self.regenerate();
    }

    fn pan(&mut self, dx: f64, dy: f64) {
        // Pan speed shrinks as we zoom in
        let step = self.bounds.width().max(self.bounds.height()) * 0.05 / self.zoom();
        self.pan = Point::new(self.pan.x + dx * step, self.pan.y + dy * step);
        self.regenerate();
    }

    fn next_pattern(&mut self) {
        if self.layers.is_empty() {
            return;
        }
        let i = match self.pattern_state.selected() {
            Some(i) => (i + 1) % self.layers.len(),
            None => 0,
        };
        self.pattern_state.select(Some(i));
    }

    fn prev_pattern(&mut self) {
        if self.layers.is_empty() {
            return;
        }
        let i = match self.pattern_state.selected() {
            Some(0) | None => self.layers.len() - 1,
            Some(i) => i - 1,
        };
        self.pattern_state.select(Some(i));
    }

    fn toggle_pattern(&mut self) {
        if let Some(i) = self.pattern_state.selected() {
            if let Some(on) = self.enabled.get_mut(i) {
                *on = !*on;
                self.patterns_dirty = true;
                self.regenerate();
            }
        }
    }
}

fn main() {
    // Logs go to stderr; stdout carries command output.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage(&args[0]);
        std::process::exit(1);
    }

    let result = match args[1].as_str() {
        "decorate" => cli::cmd_decorate(&args[2..]),
        "project" => cli::cmd_project(&args[2..]),
        "render" => cli::cmd_render(&args[2..]),
        "view" => cmd_view(&args[2..]),
        "symbols" => {
            cmd_symbols();
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage(&args[0]);
            Ok(())
        }
        other => Err(format!("Unknown command: {}. Run '{} help' for usage.", other, args[0])),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn print_usage(prog: &str) {
    eprintln!("polydecor - symbols along SVG paths");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  {} decorate <svg> -r <recipe.yaml> [options]", prog);
    eprintln!("  {} project --points \"x,y x,y ...\" [options]", prog);
    eprintln!("  {} render <svg> -r <recipe.yaml> -o <out.png> [--zoom N] [--width PX]", prog);
    eprintln!("  {} view <svg> -r <recipe.yaml>", prog);
    eprintln!("  {} symbols", prog);
    eprintln!();
    eprintln!("Decorate options:");
    eprintln!("  -r, --recipe <file>    Recipe YAML (required)");
    eprintln!("  -o, --output <file>    Output file (- for stdout, default: stdout)");
    eprintln!("  -f, --format <fmt>     Output format: svg, json (default: svg)");
    eprintln!("  --zoom <n>             Zoom level; one document unit is 2^n pixels (default: 0)");
    eprintln!("  --viewport <x,y,w,h>   Viewport in document units (default: viewBox)");
    eprintln!("  --clip                 Decorate only the parts of paths inside the viewport");
    eprintln!("  --filter <pad>         Drop symbols outside the viewport grown by <pad> pixels");
    eprintln!();
    eprintln!("Project options:");
    eprintln!("  --points <list>        Path vertices (required)");
    eprintln!("  --offset <v>           First symbol offset: pixels or percent (default: 0)");
    eprintln!("  --end-offset <v>       Stop repeating this far from the end (default: 0)");
    eprintln!("  --repeat <v>           Repeat interval, 0 for a single symbol (default: 0)");
    eprintln!("  --closed               Close the ring back to the first point");
    eprintln!();
    eprintln!("Stdin support:");
    eprintln!("  Use '-' as input file to read SVG from stdin:");
    eprintln!("  echo '<svg>...</svg>' | {} decorate - -r arrows.yaml", prog);
    eprintln!();
    eprintln!("TUI Controls:");
    eprintln!("  ↑/↓ or j/k    Select pattern");
    eprintln!("  Space         Show/hide pattern");
    eprintln!("  +/-           Zoom");
    eprintln!("  WASD          Pan");
    eprintln!("  r             Redraw (flush cache)");
    eprintln!("  0             Reset view");
    eprintln!("  q / Esc       Quit");
}

fn cmd_symbols() {
    println!("Available symbols:");
    for (name, description) in Symbol::kinds() {
        println!("  {:<14} {}", name, description);
    }
}

fn cmd_view(args: &[String]) -> Result<(), String> {
    let mut svg_path: Option<&str> = None;
    let mut recipe_path: Option<&str> = None;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-r" | "--recipe" => {
                i += 1;
                recipe_path = args.get(i).map(String::as_str);
            }
            path => {
                if svg_path.is_none() {
                    svg_path = Some(path);
                }
            }
        }
        i += 1;
    }

    let svg_path = svg_path.ok_or("SVG file required")?;
    let recipe_path = recipe_path.ok_or("Recipe required (-r <recipe.yaml>)")?;
    run_tui(svg_path, recipe_path)
}

fn run_tui(svg_path: &str, recipe_path: &str) -> Result<(), String> {
    // Load before touching the terminal so errors print normally
    let mut app = App::new(svg_path, recipe_path)?;

    enable_raw_mode().map_err(|e| e.to_string())?;
    stdout().execute(EnterAlternateScreen).map_err(|e| e.to_string())?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))
        .map_err(|e| e.to_string())?;

    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode().map_err(|e| e.to_string())?;
    stdout().execute(LeaveAlternateScreen).map_err(|e| e.to_string())?;

    result
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<(), String> {
    loop {
        // Check for completed decoration (non-blocking)
        app.check_result();

        // Update the rendered image if needed
        app.update_image();

        // Animate spinner while loading
        if app.is_loading {
            app.spinner_frame = (app.spinner_frame + 1) % 8;
        }

        terminal.draw(|frame| ui(frame, app)).map_err(|_| "Draw error".to_string())?;

        if event::poll(Duration::from_millis(50)).map_err(|e| e.to_string())? {
            if let Event::Key(key) = event::read().map_err(|e| e.to_string())? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
                        KeyCode::Up | KeyCode::Char('k') => app.prev_pattern(),
                        KeyCode::Down | KeyCode::Char('j') => app.next_pattern(),
                        KeyCode::Char(' ') => app.toggle_pattern(),
                        // Zoom controls
                        KeyCode::Char('+') | KeyCode::Char('=') => app.zoom_in(),
                        KeyCode::Char('-') | KeyCode::Char('_') => app.zoom_out(),
                        KeyCode::Char('0') => app.reset_view(),
                        KeyCode::Char('r') => app.redraw(),
                        // Pan controls (WASD)
                        KeyCode::Char('w') => app.pan(0.0, -1.0),
                        KeyCode::Char('s') => app.pan(0.0, 1.0),
                        KeyCode::Char('a') => app.pan(-1.0, 0.0),
                        KeyCode::Char('d') => app.pan(1.0, 0.0),
                        _ => {}
                    }
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &mut App) {
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(10),
            Constraint::Length(4),
        ])
        .split(frame.area());

    let top_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(30),
            Constraint::Min(40),
        ])
        .split(main_layout[0]);

    // Split left sidebar into pattern list and stats
    let sidebar_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(6),
            Constraint::Length(8),
        ])
        .split(top_layout[0]);

    // Pattern list
    let items: Vec<ListItem> = app.layers
        .iter()
        .zip(&app.enabled)
        .map(|(layer, on)| {
            let mark = if *on { "x" } else { " " };
            ListItem::new(format!("[{}] {} ({})", mark, layer.name, layer.def.symbol.kind()))
        })
        .collect();

    let list = List::new(items)
        .block(Block::default()
            .title(format!(" {} ", app.recipe_name))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)))
        .highlight_style(Style::default()
            .bg(Color::DarkGray)
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD))
        .highlight_symbol("► ");

    frame.render_stateful_widget(list, sidebar_layout[0], &mut app.pattern_state.clone());

    // Stats panel
    let symbols: usize = app.decorated.iter().map(|l| l.shapes.len()).sum();
    let stats_text = format!(
        "Paths: {}\nSymbols: {}\nCached: {}\nGen: {:.1}ms\nZoom: {:.0}% (step {})\nMode: {:?}",
        app.paths.len(),
        symbols,
        app.cached_entries,
        app.gen_time_ms,
        app.zoom() * 100.0,
        app.zoom_step,
        app.mode
    );
    let stats = Paragraph::new(stats_text)
        .block(Block::default()
            .title(" Stats ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta)))
        .style(Style::default().fg(Color::White));

    frame.render_widget(stats, sidebar_layout[1]);

    // Spinner animation frames
    let spinner_chars = ['|', '/', '-', '\\', '|', '/', '-', '\\'];
    let spinner = spinner_chars[app.spinner_frame % spinner_chars.len()];

    let image_title = match (&app.status, app.is_loading) {
        (_, true) => format!(" [{}] Decorating... ", spinner),
        (Some(status), false) => format!(" {} ", status),
        (None, false) => format!(" {} ", app.svg_path),
    };

    let border_color = if app.is_loading { Color::Yellow } else { Color::Green };

    let image_block = Block::default()
        .title(image_title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color));

    let inner_area = image_block.inner(top_layout[1]);
    frame.render_widget(image_block, top_layout[1]);

    // Render the image using ratatui-image
    if let Some(ref mut image_state) = app.image_state {
        let image_widget = StatefulImage::new(None);
        frame.render_stateful_widget(image_widget, inner_area, image_state);
    }

    // Help
    let help = Paragraph::new("↑↓ pattern  Space toggle  +/- zoom  WASD pan\nr redraw  0 reset  q quit")
        .style(Style::default().fg(Color::DarkGray))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));

    frame.render_widget(help, main_layout[1]);
}
