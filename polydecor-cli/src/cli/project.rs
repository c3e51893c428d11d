//! Project command: run the projector on points given on the command line.

use serde::Serialize;

use polydecor::{Pattern, PatternParameter, Point, project_pattern, segment::path_length};

use super::common::{JsonDirectionPoint, parse_points};

#[derive(Serialize)]
struct JsonProjection {
    length: f64,
    points: Vec<JsonDirectionPoint>,
}

fn parse_parameter(flag: &str, value: Option<&String>) -> Result<PatternParameter, String> {
    let value = value.ok_or_else(|| format!("{} requires a value", flag))?;
    PatternParameter::try_parse(value).map_err(|e| format!("{}: {}", flag, e))
}

/// Project a pattern onto `points` and serialize the result.
fn projection_json(points: &[Point], pattern: &Pattern) -> Result<String, String> {
    let projection = JsonProjection {
        length: path_length(points),
        points: project_pattern(points, pattern).iter().map(JsonDirectionPoint::from).collect(),
    };
    serde_json::to_string(&projection).map_err(|e| format!("Failed to serialize JSON: {}", e))
}

/// Execute the project command.
pub fn cmd_project(args: &[String]) -> Result<(), String> {
    let mut points: Option<Vec<Point>> = None;
    let mut pattern = Pattern::default();
    let mut closed = false;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--points" => {
                i += 1;
                points = Some(parse_points(args.get(i).map_or("", String::as_str))?);
            }
            "--offset" => {
                i += 1;
                pattern.offset = parse_parameter("--offset", args.get(i))?;
            }
            "--end-offset" => {
                i += 1;
                pattern.end_offset = parse_parameter("--end-offset", args.get(i))?;
            }
            "--repeat" => {
                i += 1;
                pattern.repeat = parse_parameter("--repeat", args.get(i))?;
            }
            "--closed" => {
                closed = true;
            }
            other => return Err(format!("Unknown option: {}", other)),
        }
        i += 1;
    }

    let mut points = points.ok_or("--points is required")?;
    if closed {
        if let Some(&first) = points.first() {
            points.push(first);
        }
    }

    println!("{}", projection_json(&points, &pattern)?);
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
