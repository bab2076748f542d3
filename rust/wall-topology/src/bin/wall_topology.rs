// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! CLI tool: reconstruct walls and rooms from extracted drawing primitives
//!
//! Input is a JSON `PrimitiveSet` (`{"lines": [...], "edges": [...],
//! "rects": [...], "curves": [...]}`) or an array of them, one per page.
//!
//! Usage:
//!   wall-topology <primitives.json> [options]

use anyhow::{bail, Context, Result};
use ifc_lite_wall_topology::{PrimitiveSet, SnapPolicy, TopologyConfig, WallTopologyAnalyzer};
use serde_json::Value;
use std::env;
use std::fs;
use std::io::Write;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage();
        return Ok(());
    }

    let input_path = &args[1];

    // Parse options
    let mut output_path: Option<String> = None;
    let mut config_path: Option<String> = None;
    let mut snap_distance: Option<f64> = None;
    let mut angle_tolerance: Option<f64> = None;
    let mut min_length: Option<f64> = None;
    let mut thickness_threshold: Option<f64> = None;
    let mut min_wall_length: Option<f64> = None;
    let mut enforce_min_wall_length = false;
    let mut nearest_snap = false;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--output" | "-o" => output_path = Some(value_of(&args, &mut i)?.to_string()),
            "--config" => config_path = Some(value_of(&args, &mut i)?.to_string()),
            "--snap-distance" => snap_distance = Some(number_of(&args, &mut i)?),
            "--angle-tolerance" => angle_tolerance = Some(number_of(&args, &mut i)?),
            "--min-length" => min_length = Some(number_of(&args, &mut i)?),
            "--thickness-threshold" => thickness_threshold = Some(number_of(&args, &mut i)?),
            "--min-wall-length" => min_wall_length = Some(number_of(&args, &mut i)?),
            "--enforce-min-wall-length" => enforce_min_wall_length = true,
            "--nearest-snap" => nearest_snap = true,
            other => {
                eprintln!("Unknown option: {}", other);
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    // Configuration: file first, then flag overrides
    let mut config = match &config_path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("cannot read config '{}'", path))?;
            TopologyConfig::from_json(&text)
                .with_context(|| format!("invalid config '{}'", path))?
        }
        None => TopologyConfig::default(),
    };
    if let Some(v) = snap_distance {
        config.snap_distance = v;
    }
    if let Some(v) = angle_tolerance {
        config.angle_tolerance = v;
    }
    if let Some(v) = min_length {
        config.normalizer.min_length = v;
    }
    if let Some(v) = thickness_threshold {
        config.normalizer.thickness_threshold = v;
    }
    if let Some(v) = min_wall_length {
        config.min_wall_length = v;
    }
    if enforce_min_wall_length {
        config.enforce_min_wall_length = true;
    }
    if nearest_snap {
        config.snap_policy = SnapPolicy::Nearest;
    }

    let analyzer = WallTopologyAnalyzer::new(config)?;
    tracing::info!(config = ?analyzer.config(), "configured analyzer");

    // Load pages
    let text = fs::read_to_string(input_path)
        .with_context(|| format!("cannot read input '{}'", input_path))?;
    let (pages, single) = parse_pages(&text)
        .with_context(|| format!("cannot parse primitives in '{}'", input_path))?;
    tracing::info!(path = %input_path, pages = pages.len(), "loaded primitives");

    let results = analyzer.analyze_pages(&pages);
    for (page, result) in results.iter().enumerate() {
        let stats = &result.stats;
        tracing::info!(
            page,
            primitives = stats.primitives_in,
            segments = stats.segments,
            paths = stats.paths,
            walls = stats.merged_walls,
            rooms = stats.rooms,
            malformed = stats.malformed_skipped,
            "page analyzed"
        );
    }

    let json = if single {
        serde_json::to_string_pretty(&results[0])?
    } else {
        serde_json::to_string_pretty(&results)?
    };

    match &output_path {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("cannot write '{}'", path))?;
            tracing::info!(path = %path, "wrote topology");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", json)?;
        }
    }

    Ok(())
}

/// A single page object or an array of pages. The flag is true for a single
/// page so the output keeps the same shape.
fn parse_pages(text: &str) -> Result<(Vec<PrimitiveSet>, bool)> {
    let value: Value = serde_json::from_str(text)?;
    match value {
        Value::Array(_) => Ok((serde_json::from_value(value)?, false)),
        Value::Object(_) => Ok((vec![serde_json::from_value(value)?], true)),
        _ => bail!("expected a primitive set object or an array of them"),
    }
}

fn value_of<'a>(args: &'a [String], i: &mut usize) -> Result<&'a str> {
    let flag = &args[*i];
    *i += 1;
    args.get(*i)
        .map(String::as_str)
        .with_context(|| format!("{} requires a value", flag))
}

fn number_of(args: &[String], i: &mut usize) -> Result<f64> {
    let flag = args[*i].clone();
    let raw = value_of(args, i)?;
    raw.parse()
        .with_context(|| format!("invalid {} value '{}'", flag, raw))
}

fn print_usage() {
    eprintln!("Usage: wall-topology <primitives.json> [options]");
    eprintln!();
    eprintln!("Reconstructs wall polylines and rooms from drawing primitives.");
    eprintln!("Input is one primitive set or a JSON array of sets (one per page).");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --output, -o <path>            Write JSON here instead of stdout");
    eprintln!("  --config <path>                JSON configuration file");
    eprintln!("  --snap-distance <n>            Endpoint snap distance (default: 10)");
    eprintln!("  --angle-tolerance <deg>        Continuation angle tolerance (default: 5)");
    eprintln!("  --min-length <n>               Minimum segment length (default: 20)");
    eprintln!("  --thickness-threshold <n>      Thin rectangle threshold (default: 15)");
    eprintln!("  --min-wall-length <n>          Minimum merged wall length (default: 50)");
    eprintln!("  --enforce-min-wall-length      Drop merged walls below --min-wall-length");
    eprintln!("  --nearest-snap                 Snap to the nearest point, not the first");
    eprintln!();
    eprintln!("Logging is controlled with RUST_LOG (default: info).");
}
