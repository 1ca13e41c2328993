//! `contours` — marching-squares elevation contours, with optional erosion.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use isocity::config::{ContoursConfig, ErosionConfig};
use isocity::contours::build_contours;
use isocity::contours_export::{export_contours_json, export_contours_svg};
use isocity::erosion::erode;

use isocity_cli::{init_tracing, load_or_generate_world, run_cli, write_text_output, WorldSource};

/// Marching-squares contour extraction over tile heights.
#[derive(Parser, Debug)]
struct Cli {
    #[command(flatten)]
    world: WorldSource,

    /// Comma-separated elevation levels to extract, e.g. "0,0.5,1".
    #[arg(long, value_delimiter = ',', default_value = "0,0.5,1")]
    levels: Vec<f64>,

    /// Douglas-Peucker simplification tolerance in tile units.
    #[arg(long)]
    simplify_epsilon: Option<f64>,

    /// Run thermal + (optional river-carve) + smoothing erosion before extracting contours.
    #[arg(long)]
    erode: bool,

    /// Carve river channels during erosion (only with --erode).
    #[arg(long)]
    carve_rivers: bool,

    #[arg(long, value_name = "PATH")]
    json: Option<PathBuf>,

    /// Write an SVG rendering of all levels to this path.
    #[arg(long, value_name = "PATH")]
    svg: Option<PathBuf>,

    /// Pixels per tile unit in the SVG output.
    #[arg(long, default_value_t = 10.0)]
    svg_scale: f64,
}

fn main() -> ExitCode {
    init_tracing();
    run_cli(run)
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let world = load_or_generate_world(&cli.world)?;

    let mut heights: Vec<f32> = world.tiles().iter().map(|t| t.height).collect();
    if cli.erode {
        erode(&mut heights, world.width(), world.height(), &ErosionConfig::default(), cli.carve_rivers);
    }

    let mut config = ContoursConfig::default();
    if let Some(eps) = cli.simplify_epsilon {
        config.simplify_epsilon = eps;
    }

    let levels = build_contours(&heights, world.width(), world.height(), &cli.levels, &config)?;

    if let Some(path) = &cli.svg {
        write_text_output(Some(path), &export_contours_svg(&levels, world.width(), world.height(), cli.svg_scale))?;
    }
    if cli.json.is_some() || cli.svg.is_none() {
        let json = export_contours_json(&levels)?;
        write_text_output(cli.json.as_deref(), &json)?;
    }

    tracing::info!(levels = levels.len(), "extracted contours");
    Ok(())
}
