//! `blocks` — city-block decomposition and the block adjacency graph.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use isocity::block_districting::{assign_districts_by_blocks, BlockDistrictingConfig};
use isocity::blocks_export::{export_block_graph_dot, export_blocks_csv, export_blocks_json};
use isocity::city_block_graph::build_city_block_graph;
use isocity::city_blocks::build_city_blocks;

use isocity_cli::{init_tracing, load_or_generate_world, run_cli, write_text_output, WorldSource};

/// City-block decomposition and the block adjacency graph.
#[derive(Parser, Debug)]
struct Cli {
    #[command(flatten)]
    world: WorldSource,

    /// Also assign districts over the block graph and include them in the JSON export.
    #[arg(long)]
    districts: bool,

    /// Write JSON (blocks + adjacency graph). Defaults to stdout if no writer flag is given.
    #[arg(long, value_name = "PATH")]
    json: Option<PathBuf>,

    /// Write a flat per-block CSV to this path.
    #[arg(long, value_name = "PATH")]
    csv: Option<PathBuf>,

    /// Write the block adjacency graph as Graphviz DOT to this path.
    #[arg(long, value_name = "PATH")]
    dot: Option<PathBuf>,
}

fn main() -> ExitCode {
    init_tracing();
    run_cli(run)
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut world = load_or_generate_world(&cli.world)?;

    let blocks = build_city_blocks(&world);
    let graph = build_city_block_graph(&world, &blocks);
    let districting = cli
        .districts
        .then(|| assign_districts_by_blocks(&mut world, &blocks, &graph, &BlockDistrictingConfig::default()));

    let mut wrote_any = false;
    if let Some(path) = &cli.csv {
        write_text_output(Some(path), &export_blocks_csv(&blocks))?;
        wrote_any = true;
    }
    if let Some(path) = &cli.dot {
        write_text_output(Some(path), &export_block_graph_dot(&graph))?;
        wrote_any = true;
    }
    if cli.json.is_some() || !wrote_any {
        let json = export_blocks_json(&blocks, &graph, districting.as_ref())?;
        write_text_output(cli.json.as_deref(), &json)?;
    }

    tracing::info!(blocks = blocks.blocks.len(), edges = graph.edges.len(), "analyzed city blocks");
    Ok(())
}
