//! `blockdistricts` — district assignment over the block adjacency graph.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use isocity::block_districting::{assign_districts_by_blocks, BlockDistrictingConfig};
use isocity::blocks_export::export_blocks_json;
use isocity::city_block_graph::build_city_block_graph;
use isocity::city_blocks::build_city_blocks;
use isocity::save::save_world_to_path;

use isocity_cli::{init_tracing, load_or_generate_world, run_cli, write_text_output, WorldSource};

/// Farthest-point-seeded districting over the block adjacency graph.
#[derive(Parser, Debug)]
struct Cli {
    #[command(flatten)]
    world: WorldSource,

    /// Number of districts to assign, clamped to the block count and to 8.
    #[arg(long, default_value_t = isocity::config::DISTRICT_COUNT)]
    districts: usize,

    /// Disable plurality district assignment for road tiles.
    #[arg(long)]
    no_fill_road_tiles: bool,

    /// Assign a plurality district to water tiles from their neighbors.
    #[arg(long)]
    include_water: bool,

    #[arg(long, value_name = "PATH")]
    json: Option<PathBuf>,

    /// Persist the world (with district tiles written) to this save file.
    #[arg(long, value_name = "PATH")]
    write_save: Option<PathBuf>,
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
    let config = BlockDistrictingConfig {
        districts: cli.districts,
        fill_road_tiles: !cli.no_fill_road_tiles,
        include_water: cli.include_water,
    };
    let districting = assign_districts_by_blocks(&mut world, &blocks, &graph, &config);

    let json = export_blocks_json(&blocks, &graph, Some(&districting))?;
    write_text_output(cli.json.as_deref(), &json)?;

    if let Some(path) = &cli.write_save {
        save_world_to_path(&world, path)?;
    }

    tracing::info!(
        districts = districting.tiles_per_district.len(),
        blocks = blocks.blocks.len(),
        "assigned block districts"
    );
    Ok(())
}
