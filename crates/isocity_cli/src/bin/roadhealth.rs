//! `roadhealth` — per-tile centrality and vulnerability fields.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use isocity::bypass_planner::{rank_bypass_suggestions, suggest_bypass, BypassPlannerConfig};
use isocity::config::RoadHealthConfig;
use isocity::road_graph_csr::build_road_graph;
use isocity::road_health::{compute_road_health, stamp_bypass_mask};
use isocity::road_health_export::{export_road_health_json, export_road_health_ppm, HealthField};
use isocity::road_resilience::compute_resilience;

use isocity_cli::{init_tracing, load_or_generate_world, run_cli, write_file, write_text_output, WorldSource};

/// Brandes-style betweenness centrality and bridge/articulation vulnerability,
/// rasterized per tile.
#[derive(Parser, Debug)]
struct Cli {
    #[command(flatten)]
    world: WorldSource,

    /// Force exact betweenness for graphs up to this many nodes.
    #[arg(long)]
    auto_exact_max_nodes: Option<usize>,

    /// Number of sampled sources for graphs above the exact threshold.
    #[arg(long)]
    auto_sample_sources: Option<usize>,

    /// Stamp the top bridge-bypass paths into the `bypass_mask` field.
    #[arg(long)]
    include_bypass: bool,

    #[arg(long, value_name = "PATH")]
    json: Option<PathBuf>,

    /// Write a centrality heatmap as a binary PPM (P6) to this path.
    #[arg(long, value_name = "PATH")]
    ppm_centrality: Option<PathBuf>,

    /// Write a vulnerability heatmap as a binary PPM (P6) to this path.
    #[arg(long, value_name = "PATH")]
    ppm_vulnerability: Option<PathBuf>,
}

fn main() -> ExitCode {
    init_tracing();
    run_cli(run)
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let world = load_or_generate_world(&cli.world)?;

    let graph = build_road_graph(&world);
    let resilience = compute_resilience(&graph);

    let mut config = RoadHealthConfig::default();
    if let Some(n) = cli.auto_exact_max_nodes {
        config.auto_exact_max_nodes = n;
    }
    if let Some(n) = cli.auto_sample_sources {
        config.auto_sample_sources = n;
    }
    config.include_bypass = cli.include_bypass;

    let mut health = compute_road_health(&graph, &resilience, world.width(), world.height(), &config);

    if config.include_bypass {
        let bypass_config = BypassPlannerConfig::default();
        let mut suggestions: Vec<_> = resilience
            .is_bridge
            .iter()
            .enumerate()
            .filter(|&(_, &is_bridge)| is_bridge)
            .filter_map(|(edge_index, _)| suggest_bypass(&world, &graph, edge_index, &bypass_config))
            .collect();
        rank_bypass_suggestions(&mut suggestions, Some(&health.centrality01), &bypass_config);
        suggestions.truncate(bypass_config.top);
        let paths: Vec<Vec<usize>> = suggestions.into_iter().map(|s| s.path).collect();
        stamp_bypass_mask(&mut health, &paths);
    }

    if let Some(path) = &cli.ppm_centrality {
        write_file(path, &export_road_health_ppm(world.width(), world.height(), &health, HealthField::Centrality))?;
    }
    if let Some(path) = &cli.ppm_vulnerability {
        write_file(path, &export_road_health_ppm(world.width(), world.height(), &health, HealthField::Vulnerability))?;
    }
    if cli.json.is_some() || (cli.ppm_centrality.is_none() && cli.ppm_vulnerability.is_none()) {
        let json = export_road_health_json(&health)?;
        write_text_output(cli.json.as_deref(), &json)?;
    }

    tracing::info!(nodes = graph.nodes.len(), edges = graph.edges.len(), "computed road health");
    Ok(())
}
