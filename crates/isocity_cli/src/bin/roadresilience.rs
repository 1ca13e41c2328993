//! `roadresilience` — bridges, articulation points, and bypass suggestions.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use isocity::bypass_planner::{rank_bypass_suggestions, suggest_bypass, BypassPlannerConfig};
use isocity::road_graph_csr::build_road_graph;
use isocity::road_resilience::compute_resilience;
use isocity::road_resilience_export::{
    export_bypass_csv, export_bypass_json, export_resilience_csv, export_resilience_dot, export_resilience_json,
};

use isocity_cli::{init_tracing, load_or_generate_world, run_cli, write_text_output, WorldSource};

/// Bridge/articulation detection on the road graph, with optional bypass planning.
#[derive(Parser, Debug)]
struct Cli {
    #[command(flatten)]
    world: WorldSource,

    /// Also compute and rank bypass-road suggestions across every bridge edge.
    #[arg(long)]
    bypass: bool,

    /// Optimize bypass cost in money rather than new tile count.
    #[arg(long)]
    money_objective: bool,

    /// Allow bypass routes to cross water via bridges.
    #[arg(long)]
    allow_bridges: bool,

    /// Road level to build the bypass at.
    #[arg(long, default_value_t = 1)]
    target_level: u8,

    /// Keep only the top-N ranked bypass suggestions.
    #[arg(long, default_value_t = 5)]
    top: usize,

    #[arg(long, value_name = "PATH")]
    json: Option<PathBuf>,

    #[arg(long, value_name = "PATH")]
    csv: Option<PathBuf>,

    #[arg(long, value_name = "PATH")]
    dot: Option<PathBuf>,

    /// Write ranked bypass suggestions as JSON to this path.
    #[arg(long, value_name = "PATH")]
    bypass_json: Option<PathBuf>,

    /// Write ranked bypass suggestions as CSV to this path.
    #[arg(long, value_name = "PATH")]
    bypass_csv: Option<PathBuf>,
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

    let mut wrote_any = false;
    if let Some(path) = &cli.csv {
        write_text_output(Some(path), &export_resilience_csv(&graph, &resilience))?;
        wrote_any = true;
    }
    if let Some(path) = &cli.dot {
        write_text_output(Some(path), &export_resilience_dot(&graph, &resilience))?;
        wrote_any = true;
    }
    if cli.json.is_some() || !wrote_any {
        let json = export_resilience_json(&graph, &resilience)?;
        write_text_output(cli.json.as_deref(), &json)?;
    }

    if cli.bypass {
        let config = BypassPlannerConfig {
            top: cli.top,
            money_objective: cli.money_objective,
            target_level: cli.target_level,
            allow_bridges: cli.allow_bridges,
            ..BypassPlannerConfig::default()
        };

        let mut suggestions: Vec<_> = resilience
            .is_bridge
            .iter()
            .enumerate()
            .filter(|&(_, &is_bridge)| is_bridge)
            .filter_map(|(edge_index, _)| suggest_bypass(&world, &graph, edge_index, &config))
            .collect();
        rank_bypass_suggestions(&mut suggestions, None, &config);
        suggestions.truncate(config.top);

        if let Some(path) = &cli.bypass_csv {
            write_text_output(Some(path), &export_bypass_csv(&suggestions))?;
        }
        if cli.bypass_json.is_some() || cli.bypass_csv.is_none() {
            let json = export_bypass_json(&suggestions)?;
            write_text_output(cli.bypass_json.as_deref(), &json)?;
        }

        tracing::info!(count = suggestions.len(), "ranked bypass suggestions");
    }

    tracing::info!(
        bridges = resilience.is_bridge.iter().filter(|&&b| b).count(),
        articulations = resilience.is_articulation.iter().filter(|&&b| b).count(),
        "computed road resilience"
    );
    Ok(())
}
