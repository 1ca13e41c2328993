//! `policyopt` — searches the 5-lever policy space for the best-scoring tweak.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::Ordering;

use clap::Parser;

use isocity::config::{PolicyOptimizerConfig, SimConfig};
use isocity::policy_optimizer::{
    cem_search, exhaustive_search, PolicyOptProgress, PolicyRanges, ScoreWeights,
};
use isocity::policy_optimizer_export::{export_policy_optimization_json, export_top_csv, export_trace_csv};
use isocity::IsoCityError;

use isocity_cli::{init_tracing, load_or_generate_world, run_cli, write_text_output, WorldSource};

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum Method {
    Exhaustive,
    Cem,
}

/// Searches tax/maintenance policy space with exhaustive enumeration or CEM.
#[derive(Parser, Debug)]
struct Cli {
    #[command(flatten)]
    world: WorldSource,

    #[arg(long, value_enum, default_value_t = Method::Cem)]
    method: Method,

    /// Days to step the simulator per candidate evaluation.
    #[arg(long, default_value_t = 30)]
    eval_days: u32,

    /// Candidate budget; exhaustive search aborts if the full grid would exceed this.
    #[arg(long, default_value_t = 50_000)]
    max_exhaustive_candidates: usize,

    /// Seed for the CEM sampler's RNG.
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// CEM population size per generation (overrides the library default).
    #[arg(long)]
    population: Option<usize>,

    /// CEM elite count per generation (overrides the library default).
    #[arg(long)]
    elites: Option<usize>,

    /// CEM generation count (overrides the library default).
    #[arg(long)]
    generations: Option<usize>,

    /// Write the winning policy and its evaluation as JSON. Defaults to stdout.
    #[arg(long, value_name = "PATH")]
    json: Option<PathBuf>,

    /// Write the winning policy as a single-row CSV to this path.
    #[arg(long, value_name = "PATH")]
    csv_top: Option<PathBuf>,

    /// Write the CEM per-generation best-score trace as CSV (CEM only).
    #[arg(long, value_name = "PATH")]
    csv_trace: Option<PathBuf>,
}

fn main() -> ExitCode {
    init_tracing();
    run_cli(run)
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let world = load_or_generate_world(&cli.world)?;

    let base_config = SimConfig {
        width: world.width(),
        height: world.height(),
        seed: world.seed(),
        ..SimConfig::default()
    };
    let ranges = PolicyRanges::default();
    let weights = ScoreWeights::default();

    let mut opt_config = PolicyOptimizerConfig::default();
    if let Some(p) = cli.population {
        opt_config.population = p;
    }
    if let Some(e) = cli.elites {
        opt_config.elites = e;
    }
    if let Some(g) = cli.generations {
        opt_config.generations = g;
    }

    let progress = PolicyOptProgress::default();

    let (best, trace) = std::thread::scope(|scope| -> anyhow::Result<_> {
        let handle = scope.spawn(|| match cli.method {
            Method::Exhaustive => {
                let result = exhaustive_search(
                    &world,
                    &base_config,
                    &ranges,
                    cli.max_exhaustive_candidates,
                    cli.eval_days,
                    &weights,
                    Some(&progress),
                    opt_config.workers,
                    opt_config.score_epsilon,
                );
                (result, None)
            }
            Method::Cem => {
                let (policy, eval, trace) = cem_search(
                    &world,
                    &base_config,
                    &ranges,
                    &opt_config,
                    cli.eval_days,
                    &weights,
                    cli.seed,
                    Some(&progress),
                );
                (Some((policy, eval)), Some(trace))
            }
        });

        while !handle.is_finished() {
            std::thread::sleep(std::time::Duration::from_millis(200));
            let evaluated = progress.evaluated.load(Ordering::Relaxed);
            let total = progress.total.load(Ordering::Relaxed);
            if total > 0 {
                tracing::info!(evaluated, total, "policy search progress");
            }
        }

        let (best, trace) = handle.join().expect("policy search thread panicked");
        let best = best.ok_or_else(|| {
            IsoCityError::Config("exhaustive search candidate grid exceeds --max-exhaustive-candidates".to_string())
        })?;
        Ok((best, trace))
    })?;

    let (policy, eval) = best;
    let json = export_policy_optimization_json(&policy, &eval)?;
    write_text_output(cli.json.as_deref(), &json)?;

    if let Some(path) = &cli.csv_top {
        write_text_output(Some(path), &export_top_csv(&[(policy, eval)]))?;
    }
    if let Some(path) = &cli.csv_trace {
        match &trace {
            Some(t) => write_text_output(Some(path), &export_trace_csv(t))?,
            None => tracing::warn!("--csv-trace has no effect with --method exhaustive"),
        }
    }

    tracing::info!(score = eval.score, money_end = eval.money_end, population_end = eval.population_end, "policy optimization finished");
    Ok(())
}
