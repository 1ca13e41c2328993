//! Shared argument types and plumbing for the `isocity_cli` binaries.
//!
//! `anyhow::Result` at the process boundary, `clap::Parser` derive args, and
//! a `tracing`/`tracing-subscriber` pairing for structured logging.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use isocity::world::World;
use isocity::IsoCityError;

/// World source: either a save file, or a seed + size to generate one.
/// Mutually exclusive, enforced by `clap`'s `conflicts_with`/`requires`.
#[derive(clap::Args, Debug)]
pub struct WorldSource {
    /// Load a world from a save file produced by `--write-save`.
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub load: Option<PathBuf>,

    /// Deterministic seed for procedural world generation.
    #[arg(long, conflicts_with = "load", requires = "size")]
    pub seed: Option<u64>,

    /// Grid size as `WxH`, e.g. `64x64`. Required with `--seed`.
    #[arg(long, conflicts_with = "load", requires = "seed", value_parser = parse_size)]
    pub size: Option<(usize, usize)>,
}

fn parse_size(s: &str) -> Result<(usize, usize), String> {
    let (w, h) = s
        .split_once('x')
        .ok_or_else(|| format!("invalid size '{s}', expected WxH (e.g. 64x64)"))?;
    let w: usize = w.parse().map_err(|_| format!("invalid width in size '{s}'"))?;
    let h: usize = h.parse().map_err(|_| format!("invalid height in size '{s}'"))?;
    if w == 0 || h == 0 {
        return Err(format!("size '{s}' must have positive width and height"));
    }
    Ok((w, h))
}

/// Loads a world from `--load`, or generates one from `--seed`/`--size`.
/// Returns a `Config` error (exit code 2) if neither or both are given.
pub fn load_or_generate_world(source: &WorldSource) -> anyhow::Result<World> {
    match (&source.load, source.seed, source.size) {
        (Some(path), None, None) => Ok(isocity::save::load_world_from_path(path)?),
        (None, Some(seed), Some((w, h))) => Ok(isocity::worldgen::generate_world(w, h, seed)),
        (None, None, None) => Err(IsoCityError::Config(
            "must pass either --load <path> or --seed <u64> --size WxH".to_string(),
        )
        .into()),
        _ => Err(IsoCityError::Config(
            "--load is mutually exclusive with --seed/--size".to_string(),
        )
        .into()),
    }
}

/// Writes text output to `path`, or stdout when no path is given.
pub fn write_text_output(path: Option<&Path>, contents: &str) -> anyhow::Result<()> {
    match path {
        Some(p) => write_file(p, contents.as_bytes()),
        None => {
            println!("{contents}");
            Ok(())
        }
    }
}

/// Writes binary output to `path`. Unlike text output, binary formats
/// (PPM) have no sensible stdout fallback under a text terminal, so `path`
/// is required by the caller's argument parser.
pub fn write_file(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Initializes `tracing-subscriber` from `RUST_LOG`, defaulting to `info`.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Runs a binary's fallible body, mapping the result to a process exit code:
/// `0` on success, `2` on `IsoCityError::Config`/`InvalidInput` (usage
/// errors), `1` on any other runtime error.
pub fn run_cli(body: impl FnOnce() -> anyhow::Result<()>) -> ExitCode {
    match body() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            match err.downcast_ref::<IsoCityError>() {
                Some(IsoCityError::Config(_)) | Some(IsoCityError::InvalidInput(_)) => ExitCode::from(2),
                _ => ExitCode::FAILURE,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_size_accepts_wxh() {
        assert_eq!(parse_size("64x32"), Ok((64, 32)));
    }

    #[test]
    fn parse_size_rejects_garbage() {
        assert!(parse_size("nope").is_err());
        assert!(parse_size("0x10").is_err());
    }

    #[test]
    fn load_or_generate_requires_one_source() {
        let source = WorldSource { load: None, seed: None, size: None };
        assert!(load_or_generate_world(&source).is_err());
    }

    #[test]
    fn load_or_generate_builds_from_seed_and_size() {
        let source = WorldSource { load: None, seed: Some(7), size: Some((4, 4)) };
        let world = load_or_generate_world(&source).unwrap();
        assert_eq!(world.width(), 4);
        assert_eq!(world.height(), 4);
    }
}
