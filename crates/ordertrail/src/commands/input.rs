// crates/ordertrail/src/commands/input.rs

use std::collections::HashSet;
use std::env;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use ordertrail_core::{load_event_logs, InputFormat, LoadedLog, PipelineConfig};
use tracing::{info, warn};

/// Environment variable naming a TOML config when `--config` is absent.
pub const CONFIG_ENV: &str = "ORDERTRAIL_CONFIG";

#[derive(Args, Debug)]
pub struct InputArgs {
    /// Event log files or glob patterns, e.g. `data/*.jsonl`
    #[arg(short, long = "input", required = true, num_args = 1..)]
    pub inputs: Vec<String>,

    /// Treat every input as this format instead of going by file extension
    #[arg(long)]
    pub format: Option<InputFormat>,
}

/// Expands each pattern in order. Matches within one pattern are sorted; a file matched twice is
/// loaded once.
pub fn resolve_inputs(patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    for pattern in patterns {
        let mut matched: Vec<PathBuf> = glob::glob(pattern)
            .with_context(|| format!("invalid input pattern '{pattern}'"))?
            .filter_map(|entry| match entry {
                Ok(path) => Some(path),
                Err(e) => {
                    warn!(error = %e, "skipping unreadable path");
                    None
                }
            })
            .filter(|path| path.is_file())
            .collect();

        if matched.is_empty() {
            bail!("no input files match '{pattern}'");
        }
        matched.sort();
        paths.extend(matched);
    }

    let mut seen = HashSet::new();
    paths.retain(|path| seen.insert(path.clone()));
    Ok(paths)
}

pub fn load_input(args: &InputArgs) -> Result<LoadedLog> {
    let paths = resolve_inputs(&args.inputs)?;
    let log = load_event_logs(&paths, args.format).context("failed to load event logs")?;
    info!(
        files = paths.len(),
        records = log.records.len(),
        fingerprint = %log.fingerprint,
        "loaded input"
    );
    Ok(log)
}

pub fn load_config(explicit: Option<&Path>) -> Result<PipelineConfig> {
    let path = explicit
        .map(Path::to_path_buf)
        .or_else(|| env::var_os(CONFIG_ENV).map(PathBuf::from));

    match path {
        Some(path) => PipelineConfig::load(&path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(PipelineConfig::default()),
    }
}
