// crates/ordertrail/src/commands/timelines.rs

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use ordertrail_core::{run_pipeline, OrderMetrics, OrderTimeline};
use serde::Serialize;
use tracing::info;

use super::input::{load_config, load_input, InputArgs};

#[derive(Args, Debug)]
pub struct TimelinesArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Only emit these order ids (repeatable)
    #[arg(long = "order")]
    pub orders: Vec<String>,

    /// Only emit orders with at least one data-quality anomaly
    #[arg(long)]
    pub anomalous: bool,

    /// Write JSON here instead of stdout
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(Serialize)]
struct TimelineView<'a> {
    timeline: &'a OrderTimeline,
    metrics: &'a OrderMetrics,
}

pub fn handle_timelines(args: TimelinesArgs, config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let log = load_input(&args.input)?;
    let output = run_pipeline(&log.records, &config).context("pipeline run failed")?;

    let views: Vec<TimelineView> = output
        .timelines
        .iter()
        .zip(&output.metrics)
        .filter(|(timeline, _)| args.orders.is_empty() || args.orders.contains(&timeline.order_id))
        .filter(|(timeline, _)| !args.anomalous || timeline.anomalies.any())
        .map(|(timeline, metrics)| TimelineView { timeline, metrics })
        .collect();

    let json = serde_json::to_string_pretty(&views).context("failed to encode timelines")?;
    match &args.out {
        Some(path) => {
            fs::write(path, &json).with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), orders = views.len(), "wrote timelines");
        }
        None => println!("{json}"),
    }

    Ok(())
}
