// crates/ordertrail/src/commands/report.rs

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use ordertrail_core::{
    metrics_frame, run_pipeline, write_table, AggregateKpiReport, GroupDimension,
    NormalizationSummary, PipelineConfig, TableFormat,
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use super::input::{load_config, load_input, InputArgs};
use super::summary;

#[derive(Args, Debug)]
pub struct ReportArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Lead time in seconds above which a completed order counts as delayed
    #[arg(long)]
    pub sla_seconds: Option<i64>,

    /// Breakdown dimension: region, store, rider, platform or created_hour
    #[arg(long)]
    pub group_by: Option<GroupDimension>,

    /// Number of bottleneck segments to report
    #[arg(long)]
    pub top_n: Option<usize>,

    /// Reject batches with more raw records than this
    #[arg(long)]
    pub max_events: Option<usize>,

    /// Write the run JSON here instead of stdout
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Write per-order metrics as a .csv or .parquet table
    #[arg(long)]
    pub metrics_out: Option<PathBuf>,

    /// Print summary tables on stdout instead of JSON
    #[arg(long)]
    pub table: bool,
}

impl ReportArgs {
    fn apply_overrides(&self, config: &mut PipelineConfig) {
        if let Some(sla) = self.sla_seconds {
            config.kpi.sla_seconds = sla;
        }
        if let Some(dimension) = self.group_by {
            config.kpi.group_by = dimension;
        }
        if let Some(top_n) = self.top_n {
            config.kpi.top_n = top_n;
        }
        if let Some(max_events) = self.max_events {
            config.max_events = max_events;
        }
    }
}

/// The JSON document one `report` run emits.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RunEnvelope<'a> {
    run_id: Uuid,
    generated_at: DateTime<Utc>,
    input_fingerprint: &'a str,
    sources: &'a [PathBuf],
    config: &'a PipelineConfig,
    normalization: &'a NormalizationSummary,
    report: &'a AggregateKpiReport,
}

pub fn handle_report(args: ReportArgs, config_path: Option<&Path>) -> Result<()> {
    let mut config = load_config(config_path)?;
    args.apply_overrides(&mut config);

    let log = load_input(&args.input)?;
    let output = run_pipeline(&log.records, &config).context("pipeline run failed")?;

    let envelope = RunEnvelope {
        run_id: Uuid::new_v4(),
        generated_at: Utc::now(),
        input_fingerprint: &log.fingerprint,
        sources: &log.sources,
        config: &config,
        normalization: &output.normalization,
        report: &output.report,
    };
    let json = serde_json::to_string_pretty(&envelope).context("failed to encode report")?;

    if let Some(path) = &args.metrics_out {
        let format = TableFormat::from_path(path)?;
        let mut df = metrics_frame(&output.metrics).context("failed to build metrics table")?;
        write_table(&mut df, path, format)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), rows = df.height(), "wrote per-order metrics");
    }

    match &args.out {
        Some(path) => {
            fs::write(path, &json).with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), run_id = %envelope.run_id, "wrote report");
        }
        None if !args.table => println!("{json}"),
        None => {}
    }

    if args.table {
        summary::print_report(&output.normalization, &output.report, config.kpi.group_by);
    }

    Ok(())
}
