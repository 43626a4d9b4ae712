use rayon::prelude::*;
use tracing::info;

use crate::aggregate::{aggregate, AggregateKpiReport};
use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::metrics::{extract_metrics, OrderMetrics};
use crate::model::RawEvent;
use crate::normalize::{normalize_batch, NormalizationSummary};
use crate::timeline::{build_timelines, OrderTimeline};

/// Everything one batch run produces, stage by stage.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub normalization: NormalizationSummary,
    pub timelines: Vec<OrderTimeline>,
    pub metrics: Vec<OrderMetrics>,
    pub report: AggregateKpiReport,
}

/// Runs raw records through normalization, timeline reconstruction, metric extraction and KPI
/// aggregation. Aggregation only starts once every order's metrics exist.
pub fn run_pipeline(raws: &[RawEvent], config: &PipelineConfig) -> Result<PipelineOutput> {
    if raws.len() > config.max_events {
        return Err(PipelineError::BatchTooLarge {
            limit: config.max_events,
            actual: raws.len(),
        });
    }

    config.timeline.validate()?;

    let (events, normalization) = normalize_batch(raws);
    let timelines = build_timelines(&events, &config.timeline);
    let metrics: Vec<OrderMetrics> = timelines
        .par_iter()
        .map(|timeline| extract_metrics(timeline, &config.timeline))
        .collect();
    let report = aggregate(&metrics, &config.kpi);

    info!(
        records = normalization.total,
        dropped = normalization.dropped_total(),
        orders = report.total_orders,
        completed = report.completed_orders,
        "pipeline run complete"
    );

    Ok(PipelineOutput {
        normalization,
        timelines,
        metrics,
        report,
    })
}
