use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::KpiConfig;
use crate::metrics::{OrderMetrics, Segment};

/// Bucket for orders whose grouping attribute is absent.
pub const UNKNOWN_GROUP: &str = "UNKNOWN";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateKpiReport {
    pub total_orders: usize,
    pub completed_orders: usize,
    pub completion_rate: f64,
    /// Mean lead time of completed orders in whole seconds; `None` when nothing completed.
    pub average_lead_time: Option<i64>,
    pub delayed_order_rate: f64,
    pub bottleneck_top: Vec<BottleneckShare>,
    pub by_group: BTreeMap<String, GroupKpi>,
    pub data_quality: DataQuality,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BottleneckShare {
    pub segment: Segment,
    /// Share of completed orders whose longest segment is this one.
    pub ratio: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupKpi {
    pub total_orders: usize,
    pub completed_orders: usize,
    pub average_lead_time: Option<i64>,
    pub delayed_order_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataQuality {
    pub total_orders: usize,
    pub completed_orders: usize,
    pub completion_rate: f64,
    pub missing_rate: f64,
    pub duplicate_types_rate: f64,
    pub out_of_order_rate: f64,
}

/// Aggregates with the grouping attribute selected in `config.group_by`.
pub fn aggregate(metrics: &[OrderMetrics], config: &KpiConfig) -> AggregateKpiReport {
    let dimension = config.group_by;
    aggregate_by(metrics, config, |m| dimension.key_of(m))
}

/// Aggregates, grouping orders by an arbitrary key. `config.group_by` is ignored here.
pub fn aggregate_by<F>(metrics: &[OrderMetrics], config: &KpiConfig, key_fn: F) -> AggregateKpiReport
where
    F: Fn(&OrderMetrics) -> Option<String>,
{
    let total_orders = metrics.len();
    let completed: Vec<&OrderMetrics> = metrics
        .iter()
        .filter(|m| m.total_lead_time.is_some())
        .collect();
    let completed_orders = completed.len();

    let lead_times: Vec<i64> = completed.iter().filter_map(|m| m.total_lead_time).collect();
    let delayed = count_delayed(&lead_times, config.sla_seconds);

    let completion_rate = ratio(completed_orders, total_orders);

    let data_quality = DataQuality {
        total_orders,
        completed_orders,
        completion_rate,
        missing_rate: ratio(metrics.iter().filter(|m| m.has_missing).count(), total_orders),
        duplicate_types_rate: ratio(
            metrics.iter().filter(|m| m.has_duplicate_types).count(),
            total_orders,
        ),
        out_of_order_rate: ratio(
            metrics.iter().filter(|m| m.has_out_of_order).count(),
            total_orders,
        ),
    };

    AggregateKpiReport {
        total_orders,
        completed_orders,
        completion_rate,
        average_lead_time: average(&lead_times),
        delayed_order_rate: ratio(delayed, completed_orders),
        bottleneck_top: rank_bottlenecks(&completed, config.top_n),
        by_group: group_kpis(metrics, config.sla_seconds, key_fn),
        data_quality,
    }
}

fn rank_bottlenecks(completed: &[&OrderMetrics], top_n: usize) -> Vec<BottleneckShare> {
    // First-seen order is the tie-break for equal counts, so keep insertion order.
    let mut counts: Vec<(Segment, usize)> = Vec::new();
    for segment in completed.iter().filter_map(|m| m.dominant_bottleneck()) {
        match counts.iter_mut().find(|(seen, _)| *seen == segment) {
            Some((_, count)) => *count += 1,
            None => counts.push((segment, 1)),
        }
    }

    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .into_iter()
        .take(top_n)
        .map(|(segment, count)| BottleneckShare {
            segment,
            ratio: ratio(count, completed.len()),
        })
        .collect()
}

fn group_kpis<F>(metrics: &[OrderMetrics], sla_seconds: i64, key_fn: F) -> BTreeMap<String, GroupKpi>
where
    F: Fn(&OrderMetrics) -> Option<String>,
{
    let mut buckets: BTreeMap<String, Vec<&OrderMetrics>> = BTreeMap::new();
    for m in metrics {
        let key = key_fn(m).unwrap_or_else(|| UNKNOWN_GROUP.to_string());
        buckets.entry(key).or_default().push(m);
    }

    buckets
        .into_iter()
        .map(|(key, members)| {
            let lead_times: Vec<i64> = members.iter().filter_map(|m| m.total_lead_time).collect();
            let kpi = GroupKpi {
                total_orders: members.len(),
                completed_orders: lead_times.len(),
                average_lead_time: average(&lead_times),
                delayed_order_rate: ratio(count_delayed(&lead_times, sla_seconds), lead_times.len()),
            };
            (key, kpi)
        })
        .collect()
}

fn count_delayed(lead_times: &[i64], sla_seconds: i64) -> usize {
    lead_times.iter().filter(|&&lead| lead > sla_seconds).count()
}

/// `part / total` rounded to two decimals; zero when `total` is zero.
pub fn ratio(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (part as f64 / total as f64 * 100.0).round() / 100.0
}

/// Mean rounded half-up to a whole second.
pub fn average(values: &[i64]) -> Option<i64> {
    if values.is_empty() {
        return None;
    }
    let sum: i64 = values.iter().sum();
    let mean = sum as f64 / values.len() as f64;
    Some((mean + 0.5).floor() as i64)
}
