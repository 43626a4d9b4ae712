use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use ordertrail_core::{AggregateKpiReport, GroupDimension, NormalizationSummary};

pub fn print_report(
    normalization: &NormalizationSummary,
    report: &AggregateKpiReport,
    dimension: GroupDimension,
) {
    println!("{}", headline_table(normalization, report));
    println!("{}", bottleneck_table(report));
    println!("{}", group_table(report, dimension));
}

fn new_table(header: Vec<String>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

pub fn headline_table(normalization: &NormalizationSummary, report: &AggregateKpiReport) -> Table {
    let mut table = new_table(vec!["Metric".to_string(), "Value".to_string()]);
    let quality = &report.data_quality;

    let mut rows = vec![
        ("Raw records", normalization.total.to_string()),
        ("Accepted records", normalization.accepted.to_string()),
    ];
    for (reason, count) in &normalization.dropped {
        rows.push((reason.as_str(), count.to_string()));
    }
    rows.extend([
        ("Orders", report.total_orders.to_string()),
        ("Completed orders", report.completed_orders.to_string()),
        ("Completion rate", percent(report.completion_rate)),
        ("Average lead time", duration(report.average_lead_time)),
        ("Delayed order rate", percent(report.delayed_order_rate)),
        ("Missing stage rate", percent(quality.missing_rate)),
        ("Duplicate type rate", percent(quality.duplicate_types_rate)),
        ("Out of order rate", percent(quality.out_of_order_rate)),
    ]);

    for (label, value) in rows {
        table.add_row(vec![label.to_string(), value]);
    }
    table
}

pub fn bottleneck_table(report: &AggregateKpiReport) -> Table {
    let mut table = new_table(vec!["Bottleneck".to_string(), "Share of completed".to_string()]);
    for share in &report.bottleneck_top {
        table.add_row(vec![share.segment.to_string(), percent(share.ratio)]);
    }
    table
}

pub fn group_table(report: &AggregateKpiReport, dimension: GroupDimension) -> Table {
    let mut table = new_table(vec![
        dimension.to_string(),
        "Orders".to_string(),
        "Completed".to_string(),
        "Avg lead time".to_string(),
        "Delayed".to_string(),
    ]);
    for (key, kpi) in &report.by_group {
        table.add_row(vec![
            key.clone(),
            kpi.total_orders.to_string(),
            kpi.completed_orders.to_string(),
            duration(kpi.average_lead_time),
            percent(kpi.delayed_order_rate),
        ]);
    }
    table
}

fn percent(rate: f64) -> String {
    format!("{:.0}%", rate * 100.0)
}

fn duration(seconds: Option<i64>) -> String {
    match seconds {
        None => "-".to_string(),
        Some(secs) => {
            let sign = if secs < 0 { "-" } else { "" };
            let secs = secs.unsigned_abs();
            format!("{sign}{}m {:02}s", secs / 60, secs % 60)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ordertrail_core::{aggregate, KpiConfig};

    #[test]
    fn durations_render_minutes_and_seconds() {
        assert_eq!(duration(None), "-");
        assert_eq!(duration(Some(2400)), "40m 00s");
        assert_eq!(duration(Some(61)), "1m 01s");
        assert_eq!(duration(Some(-90)), "-1m 30s");
    }

    #[test]
    fn percentages_are_whole_numbers() {
        assert_eq!(percent(0.67), "67%");
        assert_eq!(percent(0.0), "0%");
        assert_eq!(percent(1.0), "100%");
    }

    #[test]
    fn empty_report_still_renders() {
        let report = aggregate(&[], &KpiConfig::default());
        let normalization = NormalizationSummary::default();

        assert_eq!(headline_table(&normalization, &report).row_iter().count(), 10);
        assert_eq!(bottleneck_table(&report).row_iter().count(), 0);
        assert_eq!(group_table(&report, GroupDimension::Region).row_iter().count(), 0);
    }
}
