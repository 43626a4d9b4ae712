use ordertrail_core::{load_event_log, run_pipeline, InputFormat, PipelineConfig};
use ordertrail_synth::{generate, write_events, GeneratorConfig};
use tempfile::tempdir;

fn clean(count: usize) -> GeneratorConfig {
    GeneratorConfig {
        count,
        seed: 2025,
        missing_rate: 0.0,
        duplicate_rate: 0.0,
        shuffle_rate: 0.0,
        ..GeneratorConfig::default()
    }
}

#[test]
fn clean_log_completes_every_order() {
    let dir = tempdir().expect("tempdir");
    let events = generate(&clean(40)).expect("generate");

    for format in [InputFormat::Jsonl, InputFormat::Csv] {
        let path = dir.path().join(format!("event_log.{format}"));
        write_events(&events, &path, format).expect("write");

        let log = load_event_log(&path, format).expect("load");
        assert_eq!(log.records.len(), 40 * 7);

        let output = run_pipeline(&log.records, &PipelineConfig::default()).expect("run");
        assert_eq!(output.normalization.accepted, 40 * 7);

        let report = output.report;
        assert_eq!(report.total_orders, 40);
        assert_eq!(report.completed_orders, 40);
        assert_eq!(report.completion_rate, 1.0);
        assert_eq!(report.data_quality.missing_rate, 0.0);
        assert_eq!(report.data_quality.duplicate_types_rate, 0.0);
        assert_eq!(report.data_quality.out_of_order_rate, 0.0);
        assert!(report.average_lead_time.is_some_and(|lead| lead > 0));
        assert!(!report.bottleneck_top.is_empty());

        let grouped: usize = report.by_group.values().map(|g| g.total_orders).sum();
        assert_eq!(grouped, 40);
        assert!(!report.by_group.contains_key("UNKNOWN"));
    }
}

#[test]
fn anomalies_surface_in_data_quality() {
    let dir = tempdir().expect("tempdir");
    let config = GeneratorConfig {
        missing_rate: 1.0,
        duplicate_rate: 0.0,
        shuffle_rate: 1.0,
        ..clean(30)
    };
    let path = dir.path().join("nested").join("event_log.jsonl");
    write_events(&generate(&config).expect("generate"), &path, InputFormat::Jsonl)
        .expect("write");

    let log = load_event_log(&path, InputFormat::Jsonl).expect("load");
    let report = run_pipeline(&log.records, &PipelineConfig::default())
        .expect("run")
        .report;

    assert_eq!(report.total_orders, 30);
    assert_eq!(report.data_quality.missing_rate, 1.0);
    assert!(report.data_quality.out_of_order_rate > 0.0);
}
