pub mod aggregate;
pub mod config;
pub mod error;
pub mod loader;
pub mod metrics;
pub mod model;
pub mod normalize;
pub mod outputs;
pub mod pipeline;
pub mod timeline;

pub use aggregate::{aggregate, aggregate_by, AggregateKpiReport, BottleneckShare, DataQuality, GroupKpi};
pub use config::{GroupDimension, KpiConfig, PipelineConfig, TimelineRules};
pub use error::{PipelineError, Result};
pub use loader::{load_event_log, load_event_logs, InputFormat, LoadedLog};
pub use metrics::{extract_metrics, OrderMetrics, Segment, SegmentDuration};
pub use model::{stages, Dimensions, NormalizedEvent, RawEvent};
pub use normalize::{normalize, normalize_batch, DropReason, NormalizationSummary};
pub use outputs::{metrics_frame, write_table, TableFormat};
pub use pipeline::{run_pipeline, PipelineOutput};
pub use timeline::{build_timelines, Anomalies, OrderTimeline, TimelineStatus};
