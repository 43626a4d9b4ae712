use std::fs::File;
use std::path::Path;

use polars::io::parquet::write::{ParquetCompression, ParquetWriter, StatisticsOptions};
use polars::prelude::{Column, CsvWriter, DataFrame, NamedFrom, PolarsResult, SerWriter, Series};

use crate::error::{PipelineError, Result};
use crate::metrics::{OrderMetrics, Segment};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Parquet,
}

impl TableFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("csv") => Ok(TableFormat::Csv),
            Some("parquet") => Ok(TableFormat::Parquet),
            other => Err(PipelineError::UnsupportedFormat(
                other.unwrap_or_default().to_string(),
            )),
        }
    }
}

/// One row per order: identity, dimensions, completion, lead time, one `<segment>_s` column per
/// segment, anomaly flags and the dominant bottleneck.
pub fn metrics_frame(metrics: &[OrderMetrics]) -> PolarsResult<DataFrame> {
    let mut columns: Vec<Column> = vec![
        text_column("order_id", metrics, |m| Some(m.order_id.as_str())),
        text_column("region", metrics, |m| m.dimensions.region.as_deref()),
        text_column("store_id", metrics, |m| m.dimensions.store_id.as_deref()),
        text_column("rider_id", metrics, |m| m.dimensions.rider_id.as_deref()),
        text_column("platform", metrics, |m| m.dimensions.platform.as_deref()),
        flag_column("is_completed", metrics, |m| m.is_completed),
        seconds_column("total_lead_time_s", metrics, |m| m.total_lead_time),
    ];

    for segment in Segment::ALL {
        let name = format!("{}_s", segment.as_str().to_ascii_lowercase());
        columns.push(seconds_column(&name, metrics, |m| m.segment(segment)));
    }

    columns.push(flag_column("has_missing", metrics, |m| m.has_missing));
    columns.push(flag_column("has_duplicate_types", metrics, |m| m.has_duplicate_types));
    columns.push(flag_column("has_out_of_order", metrics, |m| m.has_out_of_order));
    columns.push(text_column("bottleneck", metrics, |m| {
        m.dominant_bottleneck().map(|segment| segment.as_str())
    }));

    DataFrame::new(columns)
}

fn text_column(
    name: &str,
    metrics: &[OrderMetrics],
    value: impl Fn(&OrderMetrics) -> Option<&str>,
) -> Column {
    let values: Vec<Option<&str>> = metrics.iter().map(value).collect();
    Series::new(name.into(), values).into()
}

fn seconds_column(
    name: &str,
    metrics: &[OrderMetrics],
    value: impl Fn(&OrderMetrics) -> Option<i64>,
) -> Column {
    let values: Vec<Option<i64>> = metrics.iter().map(value).collect();
    Series::new(name.into(), values).into()
}

fn flag_column(name: &str, metrics: &[OrderMetrics], value: impl Fn(&OrderMetrics) -> bool) -> Column {
    let values: Vec<bool> = metrics.iter().map(value).collect();
    Series::new(name.into(), values).into()
}

pub fn write_table(df: &mut DataFrame, path: &Path, format: TableFormat) -> Result<()> {
    let mut file = File::create(path).map_err(|err| PipelineError::io(path, err))?;
    match format {
        TableFormat::Csv => {
            CsvWriter::new(&mut file).include_header(true).finish(df)?;
        }
        TableFormat::Parquet => {
            ParquetWriter::new(&mut file)
                .with_compression(ParquetCompression::Zstd(None))
                .with_statistics(StatisticsOptions::default())
                .finish(df)?;
        }
    }
    Ok(())
}
