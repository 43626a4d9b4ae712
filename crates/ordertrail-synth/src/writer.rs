use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use ordertrail_core::InputFormat;

use crate::error::{Result, SynthError};
use crate::generator::GeneratedEvent;

const CSV_HEADER: [&str; 9] = [
    "event_id",
    "order_id",
    "event_type",
    "event_time",
    "store_id",
    "region",
    "rider_id",
    "platform",
    "meta",
];

/// One JSON object per line, no trailing newline after the last record.
pub fn write_jsonl<W: Write>(events: &[GeneratedEvent], mut out: W) -> Result<()> {
    for (idx, event) in events.iter().enumerate() {
        if idx > 0 {
            out.write_all(b"\n")?;
        }
        serde_json::to_writer(&mut out, event)?;
    }
    out.flush()?;
    Ok(())
}

/// Header row plus one row per event; `meta` is embedded as a JSON string and an absent rider
/// is an empty cell.
pub fn write_csv<W: Write>(events: &[GeneratedEvent], out: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(CSV_HEADER)?;
    for event in events {
        let meta = serde_json::to_string(&event.meta)?;
        writer.write_record([
            event.event_id.as_str(),
            event.order_id.as_str(),
            event.event_type.as_str(),
            event.event_time.as_str(),
            event.store_id.as_str(),
            event.region.as_str(),
            event.rider_id.as_deref().unwrap_or_default(),
            event.platform.as_str(),
            meta.as_str(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes to `path`, creating parent directories as needed.
pub fn write_events(events: &[GeneratedEvent], path: &Path, format: InputFormat) -> Result<()> {
    let io_err = |source| SynthError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    let file = BufWriter::new(File::create(path).map_err(io_err)?);
    match format {
        InputFormat::Jsonl => write_jsonl(events, file),
        InputFormat::Csv => write_csv(events, file),
    }
}
