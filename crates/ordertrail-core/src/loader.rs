use std::fmt;
use std::io::{Error as IoError, ErrorKind};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use blake3::Hasher;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{PipelineError, Result};
use crate::model::RawEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// One JSON object per line.
    Jsonl,
    /// Header row followed by one event per row.
    Csv,
}

impl InputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputFormat::Jsonl => "jsonl",
            InputFormat::Csv => "csv",
        }
    }

    /// Infers the format from the file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        extension.parse()
    }
}

impl fmt::Display for InputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InputFormat {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jsonl" | "ndjson" => Ok(InputFormat::Jsonl),
            "csv" => Ok(InputFormat::Csv),
            other => Err(PipelineError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Raw records read from one or more files, plus a fingerprint of the bytes they came from.
#[derive(Debug, Clone, Default)]
pub struct LoadedLog {
    pub records: Vec<RawEvent>,
    pub sources: Vec<PathBuf>,
    /// blake3 over every input file's bytes, in load order.
    pub fingerprint: String,
}

pub fn load_event_log(path: &Path, format: InputFormat) -> Result<LoadedLog> {
    load_event_logs(&[path.to_path_buf()], Some(format))
}

/// Loads and concatenates several files. Without an explicit format each file's extension
/// decides; any unsupported format fails the whole load before records are returned.
pub fn load_event_logs(paths: &[PathBuf], format: Option<InputFormat>) -> Result<LoadedLog> {
    let formats = paths
        .iter()
        .map(|path| match format {
            Some(format) => Ok(format),
            None => InputFormat::from_path(path),
        })
        .collect::<Result<Vec<_>>>()?;

    let mut hasher = Hasher::new();
    let mut records = Vec::new();

    for (path, format) in paths.iter().zip(formats) {
        let bytes = std::fs::read(path).map_err(|err| PipelineError::io(path, err))?;
        hasher.update(&bytes);

        let parsed = match format {
            InputFormat::Jsonl => {
                let text = std::str::from_utf8(&bytes).map_err(|err| {
                    PipelineError::io(path, IoError::new(ErrorKind::InvalidData, err))
                })?;
                parse_jsonl(text)?
            }
            InputFormat::Csv => parse_csv(&bytes)?,
        };
        debug!(path = %path.display(), format = %format, records = parsed.len(), "loaded event log");
        records.extend(parsed);
    }

    Ok(LoadedLog {
        records,
        sources: paths.to_vec(),
        fingerprint: hasher.finalize().to_hex().to_string(),
    })
}

/// Blank lines are skipped; any other line must be a JSON object.
pub fn parse_jsonl(content: &str) -> Result<Vec<RawEvent>> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(idx, line)| {
            serde_json::from_str::<RawEvent>(line.trim())
                .map_err(|source| PipelineError::JsonLine {
                    line: idx + 1,
                    source,
                })
        })
        .collect()
}

/// Empty cells are treated as absent fields. `meta` cells holding JSON are decoded.
pub fn parse_csv(content: &[u8]) -> Result<Vec<RawEvent>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(content);
    let headers = reader.headers()?.clone();

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let mut fields = Map::new();
        for (header, cell) in headers.iter().zip(row.iter()) {
            if cell.is_empty() {
                continue;
            }
            let value = if header == "meta" {
                serde_json::from_str(cell).unwrap_or_else(|_| Value::String(cell.to_string()))
            } else {
                Value::String(cell.to_string())
            };
            fields.insert(header.to_string(), value);
        }
        records.push(serde_json::from_value(Value::Object(fields))?);
    }

    Ok(records)
}
