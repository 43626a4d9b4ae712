// crates/ordertrail-synth/src/error.rs

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SynthError {
    #[error("File I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Write error: {0}")]
    Write(#[from] std::io::Error),

    #[error("JSON encoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV encoding error: {0}")]
    Csv(#[from] csv::Error),

    #[error("{name} must be within 0.0..=1.0, got {value}")]
    InvalidRate { name: &'static str, value: f64 },

    #[error("No Seoul local time for 2025-12-{day:02} {hour:02}:{minute:02}:{second:02}")]
    InvalidTime {
        day: u32,
        hour: u32,
        minute: u32,
        second: u32,
    },
}

pub type Result<T> = std::result::Result<T, SynthError>;
