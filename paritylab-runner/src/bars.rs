//! Bar CSV loading.
//!
//! Input files are plain CSV with a header row of
//! `timestamp,open,high,low,close,volume`. Timestamps accept RFC 3339 or the
//! space-separated forms `YYYY-MM-DD HH:MM[:SS]` and must be strictly
//! increasing. Indexes are assigned in file order starting at zero, and a
//! BLAKE3 dataset hash is computed at load so that identical files map to
//! identical run identities.

use chrono::{DateTime, NaiveDateTime};
use paritylab_core::domain::Bar;
use paritylab_core::fingerprint::{hash_dataset, DatasetHash};
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from the bar loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("row {row}: unrecognized timestamp '{value}'")]
    Timestamp { row: usize, value: String },

    #[error("row {row}: {details}")]
    MalformedBar { row: usize, details: String },

    #[error("row {row}: timestamp {current} does not advance past {previous}")]
    OutOfOrder {
        row: usize,
        current: NaiveDateTime,
        previous: NaiveDateTime,
    },

    #[error("no data rows found")]
    Empty,
}

/// One raw CSV record before timestamp parsing and sanity checks.
#[derive(Debug, Deserialize)]
struct RawBarRow {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    #[serde(default)]
    volume: f64,
}

/// A validated bar series plus its content fingerprint.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedBars {
    pub bars: Vec<Bar>,
    pub dataset_hash: DatasetHash,
}

/// Load bars from a CSV file on disk.
pub fn load_bars_csv(path: &Path) -> Result<LoadedBars, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_bars(file)
}

/// Read bars from any CSV source.
///
/// Row numbers in errors are 1-based file lines, counting the header.
pub fn read_bars<R: Read>(reader: R) -> Result<LoadedBars, LoadError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut bars: Vec<Bar> = Vec::new();
    let mut previous: Option<NaiveDateTime> = None;

    for (i, record) in csv_reader.deserialize::<RawBarRow>().enumerate() {
        let row = i + 2;
        let raw = record?;
        let timestamp =
            parse_timestamp(&raw.timestamp).ok_or_else(|| LoadError::Timestamp {
                row,
                value: raw.timestamp.clone(),
            })?;
        if let Some(prev) = previous {
            if timestamp <= prev {
                return Err(LoadError::OutOfOrder {
                    row,
                    current: timestamp,
                    previous: prev,
                });
            }
        }
        let bar = Bar {
            index: bars.len() as u64,
            timestamp,
            open: raw.open,
            high: raw.high,
            low: raw.low,
            close: raw.close,
            volume: raw.volume,
        };
        if !bar.is_sane() {
            return Err(LoadError::MalformedBar {
                row,
                details: "OHLC values out of order, non-positive, or non-finite".into(),
            });
        }
        previous = Some(timestamp);
        bars.push(bar);
    }

    if bars.is_empty() {
        return Err(LoadError::Empty);
    }

    let dataset_hash = hash_dataset(&bars);
    Ok(LoadedBars { bars, dataset_hash })
}

/// Parse a bar timestamp. RFC 3339 values are converted to naive UTC.
fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt);
        }
    }
    None
}
