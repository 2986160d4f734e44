//! Reference trade-export parsing.
//!
//! Reads the trade-list CSV exported alongside a reference strategy run and
//! reduces it to completed round trips. Each trade arrives as an entry row
//! and an exit row sharing a trade number. Groups missing either half are
//! dropped, as are trades whose exit row is marked `Open` (the position was
//! still live when the export was taken). Malformed rows are skipped with a
//! warning instead of aborting the whole parse; an export with zero
//! completed trades is an error.

use chrono::{Duration, NaiveDateTime};
use paritylab_core::domain::TradeSide;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

const COL_TRADE_NUMBER: &str = "Trade #";
const COL_TYPE: &str = "Type";
const COL_SIGNAL: &str = "Signal";
const COL_DATE_TIME: &str = "Date and time";
const COL_PRICE: &str = "Price USDT";
const COL_NET_PNL: &str = "Net P&L USDT";

/// Timestamp format used by reference exports.
const REFERENCE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Errors from the reference parsing layer.
#[derive(Debug, Error)]
pub enum ReferenceError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing required column '{0}'")]
    MissingColumn(&'static str),

    #[error("no completed trades in reference export")]
    NoTrades,
}

/// One completed round trip from the reference export, already reduced to
/// the fields the matcher compares.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceTrade {
    pub trade_number: u32,
    pub side: TradeSide,
    pub entry_timestamp: NaiveDateTime,
    pub entry_price: f64,
    pub exit_timestamp: NaiveDateTime,
    pub exit_price: f64,
    pub net_pnl: f64,
}

/// Parse output: completed trades plus everything that was dropped on the
/// way, so validation summaries can account for every input row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceReport {
    pub trades: Vec<ReferenceTrade>,
    pub skipped_rows: usize,
    pub incomplete_groups: usize,
    pub open_trades_skipped: usize,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone)]
struct RowData {
    line: usize,
    type_text: String,
    signal: String,
    timestamp_text: String,
    price_text: String,
    pnl_text: String,
}

#[derive(Debug, Default)]
struct TradeRows {
    entry: Option<RowData>,
    exit: Option<RowData>,
}

/// Load a reference export from disk, shifting timestamps to UTC.
///
/// `utc_offset_hours` is the exchange display offset the export was taken
/// under; it is subtracted from every timestamp. Zero leaves them untouched.
pub fn load_reference_csv(
    path: &Path,
    utc_offset_hours: f64,
) -> Result<ReferenceReport, ReferenceError> {
    let file = File::open(path).map_err(|source| ReferenceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut report = read_reference(file)?;
    normalize_to_utc(&mut report.trades, utc_offset_hours);
    Ok(report)
}

/// Parse a reference export from any CSV source. Timestamps are returned
/// as exported; see [`normalize_to_utc`].
pub fn read_reference<R: Read>(reader: R) -> Result<ReferenceReport, ReferenceError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(reader);

    let headers = strip_bom(csv_reader.headers()?);
    let col_trade = require_column(&headers, COL_TRADE_NUMBER)?;
    let col_type = require_column(&headers, COL_TYPE)?;
    let col_time = require_column(&headers, COL_DATE_TIME)?;
    let col_price = require_column(&headers, COL_PRICE)?;
    let col_signal = find_column(&headers, COL_SIGNAL);
    let col_pnl = find_column(&headers, COL_NET_PNL);

    let mut report = ReferenceReport::default();
    let mut groups: BTreeMap<u32, TradeRows> = BTreeMap::new();

    for (i, record) in csv_reader.records().enumerate() {
        let line = i + 2;
        let record = record?;
        let field = |col: usize| record.get(col).unwrap_or("").trim().to_string();

        let number_text = field(col_trade);
        let Ok(number) = number_text.parse::<u32>() else {
            report
                .warnings
                .push(format!("row {line}: unreadable trade number '{number_text}'"));
            report.skipped_rows += 1;
            continue;
        };

        let row = RowData {
            line,
            type_text: field(col_type),
            signal: col_signal.map(field).unwrap_or_default(),
            timestamp_text: field(col_time),
            price_text: field(col_price),
            pnl_text: col_pnl.map(field).unwrap_or_else(|| "0".to_string()),
        };

        let lower = row.type_text.to_lowercase();
        if lower.starts_with("entry") {
            groups.entry(number).or_default().entry = Some(row);
        } else if lower.starts_with("exit") {
            groups.entry(number).or_default().exit = Some(row);
        } else {
            report
                .warnings
                .push(format!("row {line}: unrecognized row type '{}'", row.type_text));
            report.skipped_rows += 1;
        }
    }

    for (number, rows) in groups {
        let (Some(entry), Some(exit)) = (rows.entry, rows.exit) else {
            report
                .warnings
                .push(format!("trade {number}: missing entry or exit row, skipped"));
            report.incomplete_groups += 1;
            continue;
        };

        // An exit row whose signal is `Open` marks a position that was
        // still live when the export was taken.
        if exit.signal.eq_ignore_ascii_case("open") {
            report.open_trades_skipped += 1;
            continue;
        }

        let side = if entry.type_text.to_lowercase().contains("long") {
            TradeSide::Long
        } else {
            TradeSide::Short
        };

        let Some(entry_timestamp) = parse_reference_timestamp(&entry.timestamp_text) else {
            skip_row(&mut report, entry.line, "timestamp", &entry.timestamp_text);
            continue;
        };
        let Some(exit_timestamp) = parse_reference_timestamp(&exit.timestamp_text) else {
            skip_row(&mut report, exit.line, "timestamp", &exit.timestamp_text);
            continue;
        };
        let Some(entry_price) = parse_reference_number(&entry.price_text) else {
            skip_row(&mut report, entry.line, "price", &entry.price_text);
            continue;
        };
        let Some(exit_price) = parse_reference_number(&exit.price_text) else {
            skip_row(&mut report, exit.line, "price", &exit.price_text);
            continue;
        };
        let Some(net_pnl) = parse_reference_number(&exit.pnl_text) else {
            skip_row(&mut report, exit.line, "net P&L", &exit.pnl_text);
            continue;
        };

        report.trades.push(ReferenceTrade {
            trade_number: number,
            side,
            entry_timestamp,
            entry_price,
            exit_timestamp,
            exit_price,
            net_pnl,
        });
    }

    if report.trades.is_empty() {
        return Err(ReferenceError::NoTrades);
    }
    Ok(report)
}

/// Shift reference timestamps from the export's display offset to UTC.
pub fn normalize_to_utc(trades: &mut [ReferenceTrade], utc_offset_hours: f64) {
    if utc_offset_hours == 0.0 {
        return;
    }
    let offset = Duration::seconds((utc_offset_hours * 3600.0).round() as i64);
    for trade in trades {
        trade.entry_timestamp -= offset;
        trade.exit_timestamp -= offset;
    }
}

fn skip_row(report: &mut ReferenceReport, line: usize, what: &str, value: &str) {
    report
        .warnings
        .push(format!("row {line}: unreadable {what} '{value}'"));
    report.skipped_rows += 1;
}

/// Export headers may carry a UTF-8 BOM glued to the first column name.
fn strip_bom(headers: &csv::StringRecord) -> csv::StringRecord {
    let mut cleaned = csv::StringRecord::new();
    for (i, field) in headers.iter().enumerate() {
        if i == 0 {
            cleaned.push_field(field.trim_start_matches('\u{feff}').trim());
        } else {
            cleaned.push_field(field.trim());
        }
    }
    cleaned
}

fn require_column(
    headers: &csv::StringRecord,
    name: &'static str,
) -> Result<usize, ReferenceError> {
    find_column(headers, name).ok_or(ReferenceError::MissingColumn(name))
}

fn find_column(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h == name)
}

fn parse_reference_timestamp(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, REFERENCE_TIME_FORMAT).ok()
}

/// Numbers in exports may carry thousands separators; an empty cell reads
/// as zero.
fn parse_reference_number(text: &str) -> Option<f64> {
    let cleaned = text.trim().replace(',', "");
    if cleaned.is_empty() {
        return Some(0.0);
    }
    cleaned.parse::<f64>().ok()
}
