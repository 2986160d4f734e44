//! Artifact generation for runs and parity checks.
//!
//! Three export formats:
//! - **JSON**: full round-trip serialization with schema versioning
//! - **CSV**: trade tape, equity curve, and pair-by-pair match results
//! - **Markdown**: human-readable run and parity reports
//!
//! All persisted artifacts carry a `schema_version` field. Unknown versions
//! are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use paritylab_core::domain::Trade;
use paritylab_core::engine::EquityPoint;

use crate::matcher::{MatchReport, MatchResult};
use crate::runner::{BacktestResult, SCHEMA_VERSION};
use crate::validation::ValidationSummary;

/// Timestamp format in CSV artifacts. Matches the reference export format
/// so the files diff cleanly against each other.
const EXPORT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `BacktestResult` to pretty JSON.
pub fn export_json(result: &BacktestResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize BacktestResult to JSON")
}

/// Deserialize a `BacktestResult` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<BacktestResult> {
    let result: BacktestResult =
        serde_json::from_str(json).context("failed to deserialize BacktestResult from JSON")?;
    if result.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            result.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(result)
}

/// Serialize a `ValidationSummary` to pretty JSON.
pub fn export_validation_json(summary: &ValidationSummary) -> Result<String> {
    serde_json::to_string_pretty(summary).context("failed to serialize ValidationSummary to JSON")
}

/// Deserialize a `ValidationSummary` from JSON, rejecting unknown schema
/// versions.
pub fn import_validation_json(json: &str) -> Result<ValidationSummary> {
    let summary: ValidationSummary =
        serde_json::from_str(json).context("failed to deserialize ValidationSummary from JSON")?;
    if summary.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            summary.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(summary)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Export a trade list as CSV.
///
/// Columns: side, quantity, entry_timestamp, entry_price, exit_timestamp,
/// exit_price, entry_reason, exit_reason, bars_held, gross_pnl, commission,
/// net_pnl
pub fn export_trades_csv(trades: &[Trade]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "side",
        "quantity",
        "entry_timestamp",
        "entry_price",
        "exit_timestamp",
        "exit_price",
        "entry_reason",
        "exit_reason",
        "bars_held",
        "gross_pnl",
        "commission",
        "net_pnl",
    ])?;

    for t in trades {
        wtr.write_record([
            t.side.as_str(),
            &format!("{:.6}", t.quantity),
            &t.entry_timestamp.format(EXPORT_TIME_FORMAT).to_string(),
            &format!("{:.6}", t.entry_price),
            &t.exit_timestamp.format(EXPORT_TIME_FORMAT).to_string(),
            &format!("{:.6}", t.exit_price),
            t.entry_reason.as_str(),
            t.exit_reason.as_str(),
            &t.bars_held.to_string(),
            &format!("{:.2}", t.gross_pnl),
            &format!("{:.2}", t.commission),
            &format!("{:.2}", t.net_pnl),
        ])?;
    }

    finish_csv(wtr)
}

/// Export an equity curve as CSV with one row per processed bar.
pub fn export_equity_csv(equity_curve: &[EquityPoint]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["bar_index", "timestamp", "cash", "unrealized_pnl", "equity"])?;
    for point in equity_curve {
        wtr.write_record([
            &point.bar_index.to_string(),
            &point.timestamp.format(EXPORT_TIME_FORMAT).to_string(),
            &format!("{:.2}", point.cash),
            &format!("{:.2}", point.unrealized_pnl),
            &format!("{:.2}", point.equity),
        ])?;
    }
    finish_csv(wtr)
}

/// Export graded match results as CSV, one row per pairing.
///
/// Rows with a missing half leave that half's columns empty, so the file
/// filters cleanly on the classification column.
pub fn export_pairs_csv(results: &[MatchResult]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "classification",
        "gen_side",
        "gen_entry_time",
        "gen_entry_price",
        "gen_exit_time",
        "gen_exit_price",
        "gen_net_pnl",
        "ref_trade",
        "ref_side",
        "ref_entry_time",
        "ref_entry_price",
        "ref_exit_time",
        "ref_exit_price",
        "ref_net_pnl",
        "time_delta_minutes",
        "price_delta",
        "pnl_delta",
    ])?;

    for r in results {
        let mut record: Vec<String> = vec![r.classification.as_str().to_string()];
        match &r.generated {
            Some(t) => record.extend([
                t.side.as_str().to_string(),
                t.entry_timestamp.format(EXPORT_TIME_FORMAT).to_string(),
                format!("{:.6}", t.entry_price),
                t.exit_timestamp.format(EXPORT_TIME_FORMAT).to_string(),
                format!("{:.6}", t.exit_price),
                format!("{:.2}", t.net_pnl),
            ]),
            None => record.extend(std::iter::repeat(String::new()).take(6)),
        }
        match &r.reference {
            Some(t) => record.extend([
                t.trade_number.to_string(),
                t.side.as_str().to_string(),
                t.entry_timestamp.format(EXPORT_TIME_FORMAT).to_string(),
                format!("{:.6}", t.entry_price),
                t.exit_timestamp.format(EXPORT_TIME_FORMAT).to_string(),
                format!("{:.6}", t.exit_price),
                format!("{:.2}", t.net_pnl),
            ]),
            None => record.extend(std::iter::repeat(String::new()).take(7)),
        }
        record.push(fmt_opt(r.time_delta_minutes, 1));
        record.push(fmt_opt(r.price_delta, 6));
        record.push(fmt_opt(r.pnl_delta, 2));
        wtr.write_record(&record)?;
    }

    finish_csv(wtr)
}

// ─── Markdown reports ───────────────────────────────────────────────

/// Generate a Markdown report for a single backtest run.
pub fn generate_report(result: &BacktestResult) -> String {
    let mut md = String::with_capacity(2048);

    md.push_str("# Backtest Report\n\n");

    md.push_str("## Metadata\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Symbol | {} |\n", result.symbol));
    md.push_str(&format!("| Strategy | {} |\n", result.strategy.name));
    md.push_str(&format!(
        "| Interval | {} min |\n",
        result.session.interval_minutes
    ));
    md.push_str(&format!(
        "| Bars | {} ({} warmup) |\n",
        result.summary.bars_processed, result.session.warmup_bars
    ));
    md.push_str(&format!("| Signals | {} |\n", result.summary.total_signals));
    md.push_str(&format!("| Config Hash | {} |\n", result.config_hash));
    md.push_str(&format!("| Dataset Hash | {} |\n", result.dataset_hash));
    md.push_str(&format!("| Run ID | {} |\n", result.run_id));
    md.push('\n');

    let s = &result.summary;
    md.push_str("## Performance Summary\n\n");
    md.push_str("| Metric | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Initial Capital | ${:.2} |\n", s.initial_capital));
    md.push_str(&format!("| Final Equity | ${:.2} |\n", s.final_equity));
    md.push_str(&format!("| Total Return | {:.2}% |\n", s.total_return_pct));
    md.push_str(&format!("| Net PnL | {:.2} |\n", s.net_pnl));
    md.push_str(&format!("| Gross PnL | {:.2} |\n", s.gross_pnl));
    md.push_str(&format!("| Commission | {:.2} |\n", s.total_commission));
    md.push_str(&format!("| Max Drawdown | {:.2}% |\n", s.max_drawdown_pct));
    md.push_str(&format!(
        "| Trades | {} ({} wins, {} losses) |\n",
        s.total_trades, s.winning_trades, s.losing_trades
    ));
    md.push_str(&format!("| Win Rate | {:.1}% |\n", s.win_rate_pct));
    md.push_str(&format!("| Profit Factor | {:.2} |\n", s.profit_factor));
    md.push('\n');

    if !result.warnings.is_empty() {
        md.push_str("## Warnings\n\n");
        for warn in &result.warnings {
            md.push_str(&format!("- {warn}\n"));
        }
        md.push('\n');
    }

    md
}

/// Generate a Markdown parity report across all validated cases.
pub fn generate_parity_report(summary: &ValidationSummary) -> String {
    let mut md = String::with_capacity(2048);

    md.push_str("# Trade Parity Report\n\n");
    md.push_str(&format!(
        "**{}/{} cases passed.** Overall: {}\n\n",
        summary.cases_passed,
        summary.cases_run,
        if summary.all_passed { "PASS" } else { "FAIL" }
    ));

    for report in &summary.reports {
        md.push_str(&format!(
            "## {}: {}\n\n",
            report.case_name,
            if report.passed { "PASS" } else { "FAIL" }
        ));
        md.push_str(&format!(
            "Config `{}`, dataset `{}`.\n\n",
            report.config_hash, report.dataset_hash
        ));
        md.push_str(&match_table(&report.strict));

        if let Some(ref relaxed) = report.relaxed {
            md.push_str(&format!(
                "Relaxed pass (within {:.0} min): {} matched, {} time mismatches, \
                 {} still unpaired.\n\n",
                relaxed.tolerance.time_tolerance_minutes,
                relaxed.matched_count,
                relaxed.time_mismatch_count,
                relaxed.missing_reference_count + relaxed.missing_generated_count
            ));
        }

        let dropped = report.reference_skipped_rows
            + report.reference_incomplete_groups
            + report.reference_open_trades_skipped;
        if dropped > 0 {
            md.push_str(&format!(
                "Reference export: {} rows skipped, {} incomplete groups, \
                 {} open trades dropped.\n\n",
                report.reference_skipped_rows,
                report.reference_incomplete_groups,
                report.reference_open_trades_skipped
            ));
        }

        if !report.warnings.is_empty() {
            for warn in &report.warnings {
                md.push_str(&format!("- {warn}\n"));
            }
            md.push('\n');
        }
    }

    md
}

fn match_table(report: &MatchReport) -> String {
    let mut s = String::with_capacity(512);
    s.push_str("| Metric | Value |\n");
    s.push_str("| --- | --- |\n");
    s.push_str(&format!(
        "| Generated Trades | {} |\n",
        report.generated_trade_count
    ));
    s.push_str(&format!(
        "| Reference Trades | {} |\n",
        report.reference_trade_count
    ));
    s.push_str(&format!("| Matched | {} |\n", report.matched_count));
    s.push_str(&format!(
        "| Side Mismatches | {} |\n",
        report.side_mismatch_count
    ));
    s.push_str(&format!(
        "| Time Mismatches | {} |\n",
        report.time_mismatch_count
    ));
    s.push_str(&format!(
        "| PnL Mismatches | {} |\n",
        report.pnl_mismatch_count
    ));
    s.push_str(&format!(
        "| Missing in Reference | {} |\n",
        report.missing_reference_count
    ));
    s.push_str(&format!(
        "| Missing in Generated | {} |\n",
        report.missing_generated_count
    ));
    s.push_str(&format!(
        "| Net PnL (generated) | {:.2} |\n",
        report.generated_net_pnl
    ));
    s.push_str(&format!(
        "| Net PnL (reference) | {:.2} |\n",
        report.reference_net_pnl
    ));
    s.push_str(&format!("| Net PnL Diff | {:.2} |\n", report.net_pnl_diff));
    s.push('\n');
    s
}

// ─── Artifact bundles ───────────────────────────────────────────────

/// Save the full artifact set for a single backtest run.
///
/// Creates a directory named `{symbol}_{timestamp}/` under `output_dir`
/// containing:
/// - `manifest.json`: the full `BacktestResult`
/// - `trades.csv`: trade tape
/// - `equity.csv`: bar-by-bar equity curve
/// - `report.md`: human-readable summary
///
/// Returns the path to the created directory.
pub fn save_artifacts(result: &BacktestResult, output_dir: &Path) -> Result<PathBuf> {
    let dirname = format!(
        "{}_{}",
        safe_name(&result.symbol),
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    );
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    let json = export_json(result)?;
    std::fs::write(run_dir.join("manifest.json"), &json)?;

    let trades_csv = export_trades_csv(&result.trades)?;
    std::fs::write(run_dir.join("trades.csv"), &trades_csv)?;

    let equity_csv = export_equity_csv(&result.equity_curve)?;
    std::fs::write(run_dir.join("equity.csv"), &equity_csv)?;

    let report = generate_report(result);
    std::fs::write(run_dir.join("report.md"), &report)?;

    Ok(run_dir)
}

/// Load a `BacktestResult` from an artifact directory's manifest.json.
///
/// Rejects unknown schema versions.
pub fn load_artifacts(dir: &Path) -> Result<BacktestResult> {
    let manifest_path = dir.join("manifest.json");
    let json = std::fs::read_to_string(&manifest_path)
        .with_context(|| format!("failed to read {}", manifest_path.display()))?;
    import_json(&json)
}

/// Save the full artifact set for a validation batch.
///
/// Creates a directory named `validation_{timestamp}/` under `output_dir`
/// containing:
/// - `summary.json`: the full `ValidationSummary`
/// - `report.md`: human-readable parity report
/// - `{case}_pairs.csv`: strict pair grades, one file per case
/// - `{case}_pairs_relaxed.csv`: relaxed pair grades when that pass ran
///
/// Returns the path to the created directory.
pub fn save_validation_artifacts(
    summary: &ValidationSummary,
    output_dir: &Path,
) -> Result<PathBuf> {
    let dirname = format!("validation_{}", chrono::Local::now().format("%Y%m%d_%H%M%S"));
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    let json = export_validation_json(summary)?;
    std::fs::write(run_dir.join("summary.json"), &json)?;

    let report = generate_parity_report(summary);
    std::fs::write(run_dir.join("report.md"), &report)?;

    for case in &summary.reports {
        let stem = safe_name(&case.case_name);
        let pairs = export_pairs_csv(&case.strict.results)?;
        std::fs::write(run_dir.join(format!("{stem}_pairs.csv")), &pairs)?;
        if let Some(ref relaxed) = case.relaxed {
            let pairs = export_pairs_csv(&relaxed.results)?;
            std::fs::write(run_dir.join(format!("{stem}_pairs_relaxed.csv")), &pairs)?;
        }
    }

    Ok(run_dir)
}

/// Load a `ValidationSummary` from an artifact directory's summary.json.
///
/// Rejects unknown schema versions.
pub fn load_validation_artifacts(dir: &Path) -> Result<ValidationSummary> {
    let summary_path = dir.join("summary.json");
    let json = std::fs::read_to_string(&summary_path)
        .with_context(|| format!("failed to read {}", summary_path.display()))?;
    import_validation_json(&json)
}

// ─── Helpers ────────────────────────────────────────────────────────

fn finish_csv(wtr: csv::Writer<Vec<u8>>) -> Result<String> {
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

fn fmt_opt(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) => format!("{v:.decimals$}"),
        None => String::new(),
    }
}

fn safe_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};
    use paritylab_core::domain::{EntryReason, ExitReason, TradeSide};
    use paritylab_core::engine::SessionConfig;
    use paritylab_core::fingerprint::{ConfigHash, DatasetHash};
    use paritylab_core::strategy::preset;

    use crate::matcher::{match_trades, MatchTolerance};
    use crate::metrics::SessionSummary;
    use crate::reference::ReferenceTrade;
    use crate::validation::ValidationReport;

    // ─── Test helpers ────────────────────────────────────────────────

    fn ts(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn sample_trade() -> Trade {
        Trade {
            side: TradeSide::Long,
            quantity: 0.5,
            entry_timestamp: ts(10),
            entry_price: 2000.0,
            exit_timestamp: ts(14),
            exit_price: 2080.0,
            entry_reason: EntryReason::LongEntry,
            exit_reason: ExitReason::TakeProfit,
            bars_held: 4,
            gross_pnl: 40.0,
            commission: 1.02,
            net_pnl: 38.98,
        }
    }

    fn mirror_reference(trade: &Trade, number: u32) -> ReferenceTrade {
        ReferenceTrade {
            trade_number: number,
            side: trade.side,
            entry_timestamp: trade.entry_timestamp,
            entry_price: trade.entry_price,
            exit_timestamp: trade.exit_timestamp,
            exit_price: trade.exit_price,
            net_pnl: trade.net_pnl,
        }
    }

    fn sample_summary() -> SessionSummary {
        SessionSummary {
            strategy_name: "cci_signal".into(),
            bars_processed: 500,
            total_signals: 12,
            total_trades: 1,
            winning_trades: 1,
            losing_trades: 0,
            win_rate_pct: 100.0,
            gross_pnl: 40.0,
            net_pnl: 38.98,
            total_commission: 1.02,
            initial_capital: 100_000.0,
            final_equity: 100_038.98,
            total_return_pct: 0.039,
            max_drawdown_pct: 1.2,
            profit_factor: 100.0,
        }
    }

    fn sample_result() -> BacktestResult {
        BacktestResult {
            schema_version: SCHEMA_VERSION,
            symbol: "BTCUSDT".into(),
            strategy: preset("cci_signal").unwrap(),
            session: SessionConfig::default(),
            summary: sample_summary(),
            trades: vec![sample_trade()],
            equity_curve: vec![
                EquityPoint {
                    bar_index: 0,
                    timestamp: ts(10),
                    cash: 100_000.0,
                    unrealized_pnl: 0.0,
                    equity: 100_000.0,
                },
                EquityPoint {
                    bar_index: 1,
                    timestamp: ts(11),
                    cash: 99_000.0,
                    unrealized_pnl: 1012.5,
                    equity: 100_012.5,
                },
            ],
            config_hash: ConfigHash::from_hash("cfg0123abc"),
            dataset_hash: DatasetHash::from_hash("data456def"),
            run_id: "4e5f6a7b8c9d".into(),
            warnings: vec![],
        }
    }

    fn sample_validation(reference_side: TradeSide) -> ValidationSummary {
        let generated = vec![sample_trade()];
        let mut reference = vec![mirror_reference(&generated[0], 1)];
        reference[0].side = reference_side;

        let strict = match_trades(&generated, &reference, &MatchTolerance::strict());
        let relaxed = match_trades(&generated, &reference, &MatchTolerance::relaxed());
        let passed = strict.is_clean();
        let report = ValidationReport {
            schema_version: SCHEMA_VERSION,
            case_name: "btc_1h".into(),
            passed,
            strict,
            relaxed: Some(relaxed),
            summary: sample_summary(),
            config_hash: ConfigHash::from_hash("cfg0123abc"),
            dataset_hash: DatasetHash::from_hash("data456def"),
            reference_skipped_rows: 0,
            reference_incomplete_groups: 1,
            reference_open_trades_skipped: 1,
            warnings: vec!["reference rows 3-4: trade 7 missing its exit row".into()],
        };
        ValidationSummary {
            schema_version: SCHEMA_VERSION,
            cases_run: 1,
            cases_passed: usize::from(passed),
            all_passed: passed,
            reports: vec![report],
        }
    }

    // ─── JSON round-trip ─────────────────────────────────────────────

    #[test]
    fn json_roundtrip() {
        let original = sample_result();
        let json = export_json(&original).unwrap();
        let restored = import_json(&json).unwrap();
        assert_eq!(restored, original);
    }

    #[test]
    fn json_rejects_unknown_version() {
        let mut result = sample_result();
        result.schema_version = 99;
        let json = export_json(&result).unwrap();
        let err = import_json(&json);
        assert!(err.is_err());
        let msg = err.unwrap_err().to_string();
        assert!(msg.contains("unsupported schema version 99"));
    }

    #[test]
    fn validation_json_roundtrip() {
        let original = sample_validation(TradeSide::Long);
        let json = export_validation_json(&original).unwrap();
        let restored = import_validation_json(&json).unwrap();
        assert_eq!(restored, original);
    }

    #[test]
    fn validation_json_rejects_unknown_version() {
        let mut summary = sample_validation(TradeSide::Long);
        summary.schema_version = 99;
        let json = export_validation_json(&summary).unwrap();
        assert!(import_validation_json(&json).is_err());
    }

    // ─── CSV trades ─────────────────────────────────────────────────

    #[test]
    fn csv_trades_columns_and_content() {
        let csv = export_trades_csv(&[sample_trade()]).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            "side,quantity,entry_timestamp,entry_price,exit_timestamp,\
             exit_price,entry_reason,exit_reason,bars_held,gross_pnl,\
             commission,net_pnl"
        );
        let row = lines[1];
        assert!(row.starts_with("long,0.500000,2024-03-15 10:00,2000.000000"));
        assert!(row.contains("Long Entry"));
        assert!(row.contains("TP"));
        assert!(row.contains("38.98"));
    }

    #[test]
    fn csv_empty_trades() {
        let csv = export_trades_csv(&[]).unwrap();
        assert_eq!(csv.lines().count(), 1);
    }

    // ─── CSV equity ─────────────────────────────────────────────────

    #[test]
    fn csv_equity_rows() {
        let result = sample_result();
        let csv = export_equity_csv(&result.equity_curve).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "bar_index,timestamp,cash,unrealized_pnl,equity");
        assert_eq!(lines[1], "0,2024-03-15 10:00,100000.00,0.00,100000.00");
        assert_eq!(lines[2], "1,2024-03-15 11:00,99000.00,1012.50,100012.50");
    }

    // ─── CSV pairs ──────────────────────────────────────────────────

    #[test]
    fn csv_pairs_matched_row() {
        let generated = vec![sample_trade()];
        let reference = vec![mirror_reference(&generated[0], 1)];
        let report = match_trades(&generated, &reference, &MatchTolerance::strict());

        let csv = export_pairs_csv(&report.results).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);

        let fields: Vec<&str> = lines[1].split(',').collect();
        assert_eq!(fields.len(), 17);
        assert_eq!(fields[0], "MATCHED");
        assert_eq!(fields[1], "long");
        assert_eq!(fields[2], "2024-03-15 10:00");
        assert_eq!(fields[7], "1");
        assert_eq!(fields[14], "0.0");
    }

    #[test]
    fn csv_pairs_missing_half_leaves_blanks() {
        let mut late = sample_trade();
        late.entry_timestamp = ts(20);
        late.exit_timestamp = ts(22);
        let generated = vec![sample_trade(), late];
        let reference = vec![mirror_reference(&generated[0], 1)];
        let report = match_trades(&generated, &reference, &MatchTolerance::strict());

        let csv = export_pairs_csv(&report.results).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);

        let fields: Vec<&str> = lines[2].split(',').collect();
        assert_eq!(fields.len(), 17);
        assert_eq!(fields[0], "MISSING_REFERENCE");
        assert_eq!(fields[1], "long");
        assert_eq!(fields[7], "");
        assert_eq!(fields[8], "");
        assert_eq!(fields[14], "");
        assert_eq!(fields[16], "");
    }

    // ─── Markdown reports ───────────────────────────────────────────

    #[test]
    fn markdown_report_has_sections() {
        let result = sample_result();
        let md = generate_report(&result);

        assert!(md.contains("# Backtest Report"));
        assert!(md.contains("## Metadata"));
        assert!(md.contains("| Symbol | BTCUSDT |"));
        assert!(md.contains("| Strategy | cci_signal |"));
        assert!(md.contains("## Performance Summary"));
        assert!(md.contains("| Win Rate | 100.0% |"));
        assert!(md.contains("| Profit Factor | 100.00 |"));
        assert!(!md.contains("## Warnings"));
    }

    #[test]
    fn markdown_report_lists_warnings() {
        let mut result = sample_result();
        result
            .warnings
            .push("pending short open canceled at end of stream".into());
        let md = generate_report(&result);

        assert!(md.contains("## Warnings"));
        assert!(md.contains("- pending short open canceled at end of stream"));
    }

    #[test]
    fn parity_report_passing_case() {
        let summary = sample_validation(TradeSide::Long);
        let md = generate_parity_report(&summary);

        assert!(md.contains("# Trade Parity Report"));
        assert!(md.contains("**1/1 cases passed.** Overall: PASS"));
        assert!(md.contains("## btc_1h: PASS"));
        assert!(md.contains("| Matched | 1 |"));
        assert!(md.contains("Relaxed pass (within 60 min)"));
        assert!(md.contains("1 incomplete groups"));
        assert!(md.contains("- reference rows 3-4: trade 7 missing its exit row"));
    }

    #[test]
    fn parity_report_marks_failures() {
        let summary = sample_validation(TradeSide::Short);
        let md = generate_parity_report(&summary);

        assert!(md.contains("**0/1 cases passed.** Overall: FAIL"));
        assert!(md.contains("## btc_1h: FAIL"));
        assert!(md.contains("| Side Mismatches | 1 |"));
    }

    // ─── Save/load artifacts ────────────────────────────────────────

    #[test]
    fn save_load_artifacts_roundtrip() {
        let result = sample_result();
        let dir = tempfile::tempdir().unwrap();
        let run_dir = save_artifacts(&result, dir.path()).unwrap();

        assert!(run_dir.join("manifest.json").exists());
        assert!(run_dir.join("trades.csv").exists());
        assert!(run_dir.join("equity.csv").exists());
        assert!(run_dir.join("report.md").exists());

        let loaded = load_artifacts(&run_dir).unwrap();
        assert_eq!(loaded, result);
    }

    #[test]
    fn save_validation_artifacts_writes_per_case_files() {
        let summary = sample_validation(TradeSide::Long);
        let dir = tempfile::tempdir().unwrap();
        let run_dir = save_validation_artifacts(&summary, dir.path()).unwrap();

        assert!(run_dir.join("summary.json").exists());
        assert!(run_dir.join("report.md").exists());
        assert!(run_dir.join("btc_1h_pairs.csv").exists());
        assert!(run_dir.join("btc_1h_pairs_relaxed.csv").exists());

        let loaded = load_validation_artifacts(&run_dir).unwrap();
        assert_eq!(loaded, summary);
    }
}
