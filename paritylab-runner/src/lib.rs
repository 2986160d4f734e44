//! ParityLab Runner: data loading, reference parsing, trade matching, and
//! validation orchestration.
//!
//! This crate builds on `paritylab-core` to provide:
//! - Bar series loading with content fingerprinting
//! - Reference trade-export parsing (entry/exit row pairs)
//! - Tolerance-based trade matching with graded mismatch classification
//! - Single-backtest runner with summary metrics
//! - Parallel validation batches with strict and relaxed passes
//! - JSON, CSV, and Markdown artifact generation

pub mod bars;
pub mod config;
pub mod export;
pub mod matcher;
pub mod metrics;
pub mod reference;
pub mod runner;
pub mod validation;

pub use bars::{load_bars_csv, read_bars, LoadError, LoadedBars};
pub use config::{load_run_spec, parse_run_spec, RunSpec, SpecError, StrategySpec};
pub use export::{
    export_equity_csv, export_json, export_pairs_csv, export_trades_csv, export_validation_json,
    generate_parity_report, generate_report, import_json, import_validation_json, load_artifacts,
    load_validation_artifacts, save_artifacts, save_validation_artifacts,
};
pub use matcher::{match_trades, MatchClassification, MatchReport, MatchResult, MatchTolerance};
pub use metrics::{max_drawdown_pct, profit_factor, win_rate_pct, SessionSummary};
pub use reference::{
    load_reference_csv, normalize_to_utc, read_reference, ReferenceError, ReferenceReport,
    ReferenceTrade,
};
pub use runner::{run_backtest, BacktestResult, RunError, SCHEMA_VERSION};
pub use validation::{
    validate_all, validate_case, ValidationCase, ValidationReport, ValidationSettings,
    ValidationSummary,
};
