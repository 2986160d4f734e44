//! End-to-end validation: bar CSV and reference export on disk, through
//! the session and both matcher passes, down to saved artifacts.
//!
//! The price path flips a one-bar momentum sign twice, producing two
//! completed round trips plus a long still open at the end of the stream.
//! The reference export lists the same trades in exchange display time
//! (UTC+2), newest first, with the open trade carried as an `Open` exit
//! row the way live exports do.

use chrono::{Duration, NaiveDate};

use paritylab_core::engine::SessionConfig;
use paritylab_core::signal::SignalPolicy;
use paritylab_core::strategy::{IndicatorConfig, OrderSizing, StrategyConfig};
use paritylab_runner::{
    load_artifacts, load_bars_csv, load_validation_artifacts, run_backtest, save_artifacts,
    save_validation_artifacts, validate_all, MatchClassification, ValidationCase,
    ValidationSettings,
};

fn scenario_closes() -> Vec<f64> {
    vec![
        100.0, 100.0, 101.0, 103.0, 102.0, 100.0, 102.0, 104.0, 104.0, 104.0,
    ]
}

fn bars_csv(closes: &[f64]) -> String {
    let start = NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let mut out = String::from("timestamp,open,high,low,close,volume\n");
    for (i, &close) in closes.iter().enumerate() {
        let open = if i == 0 { close } else { closes[i - 1] };
        let high = open.max(close) + 1.0;
        let low = (open.min(close) - 1.0).max(0.01);
        let timestamp = start + Duration::hours(i as i64);
        out.push_str(&format!(
            "{},{open},{high},{low},{close},1000\n",
            timestamp.format("%Y-%m-%d %H:%M:%S")
        ));
    }
    out
}

const REFERENCE_EXPORT: &str = "Trade #,Type,Signal,Date and time,Price USDT,Net P&L USDT\n\
    3,Exit long,Open,2024-01-02 11:00,104,\n\
    3,Entry long,Buy,2024-01-02 09:00,102,\n\
    2,Exit short,Buy,2024-01-02 09:00,102,0\n\
    2,Entry short,Sell,2024-01-02 07:00,102,\n\
    1,Exit long,Sell,2024-01-02 07:00,102,2\n\
    1,Entry long,Buy,2024-01-02 05:00,101,\n";

fn cross_strategy() -> StrategyConfig {
    StrategyConfig {
        name: "momentum_cross".to_string(),
        indicator: IndicatorConfig::Momentum { period: 1 },
        policy: SignalPolicy::LineCross,
        sizing: OrderSizing::Quantity { quantity: 2.0 },
        stop_loss_percent: 0.0,
        take_profit_percent: 0.0,
        max_holding_bars: 0,
        cooldown_bars: 0,
        allow_flip: true,
        use_stop_loss: false,
        use_take_profit: false,
        use_max_holding: false,
    }
}

fn session_config() -> SessionConfig {
    SessionConfig {
        interval_minutes: 60,
        warmup_bars: 0,
        initial_capital: 10_000.0,
        commission_rate: 0.0,
        ..SessionConfig::default()
    }
}

#[test]
fn files_to_validation_artifacts_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let bars_path = dir.path().join("bars.csv");
    let reference_path = dir.path().join("reference.csv");
    std::fs::write(&bars_path, bars_csv(&scenario_closes())).unwrap();
    std::fs::write(&reference_path, REFERENCE_EXPORT).unwrap();

    let case = ValidationCase::load(
        "momentum_cross",
        cross_strategy(),
        session_config(),
        &bars_path,
        &reference_path,
        2.0,
    )
    .unwrap();
    assert_eq!(case.bars.len(), 10);
    assert_eq!(case.reference.trades.len(), 2);
    assert_eq!(case.reference.open_trades_skipped, 1);

    let summary = validate_all(&[case], &ValidationSettings::default()).unwrap();
    assert!(summary.all_passed);
    assert_eq!(summary.cases_run, 1);

    let report = &summary.reports[0];
    assert!(report.passed);
    assert_eq!(report.strict.matched_count, 2);
    assert!(report
        .strict
        .results
        .iter()
        .all(|r| r.classification == MatchClassification::Matched));
    assert_eq!(report.reference_open_trades_skipped, 1);

    let out_dir = save_validation_artifacts(&summary, dir.path()).unwrap();
    assert!(out_dir.join("summary.json").exists());
    assert!(out_dir.join("report.md").exists());
    assert!(out_dir.join("momentum_cross_pairs.csv").exists());
    assert!(out_dir.join("momentum_cross_pairs_relaxed.csv").exists());

    let restored = load_validation_artifacts(&out_dir).unwrap();
    assert_eq!(restored, summary);
}

#[test]
fn backtest_artifacts_from_loaded_bars() {
    let dir = tempfile::tempdir().unwrap();
    let bars_path = dir.path().join("bars.csv");
    std::fs::write(&bars_path, bars_csv(&scenario_closes())).unwrap();

    let data = load_bars_csv(&bars_path).unwrap();
    let result = run_backtest("TESTUSDT", cross_strategy(), session_config(), &data).unwrap();

    // The default session closes at end of stream, so the final open long
    // is force-closed and the tape holds three trades.
    assert_eq!(result.summary.total_trades, 3);
    assert_eq!(result.trades.len(), 3);
    assert_eq!(result.dataset_hash, data.dataset_hash);

    let out_dir = save_artifacts(&result, dir.path()).unwrap();
    assert!(out_dir.join("manifest.json").exists());
    assert!(out_dir.join("trades.csv").exists());
    assert!(out_dir.join("equity.csv").exists());
    assert!(out_dir.join("report.md").exists());

    let loaded = load_artifacts(&out_dir).unwrap();
    assert_eq!(loaded, result);
}
