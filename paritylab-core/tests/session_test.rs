//! Integration tests for the session loop.
//!
//! Tests:
//! 1. Hand-computed mean-reversion round trip with notional sizing
//! 2. Stop-loss exit filled at the decision bar's close
//! 3. Preset catalog smoke runs over synthetic data
//! 4. Accounting identity: final equity == initial capital + net PnL
//! 5. Run identity hashes across repeated runs

use chrono::NaiveDate;
use paritylab_core::domain::{Bar, EntryReason, ExitReason};
use paritylab_core::engine::{run_session, ExecutionTiming, SessionConfig};
use paritylab_core::fingerprint::{hash_config, hash_dataset, RunId};
use paritylab_core::signal::{BandThresholds, ExitMode, SignalMode, SignalPolicy};
use paritylab_core::strategy::{preset, IndicatorConfig, OrderSizing, StrategyConfig, PRESET_NAMES};

// ──────────────────────────────────────────────
// Helpers
// ──────────────────────────────────────────────

fn bars_from_closes(closes: &[f64]) -> Vec<Bar> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                index: i as u64,
                timestamp: start + chrono::Duration::hours(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1_000.0,
            }
        })
        .collect()
}

fn wave_bars(n: usize) -> Vec<Bar> {
    let closes: Vec<f64> = (0..n)
        .map(|i| 100.0 + (i as f64 * 0.25).sin() * 8.0 + i as f64 * 0.01)
        .collect();
    bars_from_closes(&closes)
}

/// Momentum(1) inside a narrow band: the indicator value is just the close
/// delta, so crossings can be scripted bar by bar.
fn momentum_band_strategy() -> StrategyConfig {
    StrategyConfig {
        name: "momentum_band".to_string(),
        indicator: IndicatorConfig::Momentum { period: 1 },
        policy: SignalPolicy::Band {
            thresholds: BandThresholds {
                upper: 2.0,
                lower: -2.0,
                mid: 0.0,
            },
            mode: SignalMode::MeanReversion,
            exit: ExitMode::Midpoint,
        },
        sizing: OrderSizing::Notional { value: 500.0 },
        stop_loss_percent: 0.05,
        take_profit_percent: 0.10,
        max_holding_bars: 50,
        cooldown_bars: 0,
        allow_flip: false,
        use_stop_loss: true,
        use_take_profit: false,
        use_max_holding: true,
    }
}

fn quick_session() -> SessionConfig {
    SessionConfig {
        interval_minutes: 60,
        warmup_bars: 0,
        execution: ExecutionTiming::BarClose,
        initial_capital: 10_000.0,
        commission_rate: 0.0,
        close_open_position_at_end: true,
    }
}

fn assert_close(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() <= epsilon,
        "expected {expected}, got {actual}"
    );
}

// ──────────────────────────────────────────────
// Scripted scenarios
// ──────────────────────────────────────────────

#[test]
fn mean_reversion_round_trip_with_notional_sizing() {
    // momentum path: n/a, 0, -3, -0.5, +0.5. The -3 → -0.5 move crosses
    // back up through the lower threshold (entry), the -0.5 → +0.5 move
    // crosses the midpoint (exit)
    let bars = bars_from_closes(&[100.0, 100.0, 97.0, 96.5, 97.0, 97.0, 97.0]);
    let result = run_session(momentum_band_strategy(), quick_session(), &bars).unwrap();

    assert_eq!(result.trades.len(), 1);
    let trade = &result.trades[0];
    assert_eq!(trade.entry_reason, EntryReason::LongEntry);
    assert_eq!(trade.exit_reason, ExitReason::MidExit);
    assert_close(trade.entry_price, 96.5, 1e-12);
    assert_close(trade.exit_price, 97.0, 1e-12);
    assert_eq!(trade.bars_held, 1);

    // notional sizing: 500 of notional at the entry fill price
    let expected_quantity = 500.0 / 96.5;
    assert_close(trade.quantity, expected_quantity, 1e-12);
    assert_close(trade.gross_pnl, 0.5 * expected_quantity, 1e-9);
    assert_close(trade.net_pnl, trade.gross_pnl, 1e-12);

    assert_eq!(result.signal_count, 2);
    assert_eq!(result.equity_curve.len(), bars.len());
    assert_close(result.final_equity, 10_000.0 + trade.net_pnl, 1e-9);
    assert!(result.warnings.is_empty());
}

#[test]
fn stop_loss_exit_fills_at_the_decision_close() {
    // entry at 96.5; the 91 bar's low breaches the 5% stop at 91.675, and
    // the fill settles at that bar's close
    let bars = bars_from_closes(&[100.0, 100.0, 97.0, 96.5, 91.0, 85.0]);
    let result = run_session(momentum_band_strategy(), quick_session(), &bars).unwrap();

    assert_eq!(result.trades.len(), 1);
    let trade = &result.trades[0];
    assert_eq!(trade.exit_reason, ExitReason::StopLoss);
    assert_close(trade.entry_price, 96.5, 1e-12);
    assert_close(trade.exit_price, 91.0, 1e-12);
    assert!(trade.net_pnl < 0.0);
    assert!(result.warnings.is_empty());
}

// ──────────────────────────────────────────────
// Preset catalog
// ──────────────────────────────────────────────

#[test]
fn presets_run_clean_over_synthetic_data() {
    let bars = wave_bars(600);

    for name in PRESET_NAMES {
        let strategy = preset(name).unwrap();
        let result = run_session(strategy, SessionConfig::default(), &bars)
            .unwrap_or_else(|err| panic!("preset {name} failed: {err}"));

        assert_eq!(result.bars_processed, 600, "preset {name}");
        assert_eq!(result.equity_curve.len(), 600, "preset {name}");

        for trade in &result.trades {
            assert!(
                trade.exit_timestamp > trade.entry_timestamp,
                "preset {name}: trade must span time"
            );
            assert!(trade.quantity > 0.0, "preset {name}");
            assert!(trade.commission >= 0.0, "preset {name}");
            assert_close(trade.net_pnl, trade.gross_pnl - trade.commission, 1e-9);
        }
        for pair in result.trades.windows(2) {
            assert!(
                pair[1].entry_timestamp >= pair[0].exit_timestamp,
                "preset {name}: trades must not overlap"
            );
        }
        for point in &result.equity_curve {
            assert_close(point.equity, point.cash + point.unrealized_pnl, 1e-9);
        }
    }
}

#[test]
fn preset_runs_are_reproducible() {
    let bars = wave_bars(500);
    for name in PRESET_NAMES {
        let first = run_session(preset(name).unwrap(), SessionConfig::default(), &bars).unwrap();
        let second = run_session(preset(name).unwrap(), SessionConfig::default(), &bars).unwrap();
        assert_eq!(first, second, "preset {name} must be deterministic");
    }
}

// ──────────────────────────────────────────────
// Accounting
// ──────────────────────────────────────────────

#[test]
fn final_equity_is_initial_capital_plus_net_pnl() {
    // momentum sign flips several times, then a flat tail keeps the final
    // bars quiet so every position is closed before the stream ends
    let mut closes: Vec<f64> = (0..60)
        .map(|i| 100.0 + (i as f64 * 0.6).sin() * 4.0)
        .collect();
    closes.extend_from_slice(&[100.0, 100.0, 100.0, 100.0]);
    let bars = bars_from_closes(&closes);

    let strategy = StrategyConfig {
        name: "momentum_cross".to_string(),
        indicator: IndicatorConfig::Momentum { period: 1 },
        policy: SignalPolicy::LineCross,
        sizing: OrderSizing::Quantity { quantity: 2.0 },
        stop_loss_percent: 0.5,
        take_profit_percent: 0.5,
        max_holding_bars: 1_000,
        cooldown_bars: 0,
        allow_flip: true,
        use_stop_loss: false,
        use_take_profit: false,
        use_max_holding: false,
    };
    let mut config = quick_session();
    config.commission_rate = 0.0005;

    let result = run_session(strategy, config, &bars).unwrap();
    assert!(result.trades.len() >= 2);
    assert!(result.warnings.is_empty());

    let net: f64 = result.trades.iter().map(|t| t.net_pnl).sum();
    assert_close(result.final_equity, 10_000.0 + net, 1e-9);

    let commission: f64 = result.trades.iter().map(|t| t.commission).sum();
    assert_close(result.total_commission, commission, 1e-9);
}

// ──────────────────────────────────────────────
// Run identity
// ──────────────────────────────────────────────

#[test]
fn run_identity_is_stable_across_runs() {
    let bars = wave_bars(50);
    let strategy = preset("cci_signal").unwrap();
    let session = SessionConfig::default();

    let id_a = RunId::new(hash_config(&strategy, &session), hash_dataset(&bars));
    let id_b = RunId::new(hash_config(&strategy, &session), hash_dataset(&bars));
    assert_eq!(id_a, id_b);
    assert_eq!(id_a.hash(), id_b.hash());

    let other_strategy = preset("rsi_mean_reversion").unwrap();
    let id_c = RunId::new(hash_config(&other_strategy, &session), hash_dataset(&bars));
    assert_ne!(id_a.hash(), id_c.hash());
}
