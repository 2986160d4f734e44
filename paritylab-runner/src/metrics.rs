//! Session summary metrics.
//!
//! Pure functions of a finished `SessionResult`. Degenerate inputs (no
//! trades, flat or empty curves) produce zeros rather than NaN, so
//! summaries always serialize cleanly.

use paritylab_core::domain::Trade;
use paritylab_core::engine::{EquityPoint, SessionResult};
use serde::{Deserialize, Serialize};

/// Profit factor is reported as a ratio capped here; a session with wins
/// and no losses would otherwise divide by zero.
pub const PROFIT_FACTOR_CAP: f64 = 100.0;

/// Headline numbers for one session, computed once after the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub strategy_name: String,
    pub bars_processed: u64,
    pub total_signals: u64,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate_pct: f64,
    pub gross_pnl: f64,
    /// Final equity minus initial capital, so commissions are included.
    pub net_pnl: f64,
    pub total_commission: f64,
    pub initial_capital: f64,
    pub final_equity: f64,
    pub total_return_pct: f64,
    pub max_drawdown_pct: f64,
    pub profit_factor: f64,
}

impl SessionSummary {
    pub fn compute(result: &SessionResult) -> Self {
        let trades = &result.trades;
        let winning_trades = trades.iter().filter(|t| t.is_winner()).count();
        let losing_trades = trades.iter().filter(|t| t.net_pnl < 0.0).count();
        let gross_pnl: f64 = trades.iter().map(|t| t.gross_pnl).sum();
        let net_pnl = result.final_equity - result.initial_capital;
        let total_return_pct = if result.initial_capital > 0.0 {
            net_pnl / result.initial_capital * 100.0
        } else {
            0.0
        };

        Self {
            strategy_name: result.strategy_name.clone(),
            bars_processed: result.bars_processed,
            total_signals: result.signal_count,
            total_trades: trades.len(),
            winning_trades,
            losing_trades,
            win_rate_pct: win_rate_pct(trades),
            gross_pnl,
            net_pnl,
            total_commission: result.total_commission,
            initial_capital: result.initial_capital,
            final_equity: result.final_equity,
            total_return_pct,
            max_drawdown_pct: max_drawdown_pct(&result.equity_curve),
            profit_factor: profit_factor(trades),
        }
    }
}

/// Percentage of trades with positive net PnL.
pub fn win_rate_pct(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let winners = trades.iter().filter(|t| t.is_winner()).count();
    winners as f64 / trades.len() as f64 * 100.0
}

/// Gross winnings over gross losses, capped at [`PROFIT_FACTOR_CAP`].
pub fn profit_factor(trades: &[Trade]) -> f64 {
    let gross_win: f64 = trades
        .iter()
        .filter(|t| t.net_pnl > 0.0)
        .map(|t| t.net_pnl)
        .sum();
    let gross_loss: f64 = trades
        .iter()
        .filter(|t| t.net_pnl < 0.0)
        .map(|t| -t.net_pnl)
        .sum();

    if gross_loss == 0.0 {
        if gross_win > 0.0 {
            PROFIT_FACTOR_CAP
        } else {
            0.0
        }
    } else {
        (gross_win / gross_loss).min(PROFIT_FACTOR_CAP)
    }
}

/// Largest peak-to-trough equity decline, as a percentage of the peak.
pub fn max_drawdown_pct(curve: &[EquityPoint]) -> f64 {
    if curve.len() < 2 {
        return 0.0;
    }
    let mut peak = curve[0].equity;
    let mut max_dd = 0.0_f64;
    for point in curve {
        if point.equity > peak {
            peak = point.equity;
        }
        if peak > 0.0 {
            let dd = (peak - point.equity) / peak * 100.0;
            if dd > max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd
}
