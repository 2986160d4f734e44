//! Backtest session: one strategy instance driven over one bar stream.
//!
//! Per-bar order is fixed: settle pending fills at the open, update the
//! indicator, tick the cooldown, evaluate signals over the previous/current
//! pair, let the state machine decide, settle or queue the resulting fills,
//! then mark equity at the close. Decisions are suppressed until the
//! session-level warm-up has elapsed; equity is marked from the first bar.

pub mod execution;
pub mod recorder;
pub mod state_machine;

pub use execution::ExecutionTiming;
pub use recorder::{OpenTrade, StateInvariantViolation, TradeRecorder};
pub use state_machine::{BarDecision, PositionMachine};

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{Bar, EntryReason, ExitReason, PositionState, Trade, TradeSide};
use crate::indicators::{IndicatorEngine, SequenceError};
use crate::strategy::{ConfigError, StrategyConfig};
use execution::PendingFill;

fn default_interval_minutes() -> i64 {
    60
}

fn default_warmup_bars() -> u64 {
    300
}

fn default_initial_capital() -> f64 {
    100_000.0
}

fn default_commission_rate() -> f64 {
    0.0005
}

fn default_close_at_end() -> bool {
    true
}

/// Run-level knobs shared by every strategy instance in a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Bar interval; fill timestamps under bar-close execution are the bar's
    /// open time plus this.
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: i64,

    /// Bars to observe before the first decision is allowed. Indicator
    /// warm-up runs concurrently; whichever ends later gates the first
    /// signal.
    #[serde(default = "default_warmup_bars")]
    pub warmup_bars: u64,

    #[serde(default)]
    pub execution: ExecutionTiming,

    #[serde(default = "default_initial_capital")]
    pub initial_capital: f64,

    /// Commission per side as a fraction of traded notional.
    #[serde(default = "default_commission_rate")]
    pub commission_rate: f64,

    /// Force-close any open position at the final bar's close so the trade
    /// log accounts for the whole stream.
    #[serde(default = "default_close_at_end")]
    pub close_open_position_at_end: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            interval_minutes: default_interval_minutes(),
            warmup_bars: default_warmup_bars(),
            execution: ExecutionTiming::default(),
            initial_capital: default_initial_capital(),
            commission_rate: default_commission_rate(),
            close_open_position_at_end: default_close_at_end(),
        }
    }
}

/// One equity curve sample, taken at every bar's close.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub bar_index: u64,
    pub timestamp: NaiveDateTime,
    pub cash: f64,
    pub unrealized_pnl: f64,
    pub equity: f64,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("bar {index} rejected: {details}")]
    InvalidBar { index: u64, details: String },

    #[error(transparent)]
    Sequence(#[from] SequenceError),

    #[error(transparent)]
    Invariant(#[from] StateInvariantViolation),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Everything a finished session produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionResult {
    pub strategy_name: String,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
    pub bars_processed: u64,
    pub signal_count: u64,
    pub initial_capital: f64,
    pub final_equity: f64,
    pub total_commission: f64,
    pub warnings: Vec<String>,
}

/// Drives one strategy instance over a bar stream.
///
/// Bars must arrive in strictly increasing index order; a rejected bar
/// leaves the session untouched, so the caller may skip it and continue.
#[derive(Debug)]
pub struct Session {
    config: SessionConfig,
    strategy: StrategyConfig,
    indicator: IndicatorEngine,
    machine: PositionMachine,
    recorder: TradeRecorder,
    pending: Vec<PendingFill>,
    equity_curve: Vec<EquityPoint>,
    warnings: Vec<String>,
    bars_seen: u64,
    signal_count: u64,
    last_bar: Option<Bar>,
    last_index: Option<u64>,
}

impl Session {
    pub fn new(strategy: StrategyConfig, config: SessionConfig) -> Result<Self, SessionError> {
        strategy.validate()?;
        let indicator = IndicatorEngine::new(strategy.indicator.build()?);
        Ok(Self {
            machine: PositionMachine::new(&strategy),
            recorder: TradeRecorder::new(config.initial_capital, config.commission_rate),
            indicator,
            pending: Vec::new(),
            equity_curve: Vec::new(),
            warnings: Vec::new(),
            bars_seen: 0,
            signal_count: 0,
            last_bar: None,
            last_index: None,
            strategy,
            config,
        })
    }

    pub fn position(&self) -> &PositionState {
        self.machine.state()
    }

    pub fn bars_processed(&self) -> u64 {
        self.bars_seen
    }

    pub fn equity_curve(&self) -> &[EquityPoint] {
        &self.equity_curve
    }

    pub fn trades(&self) -> &[Trade] {
        self.recorder.trades()
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Process one bar and report the decision it produced.
    pub fn process_bar(&mut self, bar: &Bar) -> Result<BarDecision, SessionError> {
        if let Some(last) = self.last_index {
            if bar.index <= last {
                return Err(SessionError::Sequence(SequenceError {
                    index: bar.index,
                    last_index: last,
                }));
            }
        }
        if !bar.is_sane() {
            return Err(SessionError::InvalidBar {
                index: bar.index,
                details: "OHLC fields fail sanity checks".to_string(),
            });
        }

        self.settle_pending(bar)?;

        let state = self.indicator.update(bar)?;
        let mut decision = BarDecision::Hold;
        if state.initialized {
            self.machine.tick_cooldown();
            let signals = self
                .strategy
                .policy
                .evaluate(state.previous_value, state.current_value);
            if self.bars_seen >= self.config.warmup_bars {
                decision = self.machine.decide(bar, signals);
            }
        }
        self.apply_decision(bar, decision)?;

        self.mark_equity(bar);
        self.bars_seen += 1;
        self.last_index = Some(bar.index);
        self.last_bar = Some(bar.clone());
        Ok(decision)
    }

    /// Settle deferred fills at this bar's open, closes before opens.
    fn settle_pending(&mut self, bar: &Bar) -> Result<(), SessionError> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let fills: Vec<PendingFill> = self.pending.drain(..).collect();
        for fill in fills {
            match fill {
                PendingFill::Close { reason } => {
                    self.recorder
                        .close(bar.open, bar.timestamp, bar.index, reason);
                }
                PendingFill::Open { side, reason } => {
                    let quantity = self.strategy.sizing.quantity_at(bar.open);
                    self.recorder
                        .open(side, quantity, bar.open, bar.timestamp, reason, bar.index)?;
                    self.machine.confirm_entry_fill(bar.open);
                }
            }
        }
        Ok(())
    }

    fn apply_decision(&mut self, bar: &Bar, decision: BarDecision) -> Result<(), SessionError> {
        match decision {
            BarDecision::Hold => Ok(()),
            BarDecision::Open { side, reason } => {
                self.signal_count += 1;
                self.submit_open(bar, side, reason)
            }
            BarDecision::Close { reason } => {
                self.signal_count += 1;
                self.submit_close(bar, reason);
                Ok(())
            }
            BarDecision::Flip { to } => {
                // a flip is two order actions; the close settles first
                self.signal_count += 2;
                self.submit_close(bar, ExitReason::Flip);
                self.submit_open(bar, to, EntryReason::flip(to))
            }
        }
    }

    fn submit_open(
        &mut self,
        bar: &Bar,
        side: TradeSide,
        reason: EntryReason,
    ) -> Result<(), SessionError> {
        match self.config.execution {
            ExecutionTiming::BarClose => {
                let quantity = self.strategy.sizing.quantity_at(bar.close);
                self.recorder.open(
                    side,
                    quantity,
                    bar.close,
                    self.bar_close_time(bar),
                    reason,
                    bar.index,
                )?;
                self.machine.confirm_entry_fill(bar.close);
                Ok(())
            }
            ExecutionTiming::NextBarOpen => {
                self.pending.push(PendingFill::Open { side, reason });
                Ok(())
            }
        }
    }

    fn submit_close(&mut self, bar: &Bar, reason: ExitReason) {
        match self.config.execution {
            ExecutionTiming::BarClose => {
                self.recorder
                    .close(bar.close, self.bar_close_time(bar), bar.index, reason);
            }
            ExecutionTiming::NextBarOpen => {
                self.pending.push(PendingFill::Close { reason });
            }
        }
    }

    fn bar_close_time(&self, bar: &Bar) -> NaiveDateTime {
        bar.close_time(Duration::minutes(self.config.interval_minutes))
    }

    fn mark_equity(&mut self, bar: &Bar) {
        let cash = self.recorder.cash();
        let unrealized_pnl = self.recorder.unrealized_pnl(bar.close);
        self.equity_curve.push(EquityPoint {
            bar_index: bar.index,
            timestamp: self.bar_close_time(bar),
            cash,
            unrealized_pnl,
            equity: cash + unrealized_pnl,
        });
    }

    /// Settle what is still outstanding and hand back the results.
    ///
    /// Pending exits execute at the final close. Pending entries are
    /// dropped with a warning. The end-of-data close is skipped (with a
    /// warning) when it would not advance past the entry timestamp, which
    /// happens only when the entry filled on the final bar's close.
    pub fn finish(mut self) -> SessionResult {
        if let Some(last) = self.last_bar.clone() {
            let close_ts = self.bar_close_time(&last);
            for fill in std::mem::take(&mut self.pending) {
                match fill {
                    PendingFill::Close { reason } => {
                        self.recorder.close(last.close, close_ts, last.index, reason);
                    }
                    PendingFill::Open { side, .. } => {
                        self.warnings
                            .push(format!("pending {side} open canceled at end of stream"));
                    }
                }
            }
            if self.config.close_open_position_at_end {
                if let Some(open) = self.recorder.open_position() {
                    if close_ts > open.entry_timestamp {
                        self.signal_count += 1;
                        self.recorder
                            .close(last.close, close_ts, last.index, ExitReason::EndOfData);
                    } else {
                        self.warnings.push(format!(
                            "open {} position entered at {} left unclosed; \
                             the end-of-data close would not advance past the entry timestamp",
                            open.side, open.entry_timestamp
                        ));
                    }
                }
            }
            if let Some(point) = self.equity_curve.last_mut() {
                let cash = self.recorder.cash();
                let unrealized_pnl = self.recorder.unrealized_pnl(last.close);
                point.cash = cash;
                point.unrealized_pnl = unrealized_pnl;
                point.equity = cash + unrealized_pnl;
            }
        }

        let final_equity = self
            .equity_curve
            .last()
            .map(|point| point.equity)
            .unwrap_or_else(|| self.recorder.cash());

        SessionResult {
            strategy_name: self.strategy.name.clone(),
            bars_processed: self.bars_seen,
            signal_count: self.signal_count,
            initial_capital: self.config.initial_capital,
            final_equity,
            total_commission: self.recorder.total_commission(),
            equity_curve: self.equity_curve,
            warnings: self.warnings,
            trades: self.recorder.into_trades(),
        }
    }
}

/// Convenience driver: feed every bar, then finish.
pub fn run_session(
    strategy: StrategyConfig,
    config: SessionConfig,
    bars: &[Bar],
) -> Result<SessionResult, SessionError> {
    let mut session = Session::new(strategy, config)?;
    for bar in bars {
        session.process_bar(bar)?;
    }
    Ok(session.finish())
}
