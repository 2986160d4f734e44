//! Position state machine: per-bar transitions under a fixed exit ladder.
//!
//! Exit rules are evaluated in priority order: stop loss, take profit,
//! signal exit, flip, max holding. The first matching rule wins the bar.
//! In the reversal family (zero-line crossover) the exit signal and the
//! opposite entry are the same event, so signal exit and flip collapse
//! into one branch that flips when allowed and closes otherwise.

use crate::domain::{Bar, EntryReason, ExitReason, PositionSide, PositionState, TradeSide};
use crate::signal::SignalOutcome;
use crate::strategy::StrategyConfig;

/// What the state machine wants done on this bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarDecision {
    Hold,
    Open { side: TradeSide, reason: EntryReason },
    Close { reason: ExitReason },
    /// Close the current position and open the opposite side in the same
    /// bar. The close half carries reason "Flip", the open half "Flip to
    /// Long"/"Flip to Short".
    Flip { to: TradeSide },
}

/// Owns one instance's `PositionState` and applies the transition rules.
///
/// The machine decides; fills and cash are the recorder's concern. Under
/// deferred execution the entry price arrives later via
/// `confirm_entry_fill`, and position management stays on hold until it
/// does.
#[derive(Debug, Clone)]
pub struct PositionMachine {
    state: PositionState,
    exit_is_reversal: bool,
    stop_loss_percent: f64,
    take_profit_percent: f64,
    max_holding_bars: u64,
    cooldown_bars: u32,
    allow_flip: bool,
    use_stop_loss: bool,
    use_take_profit: bool,
    use_max_holding: bool,
}

impl PositionMachine {
    pub fn new(config: &StrategyConfig) -> Self {
        Self {
            state: PositionState::flat(),
            exit_is_reversal: config.policy.exit_is_reversal(),
            stop_loss_percent: config.stop_loss_percent,
            take_profit_percent: config.take_profit_percent,
            max_holding_bars: config.max_holding_bars,
            cooldown_bars: config.cooldown_bars,
            allow_flip: config.allow_flip,
            use_stop_loss: config.use_stop_loss,
            use_take_profit: config.use_take_profit,
            use_max_holding: config.use_max_holding,
        }
    }

    pub fn state(&self) -> &PositionState {
        &self.state
    }

    /// Count down the re-entry cooldown. Only ticks while flat.
    pub fn tick_cooldown(&mut self) {
        if self.state.cooldown_remaining > 0 && self.state.is_flat() {
            self.state.cooldown_remaining -= 1;
        }
    }

    /// Record the fill price of the most recent open.
    pub fn confirm_entry_fill(&mut self, price: f64) {
        self.state.entry_price = Some(price);
    }

    /// Evaluate one bar's transition. Mutates counters and side; the
    /// caller settles fills per the execution timing.
    pub fn decide(&mut self, bar: &Bar, signals: SignalOutcome) -> BarDecision {
        match self.state.side {
            PositionSide::Flat => self.consider_entry(bar, signals),
            PositionSide::Long => self.manage(bar, signals, TradeSide::Long),
            PositionSide::Short => self.manage(bar, signals, TradeSide::Short),
        }
    }

    fn consider_entry(&mut self, bar: &Bar, signals: SignalOutcome) -> BarDecision {
        if self.state.cooldown_remaining > 0 {
            return BarDecision::Hold;
        }
        // long checked first: deterministic ordering if both ever fire
        let side = if signals.long_entry {
            TradeSide::Long
        } else if signals.short_entry {
            TradeSide::Short
        } else {
            return BarDecision::Hold;
        };
        self.state.open(side, bar.index);
        BarDecision::Open {
            side,
            reason: EntryReason::fresh(side),
        }
    }

    fn manage(&mut self, bar: &Bar, signals: SignalOutcome, side: TradeSide) -> BarDecision {
        let entry_price = match self.state.entry_price {
            Some(price) => price,
            // entry fill still pending; nothing to manage yet
            None => return BarDecision::Hold,
        };

        let (stop_hit, target_hit, exit_signal, opposite_entry, flip_to) = match side {
            TradeSide::Long => (
                bar.low <= entry_price * (1.0 - self.stop_loss_percent),
                bar.high >= entry_price * (1.0 + self.take_profit_percent),
                signals.long_exit,
                signals.short_entry,
                TradeSide::Short,
            ),
            TradeSide::Short => (
                bar.high >= entry_price * (1.0 + self.stop_loss_percent),
                bar.low <= entry_price * (1.0 - self.take_profit_percent),
                signals.short_exit,
                signals.long_entry,
                TradeSide::Long,
            ),
        };

        if self.use_stop_loss && stop_hit {
            self.state.consecutive_stop_count += 1;
            self.state.cooldown_remaining = self.cooldown_bars;
            self.state.clear();
            return BarDecision::Close {
                reason: ExitReason::StopLoss,
            };
        }

        if self.use_take_profit && target_hit {
            self.state.consecutive_stop_count = 0;
            self.state.clear();
            return BarDecision::Close {
                reason: ExitReason::TakeProfit,
            };
        }

        if self.exit_is_reversal {
            if exit_signal {
                self.state.consecutive_stop_count = 0;
                if self.allow_flip && self.state.cooldown_remaining == 0 {
                    self.state.clear();
                    self.state.open(flip_to, bar.index);
                    return BarDecision::Flip { to: flip_to };
                }
                self.state.clear();
                return BarDecision::Close {
                    reason: ExitReason::MidExit,
                };
            }
        } else {
            if exit_signal {
                self.state.consecutive_stop_count = 0;
                self.state.clear();
                return BarDecision::Close {
                    reason: ExitReason::MidExit,
                };
            }
            if self.allow_flip && opposite_entry && self.state.cooldown_remaining == 0 {
                self.state.consecutive_stop_count = 0;
                self.state.clear();
                self.state.open(flip_to, bar.index);
                return BarDecision::Flip { to: flip_to };
            }
        }

        if self.use_max_holding && self.state.bars_held(bar.index) >= self.max_holding_bars {
            self.state.clear();
            return BarDecision::Close {
                reason: ExitReason::MaxHold,
            };
        }

        BarDecision::Hold
    }
}
