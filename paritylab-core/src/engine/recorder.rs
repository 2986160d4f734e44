//! Trade recording and cash accounting.
//!
//! The recorder only ever learns about *fills*: the state machine decides,
//! the session settles the fill per the execution timing, and the recorder
//! books it. Commission is charged per side at `quantity * price * rate`.
//! Entry commission leaves cash at open; gross PnL net of exit commission
//! arrives at close.

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::domain::{EntryReason, ExitReason, Trade, TradeSide};

/// A filled entry waiting for its exit.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenTrade {
    pub side: TradeSide,
    pub quantity: f64,
    pub entry_timestamp: NaiveDateTime,
    pub entry_price: f64,
    pub entry_reason: EntryReason,
    pub entry_bar_index: u64,
    pub entry_commission: f64,
}

/// The recorder was asked to book a second open while one is outstanding.
/// The state machine never produces this; hitting it means the session
/// mis-sequenced a flip's close and open halves.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("cannot open a {attempted} position while a {existing} position is already open")]
pub struct StateInvariantViolation {
    pub existing: TradeSide,
    pub attempted: TradeSide,
}

/// Books fills into completed trades and tracks cash.
#[derive(Debug, Clone)]
pub struct TradeRecorder {
    cash: f64,
    commission_rate: f64,
    total_commission: f64,
    open: Option<OpenTrade>,
    trades: Vec<Trade>,
}

impl TradeRecorder {
    pub fn new(initial_capital: f64, commission_rate: f64) -> Self {
        Self {
            cash: initial_capital,
            commission_rate,
            total_commission: 0.0,
            open: None,
            trades: Vec::new(),
        }
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn total_commission(&self) -> f64 {
        self.total_commission
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn open_position(&self) -> Option<&OpenTrade> {
        self.open.as_ref()
    }

    pub fn has_open_position(&self) -> bool {
        self.open.is_some()
    }

    pub fn into_trades(self) -> Vec<Trade> {
        self.trades
    }

    /// Book an entry fill.
    pub fn open(
        &mut self,
        side: TradeSide,
        quantity: f64,
        fill_price: f64,
        timestamp: NaiveDateTime,
        reason: EntryReason,
        entry_bar_index: u64,
    ) -> Result<(), StateInvariantViolation> {
        if let Some(existing) = &self.open {
            return Err(StateInvariantViolation {
                existing: existing.side,
                attempted: side,
            });
        }
        let commission = quantity * fill_price * self.commission_rate;
        self.cash -= commission;
        self.total_commission += commission;
        self.open = Some(OpenTrade {
            side,
            quantity,
            entry_timestamp: timestamp,
            entry_price: fill_price,
            entry_reason: reason,
            entry_bar_index,
            entry_commission: commission,
        });
        Ok(())
    }

    /// Book an exit fill against the outstanding entry, completing a trade.
    /// A close with no open position is a no-op and returns `None`.
    pub fn close(
        &mut self,
        fill_price: f64,
        timestamp: NaiveDateTime,
        exit_bar_index: u64,
        reason: ExitReason,
    ) -> Option<&Trade> {
        let open = self.open.take()?;
        let exit_commission = open.quantity * fill_price * self.commission_rate;
        let gross_pnl = match open.side {
            TradeSide::Long => (fill_price - open.entry_price) * open.quantity,
            TradeSide::Short => (open.entry_price - fill_price) * open.quantity,
        };
        let commission = open.entry_commission + exit_commission;
        self.cash += gross_pnl - exit_commission;
        self.total_commission += exit_commission;
        self.trades.push(Trade {
            side: open.side,
            quantity: open.quantity,
            entry_timestamp: open.entry_timestamp,
            entry_price: open.entry_price,
            exit_timestamp: timestamp,
            exit_price: fill_price,
            entry_reason: open.entry_reason,
            exit_reason: reason,
            bars_held: exit_bar_index.saturating_sub(open.entry_bar_index),
            gross_pnl,
            commission,
            net_pnl: gross_pnl - commission,
        });
        self.trades.last()
    }

    /// Mark-to-market PnL of the outstanding position. Zero when flat.
    pub fn unrealized_pnl(&self, mark_price: f64) -> f64 {
        match &self.open {
            Some(open) => match open.side {
                TradeSide::Long => (mark_price - open.entry_price) * open.quantity,
                TradeSide::Short => (open.entry_price - mark_price) * open.quantity,
            },
            None => 0.0,
        }
    }

    /// Cash plus mark-to-market PnL.
    pub fn equity(&self, mark_price: f64) -> f64 {
        self.cash + self.unrealized_pnl(mark_price)
    }
}
