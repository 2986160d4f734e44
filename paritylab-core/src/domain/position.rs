//! Position state owned by one state machine instance.

use serde::{Deserialize, Serialize};

use super::TradeSide;

/// Current exposure of a strategy instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionSide {
    Flat,
    Long,
    Short,
}

impl From<TradeSide> for PositionSide {
    fn from(side: TradeSide) -> Self {
        match side {
            TradeSide::Long => PositionSide::Long,
            TradeSide::Short => PositionSide::Short,
        }
    }
}

/// Mutable per-instance position state.
///
/// Exclusively owned by one `PositionMachine`; never shared across strategy
/// instances. `entry_price` is `None` while an entry fill is still pending
/// under next-bar-open timing. `entry_bar_index` is set on open and cleared
/// exactly when the side transitions back to flat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionState {
    pub side: PositionSide,
    pub entry_price: Option<f64>,
    pub entry_bar_index: Option<u64>,
    pub cooldown_remaining: u32,
    pub consecutive_stop_count: u32,
}

impl PositionState {
    pub fn flat() -> Self {
        Self {
            side: PositionSide::Flat,
            entry_price: None,
            entry_bar_index: None,
            cooldown_remaining: 0,
            consecutive_stop_count: 0,
        }
    }

    pub fn is_flat(&self) -> bool {
        self.side == PositionSide::Flat
    }

    pub fn is_long(&self) -> bool {
        self.side == PositionSide::Long
    }

    pub fn is_short(&self) -> bool {
        self.side == PositionSide::Short
    }

    /// Bars held so far, measured on the bar index axis. Zero when flat.
    pub fn bars_held(&self, current_bar_index: u64) -> u64 {
        match self.entry_bar_index {
            Some(entry) => current_bar_index.saturating_sub(entry),
            None => 0,
        }
    }

    /// Transition to an open position. Counters are untouched; the state
    /// machine adjusts them per exit rule.
    pub(crate) fn open(&mut self, side: TradeSide, entry_bar_index: u64) {
        self.side = side.into();
        self.entry_price = None;
        self.entry_bar_index = Some(entry_bar_index);
    }

    /// Transition back to flat, clearing the entry fields.
    pub(crate) fn clear(&mut self) {
        self.side = PositionSide::Flat;
        self.entry_price = None;
        self.entry_bar_index = None;
    }
}

impl Default for PositionState {
    fn default() -> Self {
        Self::flat()
    }
}
