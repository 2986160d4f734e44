//! Completed trades and the stable reason vocabulary.
//!
//! Reason strings are part of the external interface: the parity matcher and
//! the reporting artifacts consume them verbatim, so the `as_str` values here
//! must never change.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a trade (open positions are tracked separately as
/// `PositionSide`, which adds Flat).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeSide {
    Long,
    Short,
}

impl TradeSide {
    pub fn opposite(self) -> Self {
        match self {
            TradeSide::Long => TradeSide::Short,
            TradeSide::Short => TradeSide::Long,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TradeSide::Long => "long",
            TradeSide::Short => "short",
        }
    }
}

impl fmt::Display for TradeSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a position was opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntryReason {
    #[serde(rename = "Long Entry")]
    LongEntry,
    #[serde(rename = "Short Entry")]
    ShortEntry,
    #[serde(rename = "Flip to Long")]
    FlipToLong,
    #[serde(rename = "Flip to Short")]
    FlipToShort,
}

impl EntryReason {
    pub fn as_str(self) -> &'static str {
        match self {
            EntryReason::LongEntry => "Long Entry",
            EntryReason::ShortEntry => "Short Entry",
            EntryReason::FlipToLong => "Flip to Long",
            EntryReason::FlipToShort => "Flip to Short",
        }
    }

    /// Entry reason for a fresh (non-flip) open.
    pub fn fresh(side: TradeSide) -> Self {
        match side {
            TradeSide::Long => EntryReason::LongEntry,
            TradeSide::Short => EntryReason::ShortEntry,
        }
    }

    /// Entry reason for the open half of a flip.
    pub fn flip(to: TradeSide) -> Self {
        match to {
            TradeSide::Long => EntryReason::FlipToLong,
            TradeSide::Short => EntryReason::FlipToShort,
        }
    }
}

impl fmt::Display for EntryReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a position was closed.
///
/// `EndOfData` is the forced close when the stream ends with a position
/// still open; it surfaces as "manual" downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExitReason {
    #[serde(rename = "SL")]
    StopLoss,
    #[serde(rename = "TP")]
    TakeProfit,
    #[serde(rename = "Mid Exit")]
    MidExit,
    #[serde(rename = "Flip")]
    Flip,
    #[serde(rename = "Max Hold")]
    MaxHold,
    #[serde(rename = "manual")]
    EndOfData,
}

impl ExitReason {
    pub fn as_str(self) -> &'static str {
        match self {
            ExitReason::StopLoss => "SL",
            ExitReason::TakeProfit => "TP",
            ExitReason::MidExit => "Mid Exit",
            ExitReason::Flip => "Flip",
            ExitReason::MaxHold => "Max Hold",
            ExitReason::EndOfData => "manual",
        }
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A completed round trip: one open event paired with one close event.
///
/// Immutable once created. Timestamps are fill times under the configured
/// execution timing, so `exit_timestamp > entry_timestamp` always holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub side: TradeSide,
    pub quantity: f64,
    pub entry_timestamp: NaiveDateTime,
    pub entry_price: f64,
    pub exit_timestamp: NaiveDateTime,
    pub exit_price: f64,
    pub entry_reason: EntryReason,
    pub exit_reason: ExitReason,
    pub bars_held: u64,
    pub gross_pnl: f64,
    pub commission: f64,
    pub net_pnl: f64,
}

impl Trade {
    pub fn is_winner(&self) -> bool {
        self.net_pnl > 0.0
    }
}
