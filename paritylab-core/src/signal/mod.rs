//! Signal detection over previous/current indicator values.
//!
//! Detection is a pure function of the `(previous, current)` pair and the
//! configured policy; it holds no state and touches nothing else. Threshold
//! comparisons are inclusive on the side the value moves toward and
//! exclusive on the side it leaves, so a value parked exactly on a boundary
//! fires once, on the bar of first touch.

pub mod band;
pub mod line_cross;

pub use band::BandThresholds;

use serde::{Deserialize, Serialize};

/// The four crossing flags produced for one bar transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SignalOutcome {
    pub long_entry: bool,
    pub short_entry: bool,
    pub long_exit: bool,
    pub short_exit: bool,
}

impl SignalOutcome {
    pub fn any(&self) -> bool {
        self.long_entry || self.short_entry || self.long_exit || self.short_exit
    }
}

/// Entry interpretation for band policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalMode {
    /// Enter when the value crosses back inside the band from outside.
    MeanReversion,

    /// Enter when the value breaks out through the band in trend direction.
    Momentum,
}

/// Signal-exit interpretation for band policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExitMode {
    /// Exit when the value crosses the mid threshold.
    Midpoint,

    /// No signal-driven exits; only protective rules close positions.
    Breakout,
}

/// Strategy family selector, fixed at configuration time.
///
/// Evaluation dispatches on the variant once per bar instead of branching
/// on mode flags at every call site.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalPolicy {
    /// Oscillator band with upper/lower/mid thresholds.
    Band {
        thresholds: BandThresholds,
        mode: SignalMode,
        exit: ExitMode,
    },

    /// Difference series crossing the zero line. Exits are reversals:
    /// the opposite entry signal doubles as the exit signal.
    LineCross,
}

impl SignalPolicy {
    /// Evaluate the four crossing flags for one `(previous, current)` pair.
    pub fn evaluate(&self, previous: f64, current: f64) -> SignalOutcome {
        match *self {
            SignalPolicy::Band {
                thresholds,
                mode,
                exit,
            } => band::evaluate(thresholds, mode, exit, previous, current),
            SignalPolicy::LineCross => line_cross::evaluate(previous, current),
        }
    }

    /// Whether an exit signal in this family is itself a reversal signal.
    pub fn exit_is_reversal(&self) -> bool {
        matches!(self, SignalPolicy::LineCross)
    }
}
