//! Zero-line crossover rules for difference-style indicators.

use crate::signal::SignalOutcome;

/// Evaluate zero-line crossings for one bar transition.
///
/// Long entry fires when the difference series moves from <= 0 to > 0,
/// short entry on the mirror. Exits are reversals: each entry signal is
/// simultaneously the exit signal for the opposite side.
pub(crate) fn evaluate(previous: f64, current: f64) -> SignalOutcome {
    let long_entry = previous <= 0.0 && current > 0.0;
    let short_entry = previous >= 0.0 && current < 0.0;

    SignalOutcome {
        long_entry,
        short_entry,
        long_exit: short_entry,
        short_exit: long_entry,
    }
}
