//! Band-crossover rules for oscillator-style indicators.

use serde::{Deserialize, Serialize};

use crate::signal::{ExitMode, SignalMode, SignalOutcome};

/// Upper/lower/mid levels for one band policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandThresholds {
    pub upper: f64,
    pub lower: f64,
    pub mid: f64,
}

/// Evaluate band entries and exits for one bar transition.
///
/// Mean reversion enters when the value crosses back inside the band;
/// momentum enters when it breaks out through the band. Midpoint exits
/// mirror the entry direction for momentum and oppose it for mean
/// reversion; breakout mode has no signal exits at all.
pub(crate) fn evaluate(
    thresholds: BandThresholds,
    mode: SignalMode,
    exit: ExitMode,
    previous: f64,
    current: f64,
) -> SignalOutcome {
    let BandThresholds { upper, lower, mid } = thresholds;

    let (long_entry, short_entry) = match mode {
        SignalMode::MeanReversion => (
            previous < lower && current >= lower,
            previous > upper && current <= upper,
        ),
        SignalMode::Momentum => (
            previous < upper && current >= upper,
            previous > lower && current <= lower,
        ),
    };

    let (long_exit, short_exit) = match exit {
        ExitMode::Midpoint => match mode {
            SignalMode::MeanReversion => (
                previous < mid && current >= mid,
                previous > mid && current <= mid,
            ),
            SignalMode::Momentum => (
                previous > mid && current <= mid,
                previous < mid && current >= mid,
            ),
        },
        ExitMode::Breakout => (false, false),
    };

    SignalOutcome {
        long_entry,
        short_entry,
        long_exit,
        short_exit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const THRESHOLDS: BandThresholds = BandThresholds {
        upper: 70.0,
        lower: 30.0,
        mid: 50.0,
    };

    fn eval(mode: SignalMode, exit: ExitMode, prev: f64, cur: f64) -> SignalOutcome {
        evaluate(THRESHOLDS, mode, exit, prev, cur)
    }

    #[test]
    fn mean_reversion_long_entry_crosses_up_through_lower() {
        let outcome = eval(SignalMode::MeanReversion, ExitMode::Midpoint, 28.5, 31.0);
        assert!(outcome.long_entry);
        assert!(!outcome.short_entry);
        assert!(!outcome.long_exit);
        assert!(!outcome.short_exit);
    }

    #[test]
    fn mean_reversion_short_entry_crosses_down_through_upper() {
        let outcome = eval(SignalMode::MeanReversion, ExitMode::Midpoint, 72.0, 69.0);
        assert!(outcome.short_entry);
        assert!(!outcome.long_entry);
    }

    #[test]
    fn momentum_long_entry_breaks_out_through_upper() {
        let outcome = eval(SignalMode::Momentum, ExitMode::Midpoint, 68.0, 71.0);
        assert!(outcome.long_entry);
        assert!(!outcome.short_entry);
    }

    #[test]
    fn momentum_short_entry_breaks_down_through_lower() {
        let outcome = eval(SignalMode::Momentum, ExitMode::Midpoint, 31.0, 29.0);
        assert!(outcome.short_entry);
        assert!(!outcome.long_entry);
    }

    #[test]
    fn arrival_on_boundary_counts_as_crossed() {
        // inclusive on the side moved toward: landing exactly on the
        // threshold fires
        let outcome = eval(SignalMode::MeanReversion, ExitMode::Midpoint, 29.0, 30.0);
        assert!(outcome.long_entry);
    }

    #[test]
    fn parked_on_boundary_fires_only_once() {
        // exclusive on the departure side: prev == threshold is no longer
        // "outside", so the second bar is quiet
        let first = eval(SignalMode::MeanReversion, ExitMode::Midpoint, 29.0, 30.0);
        assert!(first.long_entry);
        let second = eval(SignalMode::MeanReversion, ExitMode::Midpoint, 30.0, 30.0);
        assert!(!second.any());
    }

    #[test]
    fn mean_reversion_mid_exits_oppose_entry_direction() {
        // long entered from below the band, exits crossing UP through mid
        let outcome = eval(SignalMode::MeanReversion, ExitMode::Midpoint, 48.0, 52.0);
        assert!(outcome.long_exit);
        assert!(!outcome.short_exit);

        // short entered from above the band, exits crossing DOWN through mid
        let outcome = eval(SignalMode::MeanReversion, ExitMode::Midpoint, 53.0, 49.0);
        assert!(outcome.short_exit);
        assert!(!outcome.long_exit);
    }

    #[test]
    fn momentum_mid_exits_follow_entry_direction() {
        // momentum long gives back to the mid from above
        let outcome = eval(SignalMode::Momentum, ExitMode::Midpoint, 53.0, 49.0);
        assert!(outcome.long_exit);
        assert!(!outcome.short_exit);

        // momentum short retraces up through the mid
        let outcome = eval(SignalMode::Momentum, ExitMode::Midpoint, 48.0, 52.0);
        assert!(outcome.short_exit);
        assert!(!outcome.long_exit);
    }

    #[test]
    fn breakout_mode_never_emits_signal_exits() {
        let outcome = eval(SignalMode::Momentum, ExitMode::Breakout, 53.0, 49.0);
        assert!(!outcome.long_exit);
        assert!(!outcome.short_exit);

        let outcome = eval(SignalMode::MeanReversion, ExitMode::Breakout, 48.0, 52.0);
        assert!(!outcome.long_exit);
        assert!(!outcome.short_exit);
    }

    #[test]
    fn no_signal_when_value_stays_inside_band() {
        let outcome = eval(SignalMode::MeanReversion, ExitMode::Breakout, 45.0, 48.0);
        assert!(!outcome.any());
    }

    #[test]
    fn entries_are_mutually_exclusive() {
        for (prev, cur) in [
            (28.0, 31.0),
            (72.0, 68.0),
            (68.0, 72.0),
            (31.0, 28.0),
            (29.0, 71.0),
            (71.0, 29.0),
        ] {
            for mode in [SignalMode::MeanReversion, SignalMode::Momentum] {
                let outcome = eval(mode, ExitMode::Midpoint, prev, cur);
                assert!(
                    !(outcome.long_entry && outcome.short_entry),
                    "both entries fired for prev={prev}, cur={cur}, mode={mode:?}"
                );
            }
        }
    }

    #[test]
    fn asymmetric_thresholds() {
        // wide asymmetric band in oscillator units
        let thresholds = BandThresholds {
            upper: 205.0,
            lower: -101.0,
            mid: 12.0,
        };
        // momentum long breakout through the upper threshold
        let outcome = evaluate(
            thresholds,
            SignalMode::Momentum,
            ExitMode::Midpoint,
            198.0,
            207.5,
        );
        assert!(outcome.long_entry);
        // give-back through the asymmetric mid closes it
        let outcome = evaluate(
            thresholds,
            SignalMode::Momentum,
            ExitMode::Midpoint,
            14.0,
            11.0,
        );
        assert!(outcome.long_exit);
    }
}
