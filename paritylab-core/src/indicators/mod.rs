//! Incremental indicator implementations.
//!
//! Every indicator consumes bars one at a time through `update` and keeps a
//! fixed-capacity window, so memory stays O(period) regardless of stream
//! length. `update` returns `None` until the warm-up window is satisfied,
//! then `Some(value)` on every subsequent bar.
//!
//! `IndicatorEngine` wraps an indicator with the previous/current value pair
//! the signal layer consumes and enforces strictly increasing bar indices.

pub mod apo;
pub mod cci;
pub mod ema;
pub mod momentum;
pub mod roc;
pub mod rsi;
pub mod sma;
pub mod tema;

pub use apo::Apo;
pub use cci::Cci;
pub use ema::Ema;
pub use momentum::Momentum;
pub use roc::Roc;
pub use rsi::Rsi;
pub use sma::Sma;
pub use tema::{Tema, TemaSpread};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::Bar;

/// Trait for incremental indicators.
///
/// Implementations must be deterministic: identical bar sequences and
/// configuration produce identical output, with no wall-clock or global
/// state involved. `update` is called exactly once per bar, in order;
/// the sequencing guard lives in `IndicatorEngine`.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g. "cci_14", "tema_spread_14_51").
    fn name(&self) -> &str;

    /// Number of bars that must be consumed before `update` yields a value.
    fn warmup_bars(&self) -> u64;

    /// Feed one bar. Returns `None` during warm-up, `Some(value)` after.
    fn update(&mut self, bar: &Bar) -> Option<f64>;

    /// Drop all accumulated state, as if freshly constructed.
    fn reset(&mut self);
}

impl std::fmt::Debug for dyn Indicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Indicator")
            .field("name", &self.name())
            .finish_non_exhaustive()
    }
}

/// Previous/current value pair consumed by the signal layer.
///
/// `previous_value` starts at 0.0 and still holds that initial value on the
/// first initialized bar; from the second initialized bar on it trails
/// `current_value` by exactly one bar.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct IndicatorState {
    pub current_value: f64,
    pub previous_value: f64,
    pub initialized: bool,
}

/// Bars were fed out of index order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("bar index {index} does not advance past {last_index}; bars must arrive in strictly increasing index order")]
pub struct SequenceError {
    pub index: u64,
    pub last_index: u64,
}

/// Sequencing wrapper around a boxed indicator.
///
/// Owns the previous/current pair so the signal layer never has to track
/// indicator history itself.
#[derive(Debug)]
pub struct IndicatorEngine {
    indicator: Box<dyn Indicator>,
    state: IndicatorState,
    last_index: Option<u64>,
}

impl IndicatorEngine {
    pub fn new(indicator: Box<dyn Indicator>) -> Self {
        Self {
            indicator,
            state: IndicatorState::default(),
            last_index: None,
        }
    }

    pub fn name(&self) -> &str {
        self.indicator.name()
    }

    pub fn warmup_bars(&self) -> u64 {
        self.indicator.warmup_bars()
    }

    pub fn state(&self) -> IndicatorState {
        self.state
    }

    pub fn is_initialized(&self) -> bool {
        self.state.initialized
    }

    /// Feed one bar, returning the refreshed state.
    ///
    /// The previous value is shifted only on bars where the indicator was
    /// already initialized, so the first initialized bar pairs the first
    /// real value with the 0.0 placeholder.
    pub fn update(&mut self, bar: &Bar) -> Result<IndicatorState, SequenceError> {
        if let Some(last) = self.last_index {
            if bar.index <= last {
                return Err(SequenceError {
                    index: bar.index,
                    last_index: last,
                });
            }
        }
        self.last_index = Some(bar.index);

        if let Some(value) = self.indicator.update(bar) {
            if self.state.initialized {
                self.state.previous_value = self.state.current_value;
            }
            self.state.current_value = value;
            self.state.initialized = true;
        }
        Ok(self.state)
    }

    pub fn reset(&mut self) {
        self.indicator.reset();
        self.state = IndicatorState::default();
        self.last_index = None;
    }
}

/// Create synthetic hourly bars from close prices for testing.
///
/// Generates plausible OHLV: open = prev_close (or close for first bar),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0, volume = 1000.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    let start = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            let high = open.max(close) + 1.0;
            let low = open.min(close) - 1.0;
            Bar {
                index: i as u64,
                timestamp: start + chrono::Duration::hours(i as i64),
                open,
                high,
                low,
                close,
                volume: 1000.0,
            }
        })
        .collect()
}

/// Feed every bar through an indicator and collect the per-bar outputs.
#[cfg(test)]
pub fn collect_values(indicator: &mut dyn Indicator, bars: &[Bar]) -> Vec<Option<f64>> {
    bars.iter().map(|bar| indicator.update(bar)).collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
