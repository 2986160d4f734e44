//! Bar: the fundamental market data unit.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// OHLCV bar for a single symbol over a fixed interval.
///
/// `timestamp` is the bar's open time; the close time is derived from the
/// run-level interval. `index` is the authoritative ordering key: every
/// previous/current comparison in the system is anchored to it, and feeding
/// bars out of index order is a hard error upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub index: u64,
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// Close time of this bar under the given interval.
    pub fn close_time(&self, interval: Duration) -> NaiveDateTime {
        self.timestamp + interval
    }

    /// Typical price (high + low + close) / 3, used by channel oscillators.
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    /// Returns true if any OHLC field is NaN or non-finite.
    pub fn is_void(&self) -> bool {
        !self.open.is_finite()
            || !self.high.is_finite()
            || !self.low.is_finite()
            || !self.close.is_finite()
    }

    /// Basic OHLC sanity check: high >= low, extremes bracket open and close,
    /// prices strictly positive.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.open > 0.0
            && self.close > 0.0
            && self.low > 0.0
    }
}
