//! Relative Strength Index (RSI).
//!
//! Wilder smoothing of average gains and losses. The seed averages the
//! first `period` price changes, so warm-up is period + 1 bars.
//! Edge cases: avg_loss == 0 and avg_gain == 0 (flat series) → 50;
//! avg_loss == 0 alone → 100.

use crate::domain::Bar;
use crate::indicators::Indicator;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    name: String,
    prev_close: Option<f64>,
    changes_seen: usize,
    gain_sum: f64,
    loss_sum: f64,
    avg_gain: f64,
    avg_loss: f64,
    seeded: bool,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            name: format!("rsi_{period}"),
            prev_close: None,
            changes_seen: 0,
            gain_sum: 0.0,
            loss_sum: 0.0,
            avg_gain: 0.0,
            avg_loss: 0.0,
            seeded: false,
        }
    }

    fn compute(&self) -> f64 {
        if self.avg_loss == 0.0 {
            if self.avg_gain == 0.0 {
                return 50.0; // no movement either way
            }
            return 100.0;
        }
        let rs = self.avg_gain / self.avg_loss;
        100.0 - (100.0 / (1.0 + rs))
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn warmup_bars(&self) -> u64 {
        self.period as u64 + 1
    }

    fn update(&mut self, bar: &Bar) -> Option<f64> {
        let close = bar.close;
        let prev = match self.prev_close {
            Some(prev) => prev,
            None => {
                self.prev_close = Some(close);
                return None;
            }
        };
        self.prev_close = Some(close);

        let change = close - prev;
        let gain = change.max(0.0);
        let loss = (-change).max(0.0);

        if !self.seeded {
            self.gain_sum += gain;
            self.loss_sum += loss;
            self.changes_seen += 1;
            if self.changes_seen < self.period {
                return None;
            }
            self.avg_gain = self.gain_sum / self.period as f64;
            self.avg_loss = self.loss_sum / self.period as f64;
            self.seeded = true;
        } else {
            self.avg_gain = ((self.avg_gain * (self.period as f64 - 1.0)) + gain) / self.period as f64;
            self.avg_loss = ((self.avg_loss * (self.period as f64 - 1.0)) + loss) / self.period as f64;
        }
        Some(self.compute())
    }

    fn reset(&mut self) {
        self.prev_close = None;
        self.changes_seen = 0;
        self.gain_sum = 0.0;
        self.loss_sum = 0.0;
        self.avg_gain = 0.0;
        self.avg_loss = 0.0;
        self.seeded = false;
    }
}
