//! Rate of Change (ROC).
//!
//! Fractional price change over the period: (close - close[period]) /
//! close[period]. A zero divisor yields 0.0. Warm-up: period + 1 bars.

use std::collections::VecDeque;

use crate::domain::Bar;
use crate::indicators::Indicator;

#[derive(Debug, Clone)]
pub struct Roc {
    period: usize,
    name: String,
    buffer: VecDeque<f64>,
}

impl Roc {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ROC period must be >= 1");
        Self {
            period,
            name: format!("roc_{period}"),
            buffer: VecDeque::with_capacity(period + 1),
        }
    }
}

impl Indicator for Roc {
    fn name(&self) -> &str {
        &self.name
    }

    fn warmup_bars(&self) -> u64 {
        self.period as u64 + 1
    }

    fn update(&mut self, bar: &Bar) -> Option<f64> {
        if self.buffer.len() == self.period + 1 {
            self.buffer.pop_front();
        }
        self.buffer.push_back(bar.close);
        if self.buffer.len() < self.period + 1 {
            return None;
        }
        let prev_price = self.buffer[0];
        if prev_price != 0.0 {
            Some((bar.close - prev_price) / prev_price)
        } else {
            Some(0.0)
        }
    }

    fn reset(&mut self) {
        self.buffer.clear();
    }
}
