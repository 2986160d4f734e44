//! Simple Moving Average (SMA).
//!
//! Arithmetic mean of the last `period` closes. Warm-up: period bars.

use std::collections::VecDeque;

use crate::domain::Bar;
use crate::indicators::Indicator;

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    name: String,
    buffer: VecDeque<f64>,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "SMA period must be >= 1");
        Self {
            period,
            name: format!("sma_{period}"),
            buffer: VecDeque::with_capacity(period),
        }
    }

}

impl Indicator for Sma {
    fn name(&self) -> &str {
        &self.name
    }

    fn warmup_bars(&self) -> u64 {
        self.period as u64
    }

    fn update(&mut self, bar: &Bar) -> Option<f64> {
        if self.buffer.len() == self.period {
            self.buffer.pop_front();
        }
        self.buffer.push_back(bar.close);
        if self.buffer.len() < self.period {
            return None;
        }
        Some(self.buffer.iter().sum::<f64>() / self.period as f64)
    }

    fn reset(&mut self) {
        self.buffer.clear();
    }
}
