//! Commodity Channel Index (CCI).
//!
//! Distance of the typical price from its moving average, scaled by mean
//! absolute deviation: (tp - sma_tp) / (0.015 * mean_dev). A zero mean
//! deviation yields 0.0. Warm-up: period bars.

use std::collections::VecDeque;

use crate::domain::Bar;
use crate::indicators::Indicator;

#[derive(Debug, Clone)]
pub struct Cci {
    period: usize,
    name: String,
    tp_buffer: VecDeque<f64>,
}

impl Cci {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "CCI period must be >= 1");
        Self {
            period,
            name: format!("cci_{period}"),
            tp_buffer: VecDeque::with_capacity(period),
        }
    }
}

impl Indicator for Cci {
    fn name(&self) -> &str {
        &self.name
    }

    fn warmup_bars(&self) -> u64 {
        self.period as u64
    }

    fn update(&mut self, bar: &Bar) -> Option<f64> {
        let tp = bar.typical_price();
        if self.tp_buffer.len() == self.period {
            self.tp_buffer.pop_front();
        }
        self.tp_buffer.push_back(tp);
        if self.tp_buffer.len() < self.period {
            return None;
        }

        let sma_tp = self.tp_buffer.iter().sum::<f64>() / self.period as f64;
        let mean_dev =
            self.tp_buffer.iter().map(|x| (x - sma_tp).abs()).sum::<f64>() / self.period as f64;

        if mean_dev != 0.0 {
            Some((tp - sma_tp) / (0.015 * mean_dev))
        } else {
            Some(0.0)
        }
    }

    fn reset(&mut self) {
        self.tp_buffer.clear();
    }
}
