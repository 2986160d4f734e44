//! Momentum (difference form).
//!
//! Raw price change over the period: close - close[period] bars ago.
//! Warm-up: period + 1 bars.

use std::collections::VecDeque;

use crate::domain::Bar;
use crate::indicators::Indicator;

#[derive(Debug, Clone)]
pub struct Momentum {
    period: usize,
    name: String,
    buffer: VecDeque<f64>,
}

impl Momentum {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "Momentum period must be >= 1");
        Self {
            period,
            name: format!("momentum_{period}"),
            buffer: VecDeque::with_capacity(period + 1),
        }
    }
}

impl Indicator for Momentum {
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
        Some(bar.close - self.buffer[0])
    }

    fn reset(&mut self) {
        self.buffer.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, collect_values, make_bars, DEFAULT_EPSILON};

    #[test]
    fn momentum_is_difference_over_period() {
        let bars = make_bars(&[100.0, 101.0, 103.0, 106.0, 110.0]);
        let mut mom = Momentum::new(2);
        let result = collect_values(&mut mom, &bars);

        assert_eq!(result[0], None);
        assert_eq!(result[1], None);
        assert_approx(result[2].unwrap(), 3.0, DEFAULT_EPSILON); // 103 - 100
        assert_approx(result[3].unwrap(), 5.0, DEFAULT_EPSILON); // 106 - 101
        assert_approx(result[4].unwrap(), 7.0, DEFAULT_EPSILON); // 110 - 103
    }

    #[test]
    fn momentum_negative_on_decline() {
        let bars = make_bars(&[110.0, 108.0, 105.0]);
        let mut mom = Momentum::new(2);
        let result = collect_values(&mut mom, &bars);
        assert_approx(result[2].unwrap(), -5.0, DEFAULT_EPSILON);
    }

    #[test]
    fn momentum_flat_series_is_zero() {
        let bars = make_bars(&[42.0; 6]);
        let mut mom = Momentum::new(3);
        let result = collect_values(&mut mom, &bars);
        assert_approx(result[5].unwrap(), 0.0, DEFAULT_EPSILON);
    }

    #[test]
    fn momentum_warmup_bars() {
        assert_eq!(Momentum::new(10).warmup_bars(), 11);
    }
}
