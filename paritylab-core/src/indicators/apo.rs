//! Absolute Price Oscillator (APO).
//!
//! Difference of a fast and a slow EMA over the same closes. Warm-up is
//! the slow period, since the fast EMA is always initialized first.

use crate::domain::Bar;
use crate::indicators::{Ema, Indicator};

#[derive(Debug, Clone)]
pub struct Apo {
    name: String,
    fast: Ema,
    slow: Ema,
    slow_period: usize,
}

impl Apo {
    pub fn new(fast_period: usize, slow_period: usize) -> Self {
        assert!(
            fast_period >= 1 && fast_period < slow_period,
            "APO requires 1 <= fast_period < slow_period"
        );
        Self {
            name: format!("apo_{fast_period}_{slow_period}"),
            fast: Ema::new(fast_period),
            slow: Ema::new(slow_period),
            slow_period,
        }
    }
}

impl Indicator for Apo {
    fn name(&self) -> &str {
        &self.name
    }

    fn warmup_bars(&self) -> u64 {
        self.slow_period as u64
    }

    fn update(&mut self, bar: &Bar) -> Option<f64> {
        let fast = self.fast.update(bar);
        let slow = self.slow.update(bar);
        match (fast, slow) {
            (Some(fast), Some(slow)) => Some(fast - slow),
            _ => None,
        }
    }

    fn reset(&mut self) {
        self.fast.reset();
        self.slow.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, collect_values, make_bars, DEFAULT_EPSILON};

    #[test]
    fn apo_warms_up_at_slow_period() {
        let bars = make_bars(&[100.0, 101.0, 102.0, 103.0, 104.0, 105.0]);
        let mut apo = Apo::new(2, 4);
        let result = collect_values(&mut apo, &bars);
        assert_eq!(result[2], None);
        assert!(result[3].is_some());
    }

    #[test]
    fn apo_constant_series_is_zero() {
        let bars = make_bars(&[75.0; 10]);
        let mut apo = Apo::new(3, 6);
        let result = collect_values(&mut apo, &bars);
        assert_approx(result[9].unwrap(), 0.0, DEFAULT_EPSILON);
    }

    #[test]
    fn apo_positive_in_uptrend() {
        // fast EMA tracks a rising series more closely than slow EMA
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + i as f64 * 2.0).collect();
        let bars = make_bars(&closes);
        let mut apo = Apo::new(3, 8);
        let result = collect_values(&mut apo, &bars);
        assert!(result[19].unwrap() > 0.0);
    }

    #[test]
    fn apo_negative_in_downtrend() {
        let closes: Vec<f64> = (0..20).map(|i| 200.0 - i as f64 * 2.0).collect();
        let bars = make_bars(&closes);
        let mut apo = Apo::new(3, 8);
        let result = collect_values(&mut apo, &bars);
        assert!(result[19].unwrap() < 0.0);
    }

    #[test]
    #[should_panic(expected = "fast_period < slow_period")]
    fn apo_rejects_inverted_periods() {
        Apo::new(26, 12);
    }

    #[test]
    fn apo_warmup_bars() {
        assert_eq!(Apo::new(12, 26).warmup_bars(), 26);
    }
}
