//! Exponential Moving Average (EMA).
//!
//! alpha = 2 / (period + 1). Seeded from the first input and smoothed from
//! the second input on, but only reported as initialized after `period`
//! inputs. Warm-up: period bars.

use crate::domain::Bar;
use crate::indicators::Indicator;

#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    name: String,
    alpha: f64,
    value: f64,
    count: u64,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "EMA period must be >= 1");
        Self {
            period,
            name: format!("ema_{period}"),
            alpha: 2.0 / (period as f64 + 1.0),
            value: 0.0,
            count: 0,
        }
    }

    /// Feed a raw value rather than a bar close. Chained smoothers (TEMA,
    /// APO) use this to consume another indicator's output.
    pub(crate) fn update_value(&mut self, value: f64) -> Option<f64> {
        self.count += 1;
        if self.count == 1 {
            self.value = value;
        } else {
            self.value = (value - self.value) * self.alpha + self.value;
        }
        if self.count >= self.period as u64 {
            Some(self.value)
        } else {
            None
        }
    }
}

impl Indicator for Ema {
    fn name(&self) -> &str {
        &self.name
    }

    fn warmup_bars(&self) -> u64 {
        self.period as u64
    }

    fn update(&mut self, bar: &Bar) -> Option<f64> {
        self.update_value(bar.close)
    }

    fn reset(&mut self) {
        self.value = 0.0;
        self.count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, collect_values, make_bars, DEFAULT_EPSILON};

    #[test]
    fn ema_seeds_from_first_close() {
        // period=3, alpha=0.5
        // v0 = 100 (seed), v1 = (110-100)*0.5+100 = 105, v2 = (120-105)*0.5+105 = 112.5
        let bars = make_bars(&[100.0, 110.0, 120.0]);
        let mut ema = Ema::new(3);
        let result = collect_values(&mut ema, &bars);

        assert_eq!(result[0], None);
        assert_eq!(result[1], None);
        assert_approx(result[2].unwrap(), 112.5, DEFAULT_EPSILON);
    }

    #[test]
    fn ema_constant_series_is_constant() {
        let bars = make_bars(&[50.0; 8]);
        let mut ema = Ema::new(4);
        let result = collect_values(&mut ema, &bars);
        assert_approx(result[7].unwrap(), 50.0, DEFAULT_EPSILON);
    }

    #[test]
    fn ema_converges_toward_new_level() {
        let mut closes = vec![100.0; 5];
        closes.extend(vec![200.0; 30]);
        let bars = make_bars(&closes);
        let mut ema = Ema::new(5);
        let result = collect_values(&mut ema, &bars);
        let last = result.last().unwrap().unwrap();
        assert!(last > 199.0 && last <= 200.0, "ema did not converge: {last}");
    }

    #[test]
    fn ema_reset_reseeds() {
        let bars = make_bars(&[100.0, 110.0, 120.0]);
        let mut ema = Ema::new(2);
        collect_values(&mut ema, &bars);
        ema.reset();
        assert_eq!(ema.update(&bars[0]), None);
        // second input after reset reports again, seeded from bars[0]
        assert_approx(
            ema.update(&bars[1]).unwrap(),
            (110.0 - 100.0) * (2.0 / 3.0) + 100.0,
            DEFAULT_EPSILON,
        );
    }

    #[test]
    fn ema_warmup_bars() {
        assert_eq!(Ema::new(9).warmup_bars(), 9);
    }
}
