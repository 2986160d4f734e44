//! Triple Exponential Moving Average (TEMA) and the two-TEMA spread.
//!
//! TEMA chains three EMAs of the same period, each fed the previous one's
//! output once that one is initialized, and combines them as
//! 3*(ema1 - ema2) + ema3. Warm-up: 3*period - 2 bars.
//!
//! `TemaSpread` is the crossover driver: short TEMA minus long TEMA over
//! the same closes. Warm-up: 3*long_period - 2 bars.

use crate::domain::Bar;
use crate::indicators::{Ema, Indicator};

#[derive(Debug, Clone)]
pub struct Tema {
    period: usize,
    name: String,
    ema1: Ema,
    ema2: Ema,
    ema3: Ema,
}

impl Tema {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "TEMA period must be >= 1");
        Self {
            period,
            name: format!("tema_{period}"),
            ema1: Ema::new(period),
            ema2: Ema::new(period),
            ema3: Ema::new(period),
        }
    }

    fn update_value(&mut self, value: f64) -> Option<f64> {
        // downstream EMAs only see values from an initialized parent, so
        // their warm-up windows chain rather than overlap
        let v1 = self.ema1.update_value(value)?;
        let v2 = self.ema2.update_value(v1)?;
        let v3 = self.ema3.update_value(v2)?;
        Some(3.0 * (v1 - v2) + v3)
    }
}

impl Indicator for Tema {
    fn name(&self) -> &str {
        &self.name
    }

    fn warmup_bars(&self) -> u64 {
        3 * self.period as u64 - 2
    }

    fn update(&mut self, bar: &Bar) -> Option<f64> {
        self.update_value(bar.close)
    }

    fn reset(&mut self) {
        self.ema1.reset();
        self.ema2.reset();
        self.ema3.reset();
    }
}

#[derive(Debug, Clone)]
pub struct TemaSpread {
    name: String,
    short: Tema,
    long: Tema,
    long_period: usize,
}

impl TemaSpread {
    pub fn new(short_period: usize, long_period: usize) -> Self {
        assert!(
            short_period >= 1 && short_period < long_period,
            "TemaSpread requires 1 <= short_period < long_period"
        );
        Self {
            name: format!("tema_spread_{short_period}_{long_period}"),
            short: Tema::new(short_period),
            long: Tema::new(long_period),
            long_period,
        }
    }
}

impl Indicator for TemaSpread {
    fn name(&self) -> &str {
        &self.name
    }

    fn warmup_bars(&self) -> u64 {
        3 * self.long_period as u64 - 2
    }

    fn update(&mut self, bar: &Bar) -> Option<f64> {
        let short = self.short.update(bar);
        let long = self.long.update(bar);
        match (short, long) {
            (Some(short), Some(long)) => Some(short - long),
            _ => None,
        }
    }

    fn reset(&mut self) {
        self.short.reset();
        self.long.reset();
    }
}
