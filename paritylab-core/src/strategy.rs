//! Strategy configuration: indicator choice, signal policy, and risk knobs.
//!
//! A `StrategyConfig` is loaded once per run and never mutated. `validate`
//! runs before any indicator is built, so malformed user input surfaces as
//! a `ConfigError` instead of a panic deep in the engine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::indicators::{
    Apo, Cci, Ema, Indicator, Momentum, Roc, Rsi, Sma, Tema, TemaSpread,
};
use crate::signal::{BandThresholds, ExitMode, SignalMode, SignalPolicy};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("indicator period must be >= 1 (got {0})")]
    InvalidPeriod(usize),

    #[error("fast period {fast} must be strictly less than slow period {slow}")]
    PeriodOrder { fast: usize, slow: usize },

    #[error("band thresholds must satisfy lower < upper (got lower={lower}, upper={upper})")]
    ThresholdOrder { lower: f64, upper: f64 },

    #[error("{name} must be positive when enabled (got {value})")]
    NonPositive { name: &'static str, value: f64 },

    #[error("max_holding_bars must be >= 1 when max-holding is enabled")]
    ZeroMaxHolding,

    #[error("unknown strategy preset '{0}'")]
    UnknownPreset(String),
}

/// Indicator selection (serializable enum).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IndicatorConfig {
    /// Difference momentum: close - close[period].
    Momentum { period: usize },

    /// Simple moving average of closes.
    Sma { period: usize },

    /// Exponential moving average of closes.
    Ema { period: usize },

    /// Relative Strength Index (Wilder smoothing).
    Rsi { period: usize },

    /// Commodity Channel Index over typical prices.
    Cci { period: usize },

    /// Fractional rate of change over the period.
    Roc { period: usize },

    /// Absolute price oscillator: fast EMA minus slow EMA.
    Apo { fast_period: usize, slow_period: usize },

    /// Triple exponential moving average.
    Tema { period: usize },

    /// Short TEMA minus long TEMA, the crossover driver.
    TemaSpread {
        short_period: usize,
        long_period: usize,
    },
}

impl IndicatorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            IndicatorConfig::Momentum { period }
            | IndicatorConfig::Sma { period }
            | IndicatorConfig::Ema { period }
            | IndicatorConfig::Rsi { period }
            | IndicatorConfig::Cci { period }
            | IndicatorConfig::Roc { period }
            | IndicatorConfig::Tema { period } => {
                if period < 1 {
                    return Err(ConfigError::InvalidPeriod(period));
                }
            }
            IndicatorConfig::Apo {
                fast_period,
                slow_period,
            } => {
                if fast_period < 1 {
                    return Err(ConfigError::InvalidPeriod(fast_period));
                }
                if fast_period >= slow_period {
                    return Err(ConfigError::PeriodOrder {
                        fast: fast_period,
                        slow: slow_period,
                    });
                }
            }
            IndicatorConfig::TemaSpread {
                short_period,
                long_period,
            } => {
                if short_period < 1 {
                    return Err(ConfigError::InvalidPeriod(short_period));
                }
                if short_period >= long_period {
                    return Err(ConfigError::PeriodOrder {
                        fast: short_period,
                        slow: long_period,
                    });
                }
            }
        }
        Ok(())
    }

    /// Instantiate the configured indicator. Validates first, so bad
    /// parameters come back as errors rather than constructor panics.
    pub fn build(&self) -> Result<Box<dyn Indicator>, ConfigError> {
        self.validate()?;
        Ok(match *self {
            IndicatorConfig::Momentum { period } => Box::new(Momentum::new(period)),
            IndicatorConfig::Sma { period } => Box::new(Sma::new(period)),
            IndicatorConfig::Ema { period } => Box::new(Ema::new(period)),
            IndicatorConfig::Rsi { period } => Box::new(Rsi::new(period)),
            IndicatorConfig::Cci { period } => Box::new(Cci::new(period)),
            IndicatorConfig::Roc { period } => Box::new(Roc::new(period)),
            IndicatorConfig::Apo {
                fast_period,
                slow_period,
            } => Box::new(Apo::new(fast_period, slow_period)),
            IndicatorConfig::Tema { period } => Box::new(Tema::new(period)),
            IndicatorConfig::TemaSpread {
                short_period,
                long_period,
            } => Box::new(TemaSpread::new(short_period, long_period)),
        })
    }
}

/// Position size determination at entry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderSizing {
    /// Fixed notional value; quantity = notional / fill price.
    Notional { value: f64 },

    /// Fixed quantity in instrument units.
    Quantity { quantity: f64 },
}

impl Default for OrderSizing {
    fn default() -> Self {
        OrderSizing::Notional { value: 500.0 }
    }
}

impl OrderSizing {
    pub fn quantity_at(&self, price: f64) -> f64 {
        match *self {
            OrderSizing::Notional { value } => value / price,
            OrderSizing::Quantity { quantity } => quantity,
        }
    }
}

/// Immutable configuration snapshot for one strategy instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    pub name: String,
    pub indicator: IndicatorConfig,
    pub policy: SignalPolicy,
    #[serde(default)]
    pub sizing: OrderSizing,

    /// Stop-loss distance as a decimal fraction of the entry price.
    pub stop_loss_percent: f64,
    /// Take-profit distance as a decimal fraction of the entry price.
    pub take_profit_percent: f64,
    pub max_holding_bars: u64,
    #[serde(default)]
    pub cooldown_bars: u32,
    pub allow_flip: bool,
    pub use_stop_loss: bool,
    pub use_take_profit: bool,
    pub use_max_holding: bool,
}

impl StrategyConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.indicator.validate()?;
        if let SignalPolicy::Band { thresholds, .. } = self.policy {
            let BandThresholds { upper, lower, .. } = thresholds;
            if lower >= upper {
                return Err(ConfigError::ThresholdOrder { lower, upper });
            }
        }
        if self.use_stop_loss && self.stop_loss_percent <= 0.0 {
            return Err(ConfigError::NonPositive {
                name: "stop_loss_percent",
                value: self.stop_loss_percent,
            });
        }
        if self.use_take_profit && self.take_profit_percent <= 0.0 {
            return Err(ConfigError::NonPositive {
                name: "take_profit_percent",
                value: self.take_profit_percent,
            });
        }
        if self.use_max_holding && self.max_holding_bars == 0 {
            return Err(ConfigError::ZeroMaxHolding);
        }
        match self.sizing {
            OrderSizing::Notional { value } if value <= 0.0 => Err(ConfigError::NonPositive {
                name: "notional value",
                value,
            }),
            OrderSizing::Quantity { quantity } if quantity <= 0.0 => {
                Err(ConfigError::NonPositive {
                    name: "quantity",
                    value: quantity,
                })
            }
            _ => Ok(()),
        }
    }
}

/// All preset names, in catalog order.
pub const PRESET_NAMES: &[&str] = &[
    "cci_signal",
    "cci_mean_reversion",
    "rsi_mean_reversion",
    "roc_mean_reversion",
    "apo_mean_reversion",
    "tema_crossover",
];

/// Resolve a named preset from the catalog.
pub fn preset(name: &str) -> Result<StrategyConfig, ConfigError> {
    let config = match name {
        "cci_signal" => StrategyConfig {
            name: name.to_string(),
            indicator: IndicatorConfig::Cci { period: 14 },
            policy: SignalPolicy::Band {
                thresholds: BandThresholds {
                    upper: 205.0,
                    lower: -101.0,
                    mid: 12.0,
                },
                mode: SignalMode::Momentum,
                exit: ExitMode::Midpoint,
            },
            sizing: OrderSizing::default(),
            stop_loss_percent: 0.074,
            take_profit_percent: 0.05,
            max_holding_bars: 25,
            cooldown_bars: 0,
            allow_flip: true,
            use_stop_loss: true,
            use_take_profit: false,
            use_max_holding: true,
        },
        "cci_mean_reversion" => StrategyConfig {
            name: name.to_string(),
            indicator: IndicatorConfig::Cci { period: 20 },
            policy: SignalPolicy::Band {
                thresholds: BandThresholds {
                    upper: 100.0,
                    lower: -100.0,
                    mid: 0.0,
                },
                mode: SignalMode::MeanReversion,
                exit: ExitMode::Midpoint,
            },
            sizing: OrderSizing::default(),
            stop_loss_percent: 0.05,
            take_profit_percent: 0.05,
            max_holding_bars: 50,
            cooldown_bars: 0,
            allow_flip: false,
            use_stop_loss: true,
            use_take_profit: false,
            use_max_holding: true,
        },
        "rsi_mean_reversion" => StrategyConfig {
            name: name.to_string(),
            indicator: IndicatorConfig::Rsi { period: 14 },
            policy: SignalPolicy::Band {
                thresholds: BandThresholds {
                    upper: 70.0,
                    lower: 30.0,
                    mid: 50.0,
                },
                mode: SignalMode::MeanReversion,
                exit: ExitMode::Midpoint,
            },
            sizing: OrderSizing::default(),
            stop_loss_percent: 0.05,
            take_profit_percent: 0.05,
            max_holding_bars: 50,
            cooldown_bars: 0,
            allow_flip: false,
            use_stop_loss: true,
            use_take_profit: false,
            use_max_holding: true,
        },
        "roc_mean_reversion" => StrategyConfig {
            name: name.to_string(),
            indicator: IndicatorConfig::Roc { period: 22 },
            policy: SignalPolicy::Band {
                // percent-scale thresholds expressed on the indicator's
                // fractional scale
                thresholds: BandThresholds {
                    upper: 0.034,
                    lower: -0.036,
                    mid: -0.021,
                },
                mode: SignalMode::MeanReversion,
                exit: ExitMode::Midpoint,
            },
            sizing: OrderSizing::default(),
            stop_loss_percent: 0.021,
            take_profit_percent: 0.05,
            max_holding_bars: 100,
            cooldown_bars: 0,
            allow_flip: false,
            use_stop_loss: true,
            use_take_profit: false,
            use_max_holding: true,
        },
        "apo_mean_reversion" => StrategyConfig {
            name: name.to_string(),
            indicator: IndicatorConfig::Apo {
                fast_period: 10,
                slow_period: 122,
            },
            policy: SignalPolicy::Band {
                thresholds: BandThresholds {
                    upper: 38.0,
                    lower: -31.0,
                    mid: -2.0,
                },
                mode: SignalMode::MeanReversion,
                exit: ExitMode::Midpoint,
            },
            sizing: OrderSizing::default(),
            stop_loss_percent: 0.07,
            take_profit_percent: 0.05,
            max_holding_bars: 175,
            cooldown_bars: 0,
            allow_flip: false,
            use_stop_loss: true,
            use_take_profit: false,
            use_max_holding: true,
        },
        "tema_crossover" => StrategyConfig {
            name: name.to_string(),
            indicator: IndicatorConfig::TemaSpread {
                short_period: 14,
                long_period: 51,
            },
            policy: SignalPolicy::LineCross,
            sizing: OrderSizing::default(),
            stop_loss_percent: 0.09054410998184012,
            take_profit_percent: 0.05,
            max_holding_bars: 21,
            cooldown_bars: 0,
            allow_flip: true,
            use_stop_loss: true,
            use_take_profit: false,
            use_max_holding: true,
        },
        _ => return Err(ConfigError::UnknownPreset(name.to_string())),
    };
    Ok(config)
}
