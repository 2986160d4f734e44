//! Run spec files.
//!
//! A run spec is a small TOML file naming the symbol, the session settings,
//! and a strategy. The strategy is either a preset name or a full inline
//! config:
//!
//! ```toml
//! symbol = "BTCUSDT"
//! strategy = "cci_signal"
//!
//! [session]
//! warmup_bars = 300
//! ```
//!
//! Session fields fall back to their defaults when omitted, so a spec can
//! override a single knob without restating the rest.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use paritylab_core::engine::SessionConfig;
use paritylab_core::strategy::{preset, ConfigError, StrategyConfig};

#[derive(Debug, Error)]
pub enum SpecError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// One run described on disk: what to trade and how.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSpec {
    pub symbol: String,
    #[serde(default)]
    pub session: SessionConfig,
    pub strategy: StrategySpec,
}

/// Strategy field of a run spec: a preset name or a full inline config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StrategySpec {
    Preset(String),
    Inline(StrategyConfig),
}

impl StrategySpec {
    /// Resolve to a validated `StrategyConfig`.
    pub fn resolve(&self) -> Result<StrategyConfig, ConfigError> {
        match self {
            StrategySpec::Preset(name) => preset(name),
            StrategySpec::Inline(config) => {
                config.validate()?;
                Ok(config.clone())
            }
        }
    }
}

/// Load and parse a run spec file.
pub fn load_run_spec(path: &Path) -> Result<RunSpec, SpecError> {
    let content = std::fs::read_to_string(path).map_err(|source| SpecError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_run_spec(&content)
}

/// Parse a run spec from a TOML string.
pub fn parse_run_spec(content: &str) -> Result<RunSpec, SpecError> {
    Ok(toml::from_str(content)?)
}
