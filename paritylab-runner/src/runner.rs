//! Backtest orchestration.
//!
//! Glues bar loading, the session loop, and summary metrics into one call
//! and stamps the output with the fingerprints that make runs comparable
//! across machines and over time.

use paritylab_core::domain::Trade;
use paritylab_core::engine::{run_session, EquityPoint, SessionConfig, SessionError};
use paritylab_core::fingerprint::{hash_config, ConfigHash, DatasetHash, RunId};
use paritylab_core::strategy::StrategyConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bars::{LoadError, LoadedBars};
use crate::metrics::SessionSummary;
use crate::reference::ReferenceError;

/// Version stamp embedded in every serialized result. Bump when the
/// result layout changes shape.
pub const SCHEMA_VERSION: u32 = 1;

pub(crate) fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Errors from running a backtest or validation end to end.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("data error: {0}")]
    Data(#[from] LoadError),

    #[error("reference error: {0}")]
    Reference(#[from] ReferenceError),

    #[error("session error: {0}")]
    Session(#[from] SessionError),
}

/// A finished run plus everything needed to reproduce or compare it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub symbol: String,
    pub strategy: StrategyConfig,
    pub session: SessionConfig,
    pub summary: SessionSummary,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
    pub config_hash: ConfigHash,
    pub dataset_hash: DatasetHash,
    /// Combined digest of `config_hash` and `dataset_hash`.
    pub run_id: String,
    pub warnings: Vec<String>,
}

/// Run one strategy over loaded bars and assemble the result envelope.
pub fn run_backtest(
    symbol: &str,
    strategy: StrategyConfig,
    session: SessionConfig,
    data: &LoadedBars,
) -> Result<BacktestResult, RunError> {
    let result = run_session(strategy.clone(), session.clone(), &data.bars)?;
    let summary = SessionSummary::compute(&result);
    let config_hash = hash_config(&strategy, &session);
    let run_id = RunId::new(config_hash.clone(), data.dataset_hash.clone()).hash();

    Ok(BacktestResult {
        schema_version: SCHEMA_VERSION,
        symbol: symbol.to_string(),
        strategy,
        session,
        summary,
        trades: result.trades,
        equity_curve: result.equity_curve,
        config_hash,
        dataset_hash: data.dataset_hash.clone(),
        run_id,
        warnings: result.warnings,
    })
}
