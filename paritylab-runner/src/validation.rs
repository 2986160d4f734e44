//! Parity validation orchestration.
//!
//! One validation case is a strategy, its session settings, a bar series,
//! and the reference export those bars should reproduce. The session runs
//! with end-of-stream force-closing disabled because reference exports
//! drop their still-open trade; then the matcher grades the two lists
//! twice: once at zero tolerance (the gate) and optionally once relaxed
//! (the diagnostic). Cases are independent and batches run on the rayon
//! pool.

use paritylab_core::domain::Bar;
use paritylab_core::engine::{run_session, SessionConfig};
use paritylab_core::fingerprint::{hash_config, hash_dataset, ConfigHash, DatasetHash};
use paritylab_core::strategy::StrategyConfig;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::bars::load_bars_csv;
use crate::matcher::{match_trades, MatchReport, MatchTolerance};
use crate::metrics::SessionSummary;
use crate::reference::{load_reference_csv, ReferenceReport};
use crate::runner::{default_schema_version, RunError, SCHEMA_VERSION};

/// Matching configuration shared by every case in a validation run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValidationSettings {
    /// The authoritative gate.
    pub strict: MatchTolerance,
    /// Optional diagnostic pass. Never affects `passed`.
    pub relaxed: Option<MatchTolerance>,
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            strict: MatchTolerance::strict(),
            relaxed: Some(MatchTolerance::relaxed()),
        }
    }
}

/// One strategy/dataset/reference triple to validate.
#[derive(Debug, Clone)]
pub struct ValidationCase {
    pub name: String,
    pub strategy: StrategyConfig,
    pub session: SessionConfig,
    pub bars: Vec<Bar>,
    pub reference: ReferenceReport,
}

impl ValidationCase {
    /// Assemble a case from files on disk.
    ///
    /// `utc_offset_hours` is the exchange display offset the reference
    /// export was taken under.
    pub fn load(
        name: impl Into<String>,
        strategy: StrategyConfig,
        session: SessionConfig,
        bars_path: &Path,
        reference_path: &Path,
        utc_offset_hours: f64,
    ) -> Result<Self, RunError> {
        let loaded = load_bars_csv(bars_path)?;
        let reference = load_reference_csv(reference_path, utc_offset_hours)?;
        Ok(Self {
            name: name.into(),
            strategy,
            session,
            bars: loaded.bars,
            reference,
        })
    }
}

/// Verdict for one case: gate result, both matcher passes, and the
/// session summary for context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub case_name: String,
    /// Strict-gate verdict. The relaxed pass never sets this.
    pub passed: bool,
    pub strict: MatchReport,
    pub relaxed: Option<MatchReport>,
    pub summary: SessionSummary,
    pub config_hash: ConfigHash,
    pub dataset_hash: DatasetHash,
    pub reference_skipped_rows: usize,
    pub reference_incomplete_groups: usize,
    pub reference_open_trades_skipped: usize,
    pub warnings: Vec<String>,
}

/// Combined verdict across a batch of cases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationSummary {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub cases_run: usize,
    pub cases_passed: usize,
    pub all_passed: bool,
    pub reports: Vec<ValidationReport>,
}

/// Run one case through the session and both matcher passes.
pub fn validate_case(
    case: &ValidationCase,
    settings: &ValidationSettings,
) -> Result<ValidationReport, RunError> {
    // Reference exports drop their still-open trade, so the session must
    // not force-close at end of stream or the lists disagree by one.
    let mut session_config = case.session.clone();
    session_config.close_open_position_at_end = false;

    let result = run_session(case.strategy.clone(), session_config.clone(), &case.bars)?;
    let strict = match_trades(&result.trades, &case.reference.trades, &settings.strict);
    let relaxed = settings
        .relaxed
        .as_ref()
        .map(|tolerance| match_trades(&result.trades, &case.reference.trades, tolerance));

    let mut warnings = case.reference.warnings.clone();
    warnings.extend(result.warnings.iter().cloned());

    let summary = SessionSummary::compute(&result);
    Ok(ValidationReport {
        schema_version: SCHEMA_VERSION,
        case_name: case.name.clone(),
        passed: strict.is_clean(),
        strict,
        relaxed,
        summary,
        config_hash: hash_config(&case.strategy, &session_config),
        dataset_hash: hash_dataset(&case.bars),
        reference_skipped_rows: case.reference.skipped_rows,
        reference_incomplete_groups: case.reference.incomplete_groups,
        reference_open_trades_skipped: case.reference.open_trades_skipped,
        warnings,
    })
}

/// Validate a batch of independent cases in parallel.
///
/// Report order follows case order regardless of scheduling.
pub fn validate_all(
    cases: &[ValidationCase],
    settings: &ValidationSettings,
) -> Result<ValidationSummary, RunError> {
    let reports: Vec<ValidationReport> = cases
        .par_iter()
        .map(|case| validate_case(case, settings))
        .collect::<Result<_, _>>()?;

    let cases_passed = reports.iter().filter(|r| r.passed).count();
    Ok(ValidationSummary {
        schema_version: SCHEMA_VERSION,
        cases_run: reports.len(),
        cases_passed,
        all_passed: cases_passed == reports.len(),
        reports,
    })
}
