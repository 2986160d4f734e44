//! Trade-parity matching.
//!
//! Pairs the engine's trade list against a reference export and grades the
//! result. Both lists are sorted by entry timestamp and walked with two
//! cursors. Entries within the time tolerance pair up; when two candidates
//! sit at the same time distance, the one with the closer entry price wins.
//! A generated trade no reference entry can claim is overtrading
//! (`MISSING_REFERENCE`); an unclaimed reference trade is undertrading
//! (`MISSING_GENERATED`). Paired trades downgrade from `MATCHED` when the
//! side differs, when entry times differ inside the tolerance, or when net
//! PnL drifts beyond the epsilon.
//!
//! The zero-tolerance pass is the authoritative parity gate. Relaxed
//! tolerances exist to show how far apart two runs are and never count as
//! passing.

use chrono::NaiveDateTime;
use paritylab_core::domain::Trade;
use serde::{Deserialize, Serialize};

use crate::reference::ReferenceTrade;

/// Grade of one matcher output row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchClassification {
    Matched,
    /// Generated trade with no reference counterpart (overtrading).
    MissingReference,
    /// Reference trade with no generated counterpart (undertrading).
    MissingGenerated,
    SideMismatch,
    TimeMismatch,
    PnlMismatch,
}

impl MatchClassification {
    pub fn as_str(self) -> &'static str {
        match self {
            MatchClassification::Matched => "MATCHED",
            MatchClassification::MissingReference => "MISSING_REFERENCE",
            MatchClassification::MissingGenerated => "MISSING_GENERATED",
            MatchClassification::SideMismatch => "SIDE_MISMATCH",
            MatchClassification::TimeMismatch => "TIME_MISMATCH",
            MatchClassification::PnlMismatch => "PNL_MISMATCH",
        }
    }
}

/// How far apart two trades may sit and still pair up.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchTolerance {
    /// Maximum absolute entry-time distance for pairing, in minutes.
    pub time_tolerance_minutes: f64,
    /// Entry-price distance a tie-break candidate must stay within.
    pub price_tolerance: f64,
    /// Net-PnL distance treated as equal. Reference exports round to
    /// cents, so exact equality is not attainable.
    pub pnl_epsilon: f64,
}

impl MatchTolerance {
    /// The authoritative gate: entries must land on the same minute.
    pub fn strict() -> Self {
        Self {
            time_tolerance_minutes: 0.0,
            price_tolerance: 1e-6,
            pnl_epsilon: 0.05,
        }
    }

    /// Diagnostic tolerances for judging how close a failing run is.
    pub fn relaxed() -> Self {
        Self {
            time_tolerance_minutes: 60.0,
            price_tolerance: 5.0,
            pnl_epsilon: 1.0,
        }
    }
}

/// One graded pairing (or non-pairing). Deltas are generated minus
/// reference and absent when either half is missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub classification: MatchClassification,
    pub generated: Option<Trade>,
    pub reference: Option<ReferenceTrade>,
    pub time_delta_minutes: Option<f64>,
    pub price_delta: Option<f64>,
    pub pnl_delta: Option<f64>,
}

impl MatchResult {
    fn missing_reference(trade: &Trade) -> Self {
        Self {
            classification: MatchClassification::MissingReference,
            generated: Some(trade.clone()),
            reference: None,
            time_delta_minutes: None,
            price_delta: None,
            pnl_delta: None,
        }
    }

    fn missing_generated(trade: &ReferenceTrade) -> Self {
        Self {
            classification: MatchClassification::MissingGenerated,
            generated: None,
            reference: Some(trade.clone()),
            time_delta_minutes: None,
            price_delta: None,
            pnl_delta: None,
        }
    }
}

/// Full matcher output: every graded row plus the aggregate counts the
/// parity gate reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchReport {
    pub results: Vec<MatchResult>,
    pub tolerance: MatchTolerance,
    pub generated_trade_count: usize,
    pub reference_trade_count: usize,
    pub matched_count: usize,
    pub side_mismatch_count: usize,
    pub time_mismatch_count: usize,
    pub pnl_mismatch_count: usize,
    pub missing_reference_count: usize,
    pub missing_generated_count: usize,
    pub generated_net_pnl: f64,
    pub reference_net_pnl: f64,
    /// Absolute distance between the two lists' total net PnL.
    pub net_pnl_diff: f64,
}

impl MatchReport {
    /// Paired rows that failed to grade as `MATCHED`.
    pub fn mismatched_count(&self) -> usize {
        self.side_mismatch_count + self.time_mismatch_count + self.pnl_mismatch_count
    }

    /// True when every trade on both sides paired and graded `MATCHED`.
    pub fn is_clean(&self) -> bool {
        self.missing_reference_count == 0
            && self.missing_generated_count == 0
            && self.mismatched_count() == 0
    }
}

/// Match a generated trade list against a reference export.
///
/// Input order does not matter; both lists are walked in entry-timestamp
/// order and the output rows come back in that merged order.
pub fn match_trades(
    generated: &[Trade],
    reference: &[ReferenceTrade],
    tolerance: &MatchTolerance,
) -> MatchReport {
    let mut gen_order: Vec<&Trade> = generated.iter().collect();
    gen_order.sort_by_key(|t| t.entry_timestamp);
    let mut ref_order: Vec<&ReferenceTrade> = reference.iter().collect();
    ref_order.sort_by_key(|t| t.entry_timestamp);

    let mut results: Vec<MatchResult> = Vec::new();
    let mut i = 0;
    let mut j = 0;

    while i < gen_order.len() && j < ref_order.len() {
        let gen = gen_order[i];
        let reference_trade = ref_order[j];
        let delta = minutes_between(gen.entry_timestamp, reference_trade.entry_timestamp);

        if delta.abs() <= tolerance.time_tolerance_minutes {
            // Equidistant candidates on either cursor break the tie on
            // entry price; the passed-over trade stays unmatched.
            if let Some(next) = gen_order.get(i + 1) {
                let next_delta =
                    minutes_between(next.entry_timestamp, reference_trade.entry_timestamp);
                let next_gap = entry_gap(next, reference_trade);
                if next_delta.abs() == delta.abs()
                    && next_gap < entry_gap(gen, reference_trade)
                    && next_gap <= tolerance.price_tolerance
                {
                    results.push(MatchResult::missing_reference(gen));
                    i += 1;
                    continue;
                }
            }
            if let Some(next) = ref_order.get(j + 1) {
                let next_delta = minutes_between(gen.entry_timestamp, next.entry_timestamp);
                let next_gap = entry_gap(gen, next);
                if next_delta.abs() == delta.abs()
                    && next_gap < entry_gap(gen, reference_trade)
                    && next_gap <= tolerance.price_tolerance
                {
                    results.push(MatchResult::missing_generated(reference_trade));
                    j += 1;
                    continue;
                }
            }
            results.push(classify_pair(gen, reference_trade, tolerance));
            i += 1;
            j += 1;
        } else if delta < 0.0 {
            // This generated entry precedes every remaining reference
            // window and can never pair.
            results.push(MatchResult::missing_reference(gen));
            i += 1;
        } else {
            results.push(MatchResult::missing_generated(reference_trade));
            j += 1;
        }
    }
    while i < gen_order.len() {
        results.push(MatchResult::missing_reference(gen_order[i]));
        i += 1;
    }
    while j < ref_order.len() {
        results.push(MatchResult::missing_generated(ref_order[j]));
        j += 1;
    }

    let mut matched_count = 0;
    let mut side_mismatch_count = 0;
    let mut time_mismatch_count = 0;
    let mut pnl_mismatch_count = 0;
    let mut missing_reference_count = 0;
    let mut missing_generated_count = 0;
    for result in &results {
        match result.classification {
            MatchClassification::Matched => matched_count += 1,
            MatchClassification::SideMismatch => side_mismatch_count += 1,
            MatchClassification::TimeMismatch => time_mismatch_count += 1,
            MatchClassification::PnlMismatch => pnl_mismatch_count += 1,
            MatchClassification::MissingReference => missing_reference_count += 1,
            MatchClassification::MissingGenerated => missing_generated_count += 1,
        }
    }

    let generated_net_pnl: f64 = generated.iter().map(|t| t.net_pnl).sum();
    let reference_net_pnl: f64 = reference.iter().map(|t| t.net_pnl).sum();

    MatchReport {
        results,
        tolerance: *tolerance,
        generated_trade_count: generated.len(),
        reference_trade_count: reference.len(),
        matched_count,
        side_mismatch_count,
        time_mismatch_count,
        pnl_mismatch_count,
        missing_reference_count,
        missing_generated_count,
        generated_net_pnl,
        reference_net_pnl,
        net_pnl_diff: (generated_net_pnl - reference_net_pnl).abs(),
    }
}

fn classify_pair(
    gen: &Trade,
    reference_trade: &ReferenceTrade,
    tolerance: &MatchTolerance,
) -> MatchResult {
    let time_delta = minutes_between(gen.entry_timestamp, reference_trade.entry_timestamp);
    let price_delta = gen.entry_price - reference_trade.entry_price;
    let pnl_delta = gen.net_pnl - reference_trade.net_pnl;

    let classification = if gen.side != reference_trade.side {
        MatchClassification::SideMismatch
    } else if time_delta != 0.0 {
        MatchClassification::TimeMismatch
    } else if pnl_delta.abs() > tolerance.pnl_epsilon {
        MatchClassification::PnlMismatch
    } else {
        MatchClassification::Matched
    };

    MatchResult {
        classification,
        generated: Some(gen.clone()),
        reference: Some(reference_trade.clone()),
        time_delta_minutes: Some(time_delta),
        price_delta: Some(price_delta),
        pnl_delta: Some(pnl_delta),
    }
}

/// Signed minutes from `b` to `a`. Exact for minute-resolution data.
fn minutes_between(a: NaiveDateTime, b: NaiveDateTime) -> f64 {
    a.signed_duration_since(b).num_seconds() as f64 / 60.0
}

fn entry_gap(gen: &Trade, reference_trade: &ReferenceTrade) -> f64 {
    (gen.entry_price - reference_trade.entry_price).abs()
}
