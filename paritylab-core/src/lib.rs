//! ParityLab Core: indicator engine, signal policies, position state machine.
//!
//! This crate contains the decision logic of the system:
//! - Domain types (bars, position state, trades with the stable reason vocabulary)
//! - Incremental indicators with warm-up semantics and O(period) memory
//! - Pure signal policies (band crossover and line crossover families)
//! - Per-bar position state machine with a fixed exit-priority order
//! - Trade recorder with notional sizing, commissions, and a cash ledger
//! - Sequential session loop with configurable fill timing
//!
//! Everything here is deterministic: same bars + same config → same trades.
//! Loading bars, parsing reference exports, and matching the two trade lists
//! live in `paritylab-runner`.

pub mod domain;
pub mod engine;
pub mod fingerprint;
pub mod indicators;
pub mod signal;
pub mod strategy;
