//! Fill-timing policy for entries and exits.

use serde::{Deserialize, Serialize};

use crate::domain::{EntryReason, ExitReason, TradeSide};

/// Which price settles an order decided on a given bar.
///
/// Applied uniformly to every entry and exit in a run; the generated
/// trades are only comparable to a reference export produced under the
/// same timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionTiming {
    /// Fill at the decision bar's close, stamped with its close time.
    #[default]
    BarClose,

    /// Fill at the following bar's open, stamped with that bar's open
    /// time. Orders still pending when the stream ends are settled at the
    /// final close (exits) or dropped with a warning (entries).
    NextBarOpen,
}

/// An order decided on one bar, waiting for its fill price.
///
/// Only populated under `NextBarOpen`; a flip queues its close ahead of
/// its open so fills resolve in decision order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PendingFill {
    Open {
        side: TradeSide,
        reason: EntryReason,
    },
    Close {
        reason: ExitReason,
    },
}
