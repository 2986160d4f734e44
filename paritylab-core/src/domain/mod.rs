//! Domain types for ParityLab.

pub mod bar;
pub mod position;
pub mod trade;

pub use bar::Bar;
pub use position::{PositionSide, PositionState};
pub use trade::{EntryReason, ExitReason, Trade, TradeSide};
