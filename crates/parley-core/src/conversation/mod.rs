//! Dialogue bookkeeping between completion rounds.

pub mod updater;

pub use updater::{TurnUpdater, apply_turn};
