//! The relay entry point used by every front end.

pub mod service;

pub use service::{RelayPolicy, RelayReply, RelayService, TurnOutcome, elapsed_suffix};
