//! Shared domain types for Parley.
//!
//! This crate contains the types passed between the relay layers: dialogue
//! turns and histories, the completion wire payloads, configuration, and
//! the error taxonomy.
//!
//! Zero infrastructure dependencies -- only serde, serde_json, thiserror.

pub mod completion;
pub mod config;
pub mod dialogue;
pub mod error;
