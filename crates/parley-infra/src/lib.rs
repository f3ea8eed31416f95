//! Infrastructure layer for Parley.
//!
//! Contains the I/O implementations behind the ports defined in
//! `parley-core`: the reqwest-backed completion client, the Telegram Bot
//! API client used by the message dispatcher, and configuration plus
//! credential loading.

pub mod completion;
pub mod config;
pub mod credentials;
pub mod telegram;
