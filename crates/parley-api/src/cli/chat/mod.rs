//! Interactive terminal chat against the relay.
//!
//! The loop talks to the same `RelayService` the Telegram dispatcher uses,
//! under a single local conversation key. Entry point:
//! `loop_runner::run_chat_loop`.

pub mod banner;
pub mod commands;
pub mod input;
pub mod loop_runner;
