//! CLI command definitions for the `parley` binary.
//!
//! Uses clap derive macros for argument parsing. `serve` runs the Telegram
//! relay, `chat` talks to the same relay from the terminal.

pub mod chat;
pub mod config;
pub mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Relay chat messages to an OpenAI-style completion service.
#[derive(Parser)]
#[command(name = "parley", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file (defaults to $PARLEY_CONFIG, then the user config dir).
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the Telegram bot (needs TELE_API_KEY and OPENAI_API_KEY).
    Serve,

    /// Chat with the relay from the terminal (needs OPENAI_API_KEY).
    Chat {
        /// Conversation key for this session.
        #[arg(long, default_value = "local")]
        user: String,
    },

    /// Print the effective configuration as TOML.
    Config,

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

/// Log filter for the given verbosity flags.
pub fn log_filter(verbose: u8, quiet: bool) -> &'static str {
    match verbose {
        0 if quiet => "error",
        0 => "warn",
        1 => "info,parley=debug",
        _ => "trace",
    }
}
