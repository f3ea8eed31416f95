//! Parley CLI entry point.
//!
//! Binary name: `parley`
//!
//! Parses CLI arguments, sets up tracing, loads configuration and
//! credentials, then runs the Telegram dispatcher or the terminal chat.

mod cli;
mod dispatch;
mod state;

use clap::Parser;
use clap_complete::generate;
use parley_infra::config::default_config_path;
use parley_infra::credentials::Credentials;
use parley_observe::tracing_setup::{init_tracing, shutdown_tracing};

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.otel, cli::log_filter(cli.verbose, cli.quiet))
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let result = run(cli).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = cli.config.unwrap_or_else(default_config_path);

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            generate(shell, &mut cmd, "parley", &mut std::io::stdout());
        }

        Commands::Config => {
            cli::config::show_config(&config_path).await?;
        }

        Commands::Serve => {
            cli::serve::run_serve(&config_path).await?;
        }

        Commands::Chat { user } => {
            let credentials = Credentials::api_key_only()?;
            let state = AppState::init(&config_path, credentials.api_key).await?;
            cli::chat::loop_runner::run_chat_loop(&state, &user).await?;
        }
    }

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM.
///
/// A signal that cannot be installed never fires; the other still can.
pub(crate) async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
