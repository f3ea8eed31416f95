//! `parley serve`: run the Telegram bot until interrupted.

use std::path::Path;
use std::sync::Arc;

use console::style;
use parley_infra::credentials::{BOT_TOKEN_ENV, Credentials};
use parley_infra::telegram::TelegramClient;
use parley_types::error::ConfigError;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::dispatch::Dispatcher;
use crate::shutdown_signal;
use crate::state::AppState;

pub async fn run_serve(config_path: &Path) -> anyhow::Result<()> {
    let credentials = Credentials::for_bot()?;
    let bot_token = credentials
        .bot_token
        .ok_or_else(|| ConfigError::MissingCredential(BOT_TOKEN_ENV.to_string()))?;

    let state = AppState::init(config_path, credentials.api_key).await?;
    let telegram = TelegramClient::new(&state.config.telegram, bot_token)?;

    let me = telegram.get_me().await?;
    let username = me.username.unwrap_or(me.first_name);
    info!(bot = %username, "authorized on Telegram");
    println!(
        "\n  {} Relaying as {}",
        style("*").cyan().bold(),
        style(format!("@{username}")).bold()
    );
    println!("  {}\n", style("Press Ctrl+C to stop.").dim());

    let shutdown = CancellationToken::new();
    let sweeper = state.start_sweeper(shutdown.clone());

    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("shutdown requested");
        signal_token.cancel();
    });

    let dispatcher = Arc::new(Dispatcher::new(telegram, Arc::clone(&state.relay)));
    dispatcher
        .run(state.config.telegram.poll_timeout_secs, shutdown.clone())
        .await;

    shutdown.cancel();
    sweeper.await?;
    println!("\n  Bot stopped.");
    Ok(())
}
