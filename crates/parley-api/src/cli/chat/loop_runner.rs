//! Terminal chat loop.
//!
//! Reads lines, handles slash commands locally and sends everything else
//! through the relay with a spinner while the upstream is working.

use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use parley_core::relay::{RelayReply, TurnOutcome};
use parley_types::dialogue::Role;
use tracing::debug;

use crate::state::AppState;

use super::banner::print_welcome_banner;
use super::commands::{self, ChatCommand};
use super::input::{ChatInput, InputEvent};

/// Longest turn preview shown by `/history`, in characters.
const HISTORY_PREVIEW_CHARS: usize = 100;

/// Run the interactive chat loop as `user`.
pub async fn run_chat_loop(state: &AppState, user: &str) -> anyhow::Result<()> {
    let relay = &state.relay;
    print_welcome_banner(
        relay.builder().model(),
        relay.client().endpoint(),
        user,
        relay.policy().window,
    );

    let prompt = format!("  {} ", style("You >").green().bold());
    let (mut chat_input, _writer) =
        ChatInput::new(prompt).map_err(|e| anyhow::anyhow!("Failed to initialize input: {e}"))?;

    loop {
        let text = match chat_input.read_line().await {
            InputEvent::Eof => break,
            InputEvent::Interrupted => {
                println!("\n  {}", style("Press Ctrl+D to exit, or keep chatting.").dim());
                continue;
            }
            InputEvent::Message(text) if text.is_empty() => continue,
            InputEvent::Message(text) => text,
        };

        if let Some(cmd) = commands::parse(&text) {
            match cmd {
                ChatCommand::Help => commands::print_help(),
                ChatCommand::Clear => {
                    relay.clear(user);
                    println!("\n  {}\n", style("Conversation cleared.").dim());
                }
                ChatCommand::History => print_history(state, user),
                ChatCommand::Exit => break,
                ChatCommand::Unknown(name) => {
                    println!(
                        "\n  {} Unknown command: {}. Type /help for available commands.\n",
                        style("?").yellow().bold(),
                        style(name).dim()
                    );
                }
            }
            continue;
        }

        let spinner = thinking_spinner();
        let reply = relay.respond(user, &text).await;
        spinner.finish_and_clear();
        print_reply(&reply);
    }

    println!("\n  {}", style("Session ended.").dim());
    chat_input.flush();
    Ok(())
}

fn thinking_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message("thinking...");
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

fn print_reply(reply: &RelayReply) {
    match &reply.outcome {
        TurnOutcome::Failed(err) => {
            debug!(error = %err, "round failed");
            println!("\n  {} {}", style("!").red().bold(), reply.text);
            println!("  {}\n", style(err.to_string()).dim());
        }
        TurnOutcome::Empty => {
            println!("\n  {} {}\n", style("?").yellow().bold(), reply.text.trim_end());
        }
        TurnOutcome::Answered(_) => {
            println!("\n  {} {}\n", style("Bot >").cyan().bold(), reply.text.trim_end());
        }
    }
}

fn print_history(state: &AppState, user: &str) {
    let history = state.relay.history(user);
    println!();
    if history.is_empty() {
        println!("  {}", style("Nothing remembered yet.").dim());
    }
    for turn in history.iter() {
        let label = match turn.role {
            Role::User => style("You").green(),
            Role::Assistant => style("Bot").cyan(),
        };
        println!("  {} {}", label.bold(), preview(&turn.content));
    }
    println!();
}

fn preview(content: &str) -> String {
    if content.chars().count() > HISTORY_PREVIEW_CHARS {
        let head: String = content.chars().take(HISTORY_PREVIEW_CHARS - 3).collect();
        format!("{head}...")
    } else {
        content.to_string()
    }
}
