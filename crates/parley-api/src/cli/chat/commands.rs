//! Slash commands for the terminal chat loop.
//!
//! Commands start with `/`. Everything else is sent to the relay.

use console::style;

#[derive(Debug, PartialEq)]
pub enum ChatCommand {
    /// Show available commands.
    Help,
    /// Forget this session's conversation.
    Clear,
    /// Show the stored conversation.
    History,
    /// Leave the chat.
    Exit,
    /// Anything else starting with `/`.
    Unknown(String),
}

/// Parse user input as a slash command.
///
/// Returns `None` if the input doesn't start with `/`.
pub fn parse(input: &str) -> Option<ChatCommand> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let cmd = trimmed
        .split_whitespace()
        .next()
        .unwrap_or(trimmed)
        .to_lowercase();

    match cmd.as_str() {
        "/help" | "/h" | "/?" => Some(ChatCommand::Help),
        "/clear" | "/new" => Some(ChatCommand::Clear),
        "/history" => Some(ChatCommand::History),
        "/exit" | "/quit" | "/q" => Some(ChatCommand::Exit),
        other => Some(ChatCommand::Unknown(other.to_string())),
    }
}

pub fn print_help() {
    println!();
    println!("  {}", style("Available commands:").bold());
    println!();
    println!("  {}     {}", style("/help").cyan(), "Show this help message");
    println!("  {}    {}", style("/clear").cyan(), "Forget the conversation so far");
    println!("  {}  {}", style("/history").cyan(), "Show the remembered turns");
    println!("  {}     {}", style("/exit").cyan(), "End the chat session");
    println!();
    println!("  {}", style("Ctrl+D to exit").dim());
    println!();
}
