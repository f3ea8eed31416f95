//! Welcome banner for terminal chat sessions.

use console::style;

/// Print the banner shown when a chat session starts.
pub fn print_welcome_banner(model: &str, endpoint: &str, user: &str, window: usize) {
    println!();
    println!("  {}", style("parley").cyan().bold());
    println!("  {}", style("Chat relay to an OpenAI-style completion service").dim());
    println!();
    println!("  {}     {}", style("Model:").bold(), style(model).dim());
    println!("  {}  {}", style("Endpoint:").bold(), style(endpoint).dim());
    println!("  {}      {}", style("User:").bold(), style(user).dim());
    println!(
        "  {}    {}",
        style("Memory:").bold(),
        style(format!("last {window} turns")).dim()
    );
    println!();
    println!("  {}", style("Type /help for commands, Ctrl+D to exit").dim());
    println!("  {}", style("---").dim());
    println!();
}
