//! Bot commands and their fixed replies.
//!
//! Commands are recognised from the first word of a message, with or
//! without a `@botname` suffix. Anything else, including unknown slash
//! words, is conversation text.

use std::fmt;

/// Greeting sent for `/start`.
pub const START_REPLY: &str = "Hi! I'm <b>ChatGPT</b> bot implemented with GPT-3.5 OpenAI API 🤖\n\n";

/// Confirmation sent after `/clear`.
pub const CLEAR_REPLY: &str = "Conversation cleared. Ask me anything to start a new one.";

/// Command list sent for `/help`.
pub const HELP_REPLY: &str = "\
<b>Commands</b>
⚡️ /start - Register chat
⚡️ /clear - Open new conversation
⚡️ /help - Show help
";

/// A recognised bot command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotCommand {
    Start,
    Clear,
    Help,
}

impl BotCommand {
    /// Parse the leading command word of `text`, if it is one we handle.
    pub fn parse(text: &str) -> Option<Self> {
        let word = text.split_whitespace().next()?;
        let name = word.strip_prefix('/')?;
        let name = name.split_once('@').map_or(name, |(name, _bot)| name);
        match name.to_ascii_lowercase().as_str() {
            "start" => Some(BotCommand::Start),
            "clear" => Some(BotCommand::Clear),
            "help" => Some(BotCommand::Help),
            _ => None,
        }
    }

    /// The fixed reply for this command.
    pub fn reply(&self) -> &'static str {
        match self {
            BotCommand::Start => START_REPLY,
            BotCommand::Clear => CLEAR_REPLY,
            BotCommand::Help => HELP_REPLY,
        }
    }
}

impl fmt::Display for BotCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BotCommand::Start => write!(f, "/start"),
            BotCommand::Clear => write!(f, "/clear"),
            BotCommand::Help => write!(f, "/help"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_commands() {
        assert_eq!(BotCommand::parse("/start"), Some(BotCommand::Start));
        assert_eq!(BotCommand::parse("/clear"), Some(BotCommand::Clear));
        assert_eq!(BotCommand::parse("/help"), Some(BotCommand::Help));
        assert_eq!(BotCommand::parse("  /HELP  "), Some(BotCommand::Help));
    }

    #[test]
    fn test_parse_accepts_bot_suffix_and_arguments() {
        assert_eq!(BotCommand::parse("/clear@parley_bot"), Some(BotCommand::Clear));
        assert_eq!(BotCommand::parse("/start now please"), Some(BotCommand::Start));
    }

    #[test]
    fn test_plain_text_and_unknown_commands_are_not_commands() {
        assert_eq!(BotCommand::parse("What is Go?"), None);
        assert_eq!(BotCommand::parse("/ai"), None);
        assert_eq!(BotCommand::parse("please /clear"), None);
        assert_eq!(BotCommand::parse(""), None);
        assert_eq!(BotCommand::parse("/"), None);
    }

    #[test]
    fn test_display_roundtrips() {
        for cmd in [BotCommand::Start, BotCommand::Clear, BotCommand::Help] {
            assert_eq!(BotCommand::parse(&cmd.to_string()), Some(cmd));
        }
    }

    #[test]
    fn test_help_lists_every_command() {
        for cmd in [BotCommand::Start, BotCommand::Clear, BotCommand::Help] {
            assert!(HELP_REPLY.contains(&cmd.to_string()));
        }
    }
}
