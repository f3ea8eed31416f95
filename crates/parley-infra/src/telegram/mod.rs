//! Telegram Bot API transport for the message dispatcher.
//!
//! - `client`: long poll, send message, chat action
//! - `types`: the subset of Bot API payloads the relay reads

pub mod client;
pub mod types;

use thiserror::Error;

pub use client::TelegramClient;
pub use types::{Chat, Message, ParseMode, Update, User};

/// Longest text Telegram accepts in one message, in characters.
pub const MAX_MESSAGE_CHARS: usize = 4096;

/// Errors from Bot API calls.
#[derive(Debug, Error)]
pub enum TelegramError {
    /// The request did not complete (connect, timeout, body read).
    #[error("telegram HTTP error: {0}")]
    Http(String),

    /// The Bot API answered with `ok: false`.
    #[error("telegram API error {code}: {description}")]
    Api { code: i64, description: String },

    /// The response was not the expected JSON.
    #[error("telegram deserialization error: {0}")]
    Deserialization(String),
}

/// Escape text for `parse_mode = HTML`.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Split `text` into chunks of at most `max_chars` characters, preferring
/// to break after a newline.
pub fn split_message(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();
    let mut rest = text;

    while rest.chars().count() > max_chars {
        // Byte offset just past the first `max_chars` characters.
        let hard_end = rest
            .char_indices()
            .nth(max_chars)
            .map_or(rest.len(), |(i, _)| i);
        let end = match rest[..hard_end].rfind('\n') {
            Some(i) if i > 0 => i + 1,
            _ => hard_end,
        };
        chunks.push(rest[..end].to_string());
        rest = &rest[end..];
    }
    if !rest.is_empty() || chunks.is_empty() {
        chunks.push(rest.to_string());
    }
    chunks
}
