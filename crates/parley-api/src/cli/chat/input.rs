//! Async readline input handling for the chat loop.
//!
//! Wraps `rustyline_async::Readline` so EOF (Ctrl+D) and interrupt (Ctrl+C)
//! come back as events instead of errors.

use rustyline_async::{Readline, ReadlineError, ReadlineEvent, SharedWriter};

/// Events produced by the input handler.
#[derive(Debug, PartialEq)]
pub enum InputEvent {
    /// User submitted a line (trimmed).
    Message(String),
    /// End of file (Ctrl+D).
    Eof,
    /// Interrupt signal (Ctrl+C).
    Interrupted,
}

impl From<ReadlineEvent> for InputEvent {
    fn from(event: ReadlineEvent) -> Self {
        match event {
            ReadlineEvent::Line(line) => InputEvent::Message(line.trim().to_string()),
            ReadlineEvent::Eof => InputEvent::Eof,
            ReadlineEvent::Interrupted => InputEvent::Interrupted,
        }
    }
}

pub struct ChatInput {
    rl: Readline,
}

impl ChatInput {
    /// Create the input handler with the given prompt.
    ///
    /// The returned `SharedWriter` prints without clobbering the prompt.
    pub fn new(prompt: String) -> Result<(Self, SharedWriter), ReadlineError> {
        let (rl, stdout) = Readline::new(prompt)?;
        Ok((Self { rl }, stdout))
    }

    pub async fn read_line(&mut self) -> InputEvent {
        match self.rl.readline().await {
            Ok(event) => {
                if let ReadlineEvent::Line(line) = &event {
                    if !line.trim().is_empty() {
                        let _ = self.rl.add_history_entry(line.clone());
                    }
                }
                event.into()
            }
            Err(_) => InputEvent::Eof,
        }
    }

    /// Restore the terminal before exit.
    pub fn flush(&mut self) {
        let _ = self.rl.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_is_trimmed() {
        assert_eq!(
            InputEvent::from(ReadlineEvent::Line("  hello  \n".to_string())),
            InputEvent::Message("hello".to_string())
        );
    }

    #[test]
    fn test_control_events() {
        assert_eq!(InputEvent::from(ReadlineEvent::Eof), InputEvent::Eof);
        assert_eq!(
            InputEvent::from(ReadlineEvent::Interrupted),
            InputEvent::Interrupted
        );
    }
}
