//! Telegram message dispatcher.
//!
//! Long-polls `getUpdates`, tracks the update offset and hands every text
//! message to its own task. Bot commands get their fixed replies; all other
//! text goes through the relay and the escaped answer is sent back to the
//! chat it came from.

use std::sync::Arc;
use std::time::Duration;

use parley_core::command::BotCommand;
use parley_core::completion::CompletionClient;
use parley_core::relay::RelayService;
use parley_core::store::ConversationStore;
use parley_infra::telegram::{
    MAX_MESSAGE_CHARS, Message, ParseMode, TelegramClient, TelegramError, escape_html,
    split_message,
};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const INITIAL_BACKOFF: Duration = Duration::from_millis(500);
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// What to do with an inbound text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Command(BotCommand),
    Relay,
}

/// Decide how `text` is handled.
pub fn route(text: &str) -> Route {
    match BotCommand::parse(text) {
        Some(command) => Route::Command(command),
        None => Route::Relay,
    }
}

pub struct Dispatcher<S: ConversationStore, C: CompletionClient> {
    telegram: TelegramClient,
    relay: Arc<RelayService<S, C>>,
}

impl<S, C> Dispatcher<S, C>
where
    S: ConversationStore + 'static,
    C: CompletionClient + 'static,
{
    pub fn new(telegram: TelegramClient, relay: Arc<RelayService<S, C>>) -> Self {
        Self { telegram, relay }
    }

    /// Poll for updates until `shutdown` fires, then wait for in-flight
    /// messages to finish.
    pub async fn run(self: Arc<Self>, poll_timeout_secs: u64, shutdown: CancellationToken) {
        let mut offset: Option<i64> = None;
        let mut backoff = INITIAL_BACKOFF;
        let mut in_flight = JoinSet::new();

        info!(poll_timeout_secs, "dispatcher started");

        loop {
            let polled = tokio::select! {
                _ = shutdown.cancelled() => break,
                polled = self.telegram.get_updates(offset, poll_timeout_secs) => polled,
            };

            match polled {
                Ok(updates) => {
                    backoff = INITIAL_BACKOFF;
                    for update in updates {
                        let next = update.update_id + 1;
                        offset = Some(offset.map_or(next, |o| o.max(next)));
                        let Some(message) = update.message else {
                            debug!(update_id = update.update_id, "skipping non-message update");
                            continue;
                        };
                        let dispatcher = Arc::clone(&self);
                        in_flight.spawn(async move {
                            if let Err(e) = dispatcher.handle(message).await {
                                warn!(error = %e, "failed to answer message");
                            }
                        });
                    }
                }
                Err(e) => {
                    warn!(error = %e, retry_in_ms = backoff.as_millis() as u64, "getUpdates failed");
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(backoff) => {}
                    }
                    backoff = (backoff * 2).min(MAX_BACKOFF);
                }
            }

            while let Some(finished) = in_flight.try_join_next() {
                if let Err(e) = finished {
                    warn!(error = %e, "message task panicked");
                }
            }
        }

        info!(pending = in_flight.len(), "dispatcher stopping");
        while let Some(finished) = in_flight.join_next().await {
            if let Err(e) = finished {
                warn!(error = %e, "message task panicked");
            }
        }
    }

    /// Answer one inbound message.
    pub async fn handle(&self, message: Message) -> Result<(), TelegramError> {
        let Some(text) = message.text.as_deref() else {
            debug!(message_id = message.message_id, "ignoring message without text");
            return Ok(());
        };
        let chat_id = message.chat.id;
        let user = message.sender_key();

        match route(text) {
            Route::Command(command) => {
                debug!(%user, %command, "bot command");
                if command == BotCommand::Clear {
                    self.relay.clear(&user);
                }
                self.telegram
                    .send_message(chat_id, command.reply(), Some(ParseMode::Html))
                    .await?;
            }
            Route::Relay => {
                if let Err(e) = self.telegram.send_typing(chat_id).await {
                    debug!(error = %e, "typing indicator failed");
                }
                let reply = self.relay.handle_message(&user, text).await;
                for chunk in split_message(&reply, MAX_MESSAGE_CHARS) {
                    self.telegram
                        .send_message(chat_id, &escape_html(&chunk), Some(ParseMode::Html))
                        .await?;
                }
            }
        }
        Ok(())
    }
}
