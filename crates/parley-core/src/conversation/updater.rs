//! Dialogue turn updater.
//!
//! Appends the latest exchange, trims the history to the window, and writes
//! the result back under the user's key.

use parley_types::dialogue::DialogueHistory;
use tracing::debug;

use crate::store::ConversationStore;

/// `prior ++ [user(query), assistant(reply)]`, trimmed to `window` turns by
/// dropping the oldest pairs.
pub fn apply_turn(
    mut prior: DialogueHistory,
    query: &str,
    reply: &str,
    window: usize,
) -> DialogueHistory {
    prior.push_exchange(query, reply);
    prior.truncate_to(window);
    prior
}

/// Records completed exchanges in a [`ConversationStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnUpdater {
    window: usize,
}

impl TurnUpdater {
    pub fn new(window: usize) -> Self {
        Self { window }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Append the exchange to `prior`, trim, and store it for `user`.
    /// Returns the history that was written.
    pub fn record<S: ConversationStore + ?Sized>(
        &self,
        store: &S,
        user: &str,
        query: &str,
        reply: &str,
        prior: DialogueHistory,
    ) -> DialogueHistory {
        let before = prior.len();
        let updated = apply_turn(prior, query, reply, self.window);
        debug!(
            user,
            turns = updated.len(),
            dropped = before + 2 - updated.len(),
            "recorded dialogue turn"
        );
        store.put(user, &updated);
        updated
    }
}
