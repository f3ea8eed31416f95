//! Per-user conversation storage.
//!
//! The `ConversationStore` trait is the only place dialogue state lives.
//! `ExpiringConversationStore` is the in-process implementation: idle TTL,
//! bounded capacity, least-recently-used eviction.

pub mod memory;

use parley_types::dialogue::DialogueHistory;

pub use memory::{ExpiringConversationStore, StoreLimits};

/// Keyed storage of dialogue histories.
///
/// All methods are safe to call concurrently. Writes to the same key are
/// last-writer-wins; there is no read-modify-write transaction across
/// `get` and `put`.
pub trait ConversationStore: Send + Sync {
    /// History for `user`. Absent, expired, or undecodable entries read as
    /// an empty history, never as an error.
    fn get(&self, user: &str) -> DialogueHistory;

    /// Overwrite the history for `user` and restart its idle TTL.
    fn put(&self, user: &str, history: &DialogueHistory);

    /// Remove the history for `user`. Returns whether a live entry existed.
    fn clear(&self, user: &str) -> bool;

    /// Number of live (unexpired) entries.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: ConversationStore + ?Sized> ConversationStore for std::sync::Arc<T> {
    fn get(&self, user: &str) -> DialogueHistory {
        (**self).get(user)
    }

    fn put(&self, user: &str, history: &DialogueHistory) {
        (**self).put(user, history)
    }

    fn clear(&self, user: &str) -> bool {
        (**self).clear(user)
    }

    fn len(&self) -> usize {
        (**self).len()
    }
}
