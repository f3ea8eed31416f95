//! Dialogue types: turns and the bounded per-user history.
//!
//! A [`DialogueHistory`] is an ordered list of turns, oldest first. The relay
//! always appends whole exchanges (one user turn followed by one assistant
//! turn) and trims from the front two turns at a time, so the history keeps
//! strict user/assistant alternation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Who produced a dialogue turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            other => Err(format!("invalid dialogue role: '{other}'")),
        }
    }
}

/// A single immutable turn of dialogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueTurn {
    pub role: Role,
    pub content: String,
}

impl DialogueTurn {
    /// A turn spoken by the end user.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// A turn produced by the completion service.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Ordered dialogue history for one user, oldest turn first.
///
/// Serializes as a plain JSON array of `{role, content}` objects, which is
/// also the shape the chat completion endpoint expects for `messages`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DialogueHistory {
    turns: Vec<DialogueTurn>,
}

impl DialogueHistory {
    /// An empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a history from existing turns, preserving their order.
    pub fn from_turns(turns: Vec<DialogueTurn>) -> Self {
        Self { turns }
    }

    pub fn turns(&self) -> &[DialogueTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DialogueTurn> {
        self.turns.iter()
    }

    /// Append a full exchange: the user's query followed by the reply.
    pub fn push_exchange(&mut self, query: impl Into<String>, reply: impl Into<String>) {
        self.turns.push(DialogueTurn::user(query));
        self.turns.push(DialogueTurn::assistant(reply));
    }

    /// Drop the two oldest turns until the history fits in `window` turns.
    ///
    /// Returns the number of turns removed. Removal always happens in pairs,
    /// so an alternating history stays alternating.
    pub fn truncate_to(&mut self, window: usize) -> usize {
        let before = self.turns.len();
        while self.turns.len() > window {
            let pair = self.turns.len().min(2);
            self.turns.drain(..pair);
        }
        before - self.turns.len()
    }

    /// Whether roles strictly alternate user, assistant, user, ...
    pub fn is_alternating(&self) -> bool {
        self.turns.iter().enumerate().all(|(i, turn)| {
            let expected = if i % 2 == 0 { Role::User } else { Role::Assistant };
            turn.role == expected
        })
    }

    /// Serialize to the byte form kept in the conversation store.
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Decode the byte form kept in the conversation store.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

impl<'a> IntoIterator for &'a DialogueHistory {
    type Item = &'a DialogueTurn;
    type IntoIter = std::slice::Iter<'a, DialogueTurn>;

    fn into_iter(self) -> Self::IntoIter {
        self.turns.iter()
    }
}
