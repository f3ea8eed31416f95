//! Relay service: one completion round per inbound message.
//!
//! `RelayService` owns the conversation store, the completion client and
//! the request builder. Callers hand it `(user, text)` and get back the
//! reply to deliver; every failure is downgraded to a fixed reply here and
//! never escapes to the caller.

use std::time::{Duration, Instant};

use parley_types::config::ConversationConfig;
use parley_types::dialogue::DialogueHistory;
use parley_types::error::RelayError;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::completion::normalizer::{
    self, EMPTY_CHOICES_REPLY, EMPTY_QUERY_REPLY, UPSTREAM_FAILURE_REPLY,
};
use crate::completion::{CompletionClient, RequestBuilder};
use crate::conversation::TurnUpdater;
use crate::store::ConversationStore;

/// History bookkeeping rules for a relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayPolicy {
    /// Maximum turns kept per user.
    pub window: usize,
    /// Record fallback replies as assistant turns too.
    pub record_failed_turns: bool,
}

impl RelayPolicy {
    pub fn from_config(config: &ConversationConfig) -> Self {
        Self {
            window: config.history_window,
            record_failed_turns: config.record_failed_turns,
        }
    }
}

impl Default for RelayPolicy {
    fn default() -> Self {
        Self::from_config(&ConversationConfig::default())
    }
}

/// How a completion round ended.
#[derive(Debug)]
pub enum TurnOutcome {
    /// The upstream produced text.
    Answered(String),
    /// The upstream answered but with no usable choices.
    Empty,
    /// The round could not complete.
    Failed(RelayError),
}

impl TurnOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            TurnOutcome::Answered(_) => "answered",
            TurnOutcome::Empty => "empty",
            TurnOutcome::Failed(_) => "failed",
        }
    }

    /// Text that stands in for the assistant turn, without timing.
    pub fn assistant_text(&self) -> &str {
        match self {
            TurnOutcome::Answered(text) => text,
            TurnOutcome::Empty => EMPTY_CHOICES_REPLY,
            TurnOutcome::Failed(RelayError::EmptyQuery) => EMPTY_QUERY_REPLY,
            TurnOutcome::Failed(_) => UPSTREAM_FAILURE_REPLY,
        }
    }
}

/// Result of [`RelayService::respond`].
#[derive(Debug)]
pub struct RelayReply {
    /// Text to deliver to the user.
    pub text: String,
    pub outcome: TurnOutcome,
    pub elapsed: Duration,
    /// Whether the exchange was written to the store.
    pub recorded: bool,
}

/// `"\n (S.SSs)"`, appended to replies that came back from the upstream.
pub fn elapsed_suffix(elapsed: Duration) -> String {
    format!("\n ({:.2}s)", elapsed.as_secs_f64())
}

/// Conversational relay over a store and a completion client.
///
/// Generic over `ConversationStore` and `CompletionClient` so the core
/// never depends on HTTP or platform crates.
pub struct RelayService<S: ConversationStore, C: CompletionClient> {
    store: S,
    client: C,
    builder: RequestBuilder,
    updater: TurnUpdater,
    policy: RelayPolicy,
}

impl<S: ConversationStore, C: CompletionClient> RelayService<S, C> {
    pub fn new(store: S, client: C, builder: RequestBuilder, policy: RelayPolicy) -> Self {
        Self {
            store,
            client,
            builder,
            updater: TurnUpdater::new(policy.window),
            policy,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn builder(&self) -> &RequestBuilder {
        &self.builder
    }

    pub fn policy(&self) -> RelayPolicy {
        self.policy
    }

    /// Handle one inbound message and return the reply text.
    pub async fn handle_message(&self, user: &str, text: &str) -> String {
        self.respond(user, text).await.text
    }

    /// Handle one inbound message, reporting how the round went.
    pub async fn respond(&self, user: &str, text: &str) -> RelayReply {
        let started = Instant::now();

        if text.trim().is_empty() {
            debug!(user, "empty query, prompting for input");
            return RelayReply {
                text: EMPTY_QUERY_REPLY.to_string(),
                outcome: TurnOutcome::Failed(RelayError::EmptyQuery),
                elapsed: started.elapsed(),
                recorded: false,
            };
        }

        let prior = self.store.get(user);
        let prior_turns = prior.len();

        let outcome = match self.complete(text, &prior).await {
            Ok(Some(answer)) => TurnOutcome::Answered(answer),
            Ok(None) => TurnOutcome::Empty,
            Err(e) => {
                warn!(user, error = %e, transport = e.is_transport(), "completion round failed");
                TurnOutcome::Failed(e)
            }
        };

        let recorded = match outcome {
            TurnOutcome::Answered(_) => true,
            TurnOutcome::Empty | TurnOutcome::Failed(_) => self.policy.record_failed_turns,
        };
        if recorded {
            self.updater
                .record(&self.store, user, text, outcome.assistant_text(), prior);
        }

        let elapsed = started.elapsed();
        let reply = match &outcome {
            TurnOutcome::Failed(_) => outcome.assistant_text().to_string(),
            _ => format!("{}{}", outcome.assistant_text(), elapsed_suffix(elapsed)),
        };

        info!(
            user,
            outcome = outcome.label(),
            prior_turns,
            recorded,
            elapsed_ms = elapsed.as_millis() as u64,
            "relayed message"
        );

        RelayReply {
            text: reply,
            outcome,
            elapsed,
            recorded,
        }
    }

    /// Forget everything stored for `user`. Returns whether anything was
    /// stored.
    pub fn clear(&self, user: &str) -> bool {
        let cleared = self.store.clear(user);
        info!(user, cleared, "cleared conversation");
        cleared
    }

    /// The stored history for `user`.
    pub fn history(&self, user: &str) -> DialogueHistory {
        self.store.get(user)
    }

    async fn complete(
        &self,
        query: &str,
        history: &DialogueHistory,
    ) -> Result<Option<String>, RelayError> {
        let body = self.builder.build_body(query, history)?;

        let span = info_span!(
            "gen_ai.complete",
            gen_ai.system = self.client.name(),
            gen_ai.operation.name = %self.builder.mode(),
            gen_ai.request.model = %self.builder.model(),
            gen_ai.request.max_tokens = self.builder.params().max_tokens,
            gen_ai.request.temperature = self.builder.params().temperature,
            gen_ai.response.id = tracing::field::Empty,
            gen_ai.usage.input_tokens = tracing::field::Empty,
            gen_ai.usage.output_tokens = tracing::field::Empty,
            history_turns = history.len(),
        );
        let raw = self.client.send(body).instrument(span).await?;
        let candidates = normalizer::parse(&raw)?;
        Ok(normalizer::join_candidates(&candidates))
    }
}
