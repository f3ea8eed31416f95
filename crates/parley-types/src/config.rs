//! Configuration types for Parley.
//!
//! `RelayConfig` is the top-level `config.toml`. Every field has a default,
//! so an empty file (or no file at all) yields a working configuration.
//! Credentials are not part of this file; they are read from the
//! environment by the infra layer.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::completion::CompletionMode;
use crate::error::ConfigError;

/// Top-level relay configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelayConfig {
    #[serde(default)]
    pub upstream: UpstreamConfig,

    #[serde(default)]
    pub conversation: ConversationConfig,

    #[serde(default)]
    pub telegram: TelegramConfig,
}

impl RelayConfig {
    /// Reject values the relay cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let window = self.conversation.history_window;
        if window < 2 || window % 2 != 0 {
            return Err(ConfigError::Invalid(format!(
                "conversation.history_window must be an even number >= 2, got {window}"
            )));
        }
        if self.conversation.ttl_secs == 0 {
            return Err(ConfigError::Invalid(
                "conversation.ttl_secs must be greater than zero".to_string(),
            ));
        }
        if self.conversation.max_entries == 0 || self.conversation.max_bytes == 0 {
            return Err(ConfigError::Invalid(
                "conversation.max_entries and conversation.max_bytes must be greater than zero"
                    .to_string(),
            ));
        }
        if self.upstream.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "upstream.timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.upstream.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("upstream.base_url is empty".to_string()));
        }
        Ok(())
    }
}

/// Where and how completions are requested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Scheme and host of the completion service, without a path.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub mode: CompletionMode,

    /// Overrides the mode's default model when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl UpstreamConfig {
    /// The model to request: the explicit one, or the mode's default.
    pub fn resolved_model(&self) -> String {
        self.model
            .clone()
            .unwrap_or_else(|| self.mode.default_model().to_string())
    }

    /// Full URL the requests are posted to.
    pub fn endpoint(&self) -> String {
        format!(
            "{}{}",
            self.base_url.trim_end_matches('/'),
            self.mode.endpoint_path()
        )
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            mode: CompletionMode::default(),
            model: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

/// Conversation store and history policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationConfig {
    /// Idle time after the last write before a user's history expires.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    /// Maximum number of turns kept per user (`H`).
    #[serde(default = "default_history_window")]
    pub history_window: usize,

    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    /// Upper bound on the summed size of all serialized histories.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// Also record fallback replies (failed or empty completions) as
    /// assistant turns.
    #[serde(default)]
    pub record_failed_turns: bool,
}

impl ConversationConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            history_window: default_history_window(),
            max_entries: default_max_entries(),
            max_bytes: default_max_bytes(),
            sweep_interval_secs: default_sweep_interval_secs(),
            record_failed_turns: false,
        }
    }
}

fn default_ttl_secs() -> u64 {
    600
}

fn default_history_window() -> usize {
    10
}

fn default_max_entries() -> usize {
    10_000
}

fn default_max_bytes() -> usize {
    64 * 1024 * 1024
}

fn default_sweep_interval_secs() -> u64 {
    60
}

/// Telegram Bot API transport settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default = "default_telegram_api_base")]
    pub api_base: String,

    /// Long-poll wait passed to `getUpdates`.
    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            api_base: default_telegram_api_base(),
            poll_timeout_secs: default_poll_timeout_secs(),
        }
    }
}

fn default_telegram_api_base() -> String {
    "https://api.telegram.org".to_string()
}

fn default_poll_timeout_secs() -> u64 {
    10
}
