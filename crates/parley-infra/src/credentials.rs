//! Credentials from the environment.
//!
//! Both secrets come only from environment variables and are wrapped in
//! [`SecretString`] immediately. Empty values count as missing.

use parley_types::error::ConfigError;
use secrecy::SecretString;

/// Environment variable holding the Telegram bot token.
pub const BOT_TOKEN_ENV: &str = "TELE_API_KEY";

/// Environment variable holding the upstream completion API key.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Secrets the relay needs at startup.
///
/// Does NOT derive Debug.
pub struct Credentials {
    pub api_key: SecretString,
    pub bot_token: Option<SecretString>,
}

impl Credentials {
    /// Upstream key only, for front ends that do not talk to Telegram.
    pub fn api_key_only() -> Result<Self, ConfigError> {
        Self::resolve(false, env_lookup)
    }

    /// Upstream key and bot token, both required.
    pub fn for_bot() -> Result<Self, ConfigError> {
        Self::resolve(true, env_lookup)
    }

    /// Resolve through `lookup` instead of the process environment.
    pub fn resolve<F>(require_bot_token: bool, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = read_secret(API_KEY_ENV, &lookup)?;
        let bot_token = if require_bot_token {
            Some(read_secret(BOT_TOKEN_ENV, &lookup)?)
        } else {
            None
        };
        Ok(Self { api_key, bot_token })
    }
}

fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn read_secret<F>(name: &str, lookup: &F) -> Result<SecretString, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(value) if !value.trim().is_empty() => Ok(SecretString::from(value.trim().to_string())),
        _ => Err(ConfigError::MissingCredential(name.to_string())),
    }
}
