use thiserror::Error;

/// Errors from a single relay round.
///
/// None of these are fatal to the process; the relay service downgrades
/// them to a fixed user-facing reply.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Connection failure, timeout, or a request that could not be built.
    #[error("transport error: {message}")]
    Transport { message: String },

    /// The upstream answered with a non-2xx status.
    #[error("upstream returned HTTP {status}: {message}")]
    UpstreamStatus { status: u16, message: String },

    /// The upstream body was not parseable as structured data.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The user sent blank text.
    #[error("empty query")]
    EmptyQuery,

    /// The request body could not be serialized.
    #[error("encode error: {0}")]
    Encode(String),
}

impl RelayError {
    pub fn transport(message: impl Into<String>) -> Self {
        RelayError::Transport {
            message: message.into(),
        }
    }

    /// Whether this failure happened talking to the upstream, including
    /// rejected (non-2xx) responses.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            RelayError::Transport { .. } | RelayError::UpstreamStatus { .. }
        )
    }
}

/// Errors loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {message}")]
    Read { path: String, message: String },

    #[error("failed to parse config file {path}: {message}")]
    Parse { path: String, message: String },

    #[error("missing credential: environment variable {0} is not set")]
    MissingCredential(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
