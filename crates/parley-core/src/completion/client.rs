//! CompletionClient trait definition.
//!
//! The port through which the relay reaches the upstream completion
//! service. The reqwest-backed implementation lives in parley-infra; tests
//! use in-memory fakes.

use parley_types::error::RelayError;

/// Sends a serialized completion request and returns the raw response body.
///
/// Uses RPITIT (native async fn in traits, Rust 2024 edition).
pub trait CompletionClient: Send + Sync {
    /// Short provider name for logs and spans (e.g. "openai").
    fn name(&self) -> &str;

    /// POST `body` upstream.
    ///
    /// Fails with a transport-class [`RelayError`] on connection failure,
    /// timeout, or a non-2xx status. A 2xx body is returned unparsed.
    fn send(
        &self,
        body: Vec<u8>,
    ) -> impl std::future::Future<Output = Result<Vec<u8>, RelayError>> + Send;
}
