//! The completion pipeline: build a request, send it, normalize the reply.
//!
//! - `builder`: pure (query, history) to wire request
//! - `client`: the `CompletionClient` port implemented in parley-infra
//! - `normalizer`: raw response bytes to candidate texts and one reply

pub mod builder;
pub mod client;
pub mod normalizer;

pub use builder::RequestBuilder;
pub use client::CompletionClient;
