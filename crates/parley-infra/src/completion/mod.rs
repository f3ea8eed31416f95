//! Upstream completion service clients.

pub mod http;

pub use http::HttpCompletionClient;
