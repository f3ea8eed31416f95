//! Business logic for Parley.
//!
//! This crate defines the conversation store, the completion pipeline
//! (request builder, client port, response normalizer), the dialogue turn
//! updater and the `RelayService` that ties them together. It depends only
//! on `parley-types`; HTTP and platform I/O live in `parley-infra`.

pub mod command;
pub mod completion;
pub mod conversation;
pub mod relay;
pub mod store;
