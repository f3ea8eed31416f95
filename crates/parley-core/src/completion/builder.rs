//! Completion request builder.
//!
//! Turns the current query plus prior history into one of the two request
//! dialects. The dialect and model are fixed at construction; nothing about
//! the query selects them.

use parley_types::completion::{
    ChatCompletionRequest, CompletionMode, CompletionRequest, GenerationParams,
    LegacyCompletionRequest,
};
use parley_types::config::UpstreamConfig;
use parley_types::dialogue::{DialogueHistory, DialogueTurn};
use parley_types::error::RelayError;

/// Builds completion requests for a fixed mode and model.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestBuilder {
    mode: CompletionMode,
    model: String,
    params: GenerationParams,
}

impl RequestBuilder {
    pub fn new(mode: CompletionMode, model: impl Into<String>) -> Self {
        Self {
            mode,
            model: model.into(),
            params: GenerationParams::default(),
        }
    }

    pub fn from_config(config: &UpstreamConfig) -> Self {
        Self::new(config.mode, config.resolved_model())
    }

    pub fn mode(&self) -> CompletionMode {
        self.mode
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn params(&self) -> &GenerationParams {
        &self.params
    }

    /// Build the request for `query`.
    ///
    /// In chat mode the prior turns are sent followed by the query as a new
    /// user turn. In legacy mode the history is ignored and the query is the
    /// whole prompt. `history` itself is never modified.
    ///
    /// Blank queries are the caller's responsibility to reject.
    pub fn build(&self, query: &str, history: &DialogueHistory) -> CompletionRequest {
        match self.mode {
            CompletionMode::Chat => {
                let mut messages = Vec::with_capacity(history.len() + 1);
                messages.extend(history.iter().cloned());
                messages.push(DialogueTurn::user(query));
                CompletionRequest::Chat(ChatCompletionRequest {
                    model: self.model.clone(),
                    messages,
                    params: self.params.clone(),
                })
            }
            CompletionMode::Legacy => CompletionRequest::Legacy(LegacyCompletionRequest {
                model: self.model.clone(),
                prompt: query.to_string(),
                params: self.params.clone(),
            }),
        }
    }

    /// Build and serialize the request body.
    pub fn build_body(&self, query: &str, history: &DialogueHistory) -> Result<Vec<u8>, RelayError> {
        self.build(query, history)
            .to_body()
            .map_err(|e| RelayError::Encode(e.to_string()))
    }
}
