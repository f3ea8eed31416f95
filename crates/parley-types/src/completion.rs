//! Completion wire payloads.
//!
//! The upstream service speaks two request dialects that share all
//! generation parameters: the multi-turn chat format (`messages`) and the
//! legacy single-prompt format (`prompt`). Exactly one is sent per call,
//! chosen by the configured [`CompletionMode`].
//!
//! Responses are parsed leniently: every field is optional and `null`
//! reads as the field's default, so an error-shaped body or a body with
//! missing `choices` still deserializes (to zero candidates).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::dialogue::DialogueTurn;

/// Which request dialect the upstream is addressed with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionMode {
    /// Multi-turn chat completions (`/v1/chat/completions`).
    #[default]
    Chat,
    /// Single-prompt text completions (`/v1/completions`).
    Legacy,
}

impl CompletionMode {
    /// Model used when the configuration does not name one.
    pub fn default_model(&self) -> &'static str {
        match self {
            CompletionMode::Chat => "gpt-3.5-turbo",
            CompletionMode::Legacy => "text-davinci-003",
        }
    }

    /// Path on the upstream host the request is posted to.
    pub fn endpoint_path(&self) -> &'static str {
        match self {
            CompletionMode::Chat => "/v1/chat/completions",
            CompletionMode::Legacy => "/v1/completions",
        }
    }
}

impl fmt::Display for CompletionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompletionMode::Chat => write!(f, "chat"),
            CompletionMode::Legacy => write!(f, "legacy"),
        }
    }
}

impl FromStr for CompletionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "chat" => Ok(CompletionMode::Chat),
            "legacy" => Ok(CompletionMode::Legacy),
            other => Err(format!("invalid completion mode: '{other}'")),
        }
    }
}

/// Sampling parameters sent with every request, in both dialects.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationParams {
    pub temperature: f64,
    pub max_tokens: u32,
    pub top_p: f64,
    pub frequency_penalty: f64,
    pub presence_penalty: f64,
    pub stop: Vec<String>,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 1000,
            top_p: 1.0,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
            stop: vec![" Human:".to_string(), " Ai:".to_string()],
        }
    }
}

/// Chat dialect request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<DialogueTurn>,
    #[serde(flatten)]
    pub params: GenerationParams,
}

/// Legacy single-prompt request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegacyCompletionRequest {
    pub model: String,
    pub prompt: String,
    #[serde(flatten)]
    pub params: GenerationParams,
}

/// A request in exactly one of the two dialects.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CompletionRequest {
    Chat(ChatCompletionRequest),
    Legacy(LegacyCompletionRequest),
}

impl CompletionRequest {
    pub fn mode(&self) -> CompletionMode {
        match self {
            CompletionRequest::Chat(_) => CompletionMode::Chat,
            CompletionRequest::Legacy(_) => CompletionMode::Legacy,
        }
    }

    pub fn model(&self) -> &str {
        match self {
            CompletionRequest::Chat(req) => &req.model,
            CompletionRequest::Legacy(req) => &req.model,
        }
    }

    pub fn params(&self) -> &GenerationParams {
        match self {
            CompletionRequest::Chat(req) => &req.params,
            CompletionRequest::Legacy(req) => &req.params,
        }
    }

    /// Serialize to the JSON body posted upstream.
    pub fn to_body(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

/// Treat an explicit JSON `null` like a missing field.
fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Upstream completion response, covering both dialects.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CompletionResponse {
    #[serde(deserialize_with = "nullable")]
    pub id: String,
    #[serde(deserialize_with = "nullable")]
    pub object: String,
    #[serde(deserialize_with = "nullable")]
    pub created: i64,
    #[serde(deserialize_with = "nullable")]
    pub model: String,
    #[serde(deserialize_with = "nullable")]
    pub choices: Vec<Choice>,
    #[serde(deserialize_with = "nullable")]
    pub usage: Usage,
    /// Present when the upstream answered with an error-shaped body. Kept
    /// untyped; any JSON value is accepted here.
    pub error: Option<serde_json::Value>,
}

impl CompletionResponse {
    /// Best-effort description of the `error` member, if there is one.
    pub fn error_message(&self) -> Option<String> {
        match self.error.as_ref()? {
            serde_json::Value::Null => None,
            serde_json::Value::String(message) => Some(message.clone()),
            serde_json::Value::Object(fields) => match fields.get("message") {
                Some(serde_json::Value::String(message)) => Some(message.clone()),
                _ => Some(serde_json::Value::Object(fields.clone()).to_string()),
            },
            other => Some(other.to_string()),
        }
    }

    /// Candidate text of every choice, in choice order.
    pub fn candidate_texts(&self) -> Vec<String> {
        self.choices.iter().map(Choice::candidate_text).collect()
    }
}

/// One generated alternative.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Choice {
    /// Legacy dialect output.
    #[serde(deserialize_with = "nullable")]
    pub text: String,
    #[serde(deserialize_with = "nullable")]
    pub index: u32,
    pub logprobs: Option<serde_json::Value>,
    pub finish_reason: Option<String>,
    /// Chat dialect output.
    #[serde(deserialize_with = "nullable")]
    pub message: ChoiceMessage,
}

impl Choice {
    /// `text` when non-empty, otherwise `message.content`.
    pub fn candidate_text(&self) -> String {
        if !self.text.is_empty() {
            self.text.clone()
        } else {
            self.message.content.clone()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ChoiceMessage {
    #[serde(deserialize_with = "nullable")]
    pub role: String,
    #[serde(deserialize_with = "nullable")]
    pub content: String,
}

/// Token accounting reported by the upstream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Usage {
    #[serde(deserialize_with = "nullable")]
    pub prompt_tokens: u32,
    #[serde(deserialize_with = "nullable")]
    pub completion_tokens: u32,
    #[serde(deserialize_with = "nullable")]
    pub total_tokens: u32,
}

/// Body of an upstream error response (`{"error": {...}}`).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ApiError {
    #[serde(deserialize_with = "nullable")]
    pub message: String,
    #[serde(rename = "type", deserialize_with = "nullable")]
    pub kind: String,
    pub param: Option<serde_json::Value>,
    pub code: Option<serde_json::Value>,
}

/// Envelope wrapping [`ApiError`], used when reading non-2xx bodies.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ApiErrorEnvelope {
    pub error: ApiError,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_mode_roundtrip_and_endpoints() {
        for mode in [CompletionMode::Chat, CompletionMode::Legacy] {
            let parsed: CompletionMode = mode.to_string().parse().unwrap();
            assert_eq!(mode, parsed);
        }
        assert_eq!(CompletionMode::Chat.endpoint_path(), "/v1/chat/completions");
        assert_eq!(CompletionMode::Legacy.endpoint_path(), "/v1/completions");
        assert_eq!(CompletionMode::Legacy.default_model(), "text-davinci-003");
    }

    #[test]
    fn test_chat_request_shape() {
        let req = CompletionRequest::Chat(ChatCompletionRequest {
            model: "gpt-3.5-turbo".to_string(),
            messages: vec![DialogueTurn::user("hi")],
            params: GenerationParams::default(),
        });
        let value: serde_json::Value = serde_json::from_slice(&req.to_body().unwrap()).unwrap();

        assert_eq!(value["model"], "gpt-3.5-turbo");
        assert_eq!(value["messages"], json!([{"role": "user", "content": "hi"}]));
        assert_eq!(value["max_tokens"], 1000);
        assert_eq!(value["stop"], json!([" Human:", " Ai:"]));
        assert!(value.get("prompt").is_none());
    }

    #[test]
    fn test_legacy_request_shape() {
        let req = CompletionRequest::Legacy(LegacyCompletionRequest {
            model: "text-davinci-003".to_string(),
            prompt: "hi".to_string(),
            params: GenerationParams::default(),
        });
        let value: serde_json::Value = serde_json::from_slice(&req.to_body().unwrap()).unwrap();

        assert_eq!(value["prompt"], "hi");
        assert!(value.get("messages").is_none());
        assert_eq!(value["temperature"].as_f64(), Some(0.7));
        assert_eq!(value["top_p"].as_f64(), Some(1.0));
        assert_eq!(req.mode(), CompletionMode::Legacy);
    }

    #[test]
    fn test_response_full_chat_shape() {
        let body = json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "created": 1_677_652_288,
            "model": "gpt-3.5-turbo",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "Hello"},
                "logprobs": null,
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 9, "completion_tokens": 12, "total_tokens": 21}
        });
        let resp: CompletionResponse = serde_json::from_value(body).unwrap();
        assert_eq!(resp.candidate_texts(), vec!["Hello".to_string()]);
        assert_eq!(resp.usage.total_tokens, 21);
        assert_eq!(resp.choices[0].finish_reason.as_deref(), Some("stop"));
    }

    #[test]
    fn test_text_wins_over_message_content() {
        let body = json!({"choices": [{"text": "legacy", "message": {"content": "chat"}}]});
        let resp: CompletionResponse = serde_json::from_value(body).unwrap();
        assert_eq!(resp.candidate_texts(), vec!["legacy".to_string()]);
    }

    #[test]
    fn test_nulls_read_as_defaults() {
        let body = json!({
            "id": null,
            "choices": [{"text": null, "message": {"role": "assistant", "content": null}}],
            "usage": null
        });
        let resp: CompletionResponse = serde_json::from_value(body).unwrap();
        assert_eq!(resp.candidate_texts(), vec![String::new()]);
        assert_eq!(resp.usage, Usage::default());
    }

    #[test]
    fn test_error_shaped_body_parses_with_no_choices() {
        let body = json!({
            "error": {
                "message": "You exceeded your current quota",
                "type": "insufficient_quota",
                "param": null,
                "code": "insufficient_quota"
            }
        });
        let resp: CompletionResponse = serde_json::from_value(body).unwrap();
        assert!(resp.choices.is_empty());
        assert_eq!(
            resp.error_message().as_deref(),
            Some("You exceeded your current quota")
        );
    }

    #[test]
    fn test_error_member_of_any_shape_is_accepted() {
        let resp: CompletionResponse =
            serde_json::from_value(json!({"error": "quota exceeded"})).unwrap();
        assert_eq!(resp.error_message().as_deref(), Some("quota exceeded"));

        let resp: CompletionResponse =
            serde_json::from_value(json!({"error": {"message": 42}})).unwrap();
        assert_eq!(resp.error_message().as_deref(), Some(r#"{"message":42}"#));

        let resp: CompletionResponse = serde_json::from_value(json!({"error": null})).unwrap();
        assert_eq!(resp.error_message(), None);
    }
}
