//! HttpCompletionClient -- concrete [`CompletionClient`] over reqwest.
//!
//! Posts the serialized request to the configured endpoint with a JSON
//! content type and a bearer token. Non-2xx responses are rejected here
//! with the upstream's error message when one can be read.
//!
//! The API key is wrapped in [`secrecy::SecretString`] and is never logged
//! or included in `Debug` output.

use std::time::{Duration, Instant};

use parley_core::completion::CompletionClient;
use parley_observe::genai_attrs::{
    GEN_AI_RESPONSE_ID, GEN_AI_USAGE_INPUT_TOKENS, GEN_AI_USAGE_OUTPUT_TOKENS,
};
use parley_types::completion::{ApiErrorEnvelope, Usage};
use parley_types::config::UpstreamConfig;
use parley_types::error::RelayError;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{Span, debug};

/// Longest slice of a non-JSON error body kept in an error message.
const MAX_ERROR_BODY_CHARS: usize = 200;

/// Completion client for OpenAI-style HTTP endpoints.
///
/// # API Key Security
///
/// Does NOT derive Debug. The key is only exposed when building the
/// `Authorization` header.
pub struct HttpCompletionClient {
    client: reqwest::Client,
    api_key: SecretString,
    endpoint: String,
    timeout: Duration,
}

impl HttpCompletionClient {
    /// Client for the endpoint and timeout in `config`.
    pub fn new(config: &UpstreamConfig, api_key: SecretString) -> Result<Self, RelayError> {
        Self::with_endpoint(config.endpoint(), api_key, config.timeout())
    }

    /// Client for an explicit endpoint URL.
    pub fn with_endpoint(
        endpoint: impl Into<String>,
        api_key: SecretString,
        timeout: Duration,
    ) -> Result<Self, RelayError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RelayError::transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            endpoint: endpoint.into(),
            timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn describe(&self, err: &reqwest::Error) -> String {
        if err.is_timeout() {
            format!("request timed out after {:?}", self.timeout)
        } else if err.is_connect() {
            format!("connection failed: {err}")
        } else {
            format!("HTTP request failed: {err}")
        }
    }
}

impl CompletionClient for HttpCompletionClient {
    fn name(&self) -> &str {
        "openai"
    }

    async fn send(&self, body: Vec<u8>) -> Result<Vec<u8>, RelayError> {
        let started = Instant::now();

        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .bearer_auth(self.api_key.expose_secret())
            .body(body)
            .send()
            .await
            .map_err(|e| RelayError::transport(self.describe(&e)))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| RelayError::transport(self.describe(&e)))?;

        debug!(
            status = status.as_u16(),
            bytes = bytes.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "upstream responded"
        );

        if !status.is_success() {
            return Err(RelayError::UpstreamStatus {
                status: status.as_u16(),
                message: upstream_error_message(&bytes),
            });
        }

        record_usage(&bytes);
        Ok(bytes.to_vec())
    }
}

/// Best-effort human-readable reason from a non-2xx body.
fn upstream_error_message(body: &[u8]) -> String {
    if let Ok(envelope) = serde_json::from_slice::<ApiErrorEnvelope>(body) {
        if !envelope.error.message.is_empty() {
            return envelope.error.message;
        }
    }
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        "empty response body".to_string()
    } else {
        text.chars().take(MAX_ERROR_BODY_CHARS).collect()
    }
}

/// The parts of a success body that go on the span; choices are skipped.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ResponseAccounting {
    id: Option<String>,
    usage: Option<Usage>,
}

fn response_accounting(body: &[u8]) -> Option<ResponseAccounting> {
    serde_json::from_slice::<Option<ResponseAccounting>>(body)
        .ok()
        .flatten()
}

/// Copy the response id and token usage onto the current span.
fn record_usage(body: &[u8]) {
    let Some(accounting) = response_accounting(body) else {
        return;
    };
    let span = Span::current();
    if let Some(id) = accounting.id.as_deref().filter(|id| !id.is_empty()) {
        span.record(GEN_AI_RESPONSE_ID, id);
    }
    if let Some(usage) = accounting.usage {
        span.record(GEN_AI_USAGE_INPUT_TOKENS, usage.prompt_tokens);
        span.record(GEN_AI_USAGE_OUTPUT_TOKENS, usage.completion_tokens);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_types::completion::CompletionMode;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> HttpCompletionClient {
        let config = UpstreamConfig {
            base_url: server.uri(),
            ..UpstreamConfig::default()
        };
        HttpCompletionClient::new(&config, SecretString::from("test-key-not-real")).unwrap()
    }

    #[test]
    fn test_endpoint_follows_mode() {
        let config = UpstreamConfig {
            base_url: "http://localhost:8080/".to_string(),
            mode: CompletionMode::Legacy,
            ..UpstreamConfig::default()
        };
        let client = HttpCompletionClient::new(&config, SecretString::from("k")).unwrap();
        assert_eq!(client.endpoint(), "http://localhost:8080/v1/completions");
        assert_eq!(client.timeout(), Duration::from_secs(30));
        assert_eq!(client.name(), "openai");
    }

    #[tokio::test]
    async fn test_send_posts_json_with_bearer_key() {
        let server = MockServer::start().await;
        let reply = serde_json::json!({
            "id": "chatcmpl-1",
            "choices": [{"index": 0, "message": {"role": "assistant", "content": "Go is..."}}],
            "usage": {"prompt_tokens": 5, "completion_tokens": 3, "total_tokens": 8}
        });
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer test-key-not-real"))
            .and(header("content-type", "application/json"))
            .and(body_json(serde_json::json!({"model": "gpt-3.5-turbo"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(&reply))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let body = serde_json::to_vec(&serde_json::json!({"model": "gpt-3.5-turbo"})).unwrap();
        let raw = client.send(body).await.unwrap();

        let parsed: serde_json::Value = serde_json::from_slice(&raw).unwrap();
        assert_eq!(parsed, reply);
    }

    #[tokio::test]
    async fn test_non_success_status_is_rejected_with_upstream_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": {
                    "message": "Incorrect API key provided",
                    "type": "invalid_request_error",
                    "param": null,
                    "code": "invalid_api_key"
                }
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).send(b"{}".to_vec()).await.unwrap_err();
        match &err {
            RelayError::UpstreamStatus { status, message } => {
                assert_eq!(*status, 401);
                assert_eq!(message, "Incorrect API key provided");
            }
            other => panic!("expected status error, got {other:?}"),
        }
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_non_json_error_body_is_truncated_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("x".repeat(1000)))
            .mount(&server)
            .await;

        let err = client_for(&server).send(b"{}".to_vec()).await.unwrap_err();
        match err {
            RelayError::UpstreamStatus { status, message } => {
                assert_eq!(status, 502);
                assert_eq!(message.len(), MAX_ERROR_BODY_CHARS);
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_success_body_is_returned_unparsed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let raw = client_for(&server).send(b"{}".to_vec()).await.unwrap();
        assert_eq!(raw, b"not json");
    }

    #[tokio::test]
    async fn test_slow_upstream_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("{}")
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let client = HttpCompletionClient::with_endpoint(
            format!("{}/v1/chat/completions", server.uri()),
            SecretString::from("k"),
            Duration::from_millis(100),
        )
        .unwrap();

        let err = client.send(b"{}".to_vec()).await.unwrap_err();
        match err {
            RelayError::Transport { message } => assert!(message.contains("timed out")),
            other => panic!("expected transport error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let client = HttpCompletionClient::with_endpoint(
            "http://127.0.0.1:1/v1/chat/completions",
            SecretString::from("k"),
            Duration::from_secs(2),
        )
        .unwrap();

        let err = client.send(b"{}".to_vec()).await.unwrap_err();
        assert!(matches!(err, RelayError::Transport { .. }));
    }

    #[test]
    fn test_accounting_reads_only_id_and_usage() {
        let body = br#"{
            "id": "chatcmpl-9",
            "choices": "not a list",
            "usage": {"prompt_tokens": 5, "completion_tokens": 3, "total_tokens": 8}
        }"#;
        let accounting = response_accounting(body).unwrap();
        assert_eq!(accounting.id.as_deref(), Some("chatcmpl-9"));
        let usage = accounting.usage.unwrap();
        assert_eq!((usage.prompt_tokens, usage.completion_tokens), (5, 3));

        assert!(response_accounting(b"null").is_none());
        assert!(response_accounting(b"not json").is_none());
    }

    #[test]
    fn test_error_message_falls_back_for_empty_body() {
        assert_eq!(upstream_error_message(b""), "empty response body");
        assert_eq!(
            upstream_error_message(br#"{"error": {"message": ""}}"#),
            r#"{"error": {"message": ""}}"#
        );
    }
}
