//! TelegramClient -- Bot API calls over reqwest.
//!
//! The bot token is part of every request URL, so it is kept in a
//! [`SecretString`] and reqwest errors are stripped of their URL before
//! they are turned into [`TelegramError`]s.

use std::time::Duration;

use parley_types::config::TelegramConfig;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::TelegramError;
use super::types::{
    ApiResponse, ChatActionParams, GetUpdatesParams, Message, ParseMode, SendMessageParams,
    Update, User,
};

/// Per-request timeout for calls other than `getUpdates`.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Extra time a long poll may take beyond its server-side wait.
const POLL_GRACE: Duration = Duration::from_secs(10);

/// Updates the dispatcher asks for.
const ALLOWED_UPDATES: &[&str] = &["message"];

/// Telegram Bot API client.
///
/// Does NOT derive Debug; the token must never be printed.
pub struct TelegramClient {
    client: reqwest::Client,
    api_base: String,
    token: SecretString,
}

impl TelegramClient {
    pub fn new(config: &TelegramConfig, token: SecretString) -> Result<Self, TelegramError> {
        Self::with_api_base(config.api_base.clone(), token)
    }

    pub fn with_api_base(
        api_base: impl Into<String>,
        token: SecretString,
    ) -> Result<Self, TelegramError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| TelegramError::Http(e.without_url().to_string()))?;
        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    /// The bot's own account.
    pub async fn get_me(&self) -> Result<User, TelegramError> {
        self.call("getMe", &serde_json::json!({}), REQUEST_TIMEOUT)
            .await
    }

    /// Long-poll for updates after `offset`, waiting up to `timeout_secs`
    /// for one to arrive.
    pub async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout_secs: u64,
    ) -> Result<Vec<Update>, TelegramError> {
        let params = GetUpdatesParams {
            offset,
            timeout: timeout_secs,
            allowed_updates: ALLOWED_UPDATES,
        };
        let timeout = Duration::from_secs(timeout_secs) + POLL_GRACE;
        self.call("getUpdates", &params, timeout).await
    }

    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        parse_mode: Option<ParseMode>,
    ) -> Result<Message, TelegramError> {
        let params = SendMessageParams {
            chat_id,
            text,
            parse_mode,
        };
        self.call("sendMessage", &params, REQUEST_TIMEOUT).await
    }

    /// Show the "typing..." indicator in `chat_id`.
    pub async fn send_typing(&self, chat_id: i64) -> Result<bool, TelegramError> {
        let params = ChatActionParams {
            chat_id,
            action: "typing",
        };
        self.call("sendChatAction", &params, REQUEST_TIMEOUT).await
    }

    async fn call<P, R>(&self, method: &str, params: &P, timeout: Duration) -> Result<R, TelegramError>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!(
            "{}/bot{}/{}",
            self.api_base,
            self.token.expose_secret(),
            method
        );

        let response = self
            .client
            .post(url)
            .timeout(timeout)
            .json(params)
            .send()
            .await
            .map_err(|e| TelegramError::Http(e.without_url().to_string()))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| TelegramError::Http(e.without_url().to_string()))?;

        debug!(method, status = status.as_u16(), bytes = bytes.len(), "telegram call");

        let envelope: ApiResponse<R> = serde_json::from_slice(&bytes).map_err(|e| {
            TelegramError::Deserialization(format!("{method}: HTTP {status}: {e}"))
        })?;

        if !envelope.ok {
            return Err(TelegramError::Api {
                code: envelope.error_code.unwrap_or_else(|| i64::from(status.as_u16())),
                description: envelope
                    .description
                    .unwrap_or_else(|| "no description".to_string()),
            });
        }

        envelope
            .result
            .ok_or_else(|| TelegramError::Deserialization(format!("{method}: missing result")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TOKEN: &str = "123456:test-token";

    fn client_for(server: &MockServer) -> TelegramClient {
        TelegramClient::with_api_base(server.uri(), SecretString::from(TOKEN)).unwrap()
    }

    #[tokio::test]
    async fn test_get_updates_sends_offset_and_parses_result() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("/bot{TOKEN}/getUpdates")))
            .and(body_partial_json(serde_json::json!({"offset": 11, "timeout": 0})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ok": true,
                "result": [{
                    "update_id": 11,
                    "message": {
                        "message_id": 1,
                        "from": {"id": 42, "is_bot": false, "first_name": "Ada"},
                        "chat": {"id": 42, "type": "private"},
                        "date": 1700000000,
                        "text": "hi"
                    }
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let updates = client_for(&server).get_updates(Some(11), 0).await.unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].update_id, 11);
        assert_eq!(updates[0].message.as_ref().unwrap().text.as_deref(), Some("hi"));
    }

    #[tokio::test]
    async fn test_send_message_uses_html_parse_mode() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("/bot{TOKEN}/sendMessage")))
            .and(body_partial_json(serde_json::json!({
                "chat_id": 42,
                "text": "<b>hi</b>",
                "parse_mode": "HTML"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ok": true,
                "result": {"message_id": 9, "chat": {"id": 42, "type": "private"}, "date": 1, "text": "hi"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let sent = client_for(&server)
            .send_message(42, "<b>hi</b>", Some(ParseMode::Html))
            .await
            .unwrap();
        assert_eq!(sent.message_id, 9);
    }

    #[tokio::test]
    async fn test_send_typing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("/bot{TOKEN}/sendChatAction")))
            .and(body_partial_json(serde_json::json!({"chat_id": 42, "action": "typing"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true, "result": true})),
            )
            .mount(&server)
            .await;

        assert!(client_for(&server).send_typing(42).await.unwrap());
    }

    #[tokio::test]
    async fn test_api_error_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "ok": false,
                "error_code": 400,
                "description": "Bad Request: message text is empty"
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).send_message(42, "", None).await.unwrap_err();
        match err {
            TelegramError::Api { code, description } => {
                assert_eq!(code, 400);
                assert!(description.contains("message text is empty"));
            }
            other => panic!("expected api error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_non_json_body_is_deserialization_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&server)
            .await;

        let err = client_for(&server).get_me().await.unwrap_err();
        assert!(matches!(err, TelegramError::Deserialization(_)));
    }

    #[tokio::test]
    async fn test_transport_error_does_not_leak_token() {
        let client =
            TelegramClient::with_api_base("http://127.0.0.1:1", SecretString::from(TOKEN)).unwrap();
        let err = client.get_me().await.unwrap_err();
        assert!(matches!(err, TelegramError::Http(_)));
        assert!(!err.to_string().contains("test-token"));
    }
}
