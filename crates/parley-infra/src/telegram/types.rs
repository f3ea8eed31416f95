//! Telegram Bot API wire types.
//!
//! Only the fields the relay reads are modelled; everything else in the
//! payloads is ignored.

use serde::{Deserialize, Serialize};

/// Envelope around every Bot API response.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub error_code: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Message {
    pub message_id: i64,
    #[serde(default)]
    pub from: Option<User>,
    pub chat: Chat,
    #[serde(default)]
    pub date: i64,
    #[serde(default)]
    pub text: Option<String>,
}

impl Message {
    /// Conversation key for the sender: the numeric user id when present,
    /// else the chat id.
    pub fn sender_key(&self) -> String {
        match &self.from {
            Some(user) => user.id.to_string(),
            None => self.chat.id.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type", default)]
    pub kind: String,
}

/// Markup dialect for outgoing text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ParseMode {
    #[serde(rename = "HTML")]
    Html,
}

#[derive(Debug, Serialize)]
pub(crate) struct GetUpdatesParams<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i64>,
    pub timeout: u64,
    pub allowed_updates: &'a [&'a str],
}

#[derive(Debug, Serialize)]
pub(crate) struct SendMessageParams<'a> {
    pub chat_id: i64,
    pub text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<ParseMode>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatActionParams<'a> {
    pub chat_id: i64,
    pub action: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_parses_private_text_message() {
        let json = r#"{
            "update_id": 1001,
            "message": {
                "message_id": 7,
                "from": {"id": 42, "is_bot": false, "first_name": "Ada", "username": "ada"},
                "chat": {"id": 42, "type": "private", "first_name": "Ada"},
                "date": 1700000000,
                "text": "What is Go?"
            }
        }"#;
        let update: Update = serde_json::from_str(json).unwrap();
        let message = update.message.unwrap();
        assert_eq!(update.update_id, 1001);
        assert_eq!(message.text.as_deref(), Some("What is Go?"));
        assert_eq!(message.sender_key(), "42");
        assert_eq!(message.chat.kind, "private");
    }

    #[test]
    fn test_update_without_message_parses() {
        let json = r#"{"update_id": 5, "edited_message": {"message_id": 1}}"#;
        let update: Update = serde_json::from_str(json).unwrap();
        assert!(update.message.is_none());
    }

    #[test]
    fn test_sender_key_falls_back_to_chat() {
        let json = r#"{"message_id": 1, "chat": {"id": -100, "type": "channel"}, "text": "hi"}"#;
        let message: Message = serde_json::from_str(json).unwrap();
        assert_eq!(message.sender_key(), "-100");
    }

    #[test]
    fn test_send_message_params_shape() {
        let params = SendMessageParams {
            chat_id: 42,
            text: "hi",
            parse_mode: Some(ParseMode::Html),
        };
        let value = serde_json::to_value(&params).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"chat_id": 42, "text": "hi", "parse_mode": "HTML"})
        );
    }

    #[test]
    fn test_error_envelope_parses() {
        let json = r#"{"ok": false, "error_code": 401, "description": "Unauthorized"}"#;
        let resp: ApiResponse<Vec<Update>> = serde_json::from_str(json).unwrap();
        assert!(!resp.ok);
        assert!(resp.result.is_none());
        assert_eq!(resp.error_code, Some(401));
    }
}
