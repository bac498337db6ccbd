//! Wire types exchanged with the sales assistant backend

use serde::{Deserialize, Serialize};

/// Who produced a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
        }
    }
}

/// One turn in a conversation. Immutable once the server has created it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub content: String,
    pub role: MessageRole,
    /// ISO-8601 timestamp as sent by the server
    #[serde(default)]
    pub timestamp: String,
}

/// A conversation as owned by the backend
///
/// Timestamps are kept as the server's strings; the client never does
/// arithmetic on them and round-trips them untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub last_updated: String,
}

impl Conversation {
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }
}

/// Payload of a successful send: the stored user turn, the assistant's reply
/// and the updated conversation containing both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageExchange {
    pub user_message: Message,
    pub ai_response: Message,
    pub chat: Conversation,
}

/// Body of `POST /chat/{id}/message`
#[derive(Debug, Serialize)]
pub struct SendMessageRequest<'a> {
    pub message: &'a str,
}

/// Status object returned by `GET /health`. Shape is server-defined.
pub type HealthStatus = serde_json::Value;

/// One record of `GET /sales/data`. Shape is server-defined.
pub type SalesRecord = serde_json::Value;
