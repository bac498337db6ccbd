//! Domain operations against the sales assistant backend

use super::normalize::{normalize, Operation, Payload};
use super::types::{Conversation, HealthStatus, MessageExchange, SalesRecord, SendMessageRequest};
use super::{Envelope, HttpRequest, Transport};
use serde::de::DeserializeOwned;
use std::time::Duration;

const HEALTH_CHECK: Operation = Operation {
    name: "health_check",
    failure: "Health check failed",
    marker: false,
    payload: Payload::Body,
};

/// Reachability probes give up sooner than regular calls
const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

const CREATE_CHAT: Operation = Operation {
    name: "create_chat",
    failure: "Failed to create chat",
    marker: true,
    payload: Payload::Field("chat"),
};

const SEND_MESSAGE: Operation = Operation {
    name: "send_message",
    failure: "Failed to send message",
    marker: true,
    payload: Payload::Fields(&["user_message", "ai_response", "chat"]),
};

const GET_CHAT: Operation = Operation {
    name: "get_chat",
    failure: "Failed to get chat",
    marker: true,
    payload: Payload::Field("chat"),
};

const GET_CHATS: Operation = Operation {
    name: "get_chats",
    failure: "Failed to get chats",
    marker: true,
    payload: Payload::Field("chats"),
};

const DELETE_CHAT: Operation = Operation {
    name: "delete_chat",
    failure: "Failed to delete chat",
    marker: true,
    payload: Payload::Field("message"),
};

const SALES_DATA: Operation = Operation {
    name: "sales_data",
    failure: "Failed to get sales data",
    marker: true,
    payload: Payload::Field("data"),
};

/// Client for the chatbot backend
///
/// Every method resolves to an [`Envelope`]; nothing escapes as a panic or an
/// unhandled error.
pub struct ChatbotApi<T> {
    transport: T,
}

impl<T: Transport> ChatbotApi<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    async fn call<R: DeserializeOwned>(&self, op: &Operation, request: HttpRequest) -> Envelope<R> {
        let result = normalize(op, self.transport.send(request).await);
        match &result {
            Err(e) if e.kind.is_connectivity() => {
                tracing::warn!(operation = op.name, error = %e.message, "Backend unreachable");
            }
            Err(e) => {
                tracing::warn!(
                    operation = op.name,
                    kind = ?e.kind,
                    error = %e.message,
                    "Backend operation failed"
                );
            }
            Ok(_) => {}
        }
        result
    }

    pub async fn health_check(&self) -> Envelope<HealthStatus> {
        self.call(
            &HEALTH_CHECK,
            HttpRequest::get("/health").with_timeout(HEALTH_TIMEOUT),
        )
        .await
    }

    /// Health check reduced to reachability
    pub async fn check_backend_connection(&self) -> bool {
        self.health_check().await.is_ok()
    }

    pub async fn create_conversation(&self) -> Envelope<Conversation> {
        self.call(&CREATE_CHAT, HttpRequest::post("/chat/new")).await
    }

    pub async fn send_message(
        &self,
        conversation_id: &str,
        message: &str,
    ) -> Envelope<MessageExchange> {
        let body = match serde_json::to_value(SendMessageRequest { message }) {
            Ok(body) => body,
            Err(e) => return Err(super::ApiError::decode(format!("{}: {e}", SEND_MESSAGE.failure))),
        };
        self.call(
            &SEND_MESSAGE,
            HttpRequest::post(format!("/chat/{conversation_id}/message")).with_json(body),
        )
        .await
    }

    pub async fn get_conversation(&self, conversation_id: &str) -> Envelope<Conversation> {
        self.call(&GET_CHAT, HttpRequest::get(format!("/chat/{conversation_id}")))
            .await
    }

    pub async fn list_conversations(&self) -> Envelope<Vec<Conversation>> {
        self.call(&GET_CHATS, HttpRequest::get("/chats")).await
    }

    /// Returns the server's confirmation text (empty if it sent none)
    pub async fn delete_conversation(&self, conversation_id: &str) -> Envelope<String> {
        let message: Option<String> = self
            .call(&DELETE_CHAT, HttpRequest::delete(format!("/chat/{conversation_id}")))
            .await?;
        Ok(message.unwrap_or_default())
    }

    pub async fn sales_data(&self) -> Envelope<Vec<SalesRecord>> {
        let records: Option<Vec<SalesRecord>> =
            self.call(&SALES_DATA, HttpRequest::get("/sales/data")).await?;
        Ok(records.unwrap_or_default())
    }
}
