//! Test doubles for the transport layer
//!
//! `MockTransport` replays queued responses without any I/O. `FakeBackend`
//! serves an in-memory imitation of the chat backend over real HTTP so the
//! `reqwest` transport can be exercised end to end.

use super::{HttpRequest, HttpResponse, Transport, TransportError};
use async_trait::async_trait;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

// ============================================================================
// Mock Transport
// ============================================================================

/// Transport that returns queued results and records every request
pub struct MockTransport {
    responses: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn queue_response(&self, response: HttpResponse) {
        self.responses.lock().unwrap().push_back(Ok(response));
    }

    pub fn queue_json(&self, status: u16, body: &Value) {
        self.queue_response(HttpResponse::json(status, body));
    }

    pub fn queue_error(&self, error: TransportError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    pub fn recorded_requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn recorded_paths(&self) -> Vec<String> {
        self.recorded_requests().into_iter().map(|r| r.path).collect()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Connect("No mock response queued".into())))
    }
}

/// Build a conversation body; messages are `(id, role, content)`
pub fn conversation_json(id: &str, messages: &[(&str, &str, &str)]) -> Value {
    json!({
        "id": id,
        "title": "New Chat",
        "messages": messages
            .iter()
            .map(|(mid, role, content)| json!({
                "id": mid,
                "content": content,
                "role": role,
                "timestamp": "2024-05-01T10:00:00"
            }))
            .collect::<Vec<_>>(),
        "created_at": "2024-05-01T09:00:00",
        "last_updated": "2024-05-01T10:00:00"
    })
}

// ============================================================================
// Fake Backend
// ============================================================================

/// In-process HTTP server mounted under `/api`
pub struct FakeBackend {
    addr: SocketAddr,
    handle: tokio::task::JoinHandle<()>,
}

impl FakeBackend {
    pub async fn start(routes: Router) -> Self {
        let app = Router::new().nest("/api", routes);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self { addr, handle }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    /// Routes mimicking the chat backend with in-memory storage
    pub fn chat_routes() -> Router {
        Router::new()
            .route("/health", get(|| async { Json(json!({ "status": "healthy" })) }))
            .route("/chat/new", post(create_chat))
            .route("/chat/:id/message", post(send_message))
            .route("/chat/:id", get(get_chat).delete(delete_chat))
            .route("/chats", get(list_chats))
            .with_state(Chats::default())
    }
}

impl Drop for FakeBackend {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[derive(Clone, Default)]
struct Chats(Arc<Mutex<Vec<Value>>>);

fn not_found() -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "success": false, "error": "Chat session not found" })),
    )
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

async fn create_chat(State(chats): State<Chats>) -> (StatusCode, Json<Value>) {
    let id = uuid::Uuid::new_v4().to_string();
    let chat = json!({
        "id": id,
        "title": "New Chat",
        "messages": [],
        "created_at": now(),
        "last_updated": now()
    });
    chats.0.lock().unwrap().push(chat.clone());
    (
        StatusCode::CREATED,
        Json(json!({ "success": true, "chat_id": id, "chat": chat })),
    )
}

async fn send_message(
    State(chats): State<Chats>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let text = body["message"].as_str().unwrap_or_default().trim().to_string();
    if text.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "success": false, "error": "Message cannot be empty" })),
        );
    }

    let mut chats = chats.0.lock().unwrap();
    let Some(chat) = chats.iter_mut().find(|c| c["id"] == id.as_str()) else {
        return not_found();
    };

    let user_message = json!({
        "id": uuid::Uuid::new_v4().to_string(),
        "content": text,
        "role": "user",
        "timestamp": now()
    });
    let ai_response = json!({
        "id": uuid::Uuid::new_v4().to_string(),
        "content": format!("Sales summary for: {text}"),
        "role": "assistant",
        "timestamp": now()
    });
    let messages = chat["messages"].as_array_mut().unwrap();
    messages.push(user_message.clone());
    messages.push(ai_response.clone());
    if messages.len() <= 2 {
        chat["title"] = json!(text.chars().take(30).collect::<String>());
    }
    chat["last_updated"] = json!(now());

    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "user_message": user_message,
            "ai_response": ai_response,
            "chat": chat.clone()
        })),
    )
}

async fn get_chat(State(chats): State<Chats>, Path(id): Path<String>) -> (StatusCode, Json<Value>) {
    let chats = chats.0.lock().unwrap();
    match chats.iter().find(|c| c["id"] == id.as_str()) {
        Some(chat) => (StatusCode::OK, Json(json!({ "success": true, "chat": chat }))),
        None => not_found(),
    }
}

async fn delete_chat(
    State(chats): State<Chats>,
    Path(id): Path<String>,
) -> (StatusCode, Json<Value>) {
    let mut chats = chats.0.lock().unwrap();
    let before = chats.len();
    chats.retain(|c| c["id"] != id.as_str());
    if chats.len() == before {
        return not_found();
    }
    (
        StatusCode::OK,
        Json(json!({ "success": true, "message": "Chat deleted successfully" })),
    )
}

async fn list_chats(State(chats): State<Chats>) -> Json<Value> {
    let chats = chats.0.lock().unwrap().clone();
    Json(json!({ "success": true, "chats": chats }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_transport_replays_in_order() {
        let mock = MockTransport::new();
        mock.queue_response(HttpResponse::new(200, "first"));
        mock.queue_error(TransportError::Timeout(10));

        let first = mock.send(HttpRequest::get("/a")).await.unwrap();
        assert_eq!(first.body, "first");
        assert!(mock.send(HttpRequest::get("/b")).await.is_err());

        // Exhausted queue behaves like an unreachable backend
        let third = mock.send(HttpRequest::get("/c")).await;
        assert!(matches!(third, Err(TransportError::Connect(_))));
        assert_eq!(mock.recorded_paths(), ["/a", "/b", "/c"]);
    }
}
