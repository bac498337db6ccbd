//! HTTP transport with a bounded timeout and uniform headers
//!
//! One attempt per call. Timeouts and network failures come back as
//! [`TransportError`], never as a panic, so the normalizer can fold them into
//! the operation envelope.

use super::TransportError;
use async_trait::async_trait;
use reqwest::{Client, Method};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default deadline for a single call
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const CONTENT_TYPE: &str = "Content-Type";
const JSON_MIME: &str = "application/json";
const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// Outgoing request, relative to the transport's base URL
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    /// Path beginning with `/`, e.g. `/chat/new`
    pub path: String,
    pub body: Option<serde_json::Value>,
    /// Extra headers merged over the defaults
    pub headers: Vec<(String, String)>,
    /// Tightens the transport's deadline for this call; never extends it
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            headers: Vec::new(),
            timeout: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    #[must_use]
    pub fn with_json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Completed HTTP exchange, any status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    #[cfg(test)]
    pub fn json(status: u16, body: &serde_json::Value) -> Self {
        Self::new(status, body.to_string())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Seam between domain operations and the network
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).send(request).await
    }
}

/// Merge extra headers over the defaults. A default is only replaced when an
/// extra header names it explicitly (case-insensitive).
pub fn merge_headers(
    defaults: &[(String, String)],
    extra: &[(String, String)],
) -> Vec<(String, String)> {
    let mut merged = defaults.to_vec();
    for (name, value) in extra {
        match merged
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
        {
            Some(slot) => slot.1.clone_from(value),
            None => merged.push((name.clone(), value.clone())),
        }
    }
    merged
}

/// `reqwest`-backed transport
pub struct HttpTransport {
    client: Client,
    base_url: String,
    timeout: Duration,
    default_headers: Vec<(String, String)>,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder()
            .build()
            .map_err(|e| TransportError::Request(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
            default_headers: vec![(CONTENT_TYPE.to_string(), JSON_MIME.to_string())],
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = format!("{}{}", self.base_url, request.path);
        let deadline = request
            .timeout
            .map_or(self.timeout, |timeout| timeout.min(self.timeout));

        let mut builder = self.client.request(request.method, &url);
        for (name, value) in merge_headers(&self.default_headers, &request.headers) {
            builder = builder.header(name, value);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.to_string());
        }

        let call = async {
            let response = builder
                .send()
                .await
                .map_err(|e| TransportError::from_reqwest(&e))?;
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .map_err(|e| TransportError::Request(format!("Failed to read response: {e}")))?;
            Ok(HttpResponse::new(status, body))
        };

        // Dropping the future on expiry aborts the in-flight request
        match tokio::time::timeout(deadline, call).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(deadline.as_millis())),
        }
    }
}

/// Logging wrapper for transports. Tags each request with an
/// `X-Request-Id` header matching the id in the log line.
pub struct LoggingTransport<T> {
    inner: T,
}

impl<T: Transport> LoggingTransport<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<T: Transport> Transport for LoggingTransport<T> {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let request_id = uuid::Uuid::new_v4();
        let method = request.method.clone();
        let path = request.path.clone();
        let request = request.with_header(REQUEST_ID_HEADER, request_id.to_string());
        let start = Instant::now();
        let result = self.inner.send(request).await;
        let duration = start.elapsed();

        match &result {
            Ok(response) => {
                tracing::debug!(
                    %request_id,
                    %method,
                    %path,
                    status = response.status,
                    duration_ms = %duration.as_millis(),
                    "Backend request completed"
                );
            }
            Err(e) => {
                tracing::warn!(
                    %request_id,
                    %method,
                    %path,
                    duration_ms = %duration.as_millis(),
                    error = %e,
                    "Backend request failed"
                );
            }
        }

        result
    }
}
