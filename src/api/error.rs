//! API error types

use thiserror::Error;

/// Failure raised below the normalizer, before any HTTP status is known
#[derive(Debug, Error)]
pub enum TransportError {
    /// The call exceeded its deadline and was aborted
    #[error("Request timed out after {0}ms")]
    Timeout(u128),
    /// Could not reach the backend at all
    #[error("Connection failed: {0}")]
    Connect(String),
    /// Any other failure while sending or reading the response
    #[error("Request failed: {0}")]
    Request(String),
}

impl TransportError {
    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        if err.is_connect() {
            Self::Connect(err.to_string())
        } else {
            Self::Request(err.to_string())
        }
    }
}

/// Classification of a failed domain operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// Network unreachable, timeout or abort
    Transport,
    /// Non-2xx HTTP status
    Protocol,
    /// 2xx with the server's `success` marker unset
    Application,
    /// Body was not valid JSON or did not match the expected payload
    Decode,
}

impl ApiErrorKind {
    /// Whether the failure says anything about backend reachability
    pub fn is_connectivity(self) -> bool {
        matches!(self, Self::Transport)
    }
}

/// Failure side of the operation envelope
///
/// `message` is display-ready and is what the console shows the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub message: String,
    /// HTTP status for `Protocol` failures
    pub status: Option<u16>,
}

impl ApiError {
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Transport, message)
    }

    pub fn protocol(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            ..Self::new(ApiErrorKind::Protocol, message)
        }
    }

    pub fn application(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Application, message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Decode, message)
    }
}

/// Uniform result of every domain operation
pub type Envelope<T> = Result<T, ApiError>;
