//! Client for the sales assistant backend
//!
//! Layered leaves first: transport, normalizer, domain operations.

mod client;
mod error;
mod normalize;
mod transport;
pub mod types;

#[cfg(test)]
pub mod testing;

pub use client::ChatbotApi;
pub use error::{ApiError, Envelope, TransportError};
pub use transport::{
    HttpRequest, HttpResponse, HttpTransport, LoggingTransport, Transport, DEFAULT_TIMEOUT,
};
pub use types::{Conversation, MessageExchange, MessageRole};

#[cfg(test)]
pub use error::ApiErrorKind;
#[cfg(test)]
pub use types::Message;
