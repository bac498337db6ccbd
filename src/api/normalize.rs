//! Response normalization
//!
//! Folds every possible outcome of a backend call into the operation
//! envelope. The mapping is total:
//!
//! | outcome                          | result                          |
//! |----------------------------------|---------------------------------|
//! | transport error                  | `Transport` failure             |
//! | non-2xx status                   | `Protocol` failure with status  |
//! | body is not JSON                 | `Decode` failure                |
//! | `success` is not `true`          | `Application` failure           |
//! | `success: true`                  | payload field(s) decoded as `T` |

use super::{ApiError, Envelope, HttpResponse, TransportError};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Which part of a successful body is the operation's payload
#[derive(Debug, Clone, Copy)]
pub enum Payload {
    /// The whole body
    Body,
    /// A single top-level field
    Field(&'static str),
    /// Several top-level fields, gathered into one object
    Fields(&'static [&'static str]),
}

/// Static description of a domain operation's response contract
#[derive(Debug, Clone, Copy)]
pub struct Operation {
    pub name: &'static str,
    /// Default failure message, also the prefix for status failures
    pub failure: &'static str,
    /// Whether the body carries a `success` marker
    pub marker: bool,
    pub payload: Payload,
}

pub fn normalize<T: DeserializeOwned>(
    op: &Operation,
    result: Result<HttpResponse, TransportError>,
) -> Envelope<T> {
    let response = match result {
        Ok(response) => response,
        Err(e) => {
            let message = e.to_string();
            return Err(ApiError::transport(if message.is_empty() {
                op.failure.to_string()
            } else {
                message
            }));
        }
    };

    if !response.is_success() {
        return Err(ApiError::protocol(
            response.status,
            format!("{}: {}", op.failure, response.status),
        ));
    }

    let body: Value = serde_json::from_str(&response.body)
        .map_err(|e| ApiError::decode(format!("Invalid response body: {e}")))?;

    if op.marker && body.get("success").and_then(Value::as_bool) != Some(true) {
        let message = body
            .get("error")
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .unwrap_or(op.failure);
        return Err(ApiError::application(message));
    }

    serde_json::from_value(extract(op.payload, body))
        .map_err(|e| ApiError::decode(format!("{}: unexpected payload ({e})", op.failure)))
}

/// Missing fields come back as `null`; whether that is acceptable is up to
/// the payload type.
fn extract(payload: Payload, body: Value) -> Value {
    match payload {
        Payload::Body => body,
        Payload::Field(name) => body.get(name).cloned().unwrap_or(Value::Null),
        Payload::Fields(names) => {
            let gathered: Map<String, Value> = names
                .iter()
                .map(|name| {
                    (
                        (*name).to_string(),
                        body.get(*name).cloned().unwrap_or(Value::Null),
                    )
                })
                .collect();
            Value::Object(gathered)
        }
    }
}
