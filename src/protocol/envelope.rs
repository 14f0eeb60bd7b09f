//! Protocol JSON envelope parsing.
//!
//! Every protocol payload is wrapped as `{"value": ...}`. For session
//! creation and error responses `value` is an object carrying some of
//! `sessionId`, `capabilities`, `error`, `message` and `stacktrace`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Negotiated session capabilities.
pub type Capabilities = Map<String, Value>;

/// Error code used when a session could not be created.
pub const SESSION_NOT_CREATED: &str = "session not created";

/// Errors raised while reading protocol payloads.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed payload: {0}")]
    MalformedPayload(String),
}

impl From<serde_json::Error> for ProtocolError {
    fn from(e: serde_json::Error) -> Self {
        ProtocolError::MalformedPayload(e.to_string())
    }
}

/// The object form of the `value` section.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ValueSection {
    #[serde(rename = "sessionId", default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub capabilities: Option<Capabilities>,
    #[serde(default)]
    pub error: Option<String>,
    /// Free-form; some servers send an object here.
    #[serde(default)]
    pub message: Option<Value>,
    #[serde(default)]
    pub stacktrace: Option<Value>,
}

/// A parsed protocol envelope.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Envelope {
    /// Present only when `value` is a JSON object.
    pub value: Option<ValueSection>,
}

/// Parse protocol JSON text into an [`Envelope`].
///
/// Fails with [`ProtocolError::MalformedPayload`] when the text is not
/// JSON, the top level is not an object, or a known `value` field has the
/// wrong type.
pub fn parse_envelope(text: &str) -> Result<Envelope, ProtocolError> {
    let root: Value = serde_json::from_str(text)?;
    let Value::Object(mut root) = root else {
        return Err(ProtocolError::MalformedPayload(
            "expected a JSON object at the top level".to_string(),
        ));
    };

    let value: Option<ValueSection> = match root.remove("value") {
        Some(section @ Value::Object(_)) => Some(serde_json::from_value(section)?),
        _ => None,
    };

    Ok(Envelope { value })
}

/// Return the `value` section of an envelope, if it has one.
pub fn extract_value_section(envelope: &Envelope) -> Option<&ValueSection> {
    envelope.value.as_ref()
}

/// Return the `capabilities` object, or an empty map when absent.
pub fn extract_capabilities(section: &ValueSection) -> Capabilities {
    section.capabilities.clone().unwrap_or_default()
}

/// True iff the text parses and its `value` section has an `error` key.
///
/// Malformed input and a missing `value` section both count as "no error".
pub fn has_error(text: &str) -> bool {
    parse_envelope(text)
        .ok()
        .and_then(|envelope| envelope.value)
        .is_some_and(|section| section.error.is_some())
}

/// Protocol-compliant error body produced by the proxy itself.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorEnvelope {
    pub value: ErrorValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorValue {
    pub error: String,
    pub message: String,
    pub stacktrace: String,
}

impl ErrorEnvelope {
    /// Build a `session not created` error with the given detail.
    pub fn session_not_created(message: impl Into<String>) -> Self {
        Self {
            value: ErrorValue {
                error: SESSION_NOT_CREATED.to_string(),
                message: message.into(),
                stacktrace: String::new(),
            },
        }
    }
}
