//! Upstream error classification.
//!
//! # Responsibilities
//! - Detect 4xx/5xx responses
//! - Read `value.error` from the protocol envelope
//! - Separate well-known element/timeout errors from everything else
//!
//! # Design Decisions
//! - Observer only: the response is returned exactly as received
//! - Parse failures are logged and swallowed
//! - Error codes are compared case-sensitively

use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::observability::metrics;
use crate::pipeline::exchange::{cached_request_body, cached_response_body, CachedRequestBody};
use crate::protocol;

/// Protocol errors worth calling out by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnownError {
    NoSuchElement,
    StaleElementReference,
    Timeout,
}

impl KnownError {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "no such element" => Some(KnownError::NoSuchElement),
            "stale element reference" => Some(KnownError::StaleElementReference),
            "timeout" => Some(KnownError::Timeout),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            KnownError::NoSuchElement => "no such element",
            KnownError::StaleElementReference => "stale element reference",
            KnownError::Timeout => "timeout",
        }
    }
}

/// Outcome of inspecting one response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Status is not 4xx/5xx.
    NotAnError,
    /// Error status, but a body snapshot is missing.
    Uninspected,
    /// Error status, envelope carries no `value.error`.
    NoErrorCode,
    Known(KnownError),
    Unknown(String),
    ParseFailure(String),
}

pub fn is_error_status(status: StatusCode) -> bool {
    status.is_client_error() || status.is_server_error()
}

pub fn classify(
    status: StatusCode,
    request_body: Option<&str>,
    response_body: Option<&str>,
) -> Classification {
    if !is_error_status(status) {
        return Classification::NotAnError;
    }
    let (Some(_), Some(response_body)) = (request_body, response_body) else {
        return Classification::Uninspected;
    };

    let envelope = match protocol::parse_envelope(response_body) {
        Ok(envelope) => envelope,
        Err(e) => return Classification::ParseFailure(e.to_string()),
    };
    match protocol::extract_value_section(&envelope).and_then(|s| s.error.as_deref()) {
        Some(code) => match KnownError::from_code(code) {
            Some(known) => Classification::Known(known),
            None => Classification::Unknown(code.to_string()),
        },
        None => Classification::NoErrorCode,
    }
}

pub async fn classify_errors(request: Request<Body>, next: Next) -> Response {
    let request_body = cached_request_body(&request).cloned();
    let response = next.run(request).await;
    if is_error_status(response.status()) {
        inspect(&response, request_body.as_ref());
    }
    response
}

fn inspect(response: &Response, request_body: Option<&CachedRequestBody>) {
    let status = response.status();
    let request_body = request_body.map(|b| b.as_text());
    let response_body = cached_response_body(response).map(|b| b.as_text());

    tracing::error!(
        status = status.as_u16(),
        request_body = ?request_body.as_deref(),
        response_body = ?response_body.as_deref(),
        "Error response detected"
    );

    match classify(status, request_body.as_deref(), response_body.as_deref()) {
        Classification::Known(known) => {
            metrics::record_classified_error(known.as_str());
            tracing::error!(
                kind = known.as_str(),
                locator = ?request_body.as_deref(),
                "Known protocol error detected"
            );
        }
        Classification::Unknown(code) => {
            metrics::record_classified_error("unknown");
            tracing::error!(kind = %code, "Unknown error type");
        }
        Classification::ParseFailure(reason) => {
            tracing::warn!(error = %reason, "Failed to parse error response body");
        }
        Classification::NotAnError | Classification::Uninspected | Classification::NoErrorCode => {}
    }
}
