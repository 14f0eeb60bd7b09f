//! Exchange-scoped cache.
//!
//! Body snapshots travel with the exchange itself: the request snapshot in
//! the request extensions, the response snapshot, the upstream deadline and
//! any upstream failure in the response extensions. Nothing here outlives the
//! exchange.

use axum::body::{Body, Bytes};
use axum::http::{Request, Response};
use std::borrow::Cow;
use std::sync::Arc;
use tokio::time::Instant;

/// Snapshot of the request body, taken before any stage runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedRequestBody(pub Bytes);

/// Snapshot of the upstream response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponseBody(pub Bytes);

/// Set on a response the proxy produced because the upstream round-trip failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamFailure(pub Arc<str>);

/// When the upstream round-trip, body included, must be finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpstreamDeadline(pub Instant);

impl UpstreamFailure {
    pub fn new(message: impl Into<Arc<str>>) -> Self {
        Self(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

impl CachedRequestBody {
    pub fn as_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.0)
    }
}

impl CachedResponseBody {
    pub fn as_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.0)
    }
}

pub fn cached_request_body(request: &Request<Body>) -> Option<&CachedRequestBody> {
    request.extensions().get::<CachedRequestBody>()
}

pub fn cached_response_body(response: &Response<Body>) -> Option<&CachedResponseBody> {
    response.extensions().get::<CachedResponseBody>()
}

pub fn upstream_failure(response: &Response<Body>) -> Option<&UpstreamFailure> {
    response.extensions().get::<UpstreamFailure>()
}
