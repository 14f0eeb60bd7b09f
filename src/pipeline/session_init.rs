//! Session creation interception.
//!
//! # Responsibilities
//! - Recognize the new-session command
//! - Build a pending context before the upstream call
//! - Store the active context once the upstream answers
//! - Replace the response with a `session not created` envelope on failure
//!
//! # Design Decisions
//! - Runs outside every stage except request capture, so it sees the raw
//!   creation request first and produces the final response last
//! - On success the upstream response passes through untouched
//! - Failures are never retried

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::http::server::AppState;
use crate::observability::metrics;
use crate::pipeline::exchange::{cached_request_body, cached_response_body, upstream_failure};
use crate::protocol::{Command, ErrorEnvelope};
use crate::session::{PendingSession, SessionContext, SessionError, SessionTracker};

pub async fn initialize_session(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !Command::classify(request.method(), request.uri().path()).is_new_session() {
        return next.run(request).await;
    }

    let Some(request_body) = cached_request_body(&request).map(|b| b.as_text().into_owned())
    else {
        return session_not_created(SessionError::MissingRequestBody);
    };
    tracing::info!(path = %request.uri().path(), body = %request_body, "New session request received");

    let pending = state.tracker.begin(&request_body);
    let response = next.run(request).await;

    match complete(&state.tracker, pending, &response) {
        Ok(context) => {
            metrics::record_session_created();
            tracing::info!(session_id = %context.session_id(), "Session created");
            response
        }
        Err(e) => session_not_created(e),
    }
}

fn complete(
    tracker: &SessionTracker,
    pending: PendingSession,
    response: &Response,
) -> Result<Arc<SessionContext>, SessionError> {
    if let Some(failure) = upstream_failure(response) {
        return Err(SessionError::Upstream(failure.message().to_string()));
    }
    let body = cached_response_body(response)
        .map(|b| b.as_text())
        .unwrap_or_default();
    tracker.complete(pending, &body)
}

fn session_not_created(error: SessionError) -> Response {
    tracing::error!(error = %error, "Session creation failed");
    metrics::record_session_create_failure(error.reason());
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorEnvelope::session_not_created(error.to_string())),
    )
        .into_response()
}
