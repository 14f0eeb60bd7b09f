//! Request/response interception pipeline.
//!
//! # Stage Order
//! ```text
//! inbound
//!   → capture_request_body      snapshot request body (CachedRequestBody)
//!   → initialize_session        POST /session only; wraps everything below
//!   → release_session           DELETE /session/{id}; drops registry entry on 2xx
//!   → classify_errors           inspects the finished response
//!   → log_command               one line per command
//!   → capture_response_body     snapshot upstream body (CachedResponseBody)
//!   → forward                   upstream round-trip
//! outbound (same stages in reverse)
//! ```
//!
//! # Design Decisions
//! - The order is declared once, in [`apply`], outermost first
//! - Only `initialize_session` may change what the client sees, apart from
//!   the 413/502/504 answers of body capture on ordinary commands
//! - Every other stage degrades to logging

pub mod capture;
pub mod command_log;
pub mod error_classifier;
pub mod exchange;
pub mod session_end;
pub mod session_init;

use axum::middleware::{from_fn, from_fn_with_state};
use axum::Router;
use tower::ServiceBuilder;

use crate::http::server::AppState;

pub use exchange::{CachedRequestBody, CachedResponseBody, UpstreamDeadline, UpstreamFailure};

/// Wrap the forwarding router in the interception stages.
pub fn apply(router: Router, state: AppState) -> Router {
    router.layer(
        ServiceBuilder::new()
            .layer(from_fn_with_state(state.clone(), capture::capture_request_body))
            .layer(from_fn_with_state(state.clone(), session_init::initialize_session))
            .layer(from_fn_with_state(state.clone(), session_end::release_session))
            .layer(from_fn(error_classifier::classify_errors))
            .layer(from_fn(command_log::log_command))
            .layer(from_fn_with_state(state, capture::capture_response_body)),
    )
}
