//! Admin API.
//!
//! Read-only view of the session registry for tooling outside the proxy.
//! Served on its own listener and guarded by a bearer token.

pub mod auth;
pub mod handlers;

use axum::{middleware, routing::get, Router};
use std::sync::Arc;

use crate::session::SessionTracker;
use self::auth::admin_auth_middleware;
use self::handlers::*;

/// State shared by the admin handlers.
#[derive(Clone)]
pub struct AdminState {
    pub tracker: SessionTracker,
    pub api_key: Arc<str>,
}

impl AdminState {
    pub fn new(tracker: SessionTracker, api_key: &str) -> Self {
        Self {
            tracker,
            api_key: Arc::from(api_key),
        }
    }
}

pub fn router(state: AdminState) -> Router {
    Router::new()
        .route("/admin/status", get(get_status))
        .route("/admin/sessions", get(list_sessions))
        .route("/admin/sessions/{id}", get(get_session))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .with_state(state)
}
