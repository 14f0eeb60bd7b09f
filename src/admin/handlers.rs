use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::admin::AdminState;
use crate::session::SessionContext;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub upstream: String,
    pub tracked_sessions: usize,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        upstream: state.tracker.remote_url().to_string(),
        tracked_sessions: state.tracker.registry().snapshot().len(),
    })
}

pub async fn list_sessions(State(state): State<AdminState>) -> Json<Vec<SessionContext>> {
    let sessions = state
        .tracker
        .registry()
        .snapshot()
        .into_iter()
        .map(|ctx| (*ctx).clone())
        .collect();
    Json(sessions)
}

pub async fn get_session(
    State(state): State<AdminState>,
    Path(session_id): Path<String>,
) -> Response {
    match state.tracker.lookup(&session_id) {
        Ok(ctx) => Json((*ctx).clone()).into_response(),
        Err(e) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}
