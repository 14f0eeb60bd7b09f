//! Session release on `DELETE /session/{id}`.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::http::server::AppState;
use crate::protocol::Command;

pub async fn release_session(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let Command::DeleteSession { session_id } =
        Command::classify(request.method(), request.uri().path())
    else {
        return next.run(request).await;
    };

    let response = next.run(request).await;
    if response.status().is_success() {
        state.tracker.release(&session_id);
    } else {
        tracing::debug!(
            session_id = %session_id,
            status = response.status().as_u16(),
            "Session delete failed upstream; keeping context"
        );
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProxyConfig;
    use axum::{http::StatusCode, middleware::from_fn_with_state, routing::any, Router};
    use tower::ServiceExt;

    fn seeded_state() -> AppState {
        let state = AppState::from_config(&ProxyConfig::default()).unwrap();
        let pending = state.tracker.begin("{}");
        state
            .tracker
            .complete(pending, r#"{"value":{"sessionId":"s1"}}"#)
            .unwrap();
        state
    }

    async fn delete(state: &AppState, status: StatusCode) {
        let app = Router::new()
            .route("/{*path}", any(move || async move { status }))
            .layer(from_fn_with_state(state.clone(), release_session));
        app.oneshot(Request::delete("/session/s1").body(Body::empty()).unwrap())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_successful_delete_releases() {
        let state = seeded_state();
        delete(&state, StatusCode::OK).await;
        assert!(state.tracker.lookup("s1").is_err());
    }

    #[tokio::test]
    async fn test_failed_delete_keeps_context() {
        let state = seeded_state();
        delete(&state, StatusCode::NOT_FOUND).await;
        assert!(state.tracker.lookup("s1").is_ok());
    }
}
