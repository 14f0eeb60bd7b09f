//! Body capture.
//!
//! Request and response bodies are single-read streams. Each half reads its
//! body once, stores the bytes in the exchange, and hands an identical body
//! on to the rest of the chain.
//!
//! An unreadable creation request is not rejected here. It continues without
//! a snapshot so the session stage answers with its own error envelope.

use axum::{
    body::{self, Body, Bytes},
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::http::forward::failure_response;
use crate::http::server::AppState;
use crate::pipeline::exchange::{CachedRequestBody, CachedResponseBody, UpstreamDeadline};
use crate::protocol::Command;

/// Read a body fully, up to `limit` bytes.
pub async fn read_body(body: Body, limit: usize) -> Result<Bytes, axum::Error> {
    body::to_bytes(body, limit).await
}

pub async fn capture_request_body(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let (mut parts, body) = request.into_parts();
    let bytes = match read_body(body, state.limits.max_request_body_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(path = %parts.uri.path(), error = %e, "Failed to read request body");
            if Command::classify(&parts.method, parts.uri.path()).is_new_session() {
                return next.run(Request::from_parts(parts, Body::empty())).await;
            }
            return (
                StatusCode::PAYLOAD_TOO_LARGE,
                "Request body too large or unreadable",
            )
                .into_response();
        }
    };

    parts.extensions.insert(CachedRequestBody(bytes.clone()));
    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

pub async fn capture_response_body(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let response = next.run(request).await;
    let (mut parts, body) = response.into_parts();

    let timeout = state.upstream.timeout();
    let deadline = parts
        .extensions
        .get::<UpstreamDeadline>()
        .map(|d| d.0)
        .unwrap_or_else(|| tokio::time::Instant::now() + timeout);
    let read = tokio::time::timeout_at(
        deadline,
        read_body(body, state.limits.max_response_body_bytes),
    )
    .await;

    match read {
        Ok(Ok(bytes)) => {
            parts.extensions.insert(CachedResponseBody(bytes.clone()));
            Response::from_parts(parts, Body::from(bytes))
        }
        Ok(Err(e)) => {
            tracing::error!(error = %e, "Failed to read upstream response body");
            failure_response(
                StatusCode::BAD_GATEWAY,
                format!("failed to read upstream response body: {e}"),
            )
        }
        Err(_) => {
            tracing::error!(timeout = ?timeout, "Timed out reading upstream response body");
            failure_response(
                StatusCode::GATEWAY_TIMEOUT,
                format!("upstream response body not received within {timeout:?}"),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProxyConfig;
    use crate::pipeline::exchange::{cached_request_body, cached_response_body};
    use axum::{middleware::from_fn_with_state, routing::any, Router};
    use tower::ServiceExt;

    fn state() -> AppState {
        AppState::from_config(&ProxyConfig::default()).unwrap()
    }

    /// Echoes the cached request body and the live body it received.
    async fn echo(request: Request<Body>) -> String {
        let cached = cached_request_body(&request).map(|b| b.0.clone());
        let live = read_body(request.into_body(), usize::MAX).await.unwrap();
        assert_eq!(cached.as_ref(), Some(&live));
        String::from_utf8(live.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_request_body_survives_capture() {
        let state = state();
        let app = Router::new()
            .route("/{*path}", any(echo))
            .layer(from_fn_with_state(state.clone(), capture_request_body))
            // A second capture must not change anything.
            .layer(from_fn_with_state(state, capture_request_body));

        for payload in ["", r#"{"capabilities":{"alwaysMatch":{}}}"#, "plain text ✓"] {
            let response = app
                .clone()
                .oneshot(
                    Request::post("/session")
                        .body(Body::from(payload))
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
            let body = read_body(response.into_body(), usize::MAX).await.unwrap();
            assert_eq!(body, payload.as_bytes());
        }
    }

    #[tokio::test]
    async fn test_oversized_request_is_rejected() {
        let mut config = ProxyConfig::default();
        config.limits.max_request_body_bytes = 4;
        let state = AppState::from_config(&config).unwrap();
        let app = Router::new()
            .route("/{*path}", any(echo))
            .layer(from_fn_with_state(state, capture_request_body));

        let response = app
            .oneshot(
                Request::post("/session/abc/url")
                    .body(Body::from("too long"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_oversized_creation_gets_session_envelope() {
        use crate::pipeline::session_init::initialize_session;
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let mut config = ProxyConfig::default();
        config.limits.max_request_body_bytes = 4;
        let state = AppState::from_config(&config).unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let app = Router::new()
            .route(
                "/{*path}",
                any(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                    async { r#"{"value":{"sessionId":"s1"}}"# }
                }),
            )
            .layer(from_fn_with_state(state.clone(), initialize_session))
            .layer(from_fn_with_state(state.clone(), capture_request_body));

        let response = app
            .oneshot(
                Request::post("/wd/hub/session")
                    .body(Body::from(r#"{"capabilities":{}}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = read_body(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["value"]["error"], "session not created");
        assert!(state.tracker.registry().is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_response_body_is_cached() {
        async fn inspect(request: Request<Body>, next: Next) -> Response {
            let response = next.run(request).await;
            let cached = cached_response_body(&response).expect("response body cached");
            assert_eq!(cached.as_text(), r#"{"value":null}"#);
            response
        }

        let app = Router::new()
            .route("/{*path}", any(|| async { r#"{"value":null}"# }))
            .layer(from_fn_with_state(state(), capture_response_body))
            .layer(axum::middleware::from_fn(inspect));

        let response = app
            .oneshot(Request::get("/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = read_body(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body, r#"{"value":null}"#.as_bytes());
    }
}
