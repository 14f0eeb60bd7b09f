//! Command logging.

use axum::{body::Body, http::Request, middleware::Next, response::Response};

use crate::pipeline::exchange::cached_request_body;
use crate::protocol::Command;

/// Logged in place of a body that was never captured.
pub const NO_BODY: &str = "<no body>";

pub async fn log_command(request: Request<Body>, next: Next) -> Response {
    record(&request);
    next.run(request).await
}

fn record(request: &Request<Body>) {
    let command = Command::classify(request.method(), request.uri().path());
    let body = cached_request_body(request).map(|b| b.as_text());
    tracing::info!(
        path = %request.uri().path(),
        method = %request.method(),
        session_id = command.session_id().unwrap_or("-"),
        body = %body.as_deref().unwrap_or(NO_BODY),
        "Command intercepted"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProxyConfig;
    use crate::http::server::AppState;
    use crate::observability::logging::capture::capture_logs;
    use crate::pipeline::capture::capture_request_body;
    use axum::{
        middleware::{from_fn, from_fn_with_state},
        routing::any,
        Router,
    };
    use tower::ServiceExt;

    const LOCATOR: &str = r##"{"using":"css selector","value":"#login"}"##;

    fn app(with_capture: bool) -> Router {
        let app = Router::new()
            .route("/{*path}", any(|| async { "{}" }))
            .layer(from_fn(log_command));
        if with_capture {
            let state = AppState::from_config(&ProxyConfig::default()).unwrap();
            app.layer(from_fn_with_state(state, capture_request_body))
        } else {
            app
        }
    }

    #[tokio::test]
    async fn test_logs_path_method_and_body() {
        let (logs, _guard) = capture_logs();

        let response = app(true)
            .oneshot(
                Request::post("/session/abc123/element")
                    .body(Body::from(LOCATOR))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(response.status().is_success());

        let logs = logs.contents();
        let line = logs
            .lines()
            .find(|l| l.contains("Command intercepted"))
            .expect("command line logged");
        assert!(line.contains("path=/session/abc123/element"), "{line}");
        assert!(line.contains("method=POST"), "{line}");
        assert!(line.contains(r#"session_id="abc123""#), "{line}");
        assert!(line.contains(LOCATOR), "{line}");
    }

    #[tokio::test]
    async fn test_missing_snapshot_logs_marker() {
        let (logs, _guard) = capture_logs();

        app(false)
            .oneshot(Request::get("/status").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let logs = logs.contents();
        let line = logs
            .lines()
            .find(|l| l.contains("Command intercepted"))
            .expect("command line logged");
        assert!(line.contains("method=GET"), "{line}");
        assert!(line.contains(r#"session_id="-""#), "{line}");
        assert!(line.contains(NO_BODY), "{line}");
    }
}
