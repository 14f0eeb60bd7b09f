//! Upstream forwarding.
//!
//! # Responsibilities
//! - Rewrite the request URI onto the upstream base URL
//! - Forward method, headers and body unchanged
//! - Bound the round-trip with a connect timeout and one request deadline
//! - Map transport failures to 502/504 responses marked [`UpstreamFailure`]
//!
//! # Design Decisions
//! - No retries: session creation is not idempotent
//! - Requests always go upstream as HTTP/1.1

use axum::{
    body::Body,
    extract::State,
    http::{uri::InvalidUri, Request, StatusCode, Uri, Version},
    response::{IntoResponse, Response},
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use std::time::{Duration, Instant};
use thiserror::Error;
use url::Url;

use crate::config::UpstreamConfig;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::pipeline::exchange::{UpstreamDeadline, UpstreamFailure};

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("invalid upstream URI: {0}")]
    InvalidUri(#[from] InvalidUri),

    #[error("upstream request failed: {0}")]
    Request(#[from] hyper_util::client::legacy::Error),

    #[error("upstream did not respond within {0:?}")]
    Timeout(Duration),
}

impl UpstreamError {
    pub fn status(&self) -> StatusCode {
        match self {
            UpstreamError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            UpstreamError::InvalidUri(_) | UpstreamError::Request(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

/// The remote automation server and the client used to reach it.
#[derive(Clone)]
pub struct Upstream {
    client: Client<HttpConnector, Body>,
    base: Url,
    timeout: Duration,
}

impl Upstream {
    pub fn new(base: Url, config: &UpstreamConfig) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(config.connect_timeout()));
        connector.set_nodelay(true);

        let client = Client::builder(TokioExecutor::new()).build(connector);
        Self {
            client,
            base,
            timeout: config.request_timeout(),
        }
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Upstream origin + upstream base path + inbound path and query.
    pub fn target_uri(&self, uri: &Uri) -> Result<Uri, UpstreamError> {
        let path_and_query = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
        let base_path = self.base.path().trim_end_matches('/');
        let target = format!(
            "{}{}{}",
            self.base.origin().ascii_serialization(),
            base_path,
            path_and_query
        );
        Ok(target.parse()?)
    }

    /// Send a request upstream and wait for the response head.
    ///
    /// The returned response carries the [`UpstreamDeadline`] its body must
    /// also arrive by.
    pub async fn send(&self, request: Request<Body>) -> Result<Response, UpstreamError> {
        let deadline = tokio::time::Instant::now() + self.timeout;
        let (mut parts, body) = request.into_parts();
        parts.uri = self.target_uri(&parts.uri)?;
        parts.version = Version::HTTP_11;

        let response = tokio::time::timeout_at(
            deadline,
            self.client.request(Request::from_parts(parts, body)),
        )
        .await
        .map_err(|_| UpstreamError::Timeout(self.timeout))??;

        let (mut parts, body) = response.into_parts();
        parts.extensions.insert(UpstreamDeadline(deadline));
        Ok(Response::from_parts(parts, Body::new(body)))
    }
}

/// A proxy-generated response for a failed upstream round-trip.
pub fn failure_response(status: StatusCode, message: String) -> Response {
    let mut response = (status, message.clone()).into_response();
    response
        .extensions_mut()
        .insert(UpstreamFailure::new(message));
    response
}

/// Terminal handler: forward every request upstream.
pub async fn forward(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    tracing::debug!(method = %method, path = %path, "Forwarding request upstream");

    match state.upstream.send(request).await {
        Ok(response) => {
            metrics::record_request(&method, response.status().as_u16(), start);
            response
        }
        Err(e) => {
            let status = e.status();
            tracing::error!(method = %method, path = %path, error = %e, "Upstream error");
            metrics::record_request(&method, status.as_u16(), start);
            failure_response(status, e.to_string())
        }
    }
}
