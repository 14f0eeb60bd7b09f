//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the forwarding handler
//! - Wire up the interception pipeline
//! - Wire up middleware (request ID, tracing)
//! - Serve until the shutdown signal, optionally with the admin API

use axum::{routing::any, Router};
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::admin::{self, AdminState};
use crate::config::{LimitsConfig, ProxyConfig};
use crate::http::forward::{forward, Upstream};
use crate::pipeline;
use crate::session::{SessionError, SessionRegistry, SessionTracker};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Application state injected into the handler and every pipeline stage.
#[derive(Clone)]
pub struct AppState {
    pub tracker: SessionTracker,
    pub upstream: Arc<Upstream>,
    pub limits: LimitsConfig,
}

impl AppState {
    /// Fails when the upstream URL does not parse.
    pub fn from_config(config: &ProxyConfig) -> Result<Self, SessionError> {
        let registry = SessionRegistry::new(config.session.ttl());
        let tracker = SessionTracker::new(&config.upstream.url, registry)?;
        let upstream = Arc::new(Upstream::new(
            tracker.remote_url().clone(),
            &config.upstream,
        ));
        Ok(Self {
            tracker,
            upstream,
            limits: config.limits.clone(),
        })
    }
}

/// HTTP server for the WebDriver proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Result<Self, ServerError> {
        let state = AppState::from_config(&config)?;
        let router = Self::build_router(state.clone());
        Ok(Self {
            router,
            config,
            state,
        })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        let router = Router::new()
            .route("/{*path}", any(forward))
            .route("/", any(forward))
            .with_state(state.clone());

        pipeline::apply(router, state)
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The router, for driving the proxy without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Handle to the session registry shared by every exchange.
    pub fn sessions(&self) -> SessionRegistry {
        self.state.tracker.registry().clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.state.upstream.base(),
            session_ttl_secs = self.config.session.ttl_secs,
            "HTTP server starting"
        );

        if self.config.admin.enabled {
            let admin_listener = TcpListener::bind(&self.config.admin.bind_address).await?;
            let admin_addr = admin_listener.local_addr()?;
            let app = admin::router(AdminState::new(
                self.state.tracker.clone(),
                &self.config.admin.api_key,
            ));
            let mut admin_shutdown = shutdown.resubscribe();
            tokio::spawn(async move {
                tracing::info!(address = %admin_addr, "Admin API listening");
                let served = axum::serve(admin_listener, app)
                    .with_graceful_shutdown(async move {
                        let _ = admin_shutdown.recv().await;
                    })
                    .await;
                if let Err(e) = served {
                    tracing::error!(error = %e, "Admin API stopped with error");
                }
            });
        }

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_upstream_fails_construction() {
        let mut config = ProxyConfig::default();
        config.upstream.url = "not a url".into();
        assert!(matches!(
            HttpServer::new(config),
            Err(ServerError::Session(SessionError::InvalidRemoteUrl { .. }))
        ));
    }

    #[test]
    fn test_registry_uses_configured_ttl() {
        let mut config = ProxyConfig::default();
        config.session.ttl_secs = 42;
        let server = HttpServer::new(config).unwrap();
        assert_eq!(server.sessions().ttl().as_secs(), 42);
    }
}
