//! Session creation tracking.
//!
//! # Responsibilities
//! - Hold the upstream URL every new session is created against
//! - Build a pending context from the creation request
//! - Enrich it from the creation response and store it
//!
//! # Design Decisions
//! - An unparsable upstream URL fails construction, never a request
//! - Capabilities default to an empty map, a missing session id is an error

use std::sync::Arc;
use thiserror::Error;
use url::Url;

use crate::protocol::{self, ProtocolError};
use crate::session::context::{PendingSession, SessionContext};
use crate::session::registry::{SessionNotFound, SessionRegistry};

/// Errors raised while creating or tracking a session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid upstream URL {url:?}: {source}")]
    InvalidRemoteUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid response data: {0}")]
    MalformedResponse(#[from] ProtocolError),

    #[error("invalid response data: {body}")]
    MissingValue { body: String },

    #[error("session id not found in response: {body}")]
    MissingSessionId { body: String },

    #[error("creation request body was not captured (unreadable or too large)")]
    MissingRequestBody,

    #[error("upstream round-trip failed: {0}")]
    Upstream(String),
}

impl SessionError {
    /// Short label for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            SessionError::InvalidRemoteUrl { .. } => "invalid_remote_url",
            SessionError::MalformedResponse(_) | SessionError::MissingValue { .. } => {
                "malformed_response"
            }
            SessionError::MissingSessionId { .. } => "missing_session_id",
            SessionError::MissingRequestBody => "missing_request_body",
            SessionError::Upstream(_) => "upstream",
        }
    }
}

/// Creates, stores and releases session contexts.
#[derive(Debug, Clone)]
pub struct SessionTracker {
    remote_url: Url,
    registry: SessionRegistry,
}

impl SessionTracker {
    pub fn new(remote_url: &str, registry: SessionRegistry) -> Result<Self, SessionError> {
        let remote_url = Url::parse(remote_url).map_err(|source| {
            tracing::error!(url = %remote_url, error = %source, "Invalid upstream URL");
            SessionError::InvalidRemoteUrl {
                url: remote_url.to_string(),
                source,
            }
        })?;
        Ok(Self {
            remote_url,
            registry,
        })
    }

    pub fn remote_url(&self) -> &Url {
        &self.remote_url
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Start tracking a creation request.
    pub fn begin(&self, request_body: &str) -> PendingSession {
        tracing::info!(upstream = %self.remote_url, "Using upstream automation server");
        PendingSession::new(self.remote_url.clone(), request_body)
    }

    /// Enrich a pending session from the creation response and store it.
    pub fn complete(
        &self,
        pending: PendingSession,
        response_body: &str,
    ) -> Result<Arc<SessionContext>, SessionError> {
        let envelope = protocol::parse_envelope(response_body)?;
        let Some(section) = protocol::extract_value_section(&envelope) else {
            return Err(SessionError::MissingValue {
                body: response_body.to_string(),
            });
        };
        let capabilities = protocol::extract_capabilities(section);
        let Some(session_id) = section.session_id.clone() else {
            return Err(SessionError::MissingSessionId {
                body: response_body.to_string(),
            });
        };

        let context = self.registry.put(pending.activate(session_id, capabilities));
        tracing::info!(
            session_id = %context.session_id(),
            browser = context.browser_name().unwrap_or("unknown"),
            "Session context stored"
        );
        Ok(context)
    }

    /// Forget a session that the client deleted.
    pub fn release(&self, session_id: &str) -> Option<Arc<SessionContext>> {
        let released = self.registry.remove(session_id);
        if released.is_some() {
            tracing::info!(session_id = %session_id, "Session context released");
        }
        released
    }

    pub fn lookup(&self, session_id: &str) -> Result<Arc<SessionContext>, SessionNotFound> {
        self.registry.lookup(session_id)
    }
}
