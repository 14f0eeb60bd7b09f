//! Session context model.

use serde::Serialize;
use url::Url;

use crate::protocol::Capabilities;

/// A session whose creation request has been seen but not yet answered.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingSession {
    remote_url: Url,
    create_session_request_body: String,
}

impl PendingSession {
    pub fn new(remote_url: Url, create_session_request_body: impl Into<String>) -> Self {
        Self {
            remote_url,
            create_session_request_body: create_session_request_body.into(),
        }
    }

    pub fn remote_url(&self) -> &Url {
        &self.remote_url
    }

    pub fn create_session_request_body(&self) -> &str {
        &self.create_session_request_body
    }

    /// Turn the pending session into an active one.
    ///
    /// Id and capabilities are always set together.
    pub fn activate(self, session_id: impl Into<String>, capabilities: Capabilities) -> SessionContext {
        SessionContext {
            session_id: session_id.into(),
            capabilities,
            remote_url: self.remote_url,
            create_session_request_body: self.create_session_request_body,
        }
    }
}

/// A live automation session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionContext {
    session_id: String,
    capabilities: Capabilities,
    remote_url: Url,
    create_session_request_body: String,
}

impl SessionContext {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    pub fn remote_url(&self) -> &Url {
        &self.remote_url
    }

    pub fn create_session_request_body(&self) -> &str {
        &self.create_session_request_body
    }

    /// Convenience accessor for the negotiated `browserName`.
    pub fn browser_name(&self) -> Option<&str> {
        self.capabilities.get("browserName").and_then(|v| v.as_str())
    }
}
