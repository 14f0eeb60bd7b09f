//! Command classification from the request line.
//!
//! # Design Decisions
//! - Matching is by path suffix so prefixed hubs (`/wd/hub/session`) work
//! - One trailing slash is ignored
//! - Path segments are compared case-sensitively

use axum::http::Method;

const SESSION_SEGMENT: &str = "session";

/// What a request means to the session pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `POST .../session`
    NewSession,
    /// `DELETE .../session/{id}`
    DeleteSession { session_id: String },
    /// Any other command addressed to `.../session/{id}/...`.
    SessionCommand { session_id: String },
    Other,
}

impl Command {
    pub fn classify(method: &Method, path: &str) -> Self {
        let trimmed = path.strip_suffix('/').unwrap_or(path);
        let segments: Vec<&str> = trimmed.split('/').collect();

        if *method == Method::POST && segments.last() == Some(&SESSION_SEGMENT) {
            return Command::NewSession;
        }

        // The id is the segment right after the last "session" segment.
        let Some(idx) = segments.iter().rposition(|s| *s == SESSION_SEGMENT) else {
            return Command::Other;
        };
        let session_id = match segments.get(idx + 1) {
            Some(id) if !id.is_empty() => (*id).to_string(),
            _ => return Command::Other,
        };

        if *method == Method::DELETE && idx + 2 == segments.len() {
            Command::DeleteSession { session_id }
        } else {
            Command::SessionCommand { session_id }
        }
    }

    pub fn is_new_session(&self) -> bool {
        matches!(self, Command::NewSession)
    }

    /// Session id carried in the path, if any.
    pub fn session_id(&self) -> Option<&str> {
        match self {
            Command::DeleteSession { session_id } | Command::SessionCommand { session_id } => {
                Some(session_id)
            }
            _ => None,
        }
    }
}
