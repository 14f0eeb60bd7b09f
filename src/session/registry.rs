//! Session context registry with passive expiry.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;

use crate::observability::metrics;
use crate::session::context::SessionContext;

/// Default time-to-live of a registry entry (8 hours).
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(8 * 60 * 60);

/// Returned when a session id is unknown or its entry has expired.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("session context not found: {session_id}")]
pub struct SessionNotFound {
    pub session_id: String,
}

#[derive(Debug)]
struct Entry {
    context: Arc<SessionContext>,
    written_at: Instant,
}

impl Entry {
    fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.written_at) > ttl
    }
}

/// A thread-safe map of session id to [`SessionContext`].
///
/// Cloning is cheap and every clone sees the same entries.
#[derive(Debug, Clone)]
pub struct SessionRegistry {
    inner: Arc<DashMap<String, Entry>>,
    ttl: Duration,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_TTL)
    }
}

impl SessionRegistry {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Insert or overwrite the entry for the context's session id.
    ///
    /// Resets the entry's expiry clock.
    pub fn put(&self, context: SessionContext) -> Arc<SessionContext> {
        let context = Arc::new(context);
        let previous = self.inner.insert(
            context.session_id().to_string(),
            Entry {
                context: context.clone(),
                written_at: Instant::now(),
            },
        );
        if previous.is_some() {
            tracing::debug!(session_id = %context.session_id(), "Overwrote existing session context");
        }
        metrics::record_tracked_sessions(self.inner.len());
        context
    }

    /// Get a live context. Expired entries are dropped on the way.
    pub fn get(&self, session_id: &str) -> Option<Arc<SessionContext>> {
        let now = Instant::now();
        let expired = match self.inner.get(session_id) {
            Some(entry) if !entry.is_expired(now, self.ttl) => {
                return Some(entry.context.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            // Re-check under the write lock: a concurrent put may have refreshed it.
            let ttl = self.ttl;
            self.inner
                .remove_if(session_id, |_, entry| entry.is_expired(now, ttl));
            tracing::debug!(session_id = %session_id, "Session context expired");
            metrics::record_tracked_sessions(self.inner.len());
        }
        None
    }

    /// Like [`get`](Self::get), but reports a miss as [`SessionNotFound`].
    pub fn lookup(&self, session_id: &str) -> Result<Arc<SessionContext>, SessionNotFound> {
        self.get(session_id).ok_or_else(|| SessionNotFound {
            session_id: session_id.to_string(),
        })
    }

    /// Remove an entry regardless of its age.
    pub fn remove(&self, session_id: &str) -> Option<Arc<SessionContext>> {
        let removed = self.inner.remove(session_id).map(|(_, entry)| entry.context);
        metrics::record_tracked_sessions(self.inner.len());
        removed
    }

    /// Number of stored entries, including expired ones not yet read.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// All live contexts. Expired entries are skipped, not removed.
    pub fn snapshot(&self) -> Vec<Arc<SessionContext>> {
        let now = Instant::now();
        self.inner
            .iter()
            .filter(|r| !r.value().is_expired(now, self.ttl))
            .map(|r| r.value().context.clone())
            .collect()
    }
}
