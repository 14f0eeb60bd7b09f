//! Session tracking subsystem.
//!
//! # Data Flow
//! ```text
//! POST /session request body
//!     → tracker.rs begin()     → PendingSession (remote URL + request body)
//! upstream creation response
//!     → tracker.rs complete()  → SessionContext (id + capabilities)
//!     → registry.rs put()      → shared, TTL-bounded map
//!
//! Other subsystems:
//!     → registry.rs lookup(id) → SessionContext | SessionNotFound
//! ```
//!
//! # Design Decisions
//! - Pending and active contexts are distinct types
//! - The registry is the only state shared across exchanges
//! - Expiry is passive: stale entries vanish when read

pub mod context;
pub mod registry;
pub mod tracker;

pub use context::{PendingSession, SessionContext};
pub use registry::{SessionNotFound, SessionRegistry, DEFAULT_SESSION_TTL};
pub use tracker::{SessionError, SessionTracker};
