//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing)
//!     → pipeline (capture, session tracking, logging, classification)
//!     → forward.rs (upstream round-trip)
//!     → Send to client
//! ```

pub mod forward;
pub mod server;

pub use forward::{Upstream, UpstreamError};
pub use server::{AppState, HttpServer, ServerError};
