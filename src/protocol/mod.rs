//! Automation protocol subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request line
//!     → command.rs (method + path → Command)
//!
//! Request/response body text
//!     → envelope.rs (JSON → Envelope { value: Option<ValueSection> })
//!     → typed optionals consumed by session tracking and error classification
//! ```
//!
//! # Design Decisions
//! - The `value` section is validated once at the parse boundary
//! - Non-object `value` payloads (null, arrays, scalars) carry no section
//! - Stateless: every helper is a free function over borrowed text

pub mod command;
pub mod envelope;

pub use command::Command;
pub use envelope::{
    extract_capabilities, extract_value_section, has_error, parse_envelope, Capabilities,
    Envelope, ErrorEnvelope, ProtocolError, ValueSection,
};
