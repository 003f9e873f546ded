//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems emit tracing events with structured fields
//! (request_id, method, uri, target, status, error)
//!     → logging.rs (EnvFilter + fmt layer)
//!     → stdout
//!
//! tower-http TraceLayer adds one span per inbound request.
//! ```

pub mod logging;
