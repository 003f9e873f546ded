//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request headers:
//!     → headers.rs (drop transport headers)
//!     → upstream fetcher
//!
//! Upstream response headers:
//!     → headers.rs (drop framing/encoding headers)
//!     → headers.rs (add CORS, force X-Frame-Options: ALLOWALL)
//!     → client
//! ```

pub mod headers;
