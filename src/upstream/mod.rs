//! Upstream fetch subsystem.
//!
//! # Data Flow
//! ```text
//! TargetSpec + inbound method/headers/body
//!     → fetcher.rs (filter headers, send via reqwest, follow redirects)
//!     → reqwest transparently undoes gzip/deflate/br
//!     → charset.rs (decode text bodies: fallbacks → declared → lossy UTF-8)
//!     → UpstreamResponse
//! ```

pub mod charset;
pub mod fetcher;

pub use charset::CharsetFallbacks;
pub use fetcher::{FetchError, Fetcher, UpstreamBody, UpstreamResponse};
