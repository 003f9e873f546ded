//! Framing proxy library.
//!
//! Fetches arbitrary web pages on behalf of a browser, strips the headers
//! that stop them from loading inside an iframe, rewrites relative links to
//! absolute ones and injects a navigation interceptor that reports clicks
//! and form submissions to the embedding page.

pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod rewrite;
pub mod security;
pub mod target;
pub mod upstream;

pub use config::schema::ProxyConfig;
pub use error::ProxyError;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
