//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection (axum::serve, one task per connection)
//!     → server.rs (middleware, route dispatch)
//!         OPTIONS *        → preflight
//!         GET|HEAD /       → info.rs
//!         * /proxy         → request.rs (query, headers, body)
//!                          → target::normalize
//!                          → upstream::Fetcher
//!                          → response.rs (header policy, rewrite, length)
//!         anything else    → 404
//!     → Send to client
//! ```

pub mod info;
pub mod request;
pub mod response;
pub mod server;

pub use request::{ProxyRequest, ProxyRequestId, QueryParams, X_REQUEST_ID};
pub use response::ResponseTranslator;
pub use server::{AppState, HttpServer};
