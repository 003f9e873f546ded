//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! ListenerConfig
//!     → listener.rs (bind, optional free-port search)
//!     → TcpListener handed to HttpServer::run
//! ```
//!
//! The listening socket is the only process-wide resource; it is acquired
//! once at startup and dropped when the server returns.

pub mod listener;

pub use listener::{bind, ListenerError};
