//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults / TOML file
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → CLI overrides for host/port (main.rs)
//!     → handed to HttpServer once at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no runtime reload
//! - All fields have defaults so the proxy runs with no file at all
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{ListenerConfig, ObservabilityConfig, ProxyConfig, RewriteConfig, UpstreamConfig};
pub use validation::{split_bind_address, validate_config, ValidationError};
