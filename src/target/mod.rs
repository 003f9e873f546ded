//! Target URL subsystem.
//!
//! # Data Flow
//! ```text
//! `url` query parameter (raw string)
//!     → resolver.rs normalize() (scheme defaulting, validation)
//!     → TargetSpec (absolute http/https URL with a host)
//!
//! During HTML rewriting:
//!     attribute value + TargetSpec base
//!     → resolver.rs resolve_relative()
//!     → absolute reference (or the value unchanged)
//! ```
//!
//! # Design Decisions
//! - A `TargetSpec` is only built through checked constructors, so every holder
//!   of one knows the scheme is http(s) and the host is non-empty
//! - Relative resolution delegates merge rules to the `url` crate

pub mod resolver;

pub use resolver::{normalize, resolve_relative, ResolveError, TargetSpec};
