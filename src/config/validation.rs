//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts, port search)
//! - Check method names and charset labels are usable
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use axum::http::Method;
use encoding_rs::Encoding;
use thiserror::Error;

use crate::config::schema::ProxyConfig;

const MAX_TIMEOUT_SECS: u64 = 300;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("listener.bind_address {0:?} is not a host:port address")]
    BindAddress(String),

    #[error("listener.port_search_attempts must be at least 1")]
    PortSearchAttempts,

    #[error("{field} must be between 1 and 300 seconds, got {value}")]
    Timeout { field: &'static str, value: u64 },

    #[error("upstream.supported_methods is empty")]
    NoMethods,

    #[error("upstream.supported_methods contains unsupported method {0:?}")]
    Method(String),

    #[error("upstream.encoding_fallbacks contains unknown charset {0:?}")]
    Charset(String),

    #[error("rewrite.max_document_bytes must be greater than 0")]
    DocumentLimit,
}

/// Check a configuration for semantic errors.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if split_bind_address(&config.listener.bind_address).is_none() {
        errors.push(ValidationError::BindAddress(
            config.listener.bind_address.clone(),
        ));
    }
    if config.listener.port_search_attempts == 0 {
        errors.push(ValidationError::PortSearchAttempts);
    }

    for (field, value) in [
        ("upstream.timeout_secs", config.upstream.timeout_secs),
        ("upstream.connect_timeout_secs", config.upstream.connect_timeout_secs),
    ] {
        if value == 0 || value > MAX_TIMEOUT_SECS {
            errors.push(ValidationError::Timeout { field, value });
        }
    }

    if config.upstream.supported_methods.is_empty() {
        errors.push(ValidationError::NoMethods);
    }
    for name in &config.upstream.supported_methods {
        if parse_method(name).is_none() {
            errors.push(ValidationError::Method(name.clone()));
        }
    }

    for label in &config.upstream.encoding_fallbacks {
        if Encoding::for_label(label.trim().as_bytes()).is_none() {
            errors.push(ValidationError::Charset(label.clone()));
        }
    }

    if config.rewrite.max_document_bytes == 0 {
        errors.push(ValidationError::DocumentLimit);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Split a `host:port` bind address. The host may be a name, an IPv4
/// address or a bracketed IPv6 address; brackets are stripped.
pub fn split_bind_address(address: &str) -> Option<(&str, u16)> {
    let (host, port) = address.trim().rsplit_once(':')?;
    let port = port.parse().ok()?;
    let host = match host.strip_prefix('[') {
        Some(inner) => inner.strip_suffix(']')?,
        None if host.contains(':') => return None,
        None => host,
    };
    let usable = !host.is_empty() && !host.contains(|c: char| c.is_whitespace() || c == '/');
    usable.then_some((host, port))
}

/// Parse a configured method name, accepting only proxyable methods.
pub fn parse_method(name: &str) -> Option<Method> {
    let method = Method::from_bytes(name.trim().to_ascii_uppercase().as_bytes()).ok()?;
    let proxyable = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::PATCH,
        Method::HEAD,
    ];
    proxyable.contains(&method).then_some(method)
}
