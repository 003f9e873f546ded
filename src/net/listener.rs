//! TCP listener acquisition.
//!
//! # Responsibilities
//! - Resolve the configured host (names such as `localhost` included)
//! - Bind to the resolved address
//! - Optionally walk upward to the next free port when it is taken
//! - Report the address actually bound

use std::io::ErrorKind;
use std::net::{IpAddr, SocketAddr};

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::{split_bind_address, ListenerConfig};

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("Invalid bind address {0:?}")]
    Address(String),

    #[error("Failed to resolve {host}: {source}")]
    Resolve {
        host: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("No free port in {first}..={last}")]
    Exhausted { first: u16, last: u16 },
}

/// Bind the listening socket described by `config`.
///
/// With `port_search_attempts > 1`, ports `port`, `port + 1`, ... are tried
/// until one is free; only "address in use" moves on to the next port.
pub async fn bind(config: &ListenerConfig) -> Result<TcpListener, ListenerError> {
    let (host, port) = split_bind_address(&config.bind_address)
        .ok_or_else(|| ListenerError::Address(config.bind_address.clone()))?;
    let addr = SocketAddr::new(resolve_host(host, port).await?, port);

    let attempts = config.port_search_attempts.max(1);
    let first = addr.port();
    let mut last = first;

    for offset in 0..attempts {
        let Some(port) = first.checked_add(offset) else {
            break;
        };
        last = port;
        let candidate = SocketAddr::new(addr.ip(), port);

        match TcpListener::bind(candidate).await {
            Ok(listener) => {
                if offset > 0 {
                    tracing::warn!(
                        requested = %addr,
                        bound = %candidate,
                        "Requested port busy, using next free port"
                    );
                }
                return Ok(listener);
            }
            Err(e) if e.kind() == ErrorKind::AddrInUse && attempts > 1 => {
                tracing::debug!(address = %candidate, "Port in use");
            }
            Err(source) => {
                return Err(ListenerError::Bind {
                    addr: candidate,
                    source,
                })
            }
        }
    }

    Err(ListenerError::Exhausted { first, last })
}

/// IP literal as is, otherwise the first address the resolver returns.
async fn resolve_host(host: &str, port: u16) -> Result<IpAddr, ListenerError> {
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(ip);
    }
    let mut resolved = tokio::net::lookup_host((host, port))
        .await
        .map_err(|source| ListenerError::Resolve {
            host: host.to_string(),
            source,
        })?;
    let addr = resolved
        .next()
        .ok_or_else(|| ListenerError::Address(format!("{host}:{port}")))?;
    tracing::debug!(host = %host, resolved = %addr.ip(), "Bind host resolved");
    Ok(addr.ip())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bind_ephemeral() {
        let config = ListenerConfig {
            bind_address: "127.0.0.1:0".into(),
            port_search_attempts: 1,
        };
        let listener = bind(&config).await.unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), 0);
    }

    #[tokio::test]
    async fn test_busy_port_without_search_fails() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let config = ListenerConfig {
            bind_address: taken.local_addr().unwrap().to_string(),
            port_search_attempts: 1,
        };
        assert!(matches!(
            bind(&config).await,
            Err(ListenerError::Bind { .. })
        ));
    }

    #[tokio::test]
    async fn test_busy_port_with_search_moves_on() {
        let taken = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let busy = taken.local_addr().unwrap();
        let config = ListenerConfig {
            bind_address: busy.to_string(),
            port_search_attempts: 20,
        };
        let listener = bind(&config).await.unwrap();
        let bound = listener.local_addr().unwrap().port();
        assert!(bound > busy.port() && bound < busy.port() + 20);
    }

    #[tokio::test]
    async fn test_bind_host_name() {
        let config = ListenerConfig {
            bind_address: "localhost:0".into(),
            port_search_attempts: 1,
        };
        let listener = bind(&config).await.unwrap();
        assert!(listener.local_addr().unwrap().ip().is_loopback());
    }

    #[tokio::test]
    async fn test_invalid_address() {
        let config = ListenerConfig {
            bind_address: "nope".into(),
            port_search_attempts: 1,
        };
        assert!(matches!(bind(&config).await, Err(ListenerError::Address(_))));
    }
}
