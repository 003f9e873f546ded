//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the framing proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address, port search).
    pub listener: ListenerConfig,

    /// Outbound request policy.
    pub upstream: UpstreamConfig,

    /// HTML rewriting settings.
    pub rewrite: RewriteConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:9999").
    pub bind_address: String,

    /// How many consecutive ports to try when the configured one is taken.
    /// 1 disables the search.
    pub port_search_attempts: u16,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:9999".to_string(),
            port_search_attempts: 1,
        }
    }
}

/// Upstream fetch policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Total time allowed for one upstream exchange, in seconds.
    pub timeout_secs: u64,

    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Verify upstream TLS certificates.
    pub verify_certificates: bool,

    /// Methods accepted on `/proxy`.
    pub supported_methods: Vec<String>,

    /// Charsets tried, in order, when decoding text bodies.
    pub encoding_fallbacks: Vec<String>,

    /// Maximum redirects followed per fetch (0 disables following).
    pub max_redirects: usize,

    pub user_agent: String,
    pub accept: String,
    pub accept_language: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            connect_timeout_secs: 10,
            verify_certificates: true,
            supported_methods: ["GET", "POST", "PUT", "DELETE", "PATCH", "HEAD"]
                .iter()
                .map(|m| m.to_string())
                .collect(),
            encoding_fallbacks: ["utf-8", "gbk", "gb2312", "big5"]
                .iter()
                .map(|e| e.to_string())
                .collect(),
            max_redirects: 10,
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
            accept: "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8"
                .to_string(),
            accept_language: "zh-CN,zh;q=0.9,en;q=0.8".to_string(),
        }
    }
}

/// HTML rewriting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RewriteConfig {
    /// Rewrite relative href/src/action references to absolute URLs.
    pub enabled: bool,

    /// Inject the navigation interception script.
    pub inject_script: bool,

    /// Documents larger than this are relayed untouched.
    pub max_document_bytes: usize,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            inject_script: true,
            max_document_bytes: 8 * 1024 * 1024, // 8MB
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
