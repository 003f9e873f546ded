//! Outbound HTTP client.
//!
//! # Responsibilities
//! - Build one `reqwest::Client` per server from `UpstreamConfig`
//! - Forward method, filtered headers and body to the target
//! - Present browser-like identification headers
//! - Decode text bodies, leave binary bodies opaque
//!
//! # Design Decisions
//! - Certificate verification is a per-client option, never process-wide
//! - Compression is negotiated and undone by the client; callers only ever
//!   see identity-encoded bytes
//! - Non-2xx upstream statuses are ordinary responses, not errors
//! - Timeouts surface as their own error so they map to 504

use std::time::Duration;

use axum::body::Bytes;
use axum::http::{header, HeaderMap, HeaderValue, Method, StatusCode};
use reqwest::redirect::Policy;
use thiserror::Error;

use crate::config::UpstreamConfig;
use crate::security::headers::{filter_headers, is_request_excluded};
use crate::target::TargetSpec;
use crate::upstream::charset::{charset_param, is_text_content_type, CharsetFallbacks};

/// Errors raised while talking to the upstream.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The upstream did not answer within the configured deadline.
    #[error("upstream timed out after {0:?}")]
    Timeout(Duration),

    /// Connection refused, DNS failure, TLS failure, broken body, ...
    #[error("upstream unreachable: {0}")]
    Unreachable(#[source] reqwest::Error),

    /// The outbound client could not be constructed.
    #[error("failed to build upstream client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Upstream body after decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamBody {
    /// Text-like body decoded to a string.
    Text {
        text: String,
        /// Original bytes, kept so a failed rewrite can relay them untouched.
        raw: Bytes,
    },
    /// Anything else, passed through as opaque bytes.
    Binary(Bytes),
}

/// Response received from the target.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: UpstreamBody,
    pub content_type: Option<String>,
    /// URL that produced the response after redirects.
    pub final_url: TargetSpec,
}

/// Performs upstream requests on behalf of the proxy.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    timeout: Duration,
    charsets: CharsetFallbacks,
}

impl Fetcher {
    /// Build a fetcher from upstream policy.
    pub fn new(config: &UpstreamConfig) -> Result<Self, FetchError> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let redirect = if config.max_redirects == 0 {
            Policy::none()
        } else {
            Policy::limited(config.max_redirects)
        };

        let mut default_headers = HeaderMap::new();
        if let Ok(v) = HeaderValue::from_str(&config.accept) {
            default_headers.insert(header::ACCEPT, v);
        }
        if let Ok(v) = HeaderValue::from_str(&config.accept_language) {
            default_headers.insert(header::ACCEPT_LANGUAGE, v);
        }

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(default_headers)
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .redirect(redirect)
            .danger_accept_invalid_certs(!config.verify_certificates)
            .no_proxy()
            .build()
            .map_err(FetchError::Client)?;

        if !config.verify_certificates {
            tracing::warn!("Upstream certificate verification disabled");
        }

        Ok(Self {
            client,
            timeout,
            charsets: CharsetFallbacks::from_labels(&config.encoding_fallbacks),
        })
    }

    /// Fetch `target` with the inbound method, headers and body.
    pub async fn fetch(
        &self,
        target: &TargetSpec,
        method: Method,
        inbound_headers: &HeaderMap,
        body: Option<Bytes>,
    ) -> Result<UpstreamResponse, FetchError> {
        let mut headers = filter_headers(inbound_headers, is_request_excluded);
        // Identification headers always come from the client defaults.
        headers.remove(header::USER_AGENT);
        headers.remove(header::ACCEPT);
        headers.remove(header::ACCEPT_LANGUAGE);

        let mut request = self
            .client
            .request(method.clone(), target.as_url().clone())
            .headers(headers);
        if let Some(body) = body.filter(|b| !b.is_empty()) {
            request = request.body(body);
        }

        let response = request.send().await.map_err(|e| self.classify(e))?;

        let status = response.status();
        let headers = response.headers().clone();
        let final_url = TargetSpec::from_url(response.url().clone())
            .unwrap_or_else(|_| target.clone());
        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let raw = response.bytes().await.map_err(|e| self.classify(e))?;

        tracing::debug!(
            target = %target,
            final_url = %final_url,
            status = %status,
            bytes = raw.len(),
            "Upstream responded"
        );

        let body = match content_type.as_deref() {
            Some(ct) if is_text_content_type(ct) => {
                let decoded = self.charsets.decode(&raw, charset_param(ct));
                if decoded.charset.is_none() {
                    tracing::debug!(target = %target, "Body decoded lossily as UTF-8");
                }
                UpstreamBody::Text {
                    text: decoded.text,
                    raw,
                }
            }
            _ => UpstreamBody::Binary(raw),
        };

        Ok(UpstreamResponse {
            status,
            headers,
            body,
            content_type,
            final_url,
        })
    }

    fn classify(&self, error: reqwest::Error) -> FetchError {
        if error.is_timeout() {
            FetchError::Timeout(self.timeout)
        } else {
            FetchError::Unreachable(error)
        }
    }
}
