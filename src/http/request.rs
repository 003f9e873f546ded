//! Inbound request handling.
//!
//! # Responsibilities
//! - Generate a request ID (UUID v4) for every inbound request
//! - Parse the query string keeping every value of repeated keys
//! - Buffer the inbound body for forwarding
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - No inbound size limit; the proxy relays whatever the client sends
//! - Query values are decoded once here; nothing downstream re-parses the URI

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, HeaderValue, Method, Request};
use tower_http::request_id::{MakeRequestId, RequestId};
use url::form_urlencoded;
use uuid::Uuid;

use crate::error::ProxyError;

/// Header carrying the request ID in both directions.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates UUID v4 request IDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProxyRequestId;

impl MakeRequestId for ProxyRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Read the request ID stamped by the request ID layer.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Query parameters in request order, repeated keys included.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn parse(query: &str) -> Self {
        Self {
            pairs: form_urlencoded::parse(query.as_bytes())
                .map(|(name, value)| (name.into_owned(), value.into_owned()))
                .collect(),
        }
    }

    /// First value for `name`.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Every `(name, value)` pair except those named `skip`, in request order.
    pub fn pairs_except<'a>(&'a self, skip: &'a str) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        self.pairs
            .iter()
            .filter(move |(n, _)| n != skip)
            .map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

/// An inbound request in the shape the proxy pipeline consumes.
#[derive(Debug, Clone)]
pub struct ProxyRequest {
    pub method: Method,
    pub path: String,
    pub query: QueryParams,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

impl ProxyRequest {
    /// Split an axum request and buffer its body.
    pub async fn from_request(request: Request<Body>) -> Result<Self, ProxyError> {
        let (parts, body) = request.into_parts();
        let bytes = axum::body::to_bytes(body, usize::MAX)
            .await
            .map_err(|e| ProxyError::Internal(format!("failed to read request body: {}", e)))?;

        Ok(Self {
            method: parts.method,
            path: parts.uri.path().to_string(),
            query: QueryParams::parse(parts.uri.query().unwrap_or_default()),
            headers: parts.headers,
            body: (!bytes.is_empty()).then_some(bytes),
        })
    }

    /// Body to forward upstream; only methods that carry one send it.
    pub fn forwardable_body(&self) -> Option<Bytes> {
        match self.method {
            Method::POST | Method::PUT | Method::PATCH | Method::DELETE => self.body.clone(),
            _ => None,
        }
    }

    /// `http://host[:port]` this proxy was reached at, from the Host header.
    pub fn proxy_origin(&self) -> Option<String> {
        self.headers
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .filter(|h| !h.is_empty())
            .map(|host| format!("http://{}", host))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_keeps_repeated_values() {
        let q = QueryParams::parse("url=https%3A%2F%2Fx.com%2Fs%3Fq%3Da&page=2&tag=a&page=3");
        assert_eq!(q.first("url"), Some("https://x.com/s?q=a"));
        assert_eq!(q.first("page"), Some("2"));
        assert_eq!(q.first("missing"), None);

        let extras: Vec<_> = q.pairs_except("url").collect();
        assert_eq!(extras, vec![("page", "2"), ("tag", "a"), ("page", "3")]);
    }

    #[test]
    fn test_interleaved_keys_keep_request_order() {
        let q = QueryParams::parse("url=x.com&x=1&y=2&x=3");
        let extras: Vec<_> = q.pairs_except("url").collect();
        assert_eq!(extras, vec![("x", "1"), ("y", "2"), ("x", "3")]);
    }

    #[test]
    fn test_query_plus_and_empty() {
        let q = QueryParams::parse("url=a+b&flag");
        assert_eq!(q.first("url"), Some("a b"));
        assert_eq!(q.first("flag"), Some(""));
        assert_eq!(QueryParams::parse("").first("url"), None);
    }

    #[tokio::test]
    async fn test_from_request() {
        let request = Request::builder()
            .method("POST")
            .uri("/proxy?url=example.com")
            .header("Host", "127.0.0.1:9999")
            .body(Body::from("a=1"))
            .unwrap();

        let inbound = ProxyRequest::from_request(request).await.unwrap();
        assert_eq!(inbound.method, Method::POST);
        assert_eq!(inbound.path, "/proxy");
        assert_eq!(inbound.query.first("url"), Some("example.com"));
        assert_eq!(inbound.forwardable_body().unwrap(), "a=1");
        assert_eq!(inbound.proxy_origin().as_deref(), Some("http://127.0.0.1:9999"));
    }

    #[tokio::test]
    async fn test_get_body_not_forwarded() {
        let request = Request::builder()
            .uri("/proxy?url=example.com")
            .body(Body::from("ignored"))
            .unwrap();
        let inbound = ProxyRequest::from_request(request).await.unwrap();
        assert!(inbound.body.is_some());
        assert!(inbound.forwardable_body().is_none());
        assert!(inbound.proxy_origin().is_none());
    }

    #[test]
    fn test_request_ids_are_unique() {
        let request = Request::builder().body(()).unwrap();
        let mut maker = ProxyRequestId;
        let a = maker.make_request_id(&request).unwrap();
        let b = maker.make_request_id(&request).unwrap();
        assert_ne!(a.header_value(), b.header_value());
    }
}
