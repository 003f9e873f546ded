//! Response handling and transformation.
//!
//! # Responsibilities
//! - Map an `UpstreamResponse` onto the outbound response
//! - Apply the header policy (drop framing headers, add CORS)
//! - Route text/html bodies through the rewriter
//! - Recompute Content-Length for the body actually sent
//!
//! # Design Decisions
//! - Upstream status codes pass through unchanged, error pages included
//! - Text bodies are re-emitted as UTF-8 and labelled accordingly
//! - A rewrite failure falls back to the upstream bytes, never to an error
//! - HEAD responses carry headers only

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::Response;

use crate::rewrite::{RewriteContext, Rewriter};
use crate::security::headers::{
    apply_cors, apply_embedding_policy, filter_headers, is_response_excluded,
};
use crate::upstream::charset::{is_html_content_type, with_utf8_charset};
use crate::upstream::{UpstreamBody, UpstreamResponse};

/// Turns upstream responses into client responses.
#[derive(Debug, Clone)]
pub struct ResponseTranslator {
    rewriter: Rewriter,
    allow_methods: HeaderValue,
}

impl ResponseTranslator {
    pub fn new(rewriter: Rewriter, allow_methods: HeaderValue) -> Self {
        Self {
            rewriter,
            allow_methods,
        }
    }

    /// Build the client response for `upstream`.
    ///
    /// `proxy_origin` is the address the client used to reach this proxy;
    /// references to it are not rewritten.
    pub fn translate(
        &self,
        upstream: UpstreamResponse,
        head_only: bool,
        proxy_origin: Option<&str>,
    ) -> Response {
        let UpstreamResponse {
            status,
            headers: upstream_headers,
            body,
            content_type,
            final_url,
        } = upstream;

        let mut headers = filter_headers(&upstream_headers, is_response_excluded);
        let content_type = content_type.unwrap_or_default();

        // Only bytes relayed as received keep the upstream length.
        let (body, verbatim) = match body {
            UpstreamBody::Binary(bytes) => (bytes, true),
            UpstreamBody::Text { text, raw } => {
                if is_html_content_type(&content_type) && !self.rewriter.is_noop() {
                    let mut ctx = RewriteContext::new(&final_url);
                    if let Some(origin) = proxy_origin {
                        ctx = ctx.with_proxy_origin(origin);
                    }
                    match self.rewriter.rewrite(&text, &ctx) {
                        Ok(document) => {
                            set_utf8_content_type(&mut headers, &content_type);
                            (Bytes::from(document), false)
                        }
                        Err(e) => {
                            tracing::warn!(target = %final_url, error = %e, "Rewrite skipped, relaying original body");
                            (raw, true)
                        }
                    }
                } else {
                    set_utf8_content_type(&mut headers, &content_type);
                    (Bytes::from(text), false)
                }
            }
        };

        apply_embedding_policy(&mut headers, &self.allow_methods);

        if head_only {
            // A rewritten or transcoded body has no length until it is
            // produced, so HEAD only advertises verbatim ones.
            if verbatim {
                if let Some(length) = upstream_headers.get(header::CONTENT_LENGTH) {
                    headers.insert(header::CONTENT_LENGTH, length.clone());
                }
            }
            return build(status, headers, Body::empty());
        }

        if carries_length(status) {
            headers.insert(header::CONTENT_LENGTH, HeaderValue::from(body.len()));
        }
        build(status, headers, Body::from(body))
    }

    /// Response to a CORS preflight: 200, CORS headers, no body.
    pub fn preflight(&self) -> Response {
        let mut headers = HeaderMap::new();
        apply_cors(&mut headers, &self.allow_methods);
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("0"));
        build(StatusCode::OK, headers, Body::empty())
    }
}

fn set_utf8_content_type(headers: &mut HeaderMap, content_type: &str) {
    if content_type.is_empty() {
        return;
    }
    if let Ok(value) = HeaderValue::from_str(&with_utf8_charset(content_type)) {
        headers.insert(header::CONTENT_TYPE, value);
    }
}

fn carries_length(status: StatusCode) -> bool {
    !(status.is_informational()
        || status == StatusCode::NO_CONTENT
        || status == StatusCode::NOT_MODIFIED)
}

fn build(status: StatusCode, headers: HeaderMap, body: Body) -> Response {
    let mut response = Response::new(body);
    *response.status_mut() = status;
    *response.headers_mut() = headers;
    response
}
