//! Header pass-through policy.
//!
//! # Responsibilities
//! - Decide which inbound headers reach the upstream
//! - Decide which upstream headers reach the client
//! - Stamp CORS and framing headers on every proxied response
//!
//! # Design Decisions
//! - Exclusion lists are compile-time constants, matched case-insensitively
//! - Framing is always permitted: upstream X-Frame-Options and CSP never pass
//! - Accept-Encoding is owned by the upstream client so bodies arrive decoded

use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method};

/// Inbound headers recomputed by the transport layer instead of forwarded.
pub const REQUEST_EXCLUDED: &[&str] = &[
    "host",
    "connection",
    "content-length",
    "transfer-encoding",
    "accept-encoding",
];

/// Upstream headers that are never relayed to the client.
pub const RESPONSE_EXCLUDED: &[&str] = &[
    "x-frame-options",
    "content-security-policy",
    "content-encoding",
    "transfer-encoding",
    "connection",
    "content-length",
];

/// Value forced onto `X-Frame-Options` so embedding is never blocked.
pub const FRAME_OPTIONS_VALUE: &str = "ALLOWALL";

pub fn is_request_excluded(name: &HeaderName) -> bool {
    REQUEST_EXCLUDED
        .iter()
        .any(|h| name.as_str().eq_ignore_ascii_case(h))
}

pub fn is_response_excluded(name: &HeaderName) -> bool {
    RESPONSE_EXCLUDED
        .iter()
        .any(|h| name.as_str().eq_ignore_ascii_case(h))
}

/// Copy `source` into a new map, dropping everything `excluded` rejects.
/// Repeated headers (e.g. `Set-Cookie`) keep every value.
pub fn filter_headers(source: &HeaderMap, excluded: fn(&HeaderName) -> bool) -> HeaderMap {
    let mut out = HeaderMap::with_capacity(source.len());
    for (name, value) in source.iter() {
        if !excluded(name) {
            out.append(name.clone(), value.clone());
        }
    }
    out
}

/// Comma-joined method list for `Access-Control-Allow-Methods`.
pub fn allow_methods_value(methods: &[Method]) -> String {
    let mut names: Vec<&str> = methods.iter().map(Method::as_str).collect();
    if !names.contains(&"OPTIONS") {
        names.push("OPTIONS");
    }
    names.join(", ")
}

/// Insert the CORS headers, replacing any the upstream sent.
pub fn apply_cors(headers: &mut HeaderMap, allow_methods: &HeaderValue) {
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(header::ACCESS_CONTROL_ALLOW_METHODS, allow_methods.clone());
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("*"),
    );
}

/// CORS headers plus a permissive `X-Frame-Options`.
pub fn apply_embedding_policy(headers: &mut HeaderMap, allow_methods: &HeaderValue) {
    apply_cors(headers, allow_methods);
    headers.insert(
        header::X_FRAME_OPTIONS,
        HeaderValue::from_static(FRAME_OPTIONS_VALUE),
    );
}
