//! Request-level errors and their HTTP mapping.

use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::target::ResolveError;
use crate::upstream::FetchError;

/// Every way a proxied request can fail before an upstream response exists.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Missing URL parameter")]
    MissingUrl,

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] ResolveError),

    #[error("Method {0} is not supported by this proxy")]
    MethodNotAllowed(Method),

    #[error("Upstream unreachable: {0}")]
    UpstreamUnreachable(#[source] reqwest::Error),

    #[error("Upstream timed out after {0} seconds")]
    UpstreamTimeout(u64),

    #[error("Proxy Error: {0}")]
    Internal(String),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::MissingUrl | ProxyError::InvalidUrl(_) => StatusCode::BAD_REQUEST,
            ProxyError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ProxyError::UpstreamUnreachable(_) => StatusCode::BAD_GATEWAY,
            ProxyError::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ProxyError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<FetchError> for ProxyError {
    fn from(error: FetchError) -> Self {
        match error {
            FetchError::Timeout(after) => ProxyError::UpstreamTimeout(after.as_secs()),
            FetchError::Unreachable(e) => ProxyError::UpstreamUnreachable(e),
            FetchError::Client(e) => ProxyError::Internal(e.to_string()),
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut response = (status, self.to_string()).into_response();
        response.headers_mut().insert(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        );
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ProxyError::MissingUrl.status(), StatusCode::BAD_REQUEST);
        let invalid = crate::target::normalize("https://").unwrap_err();
        assert_eq!(ProxyError::from(invalid).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ProxyError::MethodNotAllowed(Method::PUT).status(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(
            ProxyError::from(FetchError::Timeout(Duration::from_secs(3))).status(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            ProxyError::Internal("boom".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_response_carries_message_and_cors() {
        let response = ProxyError::MissingUrl.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "*"
        );
    }
}
