//! HTTP server setup and request dispatch.
//!
//! # Responsibilities
//! - Create the Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, panic recovery, timeout)
//! - Dispatch `/proxy` requests through resolve → fetch → translate
//! - Answer CORS preflights, the info page and unknown paths
//! - Serve until the shutdown signal fires

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderValue, Method, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::validation::parse_method;
use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::http::info::info_page;
use crate::http::request::{request_id, ProxyRequest, ProxyRequestId};
use crate::http::response::ResponseTranslator;
use crate::rewrite::Rewriter;
use crate::security::headers::allow_methods_value;
use crate::target::normalize;
use crate::upstream::{FetchError, Fetcher};

/// Extra time the outer timeout grants beyond the upstream deadline.
const TIMEOUT_GRACE_SECS: u64 = 5;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub fetcher: Arc<Fetcher>,
    pub translator: Arc<ResponseTranslator>,
    pub supported_methods: Arc<[Method]>,
}

/// HTTP server for the framing proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Result<Self, FetchError> {
        let fetcher = Arc::new(Fetcher::new(&config.upstream)?);

        let supported_methods: Vec<Method> = config
            .upstream
            .supported_methods
            .iter()
            .filter_map(|m| parse_method(m))
            .collect();
        let allow_methods = HeaderValue::from_str(&allow_methods_value(&supported_methods))
            .unwrap_or_else(|_| HeaderValue::from_static("GET, OPTIONS"));

        let translator = Arc::new(ResponseTranslator::new(
            Rewriter::new(&config.rewrite),
            allow_methods,
        ));

        let state = AppState {
            fetcher,
            translator,
            supported_methods: supported_methods.into(),
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        let request_timeout = Duration::from_secs(config.upstream.timeout_secs + TIMEOUT_GRACE_SECS);

        Router::new()
            .route("/", get(info_page).options(preflight_handler))
            .route("/proxy", any(proxy_handler))
            .fallback(fallback_handler)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(ProxyRequestId))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(CatchPanicLayer::custom(panic_response))
                    .layer(TimeoutLayer::new(request_timeout)),
            )
    }

    /// The fully layered router, for serving or in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            timeout_secs = self.config.upstream.timeout_secs,
            verify_certificates = self.config.upstream.verify_certificates,
            "HTTP server starting"
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// `/proxy` for every method.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    if request.method() == Method::OPTIONS {
        return state.translator.preflight();
    }

    let request_id = request_id(request.headers()).to_string();
    let method = request.method().clone();
    let uri = request.uri().to_string();

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        "Proxying request"
    );

    match proxy_pipeline(&state, request).await {
        Ok(response) => {
            tracing::info!(
                request_id = %request_id,
                method = %method,
                uri = %uri,
                status = response.status().as_u16(),
                "Proxied"
            );
            response
        }
        Err(e) => {
            let status = e.status();
            if status.is_server_error() {
                tracing::error!(request_id = %request_id, method = %method, uri = %uri, status = status.as_u16(), error = %e, "Proxy request failed");
            } else {
                tracing::warn!(request_id = %request_id, method = %method, uri = %uri, status = status.as_u16(), error = %e, "Proxy request rejected");
            }
            e.into_response()
        }
    }
}

async fn proxy_pipeline(state: &AppState, request: Request<Body>) -> Result<Response, ProxyError> {
    let inbound = ProxyRequest::from_request(request).await?;

    if !state.supported_methods.contains(&inbound.method) {
        return Err(ProxyError::MethodNotAllowed(inbound.method));
    }

    let raw_target = inbound.query.first("url").ok_or(ProxyError::MissingUrl)?;
    let mut target = normalize(raw_target)?;
    target.append_query_pairs(inbound.query.pairs_except("url"));

    let upstream = state
        .fetcher
        .fetch(
            &target,
            inbound.method.clone(),
            &inbound.headers,
            inbound.forwardable_body(),
        )
        .await?;

    let proxy_origin = inbound.proxy_origin();
    Ok(state.translator.translate(
        upstream,
        inbound.method == Method::HEAD,
        proxy_origin.as_deref(),
    ))
}

async fn preflight_handler(State(state): State<AppState>) -> Response {
    state.translator.preflight()
}

/// Preflights are answered on any path; everything else is 404.
async fn fallback_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    if request.method() == Method::OPTIONS {
        return state.translator.preflight();
    }
    tracing::warn!(
        request_id = %request_id(request.headers()),
        method = %request.method(),
        path = %request.uri().path(),
        "No route matched"
    );
    (StatusCode::NOT_FOUND, "Not Found").into_response()
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    tracing::error!(detail = %detail, "Handler panicked");
    ProxyError::Internal(detail).into_response()
}
