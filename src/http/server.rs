//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum app that feeds every request to the dispatcher
//! - Configure HTTP/1.1 and HTTP/2 support (plain and TLS listeners)
//! - Wire up middleware (tracing, body limit, timeout, request ID)
//! - Buffer the request body and convert the dispatcher's response
//! - Drain in-flight requests on shutdown

use std::error::Error as StdError;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response as AxumResponse},
};
use axum_server::tls_rustls::RustlsConfig;
use http_body_util::LengthLimitError;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::dispatch::{Handler, NotFound};
use crate::http::{Request, Response};
use crate::observability::metrics;
use crate::routing::Router;

/// Time allowed for in-flight requests once shutdown starts (TLS listener).
const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Application state injected into the dispatch handler.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<Router>,
    pub not_found: Arc<dyn Handler>,
    pub max_body_size: usize,
}

/// Serves a frozen [`Router`].
pub struct HttpServer {
    app: axum::Router,
    config: AppConfig,
}

impl HttpServer {
    /// Create a server with the default `404 Not Found` fallback.
    pub fn new(config: AppConfig, router: Router) -> Self {
        Self::with_not_found(config, router, NotFound)
    }

    /// Create a server with a custom fallback for unmatched requests.
    pub fn with_not_found<H: Handler>(config: AppConfig, router: Router, not_found: H) -> Self {
        tracing::info!(
            routes = router.routes().len(),
            middlewares = router.middleware_count(),
            "Router frozen"
        );

        let state = AppState {
            router: Arc::new(router),
            not_found: Arc::new(not_found),
            max_body_size: config.limits.max_body_size,
        };
        let app = Self::build_app(&config, state);
        Self { app, config }
    }

    /// Build the Axum app with all middleware layers.
    #[allow(deprecated)]
    fn build_app(config: &AppConfig, state: AppState) -> axum::Router {
        let layers = ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(RequestBodyLimitLayer::new(config.limits.max_body_size))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)));

        axum::Router::new()
            .fallback(dispatch_handler)
            .with_state(state)
            .layer(layers)
    }

    /// The Axum app, for embedding or in-process testing.
    pub fn app(&self) -> axum::Router {
        self.app.clone()
    }

    /// Run the server on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server listening on http://{addr}");

        axum::serve(listener, self.app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Run the server over TLS on `addr` until `shutdown` fires.
    pub async fn run_tls(
        self,
        addr: SocketAddr,
        tls: RustlsConfig,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let handle = axum_server::Handle::new();
        let drain = handle.clone();
        tokio::spawn(async move {
            let _ = shutdown.recv().await;
            tracing::info!("HTTPS server draining");
            drain.graceful_shutdown(Some(DRAIN_TIMEOUT));
        });

        tracing::info!(address = %addr, "HTTPS server listening on https://{addr}");
        axum_server::bind_rustls(addr, tls)
            .handle(handle)
            .serve(self.app.into_make_service())
            .await?;

        tracing::info!("HTTPS server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

/// Buffers the body, runs the dispatcher and converts its response.
async fn dispatch_handler(
    State(state): State<AppState>,
    request: axum::extract::Request,
) -> AxumResponse {
    let start = Instant::now();
    let (parts, body) = request.into_parts();
    let method = parts.method.to_string();

    let body = match axum::body::to_bytes(body, state.max_body_size).await {
        Ok(bytes) => bytes,
        Err(err) => {
            let status = if is_length_limit(&err) {
                StatusCode::PAYLOAD_TOO_LARGE
            } else {
                StatusCode::BAD_REQUEST
            };
            tracing::warn!(method = %method, path = %parts.uri.path(), error = %err, "Failed to read request body");
            metrics::record_request(&method, status.as_u16(), start);
            return (status, status.canonical_reason().unwrap_or_default()).into_response();
        }
    };

    let mut req = Request::from_parts(parts, body);
    let mut res = Response::new();
    state.router.handle(&mut req, &mut res, state.not_found.as_ref()).await;

    metrics::record_request(&method, res.status_code().as_u16(), start);
    res.into_http().map(Body::from).into_response()
}

fn is_length_limit(err: &axum::Error) -> bool {
    let mut source: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(current) = source {
        if current.is::<LengthLimitError>() {
            return true;
        }
        source = current.source();
    }
    false
}
