//! HTTP server setup and the per-request entry point.
//!
//! # Responsibilities
//! - Create the Axum router whose only entry is a catch-all fallback
//! - Wire up middleware (tracing, timeout)
//! - Bind server to listener and stop on the shutdown signal
//! - Dispatch every request: adapt, route, return the native response
//! - Observability (request span, request id, metrics)

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{HeaderValue, Request, Response},
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::Instrument;
use uuid::Uuid;

use crate::api::{self, AppState};
use crate::config::AppConfig;
use crate::http::request::ParsedRequest;
use crate::observability::metrics;
use crate::routing::{RouteError, Router};

/// Header carrying the per-request correlation id.
pub const X_REQUEST_ID: &str = "x-request-id";

/// State handed to the fallback entry.
#[derive(Clone)]
struct Entry {
    router: Arc<Router<AppState>>,
    max_body_size: usize,
}

/// HTTP server for the API.
pub struct HttpServer {
    app: axum::Router,
    config: AppConfig,
}

impl HttpServer {
    /// Create a server with a freshly seeded in-memory store.
    pub fn new(config: AppConfig) -> Result<Self, RouteError> {
        let state = AppState::from_config(&config);
        Self::with_state(config, state)
    }

    /// Create a server over existing state.
    pub fn with_state(config: AppConfig, state: AppState) -> Result<Self, RouteError> {
        let router = Arc::new(api::routes(state)?);
        let app = Self::build_router(&config, router);
        Ok(Self { app, config })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &AppConfig, router: Arc<Router<AppState>>) -> axum::Router {
        let entry = Entry {
            router,
            max_body_size: config.http.max_body_size,
        };
        axum::Router::new()
            .fallback(entry_handler)
            .with_state(entry)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.http.request_timeout_secs,
            )))
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

async fn entry_handler(State(entry): State<Entry>, request: Request<Body>) -> Response<Body> {
    dispatch(&entry.router, request, entry.max_body_size).await
}

/// Handle one native request from start to finish.
///
/// Never fails: every outcome, including a handler fault, is already a
/// finalized response by the time the router returns.
pub async fn dispatch<S: Clone + Send + Sync + 'static>(
    router: &Router<S>,
    request: Request<Body>,
    max_body_size: usize,
) -> Response<Body> {
    let start = Instant::now();
    let request_id = Uuid::new_v4().to_string();
    let method = request.method().clone();
    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %method,
        path = %request.uri().path(),
    );

    async move {
        let parsed = ParsedRequest::from_native(request, max_body_size).await;
        let done = router.dispatch(parsed).await;

        let status = done.status();
        metrics::record_request(method.as_str(), status.as_u16(), start);
        tracing::debug!(
            status = status.as_u16(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Request complete"
        );

        let mut response = done.into_inner();
        if let Ok(value) = HeaderValue::from_str(&request_id) {
            response.headers_mut().insert(X_REQUEST_ID, value);
        }
        response
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Method, StatusCode};

    fn router() -> Router<AppState> {
        api::routes(api::testing::state()).unwrap()
    }

    #[tokio::test]
    async fn test_dispatch_sets_request_id() {
        let router = router();
        let request = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let response = dispatch(&router, request, 1024).await;

        assert_eq!(response.status(), StatusCode::OK);
        let id = response.headers().get(X_REQUEST_ID).unwrap();
        assert!(Uuid::parse_str(id.to_str().unwrap()).is_ok());
    }

    #[tokio::test]
    async fn test_dispatch_preflight() {
        let router = router();
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/posts")
            .body(Body::empty())
            .unwrap();
        let response = dispatch(&router, request, 1024).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(
            response
                .headers()
                .get("access-control-allow-headers")
                .unwrap(),
            "Content-Type, Authorization"
        );
    }

    #[tokio::test]
    async fn test_dispatch_adapts_body() {
        let router = router();
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/auth/login")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = dispatch(&router, request, 1024).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_axum_app_routes_everything_through_fallback() {
        use tower::ServiceExt;

        let server = HttpServer::with_state(AppConfig::default(), api::testing::state()).unwrap();
        let response = server
            .app
            .oneshot(
                Request::builder()
                    .uri("/api/unknown")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().contains_key(X_REQUEST_ID));
        assert_eq!(
            response
                .headers()
                .get("access-control-allow-origin")
                .unwrap(),
            "*"
        );
    }
}
