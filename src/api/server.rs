use axum::error_handling::HandleErrorLayer;
use axum::http::{Method, StatusCode};
use axum::routing::{get, post};
use axum::{middleware, Router};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::{limit::ConcurrencyLimitLayer, timeout::TimeoutLayer, BoxError, ServiceBuilder};
use tower_http::{cors::{Any, CorsLayer}, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::api::middleware::track_visits;
use crate::api::server_config::{MAX_BODY_SIZE, MAX_CONCURRENCY, REQUEST_TIMEOUT};
use crate::api::handlers;
use crate::core::config::AppConfig;
use crate::core::errors::CounterError;
use crate::counter::lifecycle::CounterLifecycle;

/// HTTP layer hosting the visit counter. Holds the long-lived lifecycle
/// object and hands it to handlers and middleware via shared state; there
/// is no ambient global counter anywhere.
pub struct VisitServer {
    pub lifecycle: Arc<CounterLifecycle>,
    pub config: AppConfig,
}

impl VisitServer {
    pub fn new(config: AppConfig, lifecycle: Arc<CounterLifecycle>) -> Self {
        Self { lifecycle, config }
    }

    pub fn create_router(self) -> Router {
        let state = Arc::new(self);

        Router::new()
            .route("/", get(handlers::index))
            .route("/health", get(handlers::health_check))
            .route("/visit-count", get(handlers::visit_count))
            .route("/admin/reset-visits", post(handlers::reset_visits))
            .fallback(handlers::not_found)
            .layer(middleware::from_fn_with_state(state.clone(), track_visits))
            .layer(
                ServiceBuilder::new()
                    // Convert middleware errors (timeout/overload) into HTTP responses
                    .layer(HandleErrorLayer::new(|err: BoxError| async move {
                        if err.is::<tower::timeout::error::Elapsed>() {
                            (StatusCode::REQUEST_TIMEOUT, "request timed out")
                        } else {
                            (StatusCode::SERVICE_UNAVAILABLE, "service overloaded")
                        }
                    }))
                    .layer(ConcurrencyLimitLayer::new(MAX_CONCURRENCY))
                    .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE))
                    .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
                    .layer(TraceLayer::new_for_http()),
            )
            .layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods([Method::GET, Method::POST]),
            )
            .with_state(state)
    }

    /// Binds the listener and serves until a shutdown signal arrives, then
    /// performs the final forced counter flush before returning.
    pub async fn start(self) -> Result<(), CounterError> {
        let addr = format!("{}:{}", self.config.server.host, self.config.server.port);
        let lifecycle = self.lifecycle.clone();
        let router = self.create_router();

        let listener = match TcpListener::bind(&addr).await {
            Ok(listener) => listener,
            Err(e) => {
                lifecycle.shutdown().await;
                return Err(CounterError::ServerError(format!("failed to bind {}: {}", addr, e)));
            }
        };
        info!("listening on http://{}", addr);
        info!("visit count query: http://{}/visit-count", addr);

        let served = axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| CounterError::ServerError(e.to_string()));

        // Listener is gone; nothing can increment between here and the
        // flush. Every exit from start(), error or not, flushes first so a
        // clean exit never drops the final increments.
        lifecycle.shutdown().await;
        served
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {}", e);
    } else {
        info!("shutdown signal received");
    }
}
