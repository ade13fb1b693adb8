//! Visit-counting middleware.
//!
//! The counter has no path awareness; the exclusion policy lives here.
//! Qualifying requests bump the count, excluded ones (the count endpoint
//! itself, health/admin paths, static assets) only read it. A counter
//! failure never fails the request.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use std::sync::Arc;
use tracing::{info, warn};

use crate::api::server::VisitServer;

pub async fn track_visits(
    State(state): State<Arc<VisitServer>>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let method = request.method().clone();

    match state.lifecycle.counter() {
        Ok(counter) => {
            let total = if state.config.server.is_counted(&path) {
                counter.increment()
            } else {
                counter.current()
            };
            info!(%method, %path, total, "request");
        }
        Err(e) => warn!("visit counter unavailable: {}", e),
    }

    next.run(request).await
}
