//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /              - Landing page with the symptom form
//! POST /diagnose      - Submit symptoms (302 to /results)
//! GET  /results       - All stored diagnostics
//! GET  /test_api      - External articles API connectivity check
//! GET  /health        - Liveness check
//! GET  /health/ready  - Readiness check (store reachable)
//! GET  /static/*      - Stylesheets
//! ```

pub mod diagnose;
pub mod health;
pub mod home;
pub mod results;
pub mod test_api;

#[cfg(test)]
mod tests;

use axum::{
    Router,
    extract::Request,
    middleware,
    routing::{get, post},
};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::middleware::{request_id_middleware, security_headers_middleware};
use crate::state::AppState;

/// Directory served under `/static`, relative to the workspace root.
const STATIC_DIR: &str = "crates/web/static";

/// Build the application router with its middleware stack.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home::index))
        .route("/diagnose", post(diagnose::diagnose))
        .route("/results", get(results::index))
        .route("/test_api", get(test_api::test_api))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .with_state(state)
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = tracing::field::Empty,
            )
        }))
}
