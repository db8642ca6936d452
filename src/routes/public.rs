use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Unauthenticated endpoints used by monitoring and load balancers.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        .route("/health", get(|| async { "ok" }))
}

/// Liveness endpoints that live under the profile service root.
pub fn liveness_routes() -> Router<AppState> {
    Router::new()
        .route("/profiles/test", get(handlers::profiles::test))
        .route("/profiles-search/test", get(handlers::profile_search::test))
}
