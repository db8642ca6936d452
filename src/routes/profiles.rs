use super::{PROFILE_CREATE, PROFILE_DELETE, PROFILE_READ, guarded};
use crate::{AppState, handlers::profiles};
use axum::{
    Router,
    routing::{get, post},
};

/// Profile Router
///
/// Each method carries its own permission, so `/profiles` is registered once per method.
pub fn profile_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        // POST /profiles
        .route("/profiles", guarded(post(profiles::add), state, PROFILE_CREATE))
        // GET /profiles
        .route("/profiles", guarded(get(profiles::get), state, PROFILE_READ))
        // POST /profiles/delete
        .route(
            "/profiles/delete",
            guarded(post(profiles::delete), state, PROFILE_DELETE),
        )
        .route(
            "/profiles/added",
            guarded(get(profiles::get_added_profiles), state, PROFILE_READ),
        )
        .route(
            "/profiles/discovered",
            guarded(get(profiles::get_discovered_profiles), state, PROFILE_READ),
        )
        .route(
            "/profiles/authorized",
            guarded(get(profiles::get_authorized_profiles), state, PROFILE_READ),
        )
}
