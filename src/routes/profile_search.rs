use super::{PROFILE_DELETE, PROFILE_READ, PROFILE_SEARCH, guarded};
use crate::{AppState, handlers::profile_search};
use axum::{
    Router,
    routing::{get, post},
};

/// Profile Search Router
pub fn profile_search_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        // POST /profiles-search
        // Creating a search also reads profiles, so both grants are required.
        .route(
            "/profiles-search",
            guarded(post(profile_search::add), state, PROFILE_SEARCH),
        )
        // GET /profiles-search
        .route(
            "/profiles-search",
            guarded(get(profile_search::get), state, PROFILE_READ),
        )
        // POST /profiles-search/delete
        .route(
            "/profiles-search/delete",
            guarded(post(profile_search::delete), state, PROFILE_DELETE),
        )
        // GET /profiles-search/discovery-results/{key}
        .route(
            "/profiles-search/discovery-results/{key}",
            guarded(get(profile_search::get_by_key), state, PROFILE_READ),
        )
}
