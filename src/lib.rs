use axum::{Router, extract::FromRef, http::HeaderName};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod hateoas;
pub mod models;
pub mod permission;
pub mod service;

pub mod routes;
use routes::{profile_search::profile_search_routes, profiles::profile_routes, public};

// --- Public Re-exports ---

pub use auth::{AuthState, JwtAuthContextBuilder, Principal};
pub use config::AppConfig;
pub use permission::{ClaimsPermissionEvaluator, PermissionState};
pub use service::{HttpProfileHandler, InMemoryProfileHandler, ProfileHandlerState};

/// ApiDoc
///
/// OpenAPI document for the profile endpoints, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::profiles::add, handlers::profiles::delete, handlers::profiles::get,
        handlers::profiles::get_added_profiles, handlers::profiles::get_discovered_profiles,
        handlers::profiles::get_authorized_profiles, handlers::profiles::test,
        handlers::profile_search::add, handlers::profile_search::delete,
        handlers::profile_search::get, handlers::profile_search::get_by_key,
        handlers::profile_search::test
    ),
    components(
        schemas(
            models::ProfileDto, models::ProfileSearchDto, models::DiscoveryResult,
            models::ProfileSource, models::StatusMessage, models::ErrorResponse,
        )
    ),
    tags(
        (name = "profile-gateway", description = "Profile and profile discovery APIs")
    )
)]
struct ApiDoc;

/// AppState
///
/// Shared, cloneable container for the collaborators every request needs.
#[derive(Clone)]
pub struct AppState {
    /// Business logic behind both controllers.
    pub handler: ProfileHandlerState,
    /// Parses the `authorization` header into a `Principal`.
    pub auth: AuthState,
    /// Decides whether a principal holds the grants a route requires.
    pub permissions: PermissionState,
    pub config: AppConfig,
}

impl FromRef<AppState> for ProfileHandlerState {
    fn from_ref(app_state: &AppState) -> ProfileHandlerState {
        app_state.handler.clone()
    }
}

impl FromRef<AppState> for AuthState {
    fn from_ref(app_state: &AppState) -> AuthState {
        app_state.auth.clone()
    }
}

impl FromRef<AppState> for PermissionState {
    fn from_ref(app_state: &AppState) -> PermissionState {
        app_state.permissions.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the routing structure, applies the observability layers and registers the state.
/// Profile endpoints are nested under `config.service_root` when one is configured.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let service_routes = Router::new()
        .merge(public::liveness_routes())
        .merge(profile_routes(&state))
        .merge(profile_search_routes(&state));

    let service_routes = if state.config.service_root.is_empty() {
        service_routes
    } else {
        Router::new().nest(&state.config.service_root, service_routes)
    };

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(service_routes)
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span for every request, correlated by the `x-request-id` header.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
