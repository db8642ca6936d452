use crate::{
    AppState,
    auth::Principal,
    error::ApiError,
    hateoas::{HateoasSupport, respond},
    models::{DiscoveryResult, ProfileSearchDto, StatusMessage, stamped},
};
use axum::{
    Json,
    extract::{OriginalUri, Path, State},
    response::Response,
};

pub const LIVENESS_MESSAGE: &str = "profiles-search microservice working";
pub const DELETED_MESSAGE: &str = "Profile search deleted successfully";

/// ProfileSearchController
///
/// Response-enrichment hook for the `/profiles-search` endpoints. Adds no links.
pub struct ProfileSearchController;

impl HateoasSupport for ProfileSearchController {}

/// add
///
/// [Guarded: profile:create+read] Runs a discovery search scoped to the caller.
#[utoipa::path(
    post,
    path = "/profiles-search",
    operation_id = "discover_profiles",
    request_body = ProfileSearchDto,
    responses(
        (status = 200, description = "Discovery result", body = DiscoveryResult),
        (status = 401, description = "Missing or invalid authorization"),
        (status = 403, description = "Permission denied")
    )
)]
pub async fn add(
    State(state): State<AppState>,
    principal: Principal,
    OriginalUri(uri): OriginalUri,
    Json(search): Json<ProfileSearchDto>,
) -> Result<Response, ApiError> {
    tracing::info!(query = %search.query, "Saving profile search");
    let result = state
        .handler
        .discover_profiles(stamped(search, &principal))
        .await?;
    Ok(respond(&ProfileSearchController, &uri, result))
}

/// delete
///
/// [Guarded: profile:delete] Deletes search history for a query.
///
/// The body is forwarded as received, including any identity fields the client set, so the
/// deletion is not confined to the caller's scope. Setting `SCOPE_SEARCH_DELETES=true`
/// stamps the caller's identity first, like every other mutation.
#[utoipa::path(
    post,
    path = "/profiles-search/delete",
    operation_id = "delete_search",
    request_body = ProfileSearchDto,
    responses(
        (status = 200, description = "Deleted", body = StatusMessage),
        (status = 404, description = "No matching search")
    )
)]
pub async fn delete(
    State(state): State<AppState>,
    principal: Principal,
    OriginalUri(uri): OriginalUri,
    Json(search): Json<ProfileSearchDto>,
) -> Result<Response, ApiError> {
    tracing::info!(query = %search.query, "Deleting search history");
    let search = if state.config.scope_search_deletes {
        stamped(search, &principal)
    } else {
        search
    };
    state.handler.delete_search(search).await?;
    Ok(respond(
        &ProfileSearchController,
        &uri,
        StatusMessage::new(DELETED_MESSAGE),
    ))
}

/// get
///
/// [Guarded: profile:read] Lists the caller's discovery results, newest first.
#[utoipa::path(
    get,
    path = "/profiles-search",
    operation_id = "get_searched",
    responses((status = 200, description = "Discovery results", body = [DiscoveryResult]))
)]
pub async fn get(
    State(state): State<AppState>,
    principal: Principal,
    OriginalUri(uri): OriginalUri,
) -> Result<Response, ApiError> {
    let results = state
        .handler
        .get_searched(
            &principal.organization_id,
            principal.primary_group_id(),
            &principal.username,
        )
        .await?;
    Ok(respond(&ProfileSearchController, &uri, results))
}

/// get_by_key
///
/// [Guarded: profile:read] One discovery result with the current monitoring status of its profiles.
#[utoipa::path(
    get,
    path = "/profiles-search/discovery-results/{key}",
    operation_id = "get_discovery_result",
    params(("key" = String, Path, description = "Discovery result id")),
    responses(
        (status = 200, description = "Discovery result", body = DiscoveryResult),
        (status = 404, description = "Unknown id or outside the caller's scope")
    )
)]
pub async fn get_by_key(
    State(state): State<AppState>,
    principal: Principal,
    OriginalUri(uri): OriginalUri,
    Path(db_id): Path<String>,
) -> Result<Response, ApiError> {
    let result = state
        .handler
        .get_discovery_result_by_id(
            &db_id,
            &principal.organization_id,
            principal.primary_group_id(),
            &principal.username,
        )
        .await?;
    Ok(respond(&ProfileSearchController, &uri, result))
}

/// test
///
/// [Public] Liveness check.
#[utoipa::path(
    get,
    path = "/profiles-search/test",
    operation_id = "profiles_search_liveness",
    responses((status = 200, description = "Service is up", body = String))
)]
pub async fn test() -> &'static str {
    LIVENESS_MESSAGE
}
