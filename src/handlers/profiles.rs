use crate::{
    AppState,
    auth::Principal,
    error::ApiError,
    hateoas::{HateoasSupport, respond},
    models::{ProfileDto, StatusMessage, stamped},
};
use axum::{
    Json,
    extract::{OriginalUri, Query, State},
    response::Response,
};
use serde::Deserialize;

pub const LIVENESS_MESSAGE: &str = "profile microservice working";
pub const DELETED_MESSAGE: &str = "Profile deleted successfully";

/// ProfileController
///
/// Response-enrichment hook for the `/profiles` endpoints. Adds no links.
pub struct ProfileController;

impl HateoasSupport for ProfileController {}

/// AuthorizedProfilesQuery
///
/// Accepted for compatibility with existing clients. `userId` is ignored: the listing is
/// always for the authenticated user.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AuthorizedProfilesQuery {
    #[serde(rename = "userId")]
    #[param(rename = "userId")]
    pub user_id: Option<String>,
}

/// add
///
/// [Guarded: profile:create] Creates a monitored profile for the caller's organization/group/user.
#[utoipa::path(
    post,
    path = "/profiles",
    operation_id = "add_profile",
    request_body = ProfileDto,
    responses(
        (status = 200, description = "Created profile", body = ProfileDto),
        (status = 401, description = "Missing or invalid authorization"),
        (status = 403, description = "Permission denied")
    )
)]
pub async fn add(
    State(state): State<AppState>,
    principal: Principal,
    OriginalUri(uri): OriginalUri,
    Json(profile): Json<ProfileDto>,
) -> Result<Response, ApiError> {
    tracing::info!(screen_name = %profile.screen_name, "Saving profile");
    let created = state
        .handler
        .add_profile(stamped(profile, &principal))
        .await?;
    Ok(respond(&ProfileController, &uri, created))
}

/// delete
///
/// [Guarded: profile:delete] Deletes a profile within the caller's scope.
#[utoipa::path(
    post,
    path = "/profiles/delete",
    operation_id = "delete_profile",
    request_body = ProfileDto,
    responses(
        (status = 200, description = "Deleted", body = StatusMessage),
        (status = 404, description = "No such profile")
    )
)]
pub async fn delete(
    State(state): State<AppState>,
    principal: Principal,
    OriginalUri(uri): OriginalUri,
    Json(profile): Json<ProfileDto>,
) -> Result<Response, ApiError> {
    tracing::info!(screen_name = %profile.screen_name, "Deleting profile");
    state
        .handler
        .delete_profile(stamped(profile, &principal))
        .await?;
    Ok(respond(
        &ProfileController,
        &uri,
        StatusMessage::new(DELETED_MESSAGE),
    ))
}

/// get
///
/// [Guarded: profile:read] Lists all monitored profiles.
#[utoipa::path(
    get,
    path = "/profiles",
    operation_id = "get_monitored_profiles",
    responses((status = 200, description = "Monitored profiles", body = [ProfileDto]))
)]
pub async fn get(
    State(state): State<AppState>,
    principal: Principal,
    OriginalUri(uri): OriginalUri,
) -> Result<Response, ApiError> {
    let profiles = state
        .handler
        .get_monitored_profiles(
            &principal.organization_id,
            principal.primary_group_id(),
            &principal.username,
        )
        .await?;
    Ok(respond(&ProfileController, &uri, profiles))
}

/// get_added_profiles
///
/// [Guarded: profile:read]
#[utoipa::path(
    get,
    path = "/profiles/added",
    responses((status = 200, description = "Profiles added explicitly", body = [ProfileDto]))
)]
pub async fn get_added_profiles(
    State(state): State<AppState>,
    principal: Principal,
    OriginalUri(uri): OriginalUri,
) -> Result<Response, ApiError> {
    let profiles = state
        .handler
        .get_added_profiles(
            &principal.organization_id,
            principal.primary_group_id(),
            &principal.username,
        )
        .await?;
    Ok(respond(&ProfileController, &uri, profiles))
}

/// get_discovered_profiles
///
/// [Guarded: profile:read]
#[utoipa::path(
    get,
    path = "/profiles/discovered",
    responses((status = 200, description = "Profiles recorded by discovery", body = [ProfileDto]))
)]
pub async fn get_discovered_profiles(
    State(state): State<AppState>,
    principal: Principal,
    OriginalUri(uri): OriginalUri,
) -> Result<Response, ApiError> {
    let profiles = state
        .handler
        .get_discovered_profiles(
            &principal.organization_id,
            principal.primary_group_id(),
            &principal.username,
        )
        .await?;
    Ok(respond(&ProfileController, &uri, profiles))
}

/// get_authorized_profiles
///
/// [Guarded: profile:read] Profiles whose monitoring the authenticated user authorized.
#[utoipa::path(
    get,
    path = "/profiles/authorized",
    params(AuthorizedProfilesQuery),
    responses((status = 200, description = "Authorized profiles", body = [ProfileDto]))
)]
pub async fn get_authorized_profiles(
    State(state): State<AppState>,
    principal: Principal,
    OriginalUri(uri): OriginalUri,
    Query(_params): Query<AuthorizedProfilesQuery>,
) -> Result<Response, ApiError> {
    tracing::info!(user = %principal.username, "get all authorized profiles");
    let profiles = state
        .handler
        .get_authorized_profiles(&principal.username)
        .await?;
    Ok(respond(&ProfileController, &uri, profiles))
}

/// test
///
/// [Public] Liveness check.
#[utoipa::path(
    get,
    path = "/profiles/test",
    operation_id = "profiles_liveness",
    responses((status = 200, description = "Service is up", body = String))
)]
pub async fn test() -> &'static str {
    LIVENESS_MESSAGE
}
