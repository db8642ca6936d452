//! Router Module Index
//!
//! Every profile route except the liveness checks sits behind the permission layer.

use crate::{
    AppState,
    permission::{Action, Permission, PermissionGuard, Resource, enforce_permission},
};
use axum::{middleware, routing::MethodRouter};

/// Health check and liveness endpoints. No authorization header required.
pub mod public;

/// `/profiles` routes.
pub mod profiles;

/// `/profiles-search` routes.
pub mod profile_search;

pub const PROFILE_CREATE: Permission = Permission::new(Resource::Profile, &[Action::Create]);
pub const PROFILE_READ: Permission = Permission::new(Resource::Profile, &[Action::Read]);
pub const PROFILE_DELETE: Permission = Permission::new(Resource::Profile, &[Action::Delete]);
pub const PROFILE_SEARCH: Permission =
    Permission::new(Resource::Profile, &[Action::Create, Action::Read]);

/// guarded
///
/// Puts `enforce_permission` in front of every endpoint of `method_router`.
pub fn guarded(
    method_router: MethodRouter<AppState>,
    state: &AppState,
    permission: Permission,
) -> MethodRouter<AppState> {
    method_router.route_layer(middleware::from_fn_with_state(
        PermissionGuard::new(state, permission),
        enforce_permission,
    ))
}
