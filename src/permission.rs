use std::{fmt, sync::Arc};

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::{
    AppState,
    auth::{Principal, principal_from_headers},
    error::ApiError,
};

/// Resource
///
/// Protected resource families. Permission strings use the lowercase name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Profile,
}

impl Resource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Profile => "profile",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Read => "read",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }
}

/// Permission
///
/// A resource paired with the set of actions a route requires. All actions must be granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Permission {
    pub resource: Resource,
    pub actions: &'static [Action],
}

impl Permission {
    pub const fn new(resource: Resource, actions: &'static [Action]) -> Self {
        Self { resource, actions }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let actions: Vec<&str> = self.actions.iter().map(Action::as_str).collect();
        write!(f, "{}:{}", self.resource.as_str(), actions.join("+"))
    }
}

/// PermissionEvaluator
///
/// Decides whether a principal may perform the required actions on a resource.
pub trait PermissionEvaluator: Send + Sync {
    fn is_permitted(&self, principal: &Principal, permission: &Permission) -> bool;
}

pub type PermissionState = Arc<dyn PermissionEvaluator>;

/// ClaimsPermissionEvaluator
///
/// Grants from the `permissions` claim. `profile:read` covers one action, `profile:*`
/// every action on the resource, and `*` everything.
#[derive(Debug, Default, Clone)]
pub struct ClaimsPermissionEvaluator;

impl PermissionEvaluator for ClaimsPermissionEvaluator {
    fn is_permitted(&self, principal: &Principal, permission: &Permission) -> bool {
        let resource = permission.resource.as_str();
        permission.actions.iter().all(|action| {
            principal.permissions.iter().any(|grant| {
                if grant == "*" {
                    return true;
                }
                match grant.split_once(':') {
                    Some((res, act)) => res == resource && (act == "*" || act == action.as_str()),
                    None => false,
                }
            })
        })
    }
}

/// PermissionGuard
///
/// State for the permission route layer: the application state plus the permission the
/// guarded route requires.
#[derive(Clone)]
pub struct PermissionGuard {
    pub state: AppState,
    pub permission: Permission,
}

impl PermissionGuard {
    pub fn new(state: &AppState, permission: Permission) -> Self {
        Self {
            state: state.clone(),
            permission,
        }
    }
}

/// enforce_permission
///
/// Route-layer middleware run before every guarded handler. Fails closed: without a
/// resolvable principal (401) or the required grants (403) the handler is never reached.
/// On success the principal is stored in the request extensions for the `Principal` extractor.
pub async fn enforce_permission(
    State(guard): State<PermissionGuard>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let principal = principal_from_headers(guard.state.auth.as_ref(), request.headers())
        .inspect_err(|e| tracing::warn!(error = %e, "rejected request without a valid principal"))?;

    if !guard
        .state
        .permissions
        .is_permitted(&principal, &guard.permission)
    {
        tracing::warn!(
            user = %principal.username,
            org = %principal.organization_id,
            required = %guard.permission,
            "permission denied"
        );
        return Err(ApiError::Forbidden(guard.permission.to_string()));
    }

    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}
