use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, header, request::Parts},
};
use jsonwebtoken::{DecodingKey, Validation, decode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;
use utoipa::ToSchema;

use crate::error::ApiError;

/// Group
///
/// A group the caller belongs to inside their organization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct Group {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Claims
///
/// Payload of the JWT carried in the `authorization` header.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub username: String,
    #[serde(rename = "_org")]
    pub org: String,
    #[serde(rename = "_groups", default)]
    pub groups: Vec<Group>,
    /// `resource:action` grants, e.g. `profile:read` or `profile:*`.
    #[serde(default)]
    pub permissions: Vec<String>,
    pub exp: usize,
    pub iat: usize,
}

/// Principal
///
/// The authenticated caller, resolved from the `authorization` header.
/// `groups` is never empty once a principal reaches a handler; the first group is
/// the one requests are scoped to.
#[derive(Debug, Clone, PartialEq)]
pub struct Principal {
    pub organization_id: String,
    pub groups: Vec<Group>,
    pub username: String,
    pub permissions: Vec<String>,
}

impl Principal {
    pub fn primary_group_id(&self) -> &str {
        self.groups.first().map(|g| g.id.as_str()).unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AuthError {
    #[error("authorization header is missing")]
    MissingHeader,
    #[error("authorization token is expired")]
    Expired,
    #[error("authorization token is invalid: {0}")]
    InvalidToken(String),
    #[error("principal has no group")]
    NoGroup,
}

/// AuthContextBuilder
///
/// Turns the raw `authorization` header value into a `Principal`.
pub trait AuthContextBuilder: Send + Sync {
    fn build(&self, authorization: &str) -> Result<Principal, AuthError>;
}

pub type AuthState = Arc<dyn AuthContextBuilder>;

/// JwtAuthContextBuilder
///
/// Verifies an HS256 token signed with the shared secret. The `Bearer ` prefix is optional.
pub struct JwtAuthContextBuilder {
    key: DecodingKey,
    validation: Validation,
}

impl JwtAuthContextBuilder {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::default();
        validation.validate_exp = true;
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }
}

impl AuthContextBuilder for JwtAuthContextBuilder {
    fn build(&self, authorization: &str) -> Result<Principal, AuthError> {
        let raw = authorization.trim();
        let token = raw.strip_prefix("Bearer ").unwrap_or(raw).trim();
        if token.is_empty() {
            return Err(AuthError::MissingHeader);
        }

        let claims = decode::<Claims>(token, &self.key, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::InvalidToken(e.to_string()),
            })?
            .claims;

        if claims.groups.is_empty() {
            return Err(AuthError::NoGroup);
        }

        Ok(Principal {
            organization_id: claims.org,
            groups: claims.groups,
            username: claims.username,
            permissions: claims.permissions,
        })
    }
}

/// Resolves the principal from the request headers using the configured builder.
pub fn principal_from_headers(
    builder: &dyn AuthContextBuilder,
    headers: &HeaderMap,
) -> Result<Principal, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidToken("header is not valid ASCII".to_string()))?;
    builder.build(value)
}

/// Principal Extractor
///
/// Guarded routes already carry the principal in the request extensions (inserted by the
/// permission layer), so the header is only decoded once. Otherwise the header is parsed here.
///
/// Rejection: 401 Unauthorized.
impl<S> FromRequestParts<S> for Principal
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(principal) = parts.extensions.get::<Principal>() {
            return Ok(principal.clone());
        }

        let builder = AuthState::from_ref(state);
        Ok(principal_from_headers(builder.as_ref(), &parts.headers)?)
    }
}
