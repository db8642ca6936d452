use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::Principal;

// --- Identity Stamping ---

/// IdentityScoped
///
/// Implemented by request payloads that carry the caller's organization, group and user.
/// Stamping overwrites whatever the client sent with the values from the authenticated
/// `Principal`; caller-supplied identity fields are never trusted.
pub trait IdentityScoped {
    fn stamp_identity(&mut self, principal: &Principal);
}

/// Stamps `value` and hands it back, for use inline in a handler call.
pub fn stamped<T: IdentityScoped>(mut value: T, principal: &Principal) -> T {
    value.stamp_identity(principal);
    value
}

// --- Profile Schemas ---

/// ProfileSource
///
/// How a profile entered the caller's scope: added explicitly, or recorded by a discovery search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum ProfileSource {
    #[default]
    Added,
    Discovered,
}

/// ProfileDto
///
/// A social profile tracked on behalf of an organization/group/user.
/// Every field is optional on input; `companyId`, `groupId` and `userId` are stamped
/// from the authenticated principal before the handler sees the request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct ProfileDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub screen_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    // Network the profile lives on (e.g. "twitter").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub source: ProfileSource,
    pub monitored: bool,
    // Username of the user who authorized monitoring of this profile.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorized_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(type = "string | null")]
    pub created_at: Option<DateTime<Utc>>,
}

impl IdentityScoped for ProfileDto {
    fn stamp_identity(&mut self, principal: &Principal) {
        self.company_id = Some(principal.organization_id.clone());
        self.group_id = Some(principal.primary_group_id().to_string());
        self.user_id = Some(principal.username.clone());
    }
}

/// ProfileSearchDto
///
/// A profile discovery search. `query` is matched against known profiles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct ProfileSearchDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_results: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl IdentityScoped for ProfileSearchDto {
    fn stamp_identity(&mut self, principal: &Principal) {
        self.company_id = Some(principal.organization_id.clone());
        self.group_id = Some(principal.primary_group_id().to_string());
        self.user_id = Some(principal.username.clone());
    }
}

/// DiscoveryResult
///
/// Outcome of a discovery search, retrievable later by `id`. Each profile's `monitored`
/// flag reports whether the caller is already tracking it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase", default)]
#[ts(export)]
pub struct DiscoveryResult {
    pub id: String,
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub profiles: Vec<ProfileDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(type = "string | null")]
    pub created_at: Option<DateTime<Utc>>,
}

// --- Response Schemas ---

/// StatusMessage
///
/// Fixed acknowledgement body returned by the delete endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct StatusMessage {
    pub desc: String,
}

impl StatusMessage {
    pub fn new(desc: &str) -> Self {
        Self {
            desc: desc.to_string(),
        }
    }
}

/// ErrorResponse
///
/// JSON body for every error produced by this service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}
