#![allow(dead_code)]

use async_trait::async_trait;
use jsonwebtoken::{EncodingKey, Header, encode};
use profile_gateway::{
    AppConfig, AppState, ClaimsPermissionEvaluator, JwtAuthContextBuilder,
    auth::{Claims, Group, Principal},
    models::{DiscoveryResult, ProfileDto, ProfileSearchDto},
    service::{HandlerError, ProfileHandler, ProfileHandlerState},
};
use std::{
    sync::{Arc, Mutex},
    time::SystemTime,
};

pub const TEST_JWT_SECRET: &str = "test-secret-value-1234567890";

// --- Recording ProfileHandler ---

/// One recorded call into the handler, with exactly the arguments it received.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    AddProfile(ProfileDto),
    DeleteProfile(ProfileDto),
    GetMonitored(String, String, String),
    GetAdded(String, String, String),
    GetDiscovered(String, String, String),
    GetAuthorized(String),
    DiscoverProfiles(ProfileSearchDto),
    DeleteSearch(ProfileSearchDto),
    GetSearched(String, String, String),
    GetDiscoveryResultById(String, String, String, String),
}

/// Records every call and answers with canned values (or `fail_with`, when set).
#[derive(Default)]
pub struct RecordingHandler {
    pub calls: Mutex<Vec<Call>>,
    pub fail_with: Option<HandlerError>,
    pub profiles_to_return: Vec<ProfileDto>,
}

impl RecordingHandler {
    pub fn failing(error: HandlerError) -> Self {
        Self {
            fail_with: Some(error),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) -> Result<(), HandlerError> {
        self.calls.lock().unwrap().push(call);
        match &self.fail_with {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }
}

fn scope(c: &str, g: &str, u: &str) -> (String, String, String) {
    (c.to_string(), g.to_string(), u.to_string())
}

#[async_trait]
impl ProfileHandler for RecordingHandler {
    async fn add_profile(&self, profile: ProfileDto) -> Result<ProfileDto, HandlerError> {
        self.record(Call::AddProfile(profile.clone()))?;
        Ok(profile)
    }

    async fn delete_profile(&self, profile: ProfileDto) -> Result<(), HandlerError> {
        self.record(Call::DeleteProfile(profile))
    }

    async fn get_monitored_profiles(
        &self,
        c: &str,
        g: &str,
        u: &str,
    ) -> Result<Vec<ProfileDto>, HandlerError> {
        let (c, g, u) = scope(c, g, u);
        self.record(Call::GetMonitored(c, g, u))?;
        Ok(self.profiles_to_return.clone())
    }

    async fn get_added_profiles(
        &self,
        c: &str,
        g: &str,
        u: &str,
    ) -> Result<Vec<ProfileDto>, HandlerError> {
        let (c, g, u) = scope(c, g, u);
        self.record(Call::GetAdded(c, g, u))?;
        Ok(self.profiles_to_return.clone())
    }

    async fn get_discovered_profiles(
        &self,
        c: &str,
        g: &str,
        u: &str,
    ) -> Result<Vec<ProfileDto>, HandlerError> {
        let (c, g, u) = scope(c, g, u);
        self.record(Call::GetDiscovered(c, g, u))?;
        Ok(self.profiles_to_return.clone())
    }

    async fn get_authorized_profiles(
        &self,
        username: &str,
    ) -> Result<Vec<ProfileDto>, HandlerError> {
        self.record(Call::GetAuthorized(username.to_string()))?;
        Ok(self.profiles_to_return.clone())
    }

    async fn discover_profiles(
        &self,
        search: ProfileSearchDto,
    ) -> Result<DiscoveryResult, HandlerError> {
        self.record(Call::DiscoverProfiles(search.clone()))?;
        Ok(DiscoveryResult {
            id: "result-1".to_string(),
            query: search.query,
            company_id: search.company_id,
            group_id: search.group_id,
            user_id: search.user_id,
            profiles: self.profiles_to_return.clone(),
            created_at: None,
        })
    }

    async fn delete_search(&self, search: ProfileSearchDto) -> Result<(), HandlerError> {
        self.record(Call::DeleteSearch(search))
    }

    async fn get_searched(
        &self,
        c: &str,
        g: &str,
        u: &str,
    ) -> Result<Vec<DiscoveryResult>, HandlerError> {
        let (c, g, u) = scope(c, g, u);
        self.record(Call::GetSearched(c, g, u))?;
        Ok(vec![])
    }

    async fn get_discovery_result_by_id(
        &self,
        db_id: &str,
        c: &str,
        g: &str,
        u: &str,
    ) -> Result<DiscoveryResult, HandlerError> {
        self.record(Call::GetDiscoveryResultById(
            db_id.to_string(),
            c.to_string(),
            g.to_string(),
            u.to_string(),
        ))?;
        Ok(DiscoveryResult {
            id: db_id.to_string(),
            ..DiscoveryResult::default()
        })
    }
}

// --- Tokens & Principals ---

pub fn now_secs() -> usize {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize
}

pub fn claims_for(org: &str, groups: &[&str], username: &str, permissions: &[&str]) -> Claims {
    let now = now_secs();
    Claims {
        username: username.to_string(),
        org: org.to_string(),
        groups: groups
            .iter()
            .map(|id| Group {
                id: id.to_string(),
                name: None,
            })
            .collect(),
        permissions: permissions.iter().map(|p| p.to_string()).collect(),
        iat: now,
        exp: now + 3600,
    }
}

pub fn encode_claims(claims: &Claims) -> String {
    let key = EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes());
    encode(&Header::default(), claims, &key).unwrap()
}

/// Token for org1 / g1 / alice with the given grants.
pub fn token(permissions: &[&str]) -> String {
    encode_claims(&claims_for("org1", &["g1"], "alice", permissions))
}

pub fn principal() -> Principal {
    Principal {
        organization_id: "org1".to_string(),
        groups: vec![
            Group {
                id: "g1".to_string(),
                name: Some("Marketing".to_string()),
            },
            Group {
                id: "g2".to_string(),
                name: None,
            },
        ],
        username: "alice".to_string(),
        permissions: vec!["profile:*".to_string()],
    }
}

// --- State ---

pub fn test_config() -> AppConfig {
    AppConfig {
        jwt_secret: TEST_JWT_SECRET.to_string(),
        ..AppConfig::default()
    }
}

pub fn test_state_with(handler: ProfileHandlerState, config: AppConfig) -> AppState {
    AppState {
        handler,
        auth: Arc::new(JwtAuthContextBuilder::new(&config.jwt_secret)),
        permissions: Arc::new(ClaimsPermissionEvaluator),
        config,
    }
}

pub fn test_state(handler: ProfileHandlerState) -> AppState {
    test_state_with(handler, test_config())
}
