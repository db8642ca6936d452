use crate::models::{DiscoveryResult, ProfileDto, ProfileSearchDto, ProfileSource};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{RequestBuilder, StatusCode, Url};
use serde::{Serialize, de::DeserializeOwned};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

/// HandlerError
///
/// Failures reported by a `ProfileHandler`. The HTTP layer never recovers from these;
/// it only maps them to a status code.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HandlerError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("profile engine unavailable: {0}")]
    Unavailable(String),
    #[error("{0}")]
    Internal(String),
}

/// ProfileHandler Trait
///
/// The business-logic collaborator behind both controllers. Requests arrive already
/// stamped with the caller's identity (except where noted on `delete_search`).
#[async_trait]
pub trait ProfileHandler: Send + Sync {
    // --- Profiles ---
    async fn add_profile(&self, profile: ProfileDto) -> Result<ProfileDto, HandlerError>;
    async fn delete_profile(&self, profile: ProfileDto) -> Result<(), HandlerError>;
    async fn get_monitored_profiles(
        &self,
        company_id: &str,
        group_id: &str,
        user_id: &str,
    ) -> Result<Vec<ProfileDto>, HandlerError>;
    async fn get_added_profiles(
        &self,
        company_id: &str,
        group_id: &str,
        user_id: &str,
    ) -> Result<Vec<ProfileDto>, HandlerError>;
    async fn get_discovered_profiles(
        &self,
        company_id: &str,
        group_id: &str,
        user_id: &str,
    ) -> Result<Vec<ProfileDto>, HandlerError>;
    // Profiles whose monitoring was authorized by `username`, across scopes.
    async fn get_authorized_profiles(&self, username: &str)
    -> Result<Vec<ProfileDto>, HandlerError>;

    // --- Discovery Searches ---
    async fn discover_profiles(
        &self,
        search: ProfileSearchDto,
    ) -> Result<DiscoveryResult, HandlerError>;
    /// The search may or may not carry identity fields; absent fields widen the match.
    async fn delete_search(&self, search: ProfileSearchDto) -> Result<(), HandlerError>;
    async fn get_searched(
        &self,
        company_id: &str,
        group_id: &str,
        user_id: &str,
    ) -> Result<Vec<DiscoveryResult>, HandlerError>;
    async fn get_discovery_result_by_id(
        &self,
        db_id: &str,
        company_id: &str,
        group_id: &str,
        user_id: &str,
    ) -> Result<DiscoveryResult, HandlerError>;
}

pub type ProfileHandlerState = Arc<dyn ProfileHandler>;

const DEFAULT_MAX_RESULTS: u32 = 20;

// --- In-Memory Implementation ---

/// Organization/group/user triple a record belongs to.
#[derive(Debug, Clone)]
struct Scope {
    company: String,
    group: String,
    user: String,
}

impl Scope {
    fn new(company: &str, group: &str, user: &str) -> Self {
        Self {
            company: company.to_string(),
            group: group.to_string(),
            user: user.to_string(),
        }
    }

    fn from_fields(
        company: &Option<String>,
        group: &Option<String>,
        user: &Option<String>,
    ) -> Result<Self, HandlerError> {
        match (company, group, user) {
            (Some(c), Some(g), Some(u)) => Ok(Self::new(c, g, u)),
            _ => Err(HandlerError::InvalidRequest(
                "companyId, groupId and userId are required".to_string(),
            )),
        }
    }

    fn matches(
        &self,
        company: &Option<String>,
        group: &Option<String>,
        user: &Option<String>,
    ) -> bool {
        company.as_deref() == Some(self.company.as_str())
            && group.as_deref() == Some(self.group.as_str())
            && user.as_deref() == Some(self.user.as_str())
    }

    fn owns_profile(&self, p: &ProfileDto) -> bool {
        self.matches(&p.company_id, &p.group_id, &p.user_id)
    }

    fn owns_result(&self, r: &DiscoveryResult) -> bool {
        self.matches(&r.company_id, &r.group_id, &r.user_id)
    }
}

#[derive(Default)]
struct Store {
    profiles: Vec<ProfileDto>,
    searches: Vec<DiscoveryResult>,
}

/// InMemoryProfileHandler
///
/// Process-local `ProfileHandler` used for local runs and tests. Discovery searches match
/// against a fixed catalog of known profiles supplied at construction.
#[derive(Default)]
pub struct InMemoryProfileHandler {
    catalog: Vec<ProfileDto>,
    store: RwLock<Store>,
}

impl InMemoryProfileHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_catalog(catalog: Vec<ProfileDto>) -> Self {
        Self {
            catalog,
            store: RwLock::new(Store::default()),
        }
    }

    async fn profiles_where<F>(&self, scope: Scope, keep: F) -> Vec<ProfileDto>
    where
        F: Fn(&ProfileDto) -> bool,
    {
        let store = self.store.read().await;
        store
            .profiles
            .iter()
            .filter(|p| scope.owns_profile(p) && keep(p))
            .cloned()
            .collect()
    }
}

/// Reads a JSON array of profiles to seed the discovery catalog.
pub fn load_catalog(path: &str) -> Result<Vec<ProfileDto>, HandlerError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| HandlerError::Internal(format!("cannot read catalog {}: {}", path, e)))?;
    serde_json::from_str(&raw)
        .map_err(|e| HandlerError::Internal(format!("cannot parse catalog {}: {}", path, e)))
}

fn same_name(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

fn matches_query(candidate: &ProfileDto, query: &str, channel: Option<&str>) -> bool {
    let name_hit = candidate.screen_name.to_lowercase().contains(query)
        || candidate
            .display_name
            .as_deref()
            .is_some_and(|d| d.to_lowercase().contains(query));
    let channel_hit = match (channel, candidate.channel.as_deref()) {
        (Some(wanted), Some(actual)) => wanted.eq_ignore_ascii_case(actual),
        (Some(_), None) => false,
        (None, _) => true,
    };
    name_hit && channel_hit
}

fn field_matches(filter: &Option<String>, value: &Option<String>) -> bool {
    filter
        .as_deref()
        .is_none_or(|f| value.as_deref() == Some(f))
}

#[async_trait]
impl ProfileHandler for InMemoryProfileHandler {
    /// add_profile
    ///
    /// Upserts by screen name within the caller's scope. The profile becomes monitored,
    /// and the adding user is recorded as the one who authorized it.
    async fn add_profile(&self, profile: ProfileDto) -> Result<ProfileDto, HandlerError> {
        let screen_name = profile.screen_name.trim().to_string();
        if screen_name.is_empty() {
            return Err(HandlerError::InvalidRequest(
                "screenName is required".to_string(),
            ));
        }
        let scope = Scope::from_fields(&profile.company_id, &profile.group_id, &profile.user_id)?;

        let mut store = self.store.write().await;
        if let Some(existing) = store
            .profiles
            .iter_mut()
            .find(|p| scope.owns_profile(p) && same_name(&p.screen_name, &screen_name))
        {
            existing.source = ProfileSource::Added;
            existing.monitored = true;
            existing.authorized_by = Some(scope.user.clone());
            if profile.display_name.is_some() {
                existing.display_name = profile.display_name;
            }
            if profile.channel.is_some() {
                existing.channel = profile.channel;
            }
            return Ok(existing.clone());
        }

        let stored = ProfileDto {
            id: Some(Uuid::new_v4()),
            screen_name,
            source: ProfileSource::Added,
            monitored: true,
            authorized_by: Some(scope.user.clone()),
            created_at: Some(Utc::now()),
            ..profile
        };
        store.profiles.push(stored.clone());
        Ok(stored)
    }

    async fn delete_profile(&self, profile: ProfileDto) -> Result<(), HandlerError> {
        let scope = Scope::from_fields(&profile.company_id, &profile.group_id, &profile.user_id)?;

        let mut store = self.store.write().await;
        let before = store.profiles.len();
        store
            .profiles
            .retain(|p| !(scope.owns_profile(p) && same_name(&p.screen_name, &profile.screen_name)));

        if store.profiles.len() == before {
            return Err(HandlerError::NotFound(format!(
                "profile {}",
                profile.screen_name
            )));
        }
        Ok(())
    }

    async fn get_monitored_profiles(
        &self,
        company_id: &str,
        group_id: &str,
        user_id: &str,
    ) -> Result<Vec<ProfileDto>, HandlerError> {
        let scope = Scope::new(company_id, group_id, user_id);
        Ok(self.profiles_where(scope, |p| p.monitored).await)
    }

    async fn get_added_profiles(
        &self,
        company_id: &str,
        group_id: &str,
        user_id: &str,
    ) -> Result<Vec<ProfileDto>, HandlerError> {
        let scope = Scope::new(company_id, group_id, user_id);
        Ok(self
            .profiles_where(scope, |p| p.source == ProfileSource::Added)
            .await)
    }

    async fn get_discovered_profiles(
        &self,
        company_id: &str,
        group_id: &str,
        user_id: &str,
    ) -> Result<Vec<ProfileDto>, HandlerError> {
        let scope = Scope::new(company_id, group_id, user_id);
        Ok(self
            .profiles_where(scope, |p| p.source == ProfileSource::Discovered)
            .await)
    }

    async fn get_authorized_profiles(
        &self,
        username: &str,
    ) -> Result<Vec<ProfileDto>, HandlerError> {
        let store = self.store.read().await;
        Ok(store
            .profiles
            .iter()
            .filter(|p| p.authorized_by.as_deref() == Some(username))
            .cloned()
            .collect())
    }

    /// discover_profiles
    ///
    /// Matches the query (case-insensitive, screen or display name) against the catalog,
    /// records unseen matches as discovered profiles in the caller's scope and keeps the
    /// result for later lookup by id.
    async fn discover_profiles(
        &self,
        search: ProfileSearchDto,
    ) -> Result<DiscoveryResult, HandlerError> {
        let query = search.query.trim().to_lowercase();
        if query.is_empty() {
            return Err(HandlerError::InvalidRequest("query is required".to_string()));
        }
        let scope = Scope::from_fields(&search.company_id, &search.group_id, &search.user_id)?;
        let limit = search.max_results.unwrap_or(DEFAULT_MAX_RESULTS) as usize;
        let now = Utc::now();

        let mut store = self.store.write().await;
        let mut found = Vec::new();
        for candidate in self
            .catalog
            .iter()
            .filter(|c| matches_query(c, &query, search.channel.as_deref()))
            .take(limit)
        {
            let known = store
                .profiles
                .iter()
                .find(|p| scope.owns_profile(p) && same_name(&p.screen_name, &candidate.screen_name))
                .cloned();
            let profile = match known {
                Some(p) => p,
                None => {
                    let p = ProfileDto {
                        id: Some(Uuid::new_v4()),
                        screen_name: candidate.screen_name.clone(),
                        display_name: candidate.display_name.clone(),
                        channel: candidate.channel.clone(),
                        company_id: Some(scope.company.clone()),
                        group_id: Some(scope.group.clone()),
                        user_id: Some(scope.user.clone()),
                        source: ProfileSource::Discovered,
                        monitored: false,
                        authorized_by: None,
                        created_at: Some(now),
                    };
                    store.profiles.push(p.clone());
                    p
                }
            };
            found.push(profile);
        }

        let result = DiscoveryResult {
            id: Uuid::new_v4().to_string(),
            query: search.query.trim().to_string(),
            company_id: Some(scope.company),
            group_id: Some(scope.group),
            user_id: Some(scope.user),
            profiles: found,
            created_at: Some(now),
        };
        store.searches.push(result.clone());
        Ok(result)
    }

    async fn delete_search(&self, search: ProfileSearchDto) -> Result<(), HandlerError> {
        let query = search.query.trim();
        if query.is_empty() {
            return Err(HandlerError::InvalidRequest("query is required".to_string()));
        }

        let mut store = self.store.write().await;
        let before = store.searches.len();
        store.searches.retain(|r| {
            !(r.query.eq_ignore_ascii_case(query)
                && field_matches(&search.company_id, &r.company_id)
                && field_matches(&search.group_id, &r.group_id)
                && field_matches(&search.user_id, &r.user_id))
        });
        let removed = before - store.searches.len();
        tracing::debug!(query, removed, "search history deleted");

        if removed == 0 {
            return Err(HandlerError::NotFound(format!("search {}", query)));
        }
        Ok(())
    }

    async fn get_searched(
        &self,
        company_id: &str,
        group_id: &str,
        user_id: &str,
    ) -> Result<Vec<DiscoveryResult>, HandlerError> {
        let scope = Scope::new(company_id, group_id, user_id);
        let store = self.store.read().await;
        let mut results: Vec<DiscoveryResult> = store
            .searches
            .iter()
            .filter(|r| scope.owns_result(r))
            .cloned()
            .collect();
        results.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(results)
    }

    /// get_discovery_result_by_id
    ///
    /// Results outside the caller's scope are reported as not found. Monitoring flags are
    /// refreshed from the current profile set.
    async fn get_discovery_result_by_id(
        &self,
        db_id: &str,
        company_id: &str,
        group_id: &str,
        user_id: &str,
    ) -> Result<DiscoveryResult, HandlerError> {
        let scope = Scope::new(company_id, group_id, user_id);
        let store = self.store.read().await;
        let mut result = store
            .searches
            .iter()
            .find(|r| r.id == db_id && scope.owns_result(r))
            .cloned()
            .ok_or_else(|| HandlerError::NotFound(format!("discovery result {}", db_id)))?;

        for profile in result.profiles.iter_mut() {
            profile.monitored = store.profiles.iter().any(|p| {
                scope.owns_profile(p) && p.monitored && same_name(&p.screen_name, &profile.screen_name)
            });
        }
        Ok(result)
    }
}

// --- Remote Implementation ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ScopeQuery<'a> {
    company_id: &'a str,
    group_id: &'a str,
    user_id: &'a str,
}

/// HttpProfileHandler
///
/// Forwards every operation to a remote profile engine over JSON/HTTP. Scope travels as
/// `companyId`/`groupId`/`userId` query parameters on reads.
#[derive(Clone)]
pub struct HttpProfileHandler {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpProfileHandler {
    pub fn new(base_url: &str) -> Result<Self, HandlerError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| HandlerError::Internal(format!("invalid handler url {}: {}", base_url, e)))?;
        Ok(Self {
            client: reqwest::Client::new(),
            base_url,
        })
    }

    fn url(&self, segments: &[&str]) -> Result<Url, HandlerError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| HandlerError::Internal("handler url cannot be a base".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, HandlerError> {
        let response = check_status(send(request).await?).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| HandlerError::Internal(format!("invalid response from profile engine: {}", e)))
    }

    async fn send_empty(&self, request: RequestBuilder) -> Result<(), HandlerError> {
        check_status(send(request).await?).await.map(|_| ())
    }

    async fn scoped_list<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        company_id: &str,
        group_id: &str,
        user_id: &str,
    ) -> Result<T, HandlerError> {
        let query = ScopeQuery {
            company_id,
            group_id,
            user_id,
        };
        self.send_json(self.client.get(self.url(segments)?).query(&query))
            .await
    }
}

async fn send(request: RequestBuilder) -> Result<reqwest::Response, HandlerError> {
    request
        .send()
        .await
        .map_err(|e| HandlerError::Unavailable(e.to_string()))
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, HandlerError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let detail = response.text().await.unwrap_or_default();
    Err(match status {
        StatusCode::NOT_FOUND => HandlerError::NotFound(detail),
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            HandlerError::InvalidRequest(detail)
        }
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT => {
            HandlerError::Unavailable(format!("profile engine returned {}", status))
        }
        _ => HandlerError::Internal(format!("profile engine returned {}: {}", status, detail)),
    })
}

#[async_trait]
impl ProfileHandler for HttpProfileHandler {
    async fn add_profile(&self, profile: ProfileDto) -> Result<ProfileDto, HandlerError> {
        self.send_json(self.client.post(self.url(&["profiles"])?).json(&profile))
            .await
    }

    async fn delete_profile(&self, profile: ProfileDto) -> Result<(), HandlerError> {
        self.send_empty(self.client.post(self.url(&["profiles", "delete"])?).json(&profile))
            .await
    }

    async fn get_monitored_profiles(
        &self,
        company_id: &str,
        group_id: &str,
        user_id: &str,
    ) -> Result<Vec<ProfileDto>, HandlerError> {
        self.scoped_list(&["profiles", "monitored"], company_id, group_id, user_id)
            .await
    }

    async fn get_added_profiles(
        &self,
        company_id: &str,
        group_id: &str,
        user_id: &str,
    ) -> Result<Vec<ProfileDto>, HandlerError> {
        self.scoped_list(&["profiles", "added"], company_id, group_id, user_id)
            .await
    }

    async fn get_discovered_profiles(
        &self,
        company_id: &str,
        group_id: &str,
        user_id: &str,
    ) -> Result<Vec<ProfileDto>, HandlerError> {
        self.scoped_list(&["profiles", "discovered"], company_id, group_id, user_id)
            .await
    }

    async fn get_authorized_profiles(
        &self,
        username: &str,
    ) -> Result<Vec<ProfileDto>, HandlerError> {
        let url = self.url(&["profiles", "authorized"])?;
        self.send_json(self.client.get(url).query(&[("username", username)]))
            .await
    }

    async fn discover_profiles(
        &self,
        search: ProfileSearchDto,
    ) -> Result<DiscoveryResult, HandlerError> {
        self.send_json(self.client.post(self.url(&["searches"])?).json(&search))
            .await
    }

    async fn delete_search(&self, search: ProfileSearchDto) -> Result<(), HandlerError> {
        self.send_empty(self.client.post(self.url(&["searches", "delete"])?).json(&search))
            .await
    }

    async fn get_searched(
        &self,
        company_id: &str,
        group_id: &str,
        user_id: &str,
    ) -> Result<Vec<DiscoveryResult>, HandlerError> {
        self.scoped_list(&["searches"], company_id, group_id, user_id)
            .await
    }

    async fn get_discovery_result_by_id(
        &self,
        db_id: &str,
        company_id: &str,
        group_id: &str,
        user_id: &str,
    ) -> Result<DiscoveryResult, HandlerError> {
        self.scoped_list(&["searches", db_id], company_id, group_id, user_id)
            .await
    }
}
