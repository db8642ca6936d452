use std::env;

/// AppConfig
///
/// Holds the gateway's configuration state. Immutable once loaded and pulled into
/// handlers and extractors through `FromRef`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls log format and secret requirements.
    pub env: Env,
    // HMAC secret used to verify the JWT carried in the `authorization` header.
    pub jwt_secret: String,
    // Socket address the HTTP server binds to.
    pub bind_addr: String,
    // Optional prefix under which the profile endpoints are mounted (e.g. "/cafyne").
    pub service_root: String,
    // Base URL of a remote profile engine. When absent the in-memory handler is used.
    pub handler_url: Option<String>,
    // JSON file of known profiles seeding the in-memory discovery catalog.
    pub catalog_path: Option<String>,
    // When true, "delete search" requests are scoped to the caller like every other mutation.
    pub scope_search_deletes: bool,
}

/// Env
///
/// Runtime context: pretty logs and a fallback secret locally, JSON logs and
/// mandatory secrets in production.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

const LOCAL_JWT_SECRET: &str = "profile-gateway-local-secret";

impl Default for AppConfig {
    /// Safe, non-panicking values for test state setup.
    fn default() -> Self {
        Self {
            env: Env::Local,
            jwt_secret: LOCAL_JWT_SECRET.to_string(),
            bind_addr: "0.0.0.0:3000".to_string(),
            service_root: String::new(),
            handler_url: None,
            catalog_path: None,
            scope_search_deletes: false,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables at startup.
    ///
    /// # Panics
    /// Panics in production when `AUTH_JWT_SECRET` is not set, so the service never
    /// starts verifying tokens against a well-known development secret.
    pub fn load() -> Self {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let jwt_secret = match env {
            Env::Production => env::var("AUTH_JWT_SECRET")
                .expect("FATAL: AUTH_JWT_SECRET must be set in production."),
            Env::Local => {
                env::var("AUTH_JWT_SECRET").unwrap_or_else(|_| LOCAL_JWT_SECRET.to_string())
            }
        };

        Self {
            env,
            jwt_secret,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
            service_root: normalize_root(&env::var("SERVICE_ROOT").unwrap_or_default()),
            handler_url: non_empty(env::var("PROFILE_HANDLER_URL").ok()),
            catalog_path: non_empty(env::var("PROFILE_CATALOG_PATH").ok()),
            scope_search_deletes: env::var("SCOPE_SEARCH_DELETES")
                .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
        }
    }
}

/// Strips trailing slashes and guarantees a leading one. "" and "/" both mean "no prefix".
fn normalize_root(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
