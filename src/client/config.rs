use std::collections::HashMap;
use std::env;
use std::time::Duration;

use super::backoff::RetryPolicy;

const DEFAULT_ORIGIN: &str = "http://localhost:3000";
const DEFAULT_TIMEOUT_MS: u64 = 20_000;
const DEFAULT_REFRESH_THRESHOLD_SECS: u64 = 600;
const DEFAULT_KEEPALIVE_SECS: u64 = 240;

/// Client-side settings: where the gateway lives and how hard to try.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Gateway base, e.g. `http://localhost:3000/api`, without trailing slash
    pub base_url: String,
    /// Resource name remapping applied by the entity API
    pub resource_map: HashMap<String, String>,
    /// Extra header attached to every request
    pub auth_header: Option<(String, String)>,
    /// Static bearer token; takes precedence over the session token
    pub static_token: Option<String>,
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
    /// Refresh before a request when the access token expires sooner than this
    pub refresh_threshold: Duration,
    pub keepalive_interval: Duration,
    pub auth_url: Option<String>,
    pub auth_anon_key: Option<String>,
}

impl ClientConfig {
    /// Defaults pointed at `base_url`.
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            resource_map: HashMap::new(),
            auth_header: None,
            static_token: None,
            request_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            retry: RetryPolicy::default(),
            refresh_threshold: Duration::from_secs(DEFAULT_REFRESH_THRESHOLD_SECS),
            keepalive_interval: Duration::from_secs(DEFAULT_KEEPALIVE_SECS),
            auth_url: None,
            auth_anon_key: None,
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let number = |key: &str| var(key).and_then(|v| v.trim().parse::<u64>().ok());

        let base_url = var("API_BASE_URL").unwrap_or_else(|| {
            let origin = var("API_ORIGIN").unwrap_or_else(|| DEFAULT_ORIGIN.to_string());
            format!("{}/api", origin.trim_end_matches('/'))
        });
        let mut config = Self::new(&base_url);

        if let Some(raw) = var("API_RESOURCE_MAP") {
            match serde_json::from_str::<HashMap<String, String>>(&raw) {
                Ok(map) => config.resource_map = map,
                Err(e) => tracing::warn!("ignoring malformed API_RESOURCE_MAP: {}", e),
            }
        }
        if let (Some(name), Some(value)) = (var("API_AUTH_HEADER"), var("API_AUTH_VALUE")) {
            config.auth_header = Some((name, value));
        }
        config.static_token = var("API_TOKEN");

        if let Some(ms) = number("API_REQUEST_TIMEOUT_MS") {
            config.request_timeout = Duration::from_millis(ms);
        }
        if let Some(n) = number("API_RETRY_MAX_ATTEMPTS") {
            config.retry.max_attempts = n as u32;
        }
        if let Some(ms) = number("API_RETRY_START_DELAY_MS") {
            config.retry.start_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = number("API_RETRY_MAX_DELAY_MS") {
            config.retry.max_delay = Duration::from_millis(ms);
        }
        if let Some(n) = number("API_RETRY_MULTIPLIER") {
            config.retry.multiplier = n as u32;
        }
        if let Some(secs) = number("TOKEN_REFRESH_THRESHOLD_SECS") {
            config.refresh_threshold = Duration::from_secs(secs);
        }
        if let Some(secs) = number("SESSION_REFRESH_INTERVAL_SECS") {
            config.keepalive_interval = Duration::from_secs(secs);
        }
        config.auth_url = var("SUPABASE_URL").map(|u| u.trim_end_matches('/').to_string());
        config.auth_anon_key = var("SUPABASE_ANON_KEY");

        config
    }

    /// Public resource name after remapping.
    pub fn resource_path(&self, resource: &str) -> String {
        let mapped = self.resource_map.get(resource).map(String::as_str).unwrap_or(resource);
        format!("/{}", mapped)
    }
}
