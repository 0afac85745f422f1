//! Client configuration
//!
//! Holds the API base URL and the two cache policy windows. Values are
//! resolved from CLI flags and environment variables in [`crate::cli`].

use std::time::Duration;

/// Production backend
pub const PRODUCTION_API_URL: &str = "https://oregonchem-backend.onrender.com";

/// Local development backend
pub const DEVELOPMENT_API_URL: &str = "http://localhost:5001";

/// Freshness and throttle windows for the request cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// How long a cached response is served without a network call
    pub cache_duration: Duration,
    /// Minimum spacing between network fetches of the same resource
    pub min_fetch_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_duration: Duration::from_secs(5 * 60),   // 5 minutes
            min_fetch_interval: Duration::from_secs(30),   // 30 seconds
        }
    }
}

/// Deployment the client talks to when no explicit base URL is given
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum Environment {
    Development,
    #[default]
    Production,
}

impl Environment {
    /// Base URL of this deployment
    pub fn base_url(self) -> &'static str {
        match self {
            Environment::Development => DEVELOPMENT_API_URL,
            Environment::Production => PRODUCTION_API_URL,
        }
    }
}

/// Everything an [`crate::api::ApiClient`] needs besides its collaborators
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Scheme and host of the backend, without a trailing slash
    pub base_url: String,
    /// Cache policy
    pub cache: CacheConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::new(Environment::default().base_url())
    }
}

impl ApiConfig {
    /// Creates a config for `base_url` with the default cache policy
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: normalize_base_url(base_url.into()),
            cache: CacheConfig::default(),
        }
    }

    /// Replaces the cache policy
    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }
}

/// Strips trailing slashes so `base + "/api/..."` yields one key per resource
fn normalize_base_url(mut url: String) -> String {
    while url.ends_with('/') {
        url.pop();
    }
    url
}
