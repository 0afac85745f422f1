//! HTTP client for the catalog API
//!
//! Every read goes through [`ApiClient::fetch_with_cache`], which consults the
//! shared [`RequestCache`] before touching the network. Admin writes bypass
//! the cache and clear it once the backend accepts them.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method};
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::auth::TokenProvider;
use super::endpoints::{AnalyticsView, Resource};
use crate::cache::RequestCache;
use crate::config::ApiConfig;

/// Errors that can occur when talking to the catalog API
#[derive(Debug, Error)]
pub enum ApiError {
    /// No response was received (DNS, connection, timeout)
    #[error("HTTP request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// The backend answered with a status outside 2xx
    #[error("HTTP error! status: {status}, body: {body}")]
    Http { status: u16, body: String },

    /// A 2xx response carried a body that is not valid JSON
    #[error("Failed to parse JSON response: {0}")]
    Decode(#[from] serde_json::Error),

    /// A write was attempted without a signed-in user
    #[error("No bearer token available; sign in or set CATALOG_API_TOKEN")]
    MissingToken,

    /// A caller-supplied header name or value is not valid HTTP
    #[error("Invalid header: {0}")]
    InvalidHeader(String),
}

impl ApiError {
    /// HTTP status of the failed response, if there was one
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Method, extra headers and body of a request
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// HTTP method, GET by default
    pub method: Method,
    /// Headers applied after the JSON defaults, replacing them on conflict
    pub headers: Vec<(String, String)>,
    /// JSON body
    pub body: Option<Value>,
}

impl RequestOptions {
    /// A plain GET
    pub fn get() -> Self {
        Self::default()
    }

    /// A request with `method` and a JSON `body`
    pub fn with_body(method: Method, body: Value) -> Self {
        Self {
            method,
            headers: Vec::new(),
            body: Some(body),
        }
    }

    /// Adds a header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Adds an `Authorization: Bearer` header
    pub fn bearer(self, token: &str) -> Self {
        self.header(AUTHORIZATION.as_str(), format!("Bearer {}", token))
    }

    /// Default JSON headers merged with the caller's, caller last
    fn header_map(&self) -> Result<HeaderMap, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        for (name, value) in &self.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| ApiError::InvalidHeader(name.clone()))?;
            let value = HeaderValue::from_str(value)
                .map_err(|_| ApiError::InvalidHeader(format!("{}: {}", name, value)))?;
            headers.insert(name, value);
        }

        Ok(headers)
    }
}

/// Client for the catalog REST API with a shared request cache
///
/// The cache is injected rather than owned so several clients (or a client and
/// a snapshot writer) can share it. Its lock is only held for individual map
/// operations, never across a network call.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    cache: Arc<Mutex<RequestCache>>,
    tokens: Arc<dyn TokenProvider>,
}

impl ApiClient {
    /// Creates a client for `config.base_url`
    pub fn new(
        config: &ApiConfig,
        cache: Arc<Mutex<RequestCache>>,
        tokens: Arc<dyn TokenProvider>,
    ) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.clone(),
            cache,
            tokens,
        }
    }

    /// Replaces the underlying HTTP client
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Resource key for `endpoint`: the fully qualified URL
    pub fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    /// The shared cache this client reads and writes
    pub fn cache(&self) -> &Arc<Mutex<RequestCache>> {
        &self.cache
    }

    fn lock_cache(&self) -> MutexGuard<'_, RequestCache> {
        self.cache.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Fetches `endpoint`, serving from the cache when possible
    ///
    /// A fresh, non-null cache entry is returned without any network call unless
    /// `force` is set. When the entry is missing or expired but the key was fetched
    /// less than the minimum fetch interval ago, the cached value (usually
    /// `None`) is returned instead of an error. Failed requests leave both the
    /// cache and the throttle untouched, so an immediate retry is allowed.
    ///
    /// Two concurrent calls for the same uncached key both reach the network;
    /// in-flight requests are not de-duplicated.
    pub async fn fetch_with_cache(
        &self,
        endpoint: &str,
        options: &RequestOptions,
        force: bool,
    ) -> Result<Option<Value>, ApiError> {
        let key = self.url(endpoint);

        {
            let cache = self.lock_cache();
            // A cached `null` body counts as a miss
            let cached = cache.get(&key).filter(|data| !data.is_null());
            if !force && cached.is_some() {
                debug!(%key, "cache hit");
                return Ok(cached);
            }
            if !cache.can_fetch(&key, force) {
                debug!(%key, "fetch throttled");
                return Ok(cached);
            }
        }

        info!(%key, method = %options.method, force, "fetching");
        let text = self.send(&key, options).await?;
        let data: Value = serde_json::from_str(&text).map_err(|e| {
            warn!(%key, error = %e, "response is not valid JSON");
            ApiError::Decode(e)
        })?;

        let mut cache = self.lock_cache();
        cache.set(&key, data.clone());
        cache.update_last_fetch(&key);

        Ok(Some(data))
    }

    /// Lists a catalog resource
    pub async fn fetch_resource(
        &self,
        resource: Resource,
        force: bool,
    ) -> Result<Option<Value>, ApiError> {
        self.fetch_with_cache(&resource.list_path(), &RequestOptions::get(), force)
            .await
    }

    /// Lists every catalog resource concurrently
    pub async fn fetch_catalog(
        &self,
        force: bool,
    ) -> Result<Vec<(Resource, Option<Value>)>, ApiError> {
        let fetches = Resource::ALL.into_iter().map(|resource| async move {
            let data = self.fetch_resource(resource, force).await?;
            Ok::<_, ApiError>((resource, data))
        });
        futures::future::try_join_all(fetches).await
    }

    /// Reads an analytics report, authenticated when a token is available
    pub async fn fetch_analytics(
        &self,
        view: &AnalyticsView,
        force: bool,
    ) -> Result<Option<Value>, ApiError> {
        let mut options = RequestOptions::get();
        if let Some(token) = self.tokens.token().await {
            options = options.bearer(&token);
        }
        self.fetch_with_cache(&view.path(), &options, force).await
    }

    /// Drops every cached response and throttle record
    pub fn clear_cache(&self) {
        debug!("clearing request cache");
        self.lock_cache().clear();
    }

    /// Creates an item
    pub async fn create(&self, resource: Resource, body: Value) -> Result<Value, ApiError> {
        self.write(Method::POST, &resource.create_path(), Some(body))
            .await
    }

    /// Replaces the fields of item `id`
    pub async fn update(
        &self,
        resource: Resource,
        id: &str,
        body: Value,
    ) -> Result<Value, ApiError> {
        self.write(Method::PUT, &resource.item_path(id), Some(body))
            .await
    }

    /// Deletes item `id`
    pub async fn delete(&self, resource: Resource, id: &str) -> Result<Value, ApiError> {
        self.write(Method::DELETE, &resource.item_path(id), None)
            .await
    }

    /// Sends an authenticated write and invalidates the cache on success
    async fn write(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<Value>,
    ) -> Result<Value, ApiError> {
        let token = self.tokens.token().await.ok_or(ApiError::MissingToken)?;
        let options = RequestOptions {
            method,
            headers: Vec::new(),
            body,
        }
        .bearer(&token);

        let url = self.url(endpoint);
        info!(%url, method = %options.method, "sending write");
        let text = self.send(&url, &options).await?;
        self.clear_cache();

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    /// Performs one request and returns the body of a 2xx response
    async fn send(&self, url: &str, options: &RequestOptions) -> Result<String, ApiError> {
        let mut request = self
            .client
            .request(options.method.clone(), url)
            .headers(options.header_map()?);
        if let Some(body) = &options.body {
            request = request.body(serde_json::to_vec(body)?);
        }

        let response = request.send().await.map_err(|e| {
            warn!(%url, error = %e, "request failed");
            ApiError::Network(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%url, status = status.as_u16(), "request returned error status");
            return Err(ApiError::Http {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.text().await?)
    }
}
