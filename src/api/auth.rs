//! Bearer tokens for admin requests
//!
//! The identity provider is external; the client only needs something that can
//! hand it a token when a write is about to happen.

use async_trait::async_trait;

/// Environment variable read by [`EnvTokenProvider`]
pub const TOKEN_ENV_VAR: &str = "CATALOG_API_TOKEN";

/// Supplies bearer tokens on demand
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Returns a token, or `None` when nobody is signed in
    async fn token(&self) -> Option<String>;
}

/// A fixed token, or none at all
#[derive(Debug, Clone, Default)]
pub struct StaticToken(Option<String>);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Some(token.into()))
    }

    /// A provider that never yields a token
    pub fn none() -> Self {
        Self(None)
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn token(&self) -> Option<String> {
        self.0.clone()
    }
}

/// Reads the token from an environment variable at request time
#[derive(Debug, Clone)]
pub struct EnvTokenProvider {
    var: String,
}

impl Default for EnvTokenProvider {
    fn default() -> Self {
        Self::new(TOKEN_ENV_VAR)
    }
}

impl EnvTokenProvider {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

#[async_trait]
impl TokenProvider for EnvTokenProvider {
    async fn token(&self) -> Option<String> {
        std::env::var(&self.var).ok().filter(|t| !t.trim().is_empty())
    }
}
