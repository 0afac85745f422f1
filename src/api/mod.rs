//! Catalog API access
//!
//! This module contains the resource paths of the backend, the bearer token
//! capability used for admin writes, and the cached HTTP client.

pub mod auth;
pub mod client;
pub mod endpoints;

pub use auth::{EnvTokenProvider, StaticToken, TokenProvider};
pub use client::{ApiClient, ApiError, RequestOptions};
pub use endpoints::{AnalyticsView, Resource, DEFAULT_ANALYTICS_SITE};
