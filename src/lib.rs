//! catalog-admin library
//!
//! Client for the catalog admin API built around a throttled request cache.
//! The binary wires these modules together; integration tests use them directly.

pub mod api;
pub mod app;
pub mod cache;
pub mod cli;
pub mod config;
pub mod logging;
