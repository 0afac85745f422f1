//! Command-line interface parsing for catalog-admin
//!
//! This module handles parsing of CLI arguments using clap and turns them into
//! a [`Settings`] value for wiring up the client and an [`Action`] to run.

use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::api::{AnalyticsView, Resource, DEFAULT_ANALYTICS_SITE};
use crate::config::{ApiConfig, CacheConfig, Environment};

/// Error types for CLI argument parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// The specified resource name is not recognized
    #[error("Invalid resource: '{0}'. Valid resources: products, categories, presentations, banners")]
    InvalidResource(String),

    /// The --data argument is not valid JSON
    #[error("Invalid JSON in --data: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// catalog-admin - Manage the product catalog API from the terminal
#[derive(Parser, Debug)]
#[command(name = "catalog-admin")]
#[command(about = "Administer the multi-site product catalog API")]
#[command(version)]
pub struct Cli {
    /// Base URL of the API (overrides --env)
    #[arg(long, env = "CATALOG_API_URL", global = true)]
    pub base_url: Option<String>,

    /// Deployment to use when no base URL is given
    #[arg(long, value_enum, default_value_t = Environment::Production, global = true)]
    pub env: Environment,

    /// Bearer token for admin writes (defaults to $CATALOG_API_TOKEN)
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Skip the cache and the fetch throttle
    #[arg(long, global = true)]
    pub force: bool,

    /// Do not load or save the on-disk cache snapshot
    #[arg(long, global = true)]
    pub no_persist: bool,

    /// Directory for the cache snapshot
    #[arg(long, value_name = "DIR", global = true)]
    pub cache_dir: Option<PathBuf>,

    /// How long cached responses stay fresh, in seconds
    #[arg(long, value_name = "SECS", global = true)]
    pub cache_secs: Option<u64>,

    /// Minimum seconds between fetches of the same resource
    #[arg(long, value_name = "SECS", global = true)]
    pub throttle_secs: Option<u64>,

    /// Log cache and network activity to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List a catalog resource
    ///
    /// Valid resources: products, categories, presentations, banners
    List { resource: String },

    /// Show analytics reports
    Analytics {
        #[command(subcommand)]
        report: AnalyticsCommand,
    },

    /// Count every catalog resource
    Summary,

    /// Create an item from a JSON object
    Create {
        resource: String,
        #[arg(long, value_name = "JSON")]
        data: String,
    },

    /// Update an item from a JSON object
    Update {
        resource: String,
        id: String,
        #[arg(long, value_name = "JSON")]
        data: String,
    },

    /// Delete an item
    Delete { resource: String, id: String },

    /// Forget every cached response and throttle record
    ClearCache,
}

#[derive(Subcommand, Debug)]
pub enum AnalyticsCommand {
    /// Overview for one site
    Overview {
        #[arg(long, default_value = DEFAULT_ANALYTICS_SITE)]
        site: String,
    },
    /// Event list for one site
    Events {
        #[arg(long, default_value = DEFAULT_ANALYTICS_SITE)]
        site: String,
    },
    /// Overview across all sites
    Combined,
}

/// A validated command ready to run
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    List(Resource),
    Analytics(AnalyticsView),
    Summary,
    Create(Resource, Value),
    Update(Resource, String, Value),
    Delete(Resource, String),
    ClearCache,
}

/// Client wiring derived from CLI arguments
#[derive(Debug, Clone)]
pub struct Settings {
    /// API location and cache policy
    pub api: ApiConfig,
    /// Explicit bearer token, if given on the command line
    pub token: Option<String>,
    /// Whether reads bypass the cache
    pub force: bool,
    /// Whether to load and save the cache snapshot
    pub persist: bool,
    /// Custom snapshot directory
    pub cache_dir: Option<PathBuf>,
}

/// Parses a resource argument into a Resource.
///
/// # Returns
/// * `Ok(Resource)` if the string names a catalog resource
/// * `Err(CliError::InvalidResource)` if it doesn't
pub fn parse_resource_arg(s: &str) -> Result<Resource, CliError> {
    Resource::from_name(s).ok_or_else(|| CliError::InvalidResource(s.to_string()))
}

/// Parses a --data argument as JSON
pub fn parse_json_arg(s: &str) -> Result<Value, CliError> {
    Ok(serde_json::from_str(s)?)
}

impl Settings {
    /// Creates Settings from parsed CLI arguments.
    pub fn from_cli(cli: &Cli) -> Self {
        let base_url = cli
            .base_url
            .clone()
            .unwrap_or_else(|| cli.env.base_url().to_string());

        let defaults = CacheConfig::default();
        let cache = CacheConfig {
            cache_duration: cli
                .cache_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.cache_duration),
            min_fetch_interval: cli
                .throttle_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.min_fetch_interval),
        };

        Settings {
            api: ApiConfig::new(base_url).with_cache(cache),
            token: cli.token.clone(),
            force: cli.force,
            persist: !cli.no_persist,
            cache_dir: cli.cache_dir.clone(),
        }
    }
}

impl Cli {
    /// Validates the subcommand into an Action.
    pub fn action(&self) -> Result<Action, CliError> {
        let action = match &self.command {
            Command::List { resource } => Action::List(parse_resource_arg(resource)?),
            Command::Analytics { report } => Action::Analytics(match report {
                AnalyticsCommand::Overview { site } => AnalyticsView::Overview { site: site.clone() },
                AnalyticsCommand::Events { site } => AnalyticsView::Events { site: site.clone() },
                AnalyticsCommand::Combined => AnalyticsView::Combined,
            }),
            Command::Summary => Action::Summary,
            Command::Create { resource, data } => {
                Action::Create(parse_resource_arg(resource)?, parse_json_arg(data)?)
            }
            Command::Update { resource, id, data } => Action::Update(
                parse_resource_arg(resource)?,
                id.clone(),
                parse_json_arg(data)?,
            ),
            Command::Delete { resource, id } => {
                Action::Delete(parse_resource_arg(resource)?, id.clone())
            }
            Command::ClearCache => Action::ClearCache,
        };
        Ok(action)
    }
}
