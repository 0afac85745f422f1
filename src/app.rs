//! Application state and command execution
//!
//! `App` is the composition root: it builds the shared request cache, restores
//! it from disk, hands it to the API client, and saves it again when asked.

use serde_json::Value;
use std::io::Write;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

use crate::api::{ApiClient, ApiError, EnvTokenProvider, StaticToken, TokenProvider};
use crate::cache::{RequestCache, SnapshotStore};
use crate::cli::{Action, Settings};

/// Errors surfaced by a command
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),

    #[error("Failed to remove cache snapshot: {0}")]
    Snapshot(std::io::Error),

    #[error("Failed to format output: {0}")]
    Format(#[from] serde_json::Error),
}

/// Main application state
pub struct App {
    /// Client sharing the request cache
    client: ApiClient,
    /// Where the cache is persisted between runs, if anywhere
    snapshots: Option<SnapshotStore>,
    /// Whether reads bypass the cache
    force: bool,
}

impl App {
    /// Creates the application from CLI settings
    ///
    /// Loads the cache snapshot when persistence is enabled; a missing or
    /// unreadable snapshot just means starting with an empty cache.
    pub fn new(settings: &Settings) -> Self {
        let snapshots = if settings.persist {
            settings
                .cache_dir
                .clone()
                .map(SnapshotStore::with_dir)
                .or_else(SnapshotStore::new)
        } else {
            None
        };

        let mut cache = RequestCache::new(settings.api.cache);
        if let Some(snapshot) = snapshots.as_ref().and_then(SnapshotStore::load) {
            debug!(entries = snapshot.entries.len(), "restored cache snapshot");
            cache.restore(snapshot);
        }

        let tokens: Arc<dyn TokenProvider> = match &settings.token {
            Some(token) => Arc::new(StaticToken::new(token.clone())),
            None => Arc::new(EnvTokenProvider::default()),
        };

        Self::with_parts(
            ApiClient::new(&settings.api, Arc::new(Mutex::new(cache)), tokens),
            snapshots,
            settings.force,
        )
    }

    /// Creates the application from already built collaborators
    pub fn with_parts(client: ApiClient, snapshots: Option<SnapshotStore>, force: bool) -> Self {
        Self {
            client,
            snapshots,
            force,
        }
    }

    /// The API client used by this application
    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Runs `action`, writing results to `out`
    ///
    /// JSON results are pretty-printed. A read that was throttled with
    /// nothing cached prints a notice instead of failing.
    pub async fn run(&self, action: Action, out: &mut impl Write) -> Result<(), AppError> {
        match action {
            Action::List(resource) => {
                let data = self.client.fetch_resource(resource, self.force).await?;
                write_read(out, resource.label(), data)?;
            }
            Action::Analytics(view) => {
                let data = self.client.fetch_analytics(&view, self.force).await?;
                write_read(out, &view.path(), data)?;
            }
            Action::Summary => {
                for (resource, data) in self.client.fetch_catalog(self.force).await? {
                    match data.as_ref().map(item_count) {
                        Some(Some(count)) => writeln!(out, "{}: {}", resource, count)?,
                        Some(None) => writeln!(out, "{}: (not a list)", resource)?,
                        None => writeln!(out, "{}: (throttled, try again later)", resource)?,
                    }
                }
            }
            Action::Create(resource, body) => {
                let created = self.client.create(resource, body).await?;
                writeln!(out, "{}", serde_json::to_string_pretty(&created)?)?;
            }
            Action::Update(resource, id, body) => {
                let updated = self.client.update(resource, &id, body).await?;
                writeln!(out, "{}", serde_json::to_string_pretty(&updated)?)?;
            }
            Action::Delete(resource, id) => {
                self.client.delete(resource, &id).await?;
                writeln!(out, "Deleted {} {}", resource, id)?;
            }
            Action::ClearCache => {
                self.client.clear_cache();
                if let Some(store) = &self.snapshots {
                    store.remove().map_err(AppError::Snapshot)?;
                }
                writeln!(out, "Cache cleared")?;
            }
        }
        Ok(())
    }

    /// Saves the cache snapshot; failures are logged, not returned
    ///
    /// An empty cache removes the snapshot instead of writing an empty one.
    pub fn persist(&self) {
        let Some(store) = &self.snapshots else {
            return;
        };
        let snapshot = self
            .client
            .cache()
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .snapshot();
        let result = if snapshot.entries.is_empty() && snapshot.last_fetch.is_empty() {
            store.remove()
        } else {
            store.save(&snapshot)
        };
        if let Err(e) = result {
            warn!(path = %store.path().display(), error = %e, "failed to save cache snapshot");
        }
    }
}

/// Number of items in a listing
///
/// The backend wraps lists as `{"data": [...]}`; a bare array is also accepted.
fn item_count(value: &Value) -> Option<usize> {
    value
        .get("data")
        .unwrap_or(value)
        .as_array()
        .map(Vec::len)
}

/// Prints a cached read, or a notice when the read was throttled
fn write_read(out: &mut impl Write, what: &str, data: Option<Value>) -> Result<(), AppError> {
    match data {
        Some(value) => writeln!(out, "{}", serde_json::to_string_pretty(&value)?)?,
        None => eprintln!(
            "{} was fetched too recently and nothing is cached; try again later or pass --force",
            what
        ),
    }
    Ok(())
}
