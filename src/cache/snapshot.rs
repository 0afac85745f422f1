//! On-disk persistence for the request cache
//!
//! The CLI is a short-lived process, so it saves a [`CacheSnapshot`] after each
//! command and restores it on the next run. Timestamps are stored as-is, which
//! keeps both the freshness and the throttle windows meaningful across runs.

use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

use super::store::CacheSnapshot;

/// File name of the snapshot inside the cache directory
const SNAPSHOT_FILE: &str = "request-cache.json";

/// Reads and writes cache snapshots in a directory
///
/// Defaults to an XDG-compliant cache directory (`~/.cache/catalog-admin/` on
/// Linux).
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    /// Directory where the snapshot file lives
    cache_dir: PathBuf,
}

impl SnapshotStore {
    /// Creates a store in the platform cache directory
    ///
    /// Returns `None` if the cache directory cannot be determined (e.g., no home directory).
    pub fn new() -> Option<Self> {
        let project_dirs = ProjectDirs::from("", "", "catalog-admin")?;
        let cache_dir = project_dirs.cache_dir().to_path_buf();
        Some(Self { cache_dir })
    }

    /// Creates a store in a custom directory
    pub fn with_dir(cache_dir: PathBuf) -> Self {
        Self { cache_dir }
    }

    /// Full path of the snapshot file
    pub fn path(&self) -> PathBuf {
        self.cache_dir.join(SNAPSHOT_FILE)
    }

    /// Writes `snapshot`, creating the directory if needed
    pub fn save(&self, snapshot: &CacheSnapshot) -> std::io::Result<()> {
        fs::create_dir_all(&self.cache_dir)?;

        let json = serde_json::to_string_pretty(snapshot)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        fs::write(self.path(), json)
    }

    /// Reads the snapshot
    ///
    /// Returns `None` if the file doesn't exist or cannot be parsed.
    pub fn load(&self) -> Option<CacheSnapshot> {
        let content = fs::read_to_string(self.path()).ok()?;
        match serde_json::from_str(&content) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                tracing::warn!(path = %self.path().display(), error = %e, "ignoring unreadable cache snapshot");
                None
            }
        }
    }

    /// Deletes the snapshot file; a missing file is not an error
    pub fn remove(&self) -> std::io::Result<()> {
        match fs::remove_file(self.path()) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }

    /// Directory the snapshot is stored in
    pub fn dir(&self) -> &Path {
        &self.cache_dir
    }
}
