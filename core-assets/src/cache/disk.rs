//! # Disk Cache Tier
//!
//! Durable key to file store with time-based expiry.
//!
//! ## Layout
//!
//! ```text
//! <root>/asset-cache/<CacheKey::file_name()>
//! ```
//!
//! There is no index. The presence of a file is the cache entry, and its
//! creation time (modification time where the filesystem records no birth
//! time) is the entry's age.
//!
//! ## Failure policy
//!
//! Every filesystem failure is logged and swallowed. A broken disk tier
//! degrades to misses; it never fails the caller.

use async_trait::async_trait;
use bridge_traits::storage::FileSystemAccess;
use bridge_traits::time::Clock;
use chrono::Duration as ChronoDuration;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

use super::key::CacheKey;
use super::operator::CacheOperator;

/// Name of the directory created under the cache root.
pub const CACHE_SUBDIRECTORY: &str = "asset-cache";

/// Seven days.
pub const DEFAULT_TIME_TO_LIVE: Duration = core_runtime::config::DEFAULT_DISK_CACHE_TTL;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskCacheConfig {
    pub root: PathBuf,
    pub time_to_live: Duration,
}

impl DiskCacheConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            time_to_live: DEFAULT_TIME_TO_LIVE,
        }
    }

    pub fn with_time_to_live(mut self, time_to_live: Duration) -> Self {
        self.time_to_live = time_to_live;
        self
    }

    pub fn directory(&self) -> PathBuf {
        self.root.join(CACHE_SUBDIRECTORY)
    }
}

/// L2 cache tier. Values are file locations; `save` takes ownership of the
/// file by moving it into the cache directory.
pub struct DiskCache {
    directory: PathBuf,
    time_to_live: ChronoDuration,
    fs: Arc<dyn FileSystemAccess>,
    clock: Arc<dyn Clock>,
}

impl DiskCache {
    /// Opens the cache: creates the directory if needed, then removes every
    /// entry that has already outlived its time-to-live.
    pub async fn open(
        config: DiskCacheConfig,
        fs: Arc<dyn FileSystemAccess>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let directory = config.directory();
        // Durations too large for chrono never expire.
        let time_to_live =
            ChronoDuration::from_std(config.time_to_live).unwrap_or(ChronoDuration::MAX);

        let cache = Self {
            directory,
            time_to_live,
            fs,
            clock,
        };

        match cache.fs.create_dir_all(&cache.directory).await {
            Ok(()) => {
                cache.sweep_expired().await;
            }
            Err(e) => {
                error!(
                    directory = ?cache.directory,
                    error = %e,
                    "Failed to create disk cache directory"
                );
            }
        }

        cache
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Where `key` lives on disk, whether or not it is cached.
    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.directory.join(key.file_name())
    }

    /// Removes every expired (or unreadable) entry. Returns how many files
    /// were deleted.
    #[instrument(skip(self), fields(directory = ?self.directory))]
    pub async fn sweep_expired(&self) -> usize {
        let entries = match self.fs.list_directory(&self.directory).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "Failed to list disk cache directory");
                return 0;
            }
        };

        let mut removed = 0;
        for path in entries {
            let expired = match self.fs.metadata(&path).await {
                Ok(metadata) if metadata.is_directory => continue,
                Ok(metadata) => self.is_expired(metadata.age_reference()),
                Err(_) => true,
            };

            if expired && self.delete(&path).await {
                removed += 1;
            }
        }

        if removed > 0 {
            info!(removed, "Removed expired disk cache entries");
        }
        removed
    }

    /// Deletes the entry for `key`. Returns `true` if a file was removed.
    pub async fn remove(&self, key: &CacheKey) -> bool {
        let path = self.path_for(key);
        match self.fs.exists(&path).await {
            Ok(true) => self.delete(&path).await,
            _ => false,
        }
    }

    /// Deletes every entry. Returns how many files were deleted.
    pub async fn clear(&self) -> usize {
        let entries = match self.fs.list_directory(&self.directory).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "Failed to list disk cache directory");
                return 0;
            }
        };

        let mut removed = 0;
        for path in entries {
            if self.delete(&path).await {
                removed += 1;
            }
        }
        removed
    }

    fn is_expired(&self, created_at: Option<chrono::DateTime<chrono::Utc>>) -> bool {
        match created_at {
            Some(created_at) => self.clock.now() - created_at >= self.time_to_live,
            None => true,
        }
    }

    async fn delete(&self, path: &Path) -> bool {
        match self.fs.delete_file(path).await {
            Ok(()) => true,
            Err(e) if e.is_not_found() => {
                debug!(path = ?path, "Disk cache entry already gone");
                false
            }
            Err(e) => {
                warn!(path = ?path, error = %e, "Failed to delete disk cache entry");
                false
            }
        }
    }
}

#[async_trait]
impl CacheOperator<PathBuf> for DiskCache {
    #[instrument(skip(self, value), fields(key = %key))]
    async fn save(&self, value: PathBuf, key: &CacheKey) {
        let destination = self.path_for(key);
        if value == destination {
            return;
        }

        // The move replaces any previous entry in one step, so a reader
        // holding this path sees either the old file or the new one.
        match self.fs.move_file(&value, &destination).await {
            Ok(()) => debug!(path = ?destination, "Stored in disk cache"),
            Err(e) => error!(
                source = ?value,
                destination = ?destination,
                error = %e,
                "Failed to move file into disk cache"
            ),
        }
    }

    #[instrument(skip(self), fields(key = %key))]
    async fn retrieve(&self, key: &CacheKey) -> Option<PathBuf> {
        let path = self.path_for(key);

        match self.fs.exists(&path).await {
            Ok(true) => {}
            Ok(false) => return None,
            Err(e) => {
                warn!(path = ?path, error = %e, "Failed to check disk cache entry");
                return None;
            }
        }

        let created_at = match self.fs.metadata(&path).await {
            Ok(metadata) => metadata.age_reference(),
            Err(e) => {
                warn!(path = ?path, error = %e, "Unreadable disk cache metadata");
                None
            }
        };

        if self.is_expired(created_at) {
            debug!(path = ?path, "Disk cache entry expired");
            self.delete(&path).await;
            return None;
        }

        Some(path)
    }
}
