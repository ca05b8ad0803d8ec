//! Storage and File System Abstractions
//!
//! The disk cache tier only needs a handful of filesystem verbs. Keeping them
//! behind a trait lets tests inject failures that are awkward to provoke on a
//! real filesystem.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

use crate::error::Result;

#[derive(Debug, Clone)]
pub struct FileMetadata {
    pub size: u64,
    pub created_at: Option<DateTime<Utc>>,
    pub modified_at: Option<DateTime<Utc>>,
    pub is_directory: bool,
}

impl FileMetadata {
    /// Timestamp used for age checks.
    ///
    /// Prefers the creation time and falls back to the modification time on
    /// filesystems that do not record birth times.
    pub fn age_reference(&self) -> Option<DateTime<Utc>> {
        self.created_at.or(self.modified_at)
    }
}

#[async_trait]
pub trait FileSystemAccess: Send + Sync {
    async fn exists(&self, path: &Path) -> Result<bool>;

    async fn metadata(&self, path: &Path) -> Result<FileMetadata>;

    /// Creates `path` and any missing parents. Succeeds if it already exists.
    async fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Moves `from` to `to`, atomically replacing any existing destination.
    ///
    /// Readers of `to` see either the previous file or the moved one, never a
    /// missing or partial file.
    async fn move_file(&self, from: &Path, to: &Path) -> Result<()>;

    async fn delete_file(&self, path: &Path) -> Result<()>;

    async fn list_directory(&self, path: &Path) -> Result<Vec<PathBuf>>;
}
