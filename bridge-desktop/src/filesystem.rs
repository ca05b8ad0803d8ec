//! File System Access Implementation using Tokio

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::{FileMetadata, FileSystemAccess},
};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct TokioFileSystem;

impl TokioFileSystem {
    pub fn new() -> Self {
        Self
    }

    fn map_io_error(e: std::io::Error) -> BridgeError {
        BridgeError::Io(e)
    }

    fn to_utc(time: std::io::Result<SystemTime>) -> Option<DateTime<Utc>> {
        time.ok().map(DateTime::<Utc>::from)
    }
}

#[async_trait]
impl FileSystemAccess for TokioFileSystem {
    async fn exists(&self, path: &Path) -> Result<bool> {
        fs::try_exists(path).await.map_err(Self::map_io_error)
    }

    async fn metadata(&self, path: &Path) -> Result<FileMetadata> {
        let metadata = fs::metadata(path).await.map_err(Self::map_io_error)?;

        Ok(FileMetadata {
            size: metadata.len(),
            created_at: Self::to_utc(metadata.created()),
            modified_at: Self::to_utc(metadata.modified()),
            is_directory: metadata.is_dir(),
        })
    }

    async fn create_dir_all(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path)
            .await
            .map_err(Self::map_io_error)?;
        debug!(path = ?path, "Created directory");
        Ok(())
    }

    async fn move_file(&self, from: &Path, to: &Path) -> Result<()> {
        match fs::rename(from, to).await {
            Ok(()) => {
                debug!(from = ?from, to = ?to, "Moved file");
                Ok(())
            }
            Err(rename_err) => {
                // rename(2) cannot cross filesystems; fall back to copying
                // next to the destination and renaming over it.
                if !fs::try_exists(from).await.unwrap_or(false) {
                    return Err(Self::map_io_error(rename_err));
                }
                let parent = to.parent().unwrap_or_else(|| Path::new("."));
                let sibling = tempfile::Builder::new()
                    .prefix(".move-")
                    .tempfile_in(parent)
                    .map_err(Self::map_io_error)?;
                fs::copy(from, sibling.path())
                    .await
                    .map_err(Self::map_io_error)?;
                sibling.persist(to).map_err(|e| Self::map_io_error(e.error))?;
                fs::remove_file(from).await.map_err(Self::map_io_error)?;
                debug!(from = ?from, to = ?to, "Moved file across filesystems");
                Ok(())
            }
        }
    }

    async fn delete_file(&self, path: &Path) -> Result<()> {
        fs::remove_file(path).await.map_err(Self::map_io_error)?;
        debug!(path = ?path, "Deleted file");
        Ok(())
    }

    async fn list_directory(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let mut entries = Vec::new();
        let mut read_dir = fs::read_dir(path).await.map_err(Self::map_io_error)?;

        while let Some(entry) = read_dir
            .next_entry()
            .await
            .map_err(Self::map_io_error)?
        {
            entries.push(entry.path());
        }

        debug!(path = ?path, count = entries.len(), "Listed directory");
        Ok(entries)
    }
}
