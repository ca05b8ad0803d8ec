//! Two-tier cache composition.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, trace};

use super::key::CacheKey;
use super::operator::CacheOperator;

/// Memory tier in front of a disk tier, itself a [`CacheOperator`].
///
/// `save` writes memory then disk. `retrieve` answers from memory when it
/// can; on a memory miss a disk hit is copied into memory before returning,
/// so the next lookup for the key never touches disk.
///
/// For file locations the memory tier should be
/// [`scoped_to`](super::memory::MemoryCache::scoped_to) the disk directory.
/// The value handed to `save` is then only reachable once the disk tier has
/// moved it into place, and every hit is a disk cache path.
pub struct CacheEngine<V> {
    memory: Arc<dyn CacheOperator<V>>,
    disk: Arc<dyn CacheOperator<V>>,
}

impl<V> CacheEngine<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new(memory: Arc<dyn CacheOperator<V>>, disk: Arc<dyn CacheOperator<V>>) -> Self {
        Self { memory, disk }
    }

    pub fn memory(&self) -> &Arc<dyn CacheOperator<V>> {
        &self.memory
    }

    pub fn disk(&self) -> &Arc<dyn CacheOperator<V>> {
        &self.disk
    }
}

impl<V> Clone for CacheEngine<V> {
    fn clone(&self) -> Self {
        Self {
            memory: self.memory.clone(),
            disk: self.disk.clone(),
        }
    }
}

#[async_trait]
impl<V> CacheOperator<V> for CacheEngine<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn save(&self, value: V, key: &CacheKey) {
        self.memory.save(value.clone(), key).await;
        self.disk.save(value, key).await;
    }

    async fn retrieve(&self, key: &CacheKey) -> Option<V> {
        if let Some(value) = self.memory.retrieve(key).await {
            trace!(key = %key, "Memory tier hit");
            return Some(value);
        }

        let value = self.disk.retrieve(key).await?;
        debug!(key = %key, "Disk tier hit, promoting to memory");
        self.memory.save(value.clone(), key).await;
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::disk::{DiskCache, DiskCacheConfig};
    use crate::cache::memory::MemoryCache;
    use bridge_desktop::TokioFileSystem;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::storage::{FileMetadata, FileSystemAccess};
    use bridge_traits::time::SystemClock;
    use bytes::Bytes;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;
    use tokio::sync::Notify;

    #[derive(Default)]
    struct RecordingTier {
        values: Mutex<HashMap<String, Bytes>>,
        saves: AtomicUsize,
        retrieves: AtomicUsize,
    }

    impl RecordingTier {
        fn saves(&self) -> usize {
            self.saves.load(Ordering::SeqCst)
        }

        fn retrieves(&self) -> usize {
            self.retrieves.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CacheOperator<Bytes> for RecordingTier {
        async fn save(&self, value: Bytes, key: &CacheKey) {
            self.saves.fetch_add(1, Ordering::SeqCst);
            self.values.lock().insert(key.value().to_string(), value);
        }

        async fn retrieve(&self, key: &CacheKey) -> Option<Bytes> {
            self.retrieves.fetch_add(1, Ordering::SeqCst);
            self.values.lock().get(key.value()).cloned()
        }
    }

    fn engine() -> (Arc<RecordingTier>, Arc<RecordingTier>, CacheEngine<Bytes>) {
        let memory = Arc::new(RecordingTier::default());
        let disk = Arc::new(RecordingTier::default());
        let engine = CacheEngine::new(memory.clone(), disk.clone());
        (memory, disk, engine)
    }

    #[tokio::test]
    async fn test_save_writes_both_tiers() {
        let (memory, disk, engine) = engine();
        let key = CacheKey::new("warship");

        engine.save(Bytes::from_static(b"model-data"), &key).await;

        assert_eq!(memory.saves(), 1);
        assert_eq!(disk.saves(), 1);
    }

    #[tokio::test]
    async fn test_read_through_skips_disk() {
        let (_memory, disk, engine) = engine();

        for i in 0..5 {
            let key = CacheKey::new(format!("asset-{}", i));
            let value = Bytes::from(format!("value-{}", i));

            engine.save(value.clone(), &key).await;
            assert_eq!(engine.retrieve(&key).await, Some(value));
        }

        assert_eq!(disk.retrieves(), 0);
    }

    #[tokio::test]
    async fn test_disk_hit_promotes_to_memory() {
        let (memory, disk, engine) = engine();
        let key = CacheKey::new("warship");

        disk.save(Bytes::from_static(b"model-data"), &key).await;

        assert_eq!(
            engine.retrieve(&key).await,
            Some(Bytes::from_static(b"model-data"))
        );
        assert_eq!(
            memory.retrieve(&key).await,
            Some(Bytes::from_static(b"model-data"))
        );

        let disk_reads = disk.retrieves();
        engine.retrieve(&key).await;
        assert_eq!(disk.retrieves(), disk_reads);
    }

    #[tokio::test]
    async fn test_miss_in_both_tiers() {
        let (memory, disk, engine) = engine();

        assert_eq!(engine.retrieve(&CacheKey::new("absent")).await, None);
        assert_eq!(memory.saves(), 0);
        assert_eq!(disk.retrieves(), 1);
    }

    /// Real filesystem whose moves wait until released.
    #[derive(Default)]
    struct GatedFileSystem {
        inner: TokioFileSystem,
        move_started: Notify,
        release: Notify,
    }

    #[async_trait]
    impl FileSystemAccess for GatedFileSystem {
        async fn exists(&self, path: &Path) -> BridgeResult<bool> {
            self.inner.exists(path).await
        }

        async fn metadata(&self, path: &Path) -> BridgeResult<FileMetadata> {
            self.inner.metadata(path).await
        }

        async fn create_dir_all(&self, path: &Path) -> BridgeResult<()> {
            self.inner.create_dir_all(path).await
        }

        async fn move_file(&self, from: &Path, to: &Path) -> BridgeResult<()> {
            self.move_started.notify_one();
            self.release.notified().await;
            self.inner.move_file(from, to).await
        }

        async fn delete_file(&self, path: &Path) -> BridgeResult<()> {
            self.inner.delete_file(path).await
        }

        async fn list_directory(&self, path: &Path) -> BridgeResult<Vec<PathBuf>> {
            self.inner.list_directory(path).await
        }
    }

    struct FileStack {
        _root: TempDir,
        staging: TempDir,
        memory: Arc<MemoryCache<PathBuf>>,
        disk: Arc<DiskCache>,
        engine: Arc<CacheEngine<PathBuf>>,
    }

    async fn file_stack(fs: Arc<dyn FileSystemAccess>) -> FileStack {
        let root = TempDir::new().unwrap();
        let disk = Arc::new(
            DiskCache::open(DiskCacheConfig::new(root.path()), fs, Arc::new(SystemClock)).await,
        );
        let memory = Arc::new(MemoryCache::new(1024).scoped_to(disk.directory()));
        let engine = Arc::new(CacheEngine::new(memory.clone(), disk.clone()));
        FileStack {
            _root: root,
            staging: TempDir::new().unwrap(),
            memory,
            disk,
            engine,
        }
    }

    fn stage(stack: &FileStack, name: &str, contents: &[u8]) -> PathBuf {
        let path = stack.staging.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[tokio::test]
    async fn test_file_locations_resolve_to_disk_path() {
        let stack = file_stack(Arc::new(TokioFileSystem::new())).await;
        let key = CacheKey::new("KM1PUvbAai5kXm8").with_extension("usdz");

        let download = stage(&stack, "download.usdz", b"model-data");
        stack.engine.save(download, &key).await;

        // The download itself never entered memory; the lookup goes to disk
        // and promotes the stable path.
        assert!(!stack.memory.contains(&key));
        let stable = stack.engine.retrieve(&key).await.unwrap();
        assert_eq!(stable, stack.disk.path_for(&key));
        assert_eq!(std::fs::read(&stable).unwrap(), b"model-data");
        assert_eq!(stack.memory.retrieve(&key).await, Some(stable));
    }

    #[tokio::test]
    async fn test_lookup_during_save_never_sees_the_download() {
        let fs = Arc::new(GatedFileSystem::default());
        let stack = file_stack(fs.clone()).await;
        let key = CacheKey::new("warship").with_extension("usdz");
        let download = stage(&stack, "download.usdz", b"model-data");

        let saving = {
            let engine = stack.engine.clone();
            let key = key.clone();
            tokio::spawn(async move { engine.save(download, &key).await })
        };

        fs.move_started.notified().await;
        assert_eq!(stack.engine.retrieve(&key).await, None);

        fs.release.notify_one();
        saving.await.unwrap();

        let location = stack.engine.retrieve(&key).await.unwrap();
        assert!(location.starts_with(stack.disk.directory()));
        assert_eq!(std::fs::read(&location).unwrap(), b"model-data");
    }

    #[tokio::test]
    async fn test_lookup_during_replace_keeps_a_valid_location() {
        let fs = Arc::new(GatedFileSystem::default());
        let stack = file_stack(fs.clone()).await;
        let key = CacheKey::new("warship").with_extension("usdz");

        std::fs::write(stack.disk.path_for(&key), b"old").unwrap();
        let cached = stack.engine.retrieve(&key).await.unwrap();

        let saving = {
            let engine = stack.engine.clone();
            let key = key.clone();
            let download = stage(&stack, "download.usdz", b"new");
            tokio::spawn(async move { engine.save(download, &key).await })
        };

        fs.move_started.notified().await;
        let during = stack.engine.retrieve(&key).await.unwrap();
        assert_eq!(during, cached);
        assert_eq!(std::fs::read(&during).unwrap(), b"old");

        fs.release.notify_one();
        saving.await.unwrap();

        // Same location, replaced in one step.
        assert_eq!(std::fs::read(&during).unwrap(), b"new");
        assert_eq!(stack.engine.retrieve(&key).await, Some(cached));
    }
}
