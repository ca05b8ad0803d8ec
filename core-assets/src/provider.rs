//! # Asset Provider
//!
//! Cache first, network second.
//!
//! ## Workflow
//!
//! 1. Look the key up in the cache; a hit returns immediately.
//! 2. On a miss, download with up to `max_attempts + 1` attempts. Every
//!    attempt after the first waits `strategy.delay(attempt - 1)`.
//! 3. Hand the downloaded file to the cache, then read it back to get the
//!    stable cached location. If the cache could not keep the file the call
//!    fails and the download is removed.
//!
//! Cancellation stops everything at the next suspension point, is never
//! retried, and never reaches the cache.

use async_trait::async_trait;
use core_async::sync::CancellationToken;
use core_async::time::sleep_or_cancel;
use core_runtime::events::{AssetEvent, EventBus};
use futures::StreamExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use crate::cache::{CacheKey, CacheOperator};
use crate::catalog::resource_locator;
use crate::download::{AssetDownloading, DownloadEvent};
use crate::retry::RetryStrategy;

pub const STREAM_WITHOUT_FILE: &str = "stream completed without a file";
pub const MISSING_AFTER_SAVE: &str = "file was not found in cache after save";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Asset request cancelled")]
    Cancelled,
}

impl ProviderError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ProviderError::Cancelled)
    }
}

pub type Result<T> = std::result::Result<T, ProviderError>;

/// Receives download fractions in `[0.0, 1.0]`.
pub type ProgressCallback = Arc<dyn Fn(f32) + Send + Sync>;

#[async_trait]
pub trait AssetProviding: Send + Sync {
    /// Returns a stable local location for `key`, downloading it on a miss.
    ///
    /// `on_progress` only fires while downloading; a cache hit never calls it.
    async fn provide(
        &self,
        key: &CacheKey,
        strategy: RetryStrategy,
        on_progress: Option<ProgressCallback>,
        cancel: &CancellationToken,
    ) -> Result<PathBuf>;
}

pub struct AssetProvider {
    cache: Arc<dyn CacheOperator<PathBuf>>,
    downloader: Arc<dyn AssetDownloading>,
    base_url: Url,
    events: Option<EventBus>,
}

impl AssetProvider {
    pub fn new(
        cache: Arc<dyn CacheOperator<PathBuf>>,
        downloader: Arc<dyn AssetDownloading>,
        base_url: Url,
    ) -> Self {
        Self {
            cache,
            downloader,
            base_url,
            events: None,
        }
    }

    /// Publishes an [`AssetEvent`] for every step of every `provide` call.
    pub fn with_event_bus(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn emit(&self, event: AssetEvent) {
        if let Some(bus) = &self.events {
            // No subscribers is fine.
            let _ = bus.emit(event);
        }
    }

    fn cancelled(&self, key: &CacheKey) -> ProviderError {
        info!(key = %key, "Asset request cancelled");
        self.emit(AssetEvent::Cancelled {
            key: key.value().to_string(),
        });
        ProviderError::Cancelled
    }

    fn failed(&self, key: &CacheKey, message: impl Into<String>) -> ProviderError {
        let message = message.into();
        self.emit(AssetEvent::Failed {
            key: key.value().to_string(),
            message: message.clone(),
        });
        ProviderError::DownloadFailed(message)
    }

    /// Runs a single transfer to completion.
    async fn attempt(
        &self,
        key: &CacheKey,
        locator: &str,
        on_progress: Option<&ProgressCallback>,
        cancel: &CancellationToken,
    ) -> Result<PathBuf> {
        let mut stream = self.downloader.download(locator, cancel);

        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ProviderError::Cancelled),
                next = stream.next() => next,
            };

            match next {
                Some(Ok(DownloadEvent::Progress(fraction))) => {
                    if let Some(callback) = on_progress {
                        callback(fraction);
                    }
                    self.emit(AssetEvent::DownloadProgress {
                        key: key.value().to_string(),
                        fraction,
                    });
                }
                Some(Ok(DownloadEvent::Completed(path))) => return Ok(path),
                Some(Err(e)) if e.is_cancelled() => return Err(ProviderError::Cancelled),
                Some(Err(e)) => return Err(ProviderError::DownloadFailed(e.to_string())),
                None => return Err(ProviderError::DownloadFailed(STREAM_WITHOUT_FILE.to_string())),
            }
        }
    }

    /// Downloads with retries. Returns the downloaded (not yet cached) file.
    async fn download_with_retry(
        &self,
        key: &CacheKey,
        strategy: &RetryStrategy,
        on_progress: Option<&ProgressCallback>,
        cancel: &CancellationToken,
    ) -> Result<PathBuf> {
        let locator = resource_locator(&self.base_url, key.value())
            .map_err(|e| {
                error!(key = %key, base_url = %self.base_url, error = %e, "Cannot build asset locator");
                ProviderError::DownloadFailed(format!("invalid asset locator: {}", e))
            })?;
        let total_attempts = strategy.total_attempts();
        let mut last_error: Option<String> = None;

        for attempt in 0..total_attempts {
            if attempt > 0 {
                if cancel.is_cancelled() {
                    return Err(ProviderError::Cancelled);
                }

                let delay = strategy.delay(attempt - 1);
                info!(
                    key = %key,
                    "Retrying asset {} attempt {}/{} after {:?}",
                    key.value(),
                    attempt + 1,
                    total_attempts,
                    delay
                );
                self.emit(AssetEvent::RetryScheduled {
                    key: key.value().to_string(),
                    attempt: attempt + 1,
                    delay_ms: u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    reason: last_error.clone().unwrap_or_default(),
                });

                if sleep_or_cancel(delay, cancel).await.is_err() {
                    return Err(ProviderError::Cancelled);
                }
            }

            debug!(key = %key, locator = %locator, attempt = attempt + 1, total_attempts, "Download attempt");
            self.emit(AssetEvent::DownloadStarted {
                key: key.value().to_string(),
                attempt: attempt + 1,
                total_attempts,
            });

            match self.attempt(key, locator.as_str(), on_progress, cancel).await {
                Ok(path) => return Ok(path),
                Err(ProviderError::Cancelled) => return Err(ProviderError::Cancelled),
                Err(ProviderError::DownloadFailed(message)) => {
                    warn!(
                        key = %key,
                        attempt = attempt + 1,
                        total_attempts,
                        error = %message,
                        "Download attempt failed"
                    );
                    last_error = Some(message);
                }
            }
        }

        error!(key = %key, "All {} attempts exhausted", total_attempts);
        Err(ProviderError::DownloadFailed(
            last_error.unwrap_or_else(|| STREAM_WITHOUT_FILE.to_string()),
        ))
    }
}

#[async_trait]
impl AssetProviding for AssetProvider {
    #[instrument(skip(self, on_progress, cancel), fields(key = %key))]
    async fn provide(
        &self,
        key: &CacheKey,
        strategy: RetryStrategy,
        on_progress: Option<ProgressCallback>,
        cancel: &CancellationToken,
    ) -> Result<PathBuf> {
        if cancel.is_cancelled() {
            return Err(self.cancelled(key));
        }

        if let Some(path) = self.cache.retrieve(key).await {
            debug!(path = ?path, "Cache hit");
            self.emit(AssetEvent::CacheHit {
                key: key.value().to_string(),
            });
            return Ok(path);
        }

        let downloaded = match self
            .download_with_retry(key, &strategy, on_progress.as_ref(), cancel)
            .await
        {
            Ok(path) => path,
            Err(ProviderError::Cancelled) => return Err(self.cancelled(key)),
            Err(ProviderError::DownloadFailed(message)) => return Err(self.failed(key, message)),
        };

        if cancel.is_cancelled() {
            discard(&downloaded).await;
            return Err(self.cancelled(key));
        }

        self.cache.save(downloaded.clone(), key).await;

        match self.cache.retrieve(key).await {
            Some(path) => {
                info!(path = ?path, "Asset provided");
                self.emit(AssetEvent::Provided {
                    key: key.value().to_string(),
                    location: path.display().to_string(),
                });
                Ok(path)
            }
            None => {
                // A file still at its download location was never taken over
                // by the disk tier. Nobody else can reach it, so drop it.
                if core_async::fs::try_exists(&downloaded).await.unwrap_or(false) {
                    warn!(path = ?downloaded, "Disk cache did not take the download");
                    discard(&downloaded).await;
                }
                error!(fault = true, "Downloaded asset missing from cache after save");
                Err(self.failed(key, MISSING_AFTER_SAVE))
            }
        }
    }
}

async fn discard(path: &Path) {
    if let Err(e) = core_async::fs::remove_file(path).await {
        warn!(path = ?path, error = %e, "Failed to remove downloaded file");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheEngine, DiskCache, DiskCacheConfig, MemoryCache};
    use crate::download::{DownloadError, DownloadStream};
    use bridge_desktop::TokioFileSystem;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use bridge_traits::storage::{FileMetadata, FileSystemAccess};
    use bridge_traits::time::SystemClock;
    use futures::stream;
    use mockall::mock;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;

    enum Script {
        Fail(DownloadError),
        Succeed(Vec<f32>, &'static [u8]),
        ProgressOnly(Vec<f32>),
        Stall(Vec<f32>),
        CancelThenComplete,
    }

    struct ScriptedDownloader {
        scripts: Mutex<VecDeque<Script>>,
        staging: TempDir,
        invocations: AtomicUsize,
        locators: Mutex<Vec<String>>,
    }

    impl ScriptedDownloader {
        fn new(scripts: Vec<Script>) -> Arc<Self> {
            Arc::new(Self {
                scripts: Mutex::new(scripts.into()),
                staging: TempDir::new().unwrap(),
                invocations: AtomicUsize::new(0),
                locators: Mutex::new(Vec::new()),
            })
        }

        fn invocations(&self) -> usize {
            self.invocations.load(Ordering::SeqCst)
        }

        fn stage(&self, contents: &[u8]) -> PathBuf {
            let path = self.staging.path().join(uuid::Uuid::new_v4().to_string());
            std::fs::write(&path, contents).unwrap();
            path
        }
    }

    impl AssetDownloading for ScriptedDownloader {
        fn download(&self, locator: &str, cancel: &CancellationToken) -> DownloadStream {
            self.invocations.fetch_add(1, Ordering::SeqCst);
            self.locators.lock().push(locator.to_string());

            let script = self
                .scripts
                .lock()
                .pop_front()
                .unwrap_or(Script::Fail(DownloadError::InvalidResponse));

            let progress = |fractions: Vec<f32>| {
                stream::iter(fractions.into_iter().map(|f| Ok::<_, DownloadError>(DownloadEvent::Progress(f))))
            };

            match script {
                Script::Fail(e) => stream::iter(vec![Err(e)]).boxed(),
                Script::Succeed(fractions, contents) => {
                    let path = self.stage(contents);
                    progress(fractions)
                        .chain(stream::iter(vec![Ok(DownloadEvent::Completed(path))]))
                        .boxed()
                }
                Script::ProgressOnly(fractions) => progress(fractions).boxed(),
                Script::Stall(fractions) => progress(fractions).chain(stream::pending()).boxed(),
                Script::CancelThenComplete => {
                    let path = self.stage(b"late");
                    cancel.cancel();
                    stream::iter(vec![Ok(DownloadEvent::Completed(path))]).boxed()
                }
            }
        }
    }

    mock! {
        pub Cache {}

        #[async_trait]
        impl CacheOperator<PathBuf> for Cache {
            async fn save(&self, value: PathBuf, key: &CacheKey);
            async fn retrieve(&self, key: &CacheKey) -> Option<PathBuf>;
        }
    }

    struct Harness {
        root: TempDir,
        disk: Arc<DiskCache>,
        cache: Arc<CacheEngine<PathBuf>>,
    }

    async fn harness() -> Harness {
        let root = TempDir::new().unwrap();
        let disk = Arc::new(
            DiskCache::open(
                DiskCacheConfig::new(root.path()),
                Arc::new(TokioFileSystem::new()),
                Arc::new(SystemClock),
            )
            .await,
        );
        let memory = Arc::new(MemoryCache::default().scoped_to(disk.directory()));
        let cache = Arc::new(CacheEngine::new(memory, disk.clone()));
        Harness {
            root,
            disk,
            cache,
        }
    }

    fn fast(max_attempts: u32) -> RetryStrategy {
        RetryStrategy::new(max_attempts, Duration::from_millis(1), Duration::from_millis(10))
    }

    fn key() -> CacheKey {
        CacheKey::new("warship").with_extension("usdz")
    }

    fn base() -> Url {
        Url::parse("https://models.example").unwrap()
    }

    fn recorder() -> (ProgressCallback, Arc<Mutex<Vec<f32>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        (Arc::new(move |f| sink.lock().push(f)), seen)
    }

    fn http_500() -> Script {
        Script::Fail(DownloadError::Http { status_code: 500 })
    }

    #[tokio::test]
    async fn test_cache_hit_skips_network() {
        let h = harness().await;
        let downloader = ScriptedDownloader::new(vec![]);
        let provider = AssetProvider::new(h.cache.clone(), downloader.clone(), base());

        let staged = h.root.path().join("seed");
        std::fs::write(&staged, b"model-data").unwrap();
        h.cache.save(staged, &key()).await;

        let (callback, seen) = recorder();
        let path = provider
            .provide(&key(), fast(2), Some(callback), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(path, h.disk.path_for(&key()));
        assert_eq!(downloader.invocations(), 0);
        assert!(seen.lock().is_empty());
    }

    #[tokio::test]
    async fn test_retry_budget_exhausted() {
        let h = harness().await;
        let downloader = ScriptedDownloader::new(vec![http_500(), http_500(), http_500()]);
        let provider = AssetProvider::new(h.cache.clone(), downloader.clone(), base());

        let result = provider
            .provide(&key(), fast(2), None, &CancellationToken::new())
            .await;

        assert_eq!(downloader.invocations(), 3);
        match result {
            Err(ProviderError::DownloadFailed(message)) => assert!(message.contains("500")),
            other => panic!("expected DownloadFailed, got {:?}", other),
        }
        assert!(h.cache.retrieve(&key()).await.is_none());
    }

    #[tokio::test]
    async fn test_succeeds_on_last_attempt() {
        let h = harness().await;
        let downloader = ScriptedDownloader::new(vec![
            http_500(),
            http_500(),
            Script::Succeed(vec![0.5, 1.0], b"model-data"),
        ]);
        let provider = AssetProvider::new(h.cache.clone(), downloader.clone(), base());

        let path = provider
            .provide(&key(), fast(2), None, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(downloader.invocations(), 3);
        assert_eq!(path, h.disk.path_for(&key()));
        assert_eq!(std::fs::read(&path).unwrap(), b"model-data");
        assert_eq!(
            downloader.locators.lock()[0],
            "https://models.example/warship/download"
        );
    }

    #[tokio::test]
    async fn test_no_retries_configured() {
        let h = harness().await;
        let downloader = ScriptedDownloader::new(vec![http_500(), Script::Succeed(vec![], b"x")]);
        let provider = AssetProvider::new(h.cache.clone(), downloader.clone(), base());

        let result = provider
            .provide(&key(), RetryStrategy::no_retry(), None, &CancellationToken::new())
            .await;

        assert!(matches!(result, Err(ProviderError::DownloadFailed(_))));
        assert_eq!(downloader.invocations(), 1);
    }

    #[tokio::test]
    async fn test_stream_without_completion_fails() {
        let h = harness().await;
        let downloader = ScriptedDownloader::new(vec![Script::ProgressOnly(vec![0.2, 0.9])]);
        let provider = AssetProvider::new(h.cache.clone(), downloader.clone(), base());

        let (callback, seen) = recorder();
        let result = provider
            .provide(&key(), fast(0), Some(callback), &CancellationToken::new())
            .await;

        assert_eq!(
            result,
            Err(ProviderError::DownloadFailed(STREAM_WITHOUT_FILE.to_string()))
        );
        assert_eq!(*seen.lock(), vec![0.2, 0.9]);
    }

    #[tokio::test]
    async fn test_progress_forwarded_per_attempt() {
        let h = harness().await;
        let downloader = ScriptedDownloader::new(vec![
            Script::ProgressOnly(vec![0.1, 0.4]),
            Script::Succeed(vec![0.2, 0.7, 1.0], b"model-data"),
        ]);
        let provider = AssetProvider::new(h.cache.clone(), downloader.clone(), base());

        let (callback, seen) = recorder();
        provider
            .provide(&key(), fast(1), Some(callback), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(*seen.lock(), vec![0.1, 0.4, 0.2, 0.7, 1.0]);
    }

    #[tokio::test]
    async fn test_cancellation_during_attempt_is_not_retried() {
        let h = harness().await;
        let downloader = ScriptedDownloader::new(vec![
            Script::Stall(vec![0.3]),
            Script::Succeed(vec![], b"model-data"),
        ]);
        let provider = Arc::new(AssetProvider::new(
            h.cache.clone(),
            downloader.clone(),
            base(),
        ));
        let cancel = CancellationToken::new();

        let (progress_tx, mut progress_rx) = core_async::sync::mpsc::unbounded_channel();
        let callback: ProgressCallback = Arc::new(move |f| {
            let _ = progress_tx.send(f);
        });

        let task = {
            let provider = provider.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move {
                provider
                    .provide(&key(), fast(5), Some(callback), &cancel)
                    .await
            })
        };

        assert_eq!(progress_rx.recv().await, Some(0.3));
        cancel.cancel();

        assert_eq!(task.await.unwrap(), Err(ProviderError::Cancelled));
        assert_eq!(downloader.invocations(), 1);
    }

    #[tokio::test]
    async fn test_cancellation_during_backoff() {
        let h = harness().await;
        let downloader = ScriptedDownloader::new(vec![http_500(), Script::Succeed(vec![], b"x")]);
        let events = EventBus::new(16);
        let mut rx = events.subscribe();
        let provider = Arc::new(
            AssetProvider::new(h.cache.clone(), downloader.clone(), base())
                .with_event_bus(events),
        );
        let cancel = CancellationToken::new();
        let slow = RetryStrategy::new(3, Duration::from_secs(60), Duration::from_secs(60));

        let task = {
            let provider = provider.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { provider.provide(&key(), slow, None, &cancel).await })
        };

        loop {
            if let AssetEvent::RetryScheduled { delay_ms, .. } = rx.recv().await.unwrap() {
                assert_eq!(delay_ms, 60_000);
                break;
            }
        }
        cancel.cancel();

        assert_eq!(task.await.unwrap(), Err(ProviderError::Cancelled));
        assert_eq!(downloader.invocations(), 1);
    }

    #[tokio::test]
    async fn test_already_cancelled_does_nothing() {
        let mut cache = MockCache::new();
        cache.expect_retrieve().never();
        cache.expect_save().never();
        let downloader = ScriptedDownloader::new(vec![]);
        let provider = AssetProvider::new(Arc::new(cache), downloader.clone(), base());

        let cancel = CancellationToken::new();
        cancel.cancel();

        assert_eq!(
            provider.provide(&key(), fast(2), None, &cancel).await,
            Err(ProviderError::Cancelled)
        );
        assert_eq!(downloader.invocations(), 0);
    }

    #[tokio::test]
    async fn test_downloader_cancellation_is_not_retried() {
        let h = harness().await;
        let downloader = ScriptedDownloader::new(vec![
            Script::Fail(DownloadError::Cancelled),
            Script::Succeed(vec![], b"x"),
        ]);
        let provider = AssetProvider::new(h.cache.clone(), downloader.clone(), base());

        assert_eq!(
            provider
                .provide(&key(), fast(3), None, &CancellationToken::new())
                .await,
            Err(ProviderError::Cancelled)
        );
        assert_eq!(downloader.invocations(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_download_never_reaches_cache() {
        let mut cache = MockCache::new();
        cache.expect_retrieve().times(1).returning(|_| None);
        cache.expect_save().never();
        let downloader = ScriptedDownloader::new(vec![Script::CancelThenComplete]);
        let provider = AssetProvider::new(Arc::new(cache), downloader.clone(), base());

        assert_eq!(
            provider
                .provide(&key(), fast(2), None, &CancellationToken::new())
                .await,
            Err(ProviderError::Cancelled)
        );
        assert_eq!(downloader.invocations(), 1);
    }

    #[tokio::test]
    async fn test_missing_after_save() {
        let mut cache = MockCache::new();
        cache.expect_retrieve().times(2).returning(|_| None);
        cache.expect_save().times(1).returning(|_, _| ());
        let downloader = ScriptedDownloader::new(vec![Script::Succeed(vec![], b"model-data")]);
        let provider = AssetProvider::new(Arc::new(cache), downloader.clone(), base());

        assert_eq!(
            provider
                .provide(&key(), fast(2), None, &CancellationToken::new())
                .await,
            Err(ProviderError::DownloadFailed(MISSING_AFTER_SAVE.to_string()))
        );
        assert_eq!(downloader.invocations(), 1);
        // The cache never took the file, so it is not left behind.
        assert_eq!(std::fs::read_dir(downloader.staging.path()).unwrap().count(), 0);
    }

    /// Real filesystem on which moves into the cache always fail.
    struct FullDisk(TokioFileSystem);

    #[async_trait]
    impl FileSystemAccess for FullDisk {
        async fn exists(&self, path: &Path) -> BridgeResult<bool> {
            self.0.exists(path).await
        }

        async fn metadata(&self, path: &Path) -> BridgeResult<FileMetadata> {
            self.0.metadata(path).await
        }

        async fn create_dir_all(&self, path: &Path) -> BridgeResult<()> {
            self.0.create_dir_all(path).await
        }

        async fn move_file(&self, _from: &Path, _to: &Path) -> BridgeResult<()> {
            Err(BridgeError::OperationFailed("no space left".to_string()))
        }

        async fn delete_file(&self, path: &Path) -> BridgeResult<()> {
            self.0.delete_file(path).await
        }

        async fn list_directory(&self, path: &Path) -> BridgeResult<Vec<PathBuf>> {
            self.0.list_directory(path).await
        }
    }

    #[tokio::test]
    async fn test_failed_disk_save_is_never_served() {
        let root = TempDir::new().unwrap();
        let disk = Arc::new(
            DiskCache::open(
                DiskCacheConfig::new(root.path()),
                Arc::new(FullDisk(TokioFileSystem::new())),
                Arc::new(SystemClock),
            )
            .await,
        );
        let memory = Arc::new(MemoryCache::default().scoped_to(disk.directory()));
        let cache = Arc::new(CacheEngine::new(memory.clone(), disk));
        let downloader = ScriptedDownloader::new(vec![Script::Succeed(vec![], b"model-data")]);
        let provider = AssetProvider::new(cache, downloader.clone(), base());

        assert_eq!(
            provider
                .provide(&key(), fast(0), None, &CancellationToken::new())
                .await,
            Err(ProviderError::DownloadFailed(MISSING_AFTER_SAVE.to_string()))
        );
        assert!(memory.is_empty());
        assert_eq!(std::fs::read_dir(downloader.staging.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_events_follow_the_call() {
        let h = harness().await;
        let downloader = ScriptedDownloader::new(vec![
            http_500(),
            Script::Succeed(vec![1.0], b"model-data"),
        ]);
        let events = EventBus::new(32);
        let mut rx = events.subscribe();
        let provider = AssetProvider::new(h.cache.clone(), downloader, base())
            .with_event_bus(events);

        provider
            .provide(&key(), fast(2), None, &CancellationToken::new())
            .await
            .unwrap();

        let mut names = Vec::new();
        while let Ok(event) = rx.try_recv() {
            assert_eq!(event.key(), "warship");
            names.push(match event {
                AssetEvent::DownloadStarted { attempt, .. } => format!("started:{}", attempt),
                AssetEvent::RetryScheduled { attempt, .. } => format!("retry:{}", attempt),
                AssetEvent::DownloadProgress { .. } => "progress".to_string(),
                AssetEvent::Provided { .. } => "provided".to_string(),
                other => panic!("unexpected event {:?}", other),
            });
        }

        assert_eq!(
            names,
            vec!["started:1", "retry:2", "started:2", "progress", "provided"]
        );
    }
}
