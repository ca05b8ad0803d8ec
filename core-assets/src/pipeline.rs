//! Assembly of the full asset pipeline from a [`CoreConfig`].

use core_async::sync::CancellationToken;
use core_runtime::config::CoreConfig;
use core_runtime::error::Error as RuntimeError;
use core_runtime::events::EventBus;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use url::Url;

use crate::cache::{CacheEngine, DiskCache, DiskCacheConfig, MemoryCache};
use crate::catalog::Asset;
use crate::download::AssetDownloader;
use crate::error::Result;
use crate::provider::{AssetProvider, AssetProviding, ProgressCallback};
use crate::retry::RetryStrategy;

/// Memory cache, disk cache, downloader and provider wired together.
#[derive(Clone)]
pub struct AssetPipeline {
    provider: Arc<AssetProvider>,
    memory: Arc<MemoryCache<PathBuf>>,
    disk: Arc<DiskCache>,
    events: EventBus,
    retry: RetryStrategy,
}

impl AssetPipeline {
    /// Builds every component from `config`. Opening the disk cache creates
    /// its directory and sweeps expired entries.
    pub async fn from_config(config: &CoreConfig) -> Result<Self> {
        config.validate()?;
        let base_url = Url::parse(&config.asset_base_url).map_err(|e| {
            RuntimeError::config(format!(
                "Invalid asset base URL {:?}: {}",
                config.asset_base_url, e
            ))
        })?;

        let disk = Arc::new(
            DiskCache::open(
                DiskCacheConfig::new(&config.cache_dir).with_time_to_live(config.disk_cache_ttl),
                config.file_system.clone(),
                config.clock.clone(),
            )
            .await,
        );
        let memory = Arc::new(
            MemoryCache::new(config.memory_cost_limit).scoped_to(disk.directory()),
        );
        let cache = Arc::new(CacheEngine::new(memory.clone(), disk.clone()));

        let mut downloader = AssetDownloader::new(config.http_client.clone());
        if let Some(staging_dir) = &config.staging_dir {
            downloader = downloader.with_staging_dir(staging_dir);
        }

        let events = EventBus::new(config.event_bus_capacity);
        let provider = AssetProvider::new(cache, Arc::new(downloader), base_url)
            .with_event_bus(events.clone());

        let retry = RetryStrategy::new(
            config.retry_max_attempts,
            config.retry_initial_delay,
            config.retry_max_delay,
        );

        info!(
            cache_dir = ?config.cache_dir,
            base_url = %config.asset_base_url,
            "Asset pipeline ready"
        );

        Ok(Self {
            provider: Arc::new(provider),
            memory,
            disk,
            events,
            retry,
        })
    }

    /// Provides a catalog asset with the configured retry strategy.
    pub async fn provide(
        &self,
        asset: Asset,
        on_progress: Option<ProgressCallback>,
        cancel: &CancellationToken,
    ) -> Result<PathBuf> {
        let path = self
            .provider
            .provide(&asset.cache_key(), self.retry, on_progress, cancel)
            .await?;
        Ok(path)
    }

    pub fn provider(&self) -> Arc<AssetProvider> {
        Arc::clone(&self.provider)
    }

    pub fn memory_cache(&self) -> &MemoryCache<PathBuf> {
        &self.memory
    }

    pub fn disk_cache(&self) -> &DiskCache {
        &self.disk
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn retry_strategy(&self) -> RetryStrategy {
        self.retry
    }
}
