//! # Asset Acquisition Module
//!
//! Fetches large binary assets (3D models), caches them durably and reports
//! progress while doing so.
//!
//! ## Overview
//!
//! This module handles:
//! - Two-tier caching: an LRU memory tier bounded by cost in front of a
//!   disk tier with time-based expiry
//! - Streaming downloads with progress, relocated to stable files
//! - Retrying downloads with exponential backoff
//! - Cooperative cancellation of a whole `provide` call
//!
//! ## Usage
//!
//! ```rust,no_run
//! use core_assets::{AssetPipeline, Asset};
//! use core_async::sync::CancellationToken;
//! use core_runtime::config::CoreConfig;
//!
//! # async fn example() -> core_assets::Result<()> {
//! let config = CoreConfig::builder()
//!     .cache_dir("/tmp/viewer")
//!     .asset_base_url("https://models.example")
//!     .build()?;
//!
//! let pipeline = AssetPipeline::from_config(&config).await?;
//! let path = pipeline
//!     .provide(Asset::Warship, None, &CancellationToken::new())
//!     .await?;
//! println!("model at {}", path.display());
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod catalog;
pub mod download;
pub mod error;
pub mod pipeline;
pub mod provider;
pub mod retry;
pub mod state;

pub use cache::{CacheEngine, CacheKey, CacheOperator, CacheValue, DiskCache, DiskCacheConfig, MemoryCache};
pub use catalog::Asset;
pub use download::{AssetDownloader, AssetDownloading, DownloadError, DownloadEvent, DownloadStream};
pub use error::{AssetError, Result};
pub use pipeline::AssetPipeline;
pub use provider::{AssetProvider, AssetProviding, ProgressCallback, ProviderError};
pub use retry::RetryStrategy;
pub use state::AssetLoadingState;
