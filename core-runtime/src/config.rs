//! # Core Configuration Module
//!
//! Configuration for the asset pipeline, built with a fail-fast builder.
//!
//! ## Overview
//!
//! The cache root and TTL are process-wide settings, but they are carried in
//! an explicitly constructed [`CoreConfig`] rather than ambient globals so that
//! tests can point every component at an isolated temporary directory.
//!
//! ## Required settings
//!
//! - `cache_dir` - root directory of the disk cache
//! - `asset_base_url` - origin that resource locators are built from
//!
//! ## Bridges (with platform defaults)
//!
//! - `HttpClient` - transfers (desktop default: reqwest)
//! - `FileSystemAccess` - disk cache I/O (desktop default: tokio fs)
//! - `Clock` - expiry checks (default: system clock)
//!
//! When the `desktop-shims` feature is enabled, the desktop bridges are
//! injected automatically if not provided. Otherwise a missing bridge is a
//! [`Error::CapabilityMissing`].
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::time::Duration;
//!
//! let config = CoreConfig::builder()
//!     .cache_dir("/path/to/cache")
//!     .asset_base_url("https://assets.example.com/s")
//!     .disk_cache_ttl(Duration::from_secs(24 * 60 * 60))
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use bridge_traits::{Clock, FileSystemAccess, HttpClient, SystemClock};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

pub const DEFAULT_DISK_CACHE_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);
pub const DEFAULT_MEMORY_COST_LIMIT: usize = 1_000_000_000;
pub const DEFAULT_RETRY_MAX_ATTEMPTS: u32 = 2;
pub const DEFAULT_RETRY_INITIAL_DELAY: Duration = Duration::from_secs(1);
pub const DEFAULT_RETRY_MAX_DELAY: Duration = Duration::from_secs(8);

#[derive(Clone)]
pub struct CoreConfig {
    pub cache_dir: PathBuf,

    pub disk_cache_ttl: Duration,

    /// Ceiling on the summed cost of memory-tier entries, in bytes.
    pub memory_cost_limit: usize,

    pub asset_base_url: String,

    /// Where downloaded files wait before the cache takes them over.
    /// `None` uses the system temp directory.
    pub staging_dir: Option<PathBuf>,

    pub retry_max_attempts: u32,

    pub retry_initial_delay: Duration,

    pub retry_max_delay: Duration,

    pub event_bus_capacity: usize,

    pub http_client: Arc<dyn HttpClient>,

    pub file_system: Arc<dyn FileSystemAccess>,

    pub clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("cache_dir", &self.cache_dir)
            .field("disk_cache_ttl", &self.disk_cache_ttl)
            .field("memory_cost_limit", &self.memory_cost_limit)
            .field("asset_base_url", &self.asset_base_url)
            .field("staging_dir", &self.staging_dir)
            .field("retry_max_attempts", &self.retry_max_attempts)
            .field("retry_initial_delay", &self.retry_initial_delay)
            .field("retry_max_delay", &self.retry_max_delay)
            .field("event_bus_capacity", &self.event_bus_capacity)
            .field("http_client", &"HttpClient { ... }")
            .field("file_system", &"FileSystemAccess { ... }")
            .field("clock", &"Clock { ... }")
            .finish()
    }
}

impl CoreConfig {
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    pub fn validate(&self) -> Result<()> {
        if self.cache_dir.as_os_str().is_empty() {
            return Err(Error::Config("Cache directory cannot be empty".to_string()));
        }

        match Url::parse(&self.asset_base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => {
                return Err(Error::Config(format!(
                    "Asset base URL must be http(s): {}",
                    url
                )));
            }
            Err(e) => {
                return Err(Error::Config(format!(
                    "Invalid asset base URL {:?}: {}",
                    self.asset_base_url, e
                )));
            }
        }

        if self.memory_cost_limit == 0 {
            return Err(Error::Config(
                "Memory cost limit must be greater than 0 bytes".to_string(),
            ));
        }

        if self.retry_initial_delay > self.retry_max_delay {
            return Err(Error::Config(format!(
                "Initial retry delay ({:?}) exceeds maximum retry delay ({:?})",
                self.retry_initial_delay, self.retry_max_delay
            )));
        }

        if self.event_bus_capacity == 0 {
            return Err(Error::Config(
                "Event bus capacity must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn http_client_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "HttpClient".to_string(),
        message: "No HTTP client implementation provided. \
                 Desktop: enable the 'desktop-shims' feature to use ReqwestHttpClient. \
                 Mobile: inject a platform-native adapter."
            .to_string(),
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn file_system_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "FileSystemAccess".to_string(),
        message: "No filesystem implementation provided. \
                 Desktop: enable the 'desktop-shims' feature to use TokioFileSystem. \
                 Mobile: inject a platform-native adapter."
            .to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client(staging_dir: Option<&PathBuf>) -> Result<Arc<dyn HttpClient>> {
    use bridge_desktop::ReqwestHttpClient;

    let mut client = ReqwestHttpClient::new().map_err(|e| {
        Error::Internal(format!("Failed to initialize default HttpClient: {}", e))
    })?;
    if let Some(dir) = staging_dir {
        client = client.with_staging_dir(dir.clone());
    }

    let client: Arc<dyn HttpClient> = Arc::new(client);
    Ok(client)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client(_staging_dir: Option<&PathBuf>) -> Result<Arc<dyn HttpClient>> {
    Err(http_client_missing_error())
}

#[cfg(feature = "desktop-shims")]
fn provide_default_file_system() -> Result<Arc<dyn FileSystemAccess>> {
    use bridge_desktop::TokioFileSystem;

    let fs: Arc<dyn FileSystemAccess> = Arc::new(TokioFileSystem::new());
    Ok(fs)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_file_system() -> Result<Arc<dyn FileSystemAccess>> {
    Err(file_system_missing_error())
}

#[derive(Default)]
pub struct CoreConfigBuilder {
    cache_dir: Option<PathBuf>,
    disk_cache_ttl: Option<Duration>,
    memory_cost_limit: Option<usize>,
    asset_base_url: Option<String>,
    staging_dir: Option<PathBuf>,
    retry_max_attempts: Option<u32>,
    retry_initial_delay: Option<Duration>,
    retry_max_delay: Option<Duration>,
    event_bus_capacity: Option<usize>,
    http_client: Option<Arc<dyn HttpClient>>,
    file_system: Option<Arc<dyn FileSystemAccess>>,
    clock: Option<Arc<dyn Clock>>,
}

impl CoreConfigBuilder {
    pub fn cache_dir<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.cache_dir = Some(path.into());
        self
    }

    pub fn disk_cache_ttl(mut self, ttl: Duration) -> Self {
        self.disk_cache_ttl = Some(ttl);
        self
    }

    pub fn memory_cost_limit(mut self, bytes: usize) -> Self {
        self.memory_cost_limit = Some(bytes);
        self
    }

    pub fn asset_base_url(mut self, url: impl Into<String>) -> Self {
        self.asset_base_url = Some(url.into());
        self
    }

    pub fn staging_dir<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.staging_dir = Some(path.into());
        self
    }

    pub fn retry(mut self, max_attempts: u32, initial_delay: Duration, max_delay: Duration) -> Self {
        self.retry_max_attempts = Some(max_attempts);
        self.retry_initial_delay = Some(initial_delay);
        self.retry_max_delay = Some(max_delay);
        self
    }

    pub fn event_bus_capacity(mut self, capacity: usize) -> Self {
        self.event_bus_capacity = Some(capacity);
        self
    }

    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn file_system(mut self, fs: Arc<dyn FileSystemAccess>) -> Self {
        self.file_system = Some(fs);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn build(self) -> Result<CoreConfig> {
        let cache_dir = self
            .cache_dir
            .ok_or_else(|| Error::config("Cache directory is required"))?;

        let asset_base_url = self
            .asset_base_url
            .ok_or_else(|| Error::config("Asset base URL is required"))?;

        let http_client = match self.http_client {
            Some(client) => client,
            None => provide_default_http_client(self.staging_dir.as_ref())?,
        };

        let file_system = match self.file_system {
            Some(fs) => fs,
            None => provide_default_file_system()?,
        };

        let clock = self
            .clock
            .unwrap_or_else(|| Arc::new(SystemClock) as Arc<dyn Clock>);

        let config = CoreConfig {
            cache_dir,
            disk_cache_ttl: self.disk_cache_ttl.unwrap_or(DEFAULT_DISK_CACHE_TTL),
            memory_cost_limit: self.memory_cost_limit.unwrap_or(DEFAULT_MEMORY_COST_LIMIT),
            asset_base_url: asset_base_url.trim_end_matches('/').to_string(),
            staging_dir: self.staging_dir,
            retry_max_attempts: self.retry_max_attempts.unwrap_or(DEFAULT_RETRY_MAX_ATTEMPTS),
            retry_initial_delay: self
                .retry_initial_delay
                .unwrap_or(DEFAULT_RETRY_INITIAL_DELAY),
            retry_max_delay: self.retry_max_delay.unwrap_or(DEFAULT_RETRY_MAX_DELAY),
            event_bus_capacity: self
                .event_bus_capacity
                .unwrap_or(crate::events::DEFAULT_EVENT_BUFFER_SIZE),
            http_client,
            file_system,
            clock,
        };

        config.validate()?;
        Ok(config)
    }
}
