//! # Asset Cache
//!
//! Two tiers behind one [`CacheOperator`] contract:
//!
//! - [`MemoryCache`] - L1, process lifetime, bounded by a cost ceiling, LRU
//! - [`DiskCache`] - L2, durable, expires entries by age
//! - [`CacheEngine`] - memory then disk, with read-through promotion
//!
//! ```text
//!              save                         retrieve
//!   ┌────────────┴────────────┐    ┌────────────┴────────────┐
//!   ▼                         ▼    ▼                         │ miss
//! MemoryCache  ──────────>  DiskCache ──── hit ──> promote ──┘
//! ```

pub mod disk;
pub mod engine;
pub mod key;
pub mod memory;
pub mod operator;

pub use disk::{DiskCache, DiskCacheConfig, CACHE_SUBDIRECTORY, DEFAULT_TIME_TO_LIVE};
pub use engine::CacheEngine;
pub use key::CacheKey;
pub use memory::{Admission, MemoryCache, MemoryCacheStats, DEFAULT_MEMORY_COST_LIMIT};
pub use operator::{CacheOperator, CacheValue};
