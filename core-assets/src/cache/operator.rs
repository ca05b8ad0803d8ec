use async_trait::async_trait;
use bytes::Bytes;
use std::path::PathBuf;

use super::key::CacheKey;

/// Uniform contract shared by every cache tier and by their composition.
///
/// Both operations are best-effort: a tier that cannot store or read a value
/// logs the problem and behaves as a miss.
#[async_trait]
pub trait CacheOperator<V>: Send + Sync
where
    V: Send + Sync + 'static,
{
    async fn save(&self, value: V, key: &CacheKey);

    async fn retrieve(&self, key: &CacheKey) -> Option<V>;
}

/// Values the memory tier knows how to account for.
pub trait CacheValue: Clone + Send + Sync + 'static {
    /// Cost charged against the memory ceiling, in bytes.
    fn cost(&self) -> usize;

    /// Whether the value still refers to something usable.
    ///
    /// Byte buffers are always live. A file location is live while the file
    /// exists, so the memory tier never hands out a path the disk tier has
    /// since moved or expired.
    fn is_live(&self) -> bool {
        true
    }
}

impl CacheValue for Bytes {
    fn cost(&self) -> usize {
        self.len()
    }
}

impl CacheValue for Vec<u8> {
    fn cost(&self) -> usize {
        self.len()
    }
}

impl CacheValue for PathBuf {
    fn cost(&self) -> usize {
        std::fs::metadata(self)
            .map(|metadata| usize::try_from(metadata.len()).unwrap_or(usize::MAX))
            .unwrap_or(0)
    }

    fn is_live(&self) -> bool {
        self.is_file()
    }
}
