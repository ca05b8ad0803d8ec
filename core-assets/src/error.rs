use thiserror::Error;

use crate::download::DownloadError;
use crate::provider::ProviderError;

/// Single error type for callers that drive the whole pipeline.
#[derive(Error, Debug)]
pub enum AssetError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Download(#[from] DownloadError),

    #[error("Runtime error: {0}")]
    Runtime(#[from] core_runtime::error::Error),

    #[error("Unknown asset: {0}")]
    UnknownAsset(String),
}

impl AssetError {
    pub fn is_cancelled(&self) -> bool {
        match self {
            AssetError::Provider(e) => e.is_cancelled(),
            AssetError::Download(e) => e.is_cancelled(),
            _ => false,
        }
    }

    /// Whether trying the same request again could succeed.
    ///
    /// Download failures are transient. An exhausted provider call may be
    /// retried by the user. Cancellation and configuration problems are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            AssetError::Provider(ProviderError::DownloadFailed(_)) => true,
            AssetError::Download(e) => !e.is_cancelled(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, AssetError>;
