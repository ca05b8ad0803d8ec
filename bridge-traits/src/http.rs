//! HTTP Transport Abstraction
//!
//! Whole-file GET transfers into a temporary file, with byte-level progress.
//! Only what the asset pipeline needs: no request bodies, no auth, no ranges.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempPath;

use crate::error::Result;

/// A single GET request for one remote resource.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: String,
    pub headers: HashMap<String, String>,
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: HashMap::new(),
            timeout: None,
        }
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn timeout(mut self, duration: Duration) -> Self {
        self.timeout = Some(duration);
        self
    }
}

/// Byte counters reported while a transfer is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferProgress {
    pub bytes_written: u64,
    /// Expected size, when the server announced one.
    pub total_bytes: Option<u64>,
}

impl TransferProgress {
    /// Completed fraction clamped to `[0.0, 1.0]`.
    ///
    /// `None` when the total is unknown or zero.
    pub fn fraction(&self) -> Option<f32> {
        match self.total_bytes {
            Some(total) if total > 0 => {
                let fraction = self.bytes_written as f64 / total as f64;
                Some(fraction.clamp(0.0, 1.0) as f32)
            }
            _ => None,
        }
    }
}

/// Callback invoked by the transport as bytes arrive.
pub type ProgressSink = Arc<dyn Fn(TransferProgress) + Send + Sync>;

/// What the transport learned about the response.
///
/// `status` is `None` when the transport could not produce an HTTP status
/// line (non-HTTP scheme, malformed response).
#[derive(Debug, Clone, Default)]
pub struct ResponseMetadata {
    pub url: String,
    pub status: Option<u16>,
    pub content_length: Option<u64>,
    pub headers: HashMap<String, String>,
}

impl ResponseMetadata {
    pub fn http(url: impl Into<String>, status: u16) -> Self {
        Self {
            url: url.into(),
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, Some(status) if (200..300).contains(&status))
    }
}

/// A completed transfer.
///
/// `file` deletes itself when dropped; callers that want to keep the bytes
/// must move them elsewhere first.
#[derive(Debug)]
pub struct FileDownload {
    pub file: TempPath,
    pub response: ResponseMetadata,
}

/// Transport used by the asset downloader.
///
/// Cancellation is cooperative: dropping the returned future aborts the
/// transfer and removes any partially written file.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Downloads the whole response body of `request` into a temporary file.
    ///
    /// Non-2xx responses are not errors at this layer; the status is reported
    /// in [`ResponseMetadata`] for the caller to validate.
    async fn download_to_file(
        &self,
        request: HttpRequest,
        progress: Option<ProgressSink>,
    ) -> Result<FileDownload>;
}
