//! # Asset Downloader
//!
//! Turns one whole-file HTTP transfer into a typed event stream:
//! zero or more [`DownloadEvent::Progress`] followed by exactly one
//! [`DownloadEvent::Completed`], or a single [`DownloadError`].
//!
//! ## Lifetime
//!
//! The transfer runs on a spawned task tied to the returned stream. Dropping
//! the stream, or cancelling the token passed to
//! [`AssetDownloading::download`], aborts the transfer and removes whatever
//! was partially written.
//!
//! A completed file is relocated out of the transport's self-deleting
//! temporary location into `<staging_dir>/<uuid>[.ext]`. From then on the
//! consumer owns it: either it hands the path to the cache (which moves it) or
//! deletes it. A `Completed` event that is never received is cleaned up when
//! the stream is dropped.

use bridge_traits::http::{FileDownload, HttpClient, HttpRequest, ProgressSink, TransferProgress};
use core_async::sync::{mpsc, CancellationToken, DropGuard};
use futures::stream::{BoxStream, Stream};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub enum DownloadEvent {
    /// Completed fraction in `[0.0, 1.0]`, non-decreasing within a transfer.
    Progress(f32),
    /// The downloaded bytes, at a location the consumer now owns.
    Completed(PathBuf),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DownloadError {
    #[error("HTTP error: status {status_code}")]
    Http { status_code: u16 },

    #[error("Invalid response")]
    InvalidResponse,

    #[error("File operation failed: {0}")]
    FileOperationFailed(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Download cancelled")]
    Cancelled,
}

impl DownloadError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DownloadError::Cancelled)
    }
}

pub type DownloadResult<T> = std::result::Result<T, DownloadError>;

pub type DownloadStream = BoxStream<'static, DownloadResult<DownloadEvent>>;

/// Source of download event streams.
pub trait AssetDownloading: Send + Sync {
    /// Starts a transfer of `locator`.
    ///
    /// Cancelling `cancel` ends the stream with [`DownloadError::Cancelled`].
    fn download(&self, locator: &str, cancel: &CancellationToken) -> DownloadStream;
}

/// [`AssetDownloading`] over a host [`HttpClient`].
pub struct AssetDownloader {
    http: Arc<dyn HttpClient>,
    staging_dir: PathBuf,
    request_timeout: Option<Duration>,
}

impl AssetDownloader {
    pub fn new(http: Arc<dyn HttpClient>) -> Self {
        Self {
            http,
            staging_dir: std::env::temp_dir(),
            request_timeout: None,
        }
    }

    /// Directory completed downloads are relocated into.
    pub fn with_staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = dir.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }
}

impl AssetDownloading for AssetDownloader {
    fn download(&self, locator: &str, cancel: &CancellationToken) -> DownloadStream {
        let (tx, rx) = mpsc::unbounded_channel();
        let token = cancel.child_token();

        let mut request = HttpRequest::get(locator);
        if let Some(timeout) = self.request_timeout {
            request = request.timeout(timeout);
        }

        let transfer = Transfer {
            http: self.http.clone(),
            staging_dir: self.staging_dir.clone(),
            request,
            tx,
            token: token.clone(),
        };
        core_async::task::spawn(transfer.run());

        Box::pin(DownloadEventStream {
            rx,
            _guard: token.drop_guard(),
        })
    }
}

type EventSender = mpsc::UnboundedSender<DownloadResult<DownloadEvent>>;

struct Transfer {
    http: Arc<dyn HttpClient>,
    staging_dir: PathBuf,
    request: HttpRequest,
    tx: EventSender,
    token: CancellationToken,
}

impl Transfer {
    async fn run(self) {
        let url = self.request.url.clone();
        let progress = monotonic_progress(self.tx.clone());

        let outcome = race_cancel(
            &self.token,
            self.http.download_to_file(self.request, Some(progress)),
        )
        .await;

        let download = match outcome {
            None => {
                debug!(url = %url, "Download cancelled");
                let _ = self.tx.send(Err(DownloadError::Cancelled));
                return;
            }
            Some(Err(e)) => {
                warn!(url = %url, error = %e, "Transport failed");
                let _ = self.tx.send(Err(DownloadError::Transport(e.to_string())));
                return;
            }
            Some(Ok(download)) => download,
        };

        let result = match validate(&download) {
            Ok(()) => relocate(download, &self.staging_dir, &url).await,
            Err(e) => {
                drop(download);
                Err(e)
            }
        };

        if self.token.is_cancelled() {
            if let Ok(path) = &result {
                discard(path);
            }
            let _ = self.tx.send(Err(DownloadError::Cancelled));
            return;
        }

        match result {
            Ok(path) => {
                debug!(url = %url, path = ?path, "Download completed");
                if let Err(mpsc::error::SendError(Ok(DownloadEvent::Completed(path)))) =
                    self.tx.send(Ok(DownloadEvent::Completed(path)))
                {
                    // Nobody is listening any more.
                    discard(&path);
                }
            }
            Err(e) => {
                warn!(url = %url, error = %e, "Download rejected");
                let _ = self.tx.send(Err(e));
            }
        }
    }
}

/// Races `future` against `token`. `None` means the token fired first, in
/// which case `future` is dropped mid-flight.
async fn race_cancel<F: std::future::Future>(
    token: &CancellationToken,
    future: F,
) -> Option<F::Output> {
    tokio::select! {
        biased;
        _ = token.cancelled() => None,
        output = future => Some(output),
    }
}

/// Forwards transport progress as fractions, dropping unknown totals and
/// anything that would move backwards.
fn monotonic_progress(tx: EventSender) -> ProgressSink {
    let last = Mutex::new(0.0f32);
    Arc::new(move |progress: TransferProgress| {
        let Some(fraction) = progress.fraction() else {
            return;
        };

        let mut last = last.lock();
        if fraction < *last {
            return;
        }
        *last = fraction;
        let _ = tx.send(Ok(DownloadEvent::Progress(fraction)));
    })
}

fn validate(download: &FileDownload) -> DownloadResult<()> {
    match download.response.status {
        None => Err(DownloadError::InvalidResponse),
        Some(_) if download.response.is_success() => Ok(()),
        Some(status_code) => Err(DownloadError::Http { status_code }),
    }
}

/// Moves the transport's temporary file to a stable staging path.
async fn relocate(download: FileDownload, staging_dir: &Path, url: &str) -> DownloadResult<PathBuf> {
    core_async::fs::create_dir_all(staging_dir)
        .await
        .map_err(|e| DownloadError::FileOperationFailed(e.to_string()))?;

    let destination = staging_dir.join(staged_file_name(url));

    match download.file.persist(&destination) {
        Ok(()) => Ok(destination),
        Err(e) => {
            // Renames cannot cross filesystems; copy instead. The temporary
            // file is removed when `e.path` drops.
            core_async::fs::copy(&e.path, &destination)
                .await
                .map_err(|copy_err| DownloadError::FileOperationFailed(copy_err.to_string()))?;
            Ok(destination)
        }
    }
}

/// `<uuid>` plus the extension of the URL path, if it has one.
fn staged_file_name(url: &str) -> String {
    let last_segment = Url::parse(url).ok().and_then(|url| {
        url.path_segments()
            .and_then(|mut segments| segments.next_back())
            .map(str::to_string)
    });

    let extension = last_segment
        .as_deref()
        .and_then(|segment| Path::new(segment).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()));

    match extension {
        Some(ext) => format!("{}.{}", Uuid::new_v4(), ext),
        None => Uuid::new_v4().to_string(),
    }
}

fn discard(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        warn!(path = ?path, error = %e, "Failed to remove unclaimed download");
    }
}

/// Event stream handed to consumers. Dropping it cancels the transfer.
struct DownloadEventStream {
    rx: mpsc::UnboundedReceiver<DownloadResult<DownloadEvent>>,
    _guard: DropGuard,
}

impl Stream for DownloadEventStream {
    type Item = DownloadResult<DownloadEvent>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

impl Drop for DownloadEventStream {
    fn drop(&mut self) {
        self.rx.close();
        while let Ok(event) = self.rx.try_recv() {
            if let Ok(DownloadEvent::Completed(path)) = event {
                discard(&path);
            }
        }
    }
}
