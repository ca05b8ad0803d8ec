//! HTTP Client Implementation using Reqwest

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    http::{
        FileDownload, HttpClient, HttpRequest, ProgressSink, ResponseMetadata, TransferProgress,
    },
};
use reqwest::Client;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

pub struct ReqwestHttpClient {
    client: Client,
    staging_dir: Option<PathBuf>,
}

impl ReqwestHttpClient {
    pub fn new() -> Result<Self> {
        Self::with_connect_timeout(Duration::from_secs(10))
    }

    /// Large assets can take minutes to arrive, so only connection setup is
    /// bounded here. Per-request limits go on [`HttpRequest::timeout`].
    pub fn with_connect_timeout(connect_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .pool_max_idle_per_host(4)
            .user_agent(concat!("asset-viewer-core/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                BridgeError::OperationFailed(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(Self::with_client(client))
    }

    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            staging_dir: None,
        }
    }

    /// Writes in-flight transfers under `dir` instead of the system temp
    /// directory.
    pub fn with_staging_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.staging_dir = Some(dir.into());
        self
    }

    fn build_request(&self, request: &HttpRequest) -> reqwest::RequestBuilder {
        let mut req = self.client.get(&request.url);

        for (key, value) in &request.headers {
            req = req.header(key, value);
        }

        if let Some(timeout) = request.timeout {
            req = req.timeout(timeout);
        }

        req
    }

    fn map_reqwest_error(e: reqwest::Error) -> BridgeError {
        if e.is_timeout() {
            BridgeError::Timeout(e.to_string())
        } else if e.is_connect() {
            BridgeError::OperationFailed(format!("Connection failed: {}", e))
        } else {
            BridgeError::OperationFailed(e.to_string())
        }
    }

    fn create_staging_file(&self) -> Result<tempfile::NamedTempFile> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("asset-download-");

        let file = match &self.staging_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        Ok(file)
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn download_to_file(
        &self,
        request: HttpRequest,
        progress: Option<ProgressSink>,
    ) -> Result<FileDownload> {
        debug!(url = %request.url, "Starting download");

        let mut response = self
            .build_request(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(url = %request.url, error = %e, "HTTP request failed");
                Self::map_reqwest_error(e)
            })?;

        let status = response.status().as_u16();
        let content_length = response.content_length();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|s| (k.to_string(), s.to_string())))
            .collect();

        // The temp path is removed on drop, so an aborted transfer leaves
        // nothing behind.
        let (std_file, path) = self.create_staging_file()?.into_parts();
        let mut file = tokio::fs::File::from_std(std_file);
        let mut bytes_written = 0u64;

        while let Some(chunk) = response.chunk().await.map_err(Self::map_reqwest_error)? {
            file.write_all(&chunk).await?;
            bytes_written += chunk.len() as u64;

            if let Some(sink) = &progress {
                sink(TransferProgress {
                    bytes_written,
                    total_bytes: content_length,
                });
            }
        }

        file.flush().await?;
        drop(file);

        debug!(
            url = %request.url,
            status,
            bytes = bytes_written,
            "Download finished"
        );

        Ok(FileDownload {
            file: path,
            response: ResponseMetadata {
                url: request.url,
                status: Some(status),
                content_length,
                headers,
            },
        })
    }
}
