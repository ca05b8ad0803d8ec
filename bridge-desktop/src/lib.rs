//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! - `HttpClient` using `reqwest`, streaming the body into a temporary file
//! - `FileSystemAccess` using `tokio::fs`
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{ReqwestHttpClient, TokioFileSystem};
//! use std::sync::Arc;
//!
//! let http_client = Arc::new(ReqwestHttpClient::new()?);
//! let fs = Arc::new(TokioFileSystem::new());
//! ```

mod filesystem;
mod http;

pub use filesystem::TokioFileSystem;
pub use http::ReqwestHttpClient;
