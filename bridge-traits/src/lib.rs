//! # Host Bridge Traits
//!
//! Capability contracts the asset core consumes but does not implement.
//!
//! ## Overview
//!
//! The core never talks to the network, the filesystem, the wall clock or the
//! host logger directly. Each of those is a trait here so that tests can inject
//! doubles and each host can ship its own adapters.
//!
//! ## Traits
//!
//! - [`HttpClient`](http::HttpClient) - Whole-file GET into a temporary file with progress
//! - [`FileSystemAccess`](storage::FileSystemAccess) - Existence, move, remove, metadata
//! - [`Clock`](time::Clock) - Time source for deterministic expiry tests
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to host logging
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation Crate |
//! |----------|---------------------|
//! | Desktop  | `bridge-desktop`    |
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! should convert platform errors into it and keep the original message.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so a single instance can be shared
//! across concurrent `provide` calls.

pub mod error;
pub mod http;
pub mod storage;
pub mod time;

pub use error::BridgeError;

pub use http::{
    FileDownload, HttpClient, HttpRequest, ProgressSink, ResponseMetadata, TransferProgress,
};
pub use storage::{FileMetadata, FileSystemAccess};
pub use time::{Clock, ConsoleLogger, LogEntry, LogLevel, LoggerSink, NoopLogger, SystemClock};
