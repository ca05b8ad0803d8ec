//! Runtime abstraction layer for the asset viewer core.
//!
//! All core-* crates depend on this crate instead of reaching for tokio
//! directly. The surface mirrors the tokio modules it wraps so call sites read
//! the same either way, and adds the few helpers the core needs on top
//! (cancellable sleeps, wall-clock shortcuts).
//!
//! # Modules
//!
//! - `task`: Task spawning
//! - `time`: Sleep, timeouts, cancellable sleep
//! - `sync`: Locks, channels, cancellation tokens
//! - `fs`: Async filesystem operations
//! - `runtime`: Blocking entry point for sync contexts
//!
//! # Examples
//!
//! ```rust
//! use core_async::sync::CancellationToken;
//! use core_async::time::{sleep_or_cancel, Duration};
//!
//! async fn example(token: CancellationToken) {
//!     if sleep_or_cancel(Duration::from_millis(10), &token).await.is_err() {
//!         // cancelled before the delay elapsed
//!     }
//! }
//! ```

pub mod fs;
pub mod runtime;
pub mod sync;
pub mod task;
pub mod time;

pub use task::spawn;
pub use time::{sleep, Duration, Instant};
