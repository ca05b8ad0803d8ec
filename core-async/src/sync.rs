//! Synchronization primitives.
//!
//! Async-aware locks and channels come from `tokio::sync`; cancellation
//! tokens come from `tokio-util`. Everything here is `Send + Sync` and can be
//! shared across tasks.
//!
//! # Examples
//!
//! ```rust
//! use core_async::sync::{CancellationToken, Mutex};
//!
//! async fn example() {
//!     let mutex = Mutex::new(42);
//!     *mutex.lock().await += 1;
//!
//!     let token = CancellationToken::new();
//!     let child = token.child_token();
//!     token.cancel();
//!     assert!(child.is_cancelled());
//! }
//! ```

pub use tokio::sync::{broadcast, mpsc, oneshot, Mutex, MutexGuard, Notify, RwLock};
pub use tokio_util::sync::{CancellationToken, DropGuard};
