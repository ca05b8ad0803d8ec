//! Time-related abstractions.
//!
//! Sleeps and timeouts integrate with tokio's timer wheel, so tests can run
//! them on a paused clock (`#[tokio::test(start_paused = true)]`).
//!
//! # Examples
//!
//! ```rust
//! use core_async::time::{sleep, Duration, Instant};
//!
//! async fn example() {
//!     let start = Instant::now();
//!     sleep(Duration::from_millis(5)).await;
//!     println!("Took {:?}", start.elapsed());
//! }
//! ```

pub use std::time::Duration;
pub use tokio::time::{sleep, timeout, Instant, Sleep, Timeout};

use crate::sync::CancellationToken;

/// Returned by [`sleep_or_cancel`] when the token fired first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancelled;

impl std::fmt::Display for Cancelled {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("operation cancelled")
    }
}

impl std::error::Error for Cancelled {}

/// Sleeps for `duration` unless `token` is cancelled first.
///
/// An already-cancelled token returns immediately without arming a timer.
pub async fn sleep_or_cancel(
    duration: Duration,
    token: &CancellationToken,
) -> Result<(), Cancelled> {
    if token.is_cancelled() {
        return Err(Cancelled);
    }

    tokio::select! {
        biased;
        _ = token.cancelled() => Err(Cancelled),
        _ = sleep(duration) => Ok(()),
    }
}
