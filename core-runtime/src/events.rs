//! # Asset Event Bus
//!
//! Broadcasts what the asset provider is doing so that observers (UI state
//! holders, analytics, debug overlays) can follow along without being wired
//! into the provider's callbacks.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────┐     emit      ┌───────────┐    subscribe    ┌────────────┐
//! │ AssetProvider ├──────────────>│ EventBus  ├────────────────>│ Subscriber │
//! └───────────────┘               │ (broadcast│                 └────────────┘
//!                                 │  channel) ├────────────────>┌────────────┐
//!                                 └───────────┘                 │ Subscriber │
//!                                                               └────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{AssetEvent, EventBus};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let bus = EventBus::new(16);
//! let mut rx = bus.subscribe();
//!
//! bus.emit(AssetEvent::CacheHit { key: "warship".into() }).ok();
//!
//! let event = rx.recv().await.unwrap();
//! assert_eq!(event.key(), "warship");
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Emission is best-effort. `emit` fails only when nobody is subscribed, and
//! publishers ignore that. Slow subscribers see `RecvError::Lagged(n)` and can
//! keep reading; `RecvError::Closed` means every sender is gone.

use core_async::sync::broadcast;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use core_async::sync::broadcast::error::{RecvError, SendError};
pub use core_async::sync::broadcast::Receiver;

pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 64;

/// One step of a `provide` call, tagged with the asset key it concerns.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event")]
pub enum AssetEvent {
    CacheHit {
        key: String,
    },
    /// `attempt` is 1-based.
    DownloadStarted {
        key: String,
        attempt: u32,
        total_attempts: u32,
    },
    DownloadProgress {
        key: String,
        fraction: f32,
    },
    RetryScheduled {
        key: String,
        attempt: u32,
        delay_ms: u64,
        reason: String,
    },
    Provided {
        key: String,
        location: String,
    },
    Failed {
        key: String,
        message: String,
    },
    Cancelled {
        key: String,
    },
}

impl AssetEvent {
    pub fn key(&self) -> &str {
        match self {
            AssetEvent::CacheHit { key }
            | AssetEvent::DownloadStarted { key, .. }
            | AssetEvent::DownloadProgress { key, .. }
            | AssetEvent::RetryScheduled { key, .. }
            | AssetEvent::Provided { key, .. }
            | AssetEvent::Failed { key, .. }
            | AssetEvent::Cancelled { key } => key,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            AssetEvent::CacheHit { .. } => "Asset served from cache",
            AssetEvent::DownloadStarted { .. } => "Download attempt started",
            AssetEvent::DownloadProgress { .. } => "Download progress",
            AssetEvent::RetryScheduled { .. } => "Retry scheduled after failure",
            AssetEvent::Provided { .. } => "Asset available",
            AssetEvent::Failed { .. } => "Asset could not be provided",
            AssetEvent::Cancelled { .. } => "Asset request cancelled",
        }
    }

    /// True for events that end a `provide` call.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AssetEvent::CacheHit { .. }
                | AssetEvent::Provided { .. }
                | AssetEvent::Failed { .. }
                | AssetEvent::Cancelled { .. }
        )
    }
}

#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<AssetEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Returns the number of subscribers that will see the event.
    pub fn emit(&self, event: AssetEvent) -> Result<usize, SendError<AssetEvent>> {
        self.sender.send(event)
    }

    pub fn subscribe(&self) -> Receiver<AssetEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}
