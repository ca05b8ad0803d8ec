//! Consumer-facing loading state.
//!
//! The provider never stores this. UI layers fold [`AssetEvent`]s and the
//! final `provide` result into it.

use core_runtime::events::AssetEvent;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::provider::ProviderError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum AssetLoadingState {
    #[default]
    Idle,
    Loading(f32),
    Loaded(PathBuf),
    Failed(String),
}

impl AssetLoadingState {
    pub fn loading(fraction: f32) -> Self {
        AssetLoadingState::Loading(fraction.clamp(0.0, 1.0))
    }

    /// Final state for a finished `provide` call. A cancelled call returns to
    /// `Idle` so the consumer can start again.
    pub fn from_result(result: &Result<PathBuf, ProviderError>) -> Self {
        match result {
            Ok(path) => AssetLoadingState::Loaded(path.clone()),
            Err(ProviderError::Cancelled) => AssetLoadingState::Idle,
            Err(e) => AssetLoadingState::Failed(e.to_string()),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, AssetLoadingState::Loading(_))
    }

    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            AssetLoadingState::Loaded(_) | AssetLoadingState::Failed(_)
        )
    }

    pub fn progress(&self) -> Option<f32> {
        match self {
            AssetLoadingState::Loading(fraction) => Some(*fraction),
            AssetLoadingState::Loaded(_) => Some(1.0),
            _ => None,
        }
    }

    /// Folds one provider event into the state.
    ///
    /// Progress restarts from zero on every attempt. A cache hit carries no
    /// location, so it leaves the state for [`Self::from_result`] to settle.
    /// A failure reads the same as the error `provide` returns.
    pub fn apply(&mut self, event: &AssetEvent) {
        let next = match event {
            AssetEvent::DownloadStarted { .. } => Self::loading(0.0),
            AssetEvent::DownloadProgress { fraction, .. } => Self::loading(*fraction),
            AssetEvent::Provided { location, .. } => {
                AssetLoadingState::Loaded(PathBuf::from(location))
            }
            AssetEvent::Failed { message, .. } => AssetLoadingState::Failed(
                ProviderError::DownloadFailed(message.clone()).to_string(),
            ),
            AssetEvent::Cancelled { .. } => AssetLoadingState::Idle,
            AssetEvent::CacheHit { .. } | AssetEvent::RetryScheduled { .. } => return,
        };
        *self = next;
    }
}
