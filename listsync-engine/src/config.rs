//! Engine configuration.

use serde::{Deserialize, Serialize};

/// Default number of lists reconciled concurrently.
pub const DEFAULT_BATCH_SIZE: usize = 5;

/// Default capacity of the status broadcast channel.
pub const DEFAULT_STATUS_CHANNEL_CAPACITY: usize = 64;

/// What a second run does while another one holds the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConcurrentRunPolicy {
    /// Fail with `SyncError::AlreadyRunning`.
    #[default]
    Reject,
    /// Return an empty report without touching the store.
    ReturnEmpty,
}

/// Configuration for the sync engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Lists reconciled concurrently per batch.
    pub batch_size: usize,
    /// Behaviour when a run is requested while one is in progress.
    pub concurrent_run_policy: ConcurrentRunPolicy,
    /// Buffered status updates per channel subscriber.
    pub status_channel_capacity: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            concurrent_run_policy: ConcurrentRunPolicy::Reject,
            status_channel_capacity: DEFAULT_STATUS_CHANNEL_CAPACITY,
        }
    }
}

impl SyncConfig {
    /// Settings used for the platform's system lists.
    pub fn system_lists() -> Self {
        Self::default()
    }

    /// Settings used for the autocomplete lists.
    pub fn autocomplete_lists() -> Self {
        Self {
            batch_size: 3,
            ..Self::default()
        }
    }

    /// Sets the batch size.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Sets the concurrent-run policy.
    #[must_use]
    pub fn with_concurrent_run_policy(mut self, policy: ConcurrentRunPolicy) -> Self {
        self.concurrent_run_policy = policy;
        self
    }

    /// Batch size actually used; never zero.
    pub fn effective_batch_size(&self) -> usize {
        self.batch_size.max(1)
    }
}
