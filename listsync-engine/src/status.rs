//! Progress notifications.
//!
//! Every status change is delivered to registered callbacks and to any
//! channel subscribers. Publishing never blocks and never fails: callbacks
//! run synchronously on the publishing task and lagging channel receivers
//! lose the oldest updates.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;

/// Phase of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncPhase {
    Running,
    Completed,
    Error,
}

/// Snapshot of run progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStatus {
    pub phase: SyncPhase,
    /// Percent of the stale lists processed, 0..=100.
    pub progress: u8,
    /// Name of the list processed last.
    pub current_list: Option<String>,
    /// Error message for the `Error` phase.
    pub message: Option<String>,
}

impl SyncStatus {
    pub fn running(progress: u8, current_list: Option<String>) -> Self {
        Self {
            phase: SyncPhase::Running,
            progress: progress.min(100),
            current_list,
            message: None,
        }
    }

    pub fn completed() -> Self {
        Self {
            phase: SyncPhase::Completed,
            progress: 100,
            current_list: None,
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            phase: SyncPhase::Error,
            progress: 0,
            current_list: None,
            message: Some(message.into()),
        }
    }
}

/// Handle returned when registering a callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

type Listener = Arc<dyn Fn(&SyncStatus) + Send + Sync>;

/// Fan-out point for status updates.
pub struct StatusHub {
    listeners: RwLock<BTreeMap<ListenerId, Listener>>,
    next_id: AtomicU64,
    sender: broadcast::Sender<SyncStatus>,
}

impl StatusHub {
    /// Creates a hub whose channel buffers `capacity` updates per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            listeners: RwLock::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
            sender,
        }
    }

    /// Registers a callback invoked with every status update.
    pub fn add_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&SyncStatus) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id, Arc::new(listener));
        id
    }

    /// Unregisters a callback. Returns false if it was not registered.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        self.listeners
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&id)
            .is_some()
    }

    /// Number of registered callbacks.
    pub fn listener_count(&self) -> usize {
        self.listeners.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Opens a channel receiving every subsequent status update.
    pub fn subscribe(&self) -> broadcast::Receiver<SyncStatus> {
        self.sender.subscribe()
    }

    /// Delivers a status to every callback and subscriber.
    pub fn publish(&self, status: SyncStatus) {
        // Snapshot so callbacks may (un)register without deadlocking.
        let listeners: Vec<Listener> = self
            .listeners
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .cloned()
            .collect();
        for listener in listeners {
            listener(&status);
        }
        // No receivers is not an error.
        let _ = self.sender.send(status);
    }
}

impl Default for StatusHub {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_STATUS_CHANNEL_CAPACITY)
    }
}
