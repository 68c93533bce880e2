//! Error types for the sync layer.

use listsync_storage::StorageError;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur in sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Reading from the backing store failed.
    #[error("lookup failed: {0}")]
    Lookup(#[source] StorageError),

    /// Writing to the backing store failed.
    #[error("write failed: {0}")]
    Write(#[source] StorageError),

    /// A definition cannot be written as declared.
    #[error("invalid definition: {0}")]
    InvalidDefinition(String),

    /// Another run holds the engine.
    #[error("sync already running")]
    AlreadyRunning,

    /// Internal invariant violated.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<listsync_types::Error> for SyncError {
    fn from(e: listsync_types::Error) -> Self {
        match e {
            listsync_types::Error::InvalidDefinition(msg) => Self::InvalidDefinition(msg),
            other => Self::Internal(other.to_string()),
        }
    }
}
