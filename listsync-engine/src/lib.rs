//! Declarative list synchronization engine.
//!
//! Makes a backing store match a set of in-code list definitions
//! (controlled vocabularies and their allowed values).
//!
//! # Architecture
//!
//! ## Components
//!
//! - **Fingerprint**: stable digest of a definition's stored content
//! - **Detector**: compares fingerprints with the stored sync hash
//! - **Reconciler**: creates or updates one list's metadata row
//! - **Values**: deletes, updates and inserts one list's values
//! - **Engine**: runs reconciliation in batches and publishes progress
//!
//! ## Sync Process
//!
//! 1. **Scan**: classify every definition as new, changed or unchanged
//! 2. **Reconcile**: process stale lists in fixed-size concurrent batches
//! 3. **Report**: aggregate per-list outcomes and publish completion
//!
//! # Example
//!
//! ```
//! use listsync_engine::{ListSyncEngine, SyncConfig};
//! use listsync_storage::MemoryStore;
//! use listsync_types::{ListDefinition, ValueDefinition};
//! use std::sync::Arc;
//!
//! # tokio_test_block_on(async {
//! let engine = ListSyncEngine::new(Arc::new(MemoryStore::new()), SyncConfig::default());
//! let genres = ListDefinition::new("genres", "Genres")
//!     .with_value(ValueDefinition::new("novel", "Novel"));
//!
//! let report = engine.auto_sync(&[genres]).await.unwrap();
//! assert_eq!(report.created, 1);
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(f)
//! # }
//! ```

mod config;
pub mod detector;
mod engine;
mod error;
pub mod fingerprint;
pub mod reconciler;
mod report;
pub mod status;
pub mod values;

pub use config::{
    ConcurrentRunPolicy, SyncConfig, DEFAULT_BATCH_SIZE, DEFAULT_STATUS_CHANNEL_CAPACITY,
};
pub use detector::{ChangeDetector, ChangeKind};
pub use engine::ListSyncEngine;
pub use error::{SyncError, SyncResult};
pub use fingerprint::{fingerprint, FINGERPRINT_LEN};
pub use reconciler::ListReconciler;
pub use report::{ListOutcome, SyncAction, SyncPlan, SyncReport};
pub use status::{ListenerId, StatusHub, SyncPhase, SyncStatus};
pub use values::{ValueChanges, ValueReconciler};
