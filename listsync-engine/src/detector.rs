//! Change detection against stored fingerprints.

use crate::error::{SyncError, SyncResult};
use crate::fingerprint::fingerprint;
use listsync_storage::CatalogStore;
use listsync_types::ListDefinition;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// How a definition relates to what is stored under its code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// No list with this code is stored.
    New,
    /// A list is stored but its hash differs or is missing.
    Changed,
    /// The stored hash matches the definition.
    Unchanged,
}

impl ChangeKind {
    /// Returns true if the definition has to be reconciled.
    pub fn needs_sync(self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}

/// Decides which definitions need reconciling.
#[derive(Clone)]
pub struct ChangeDetector {
    store: Arc<dyn CatalogStore>,
}

impl ChangeDetector {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    /// Compares the definition with the stored row of the same code.
    /// A failed lookup is returned as an error, never guessed.
    pub async fn classify(&self, definition: &ListDefinition) -> SyncResult<ChangeKind> {
        let stored = self
            .store
            .find_list(&definition.code)
            .await
            .map_err(SyncError::Lookup)?;

        Ok(match stored {
            None => ChangeKind::New,
            Some(row) if row.sync_hash.as_deref() == Some(fingerprint(definition).as_str()) => {
                ChangeKind::Unchanged
            }
            Some(_) => ChangeKind::Changed,
        })
    }

    /// Returns true if the definition is new or its content changed.
    pub async fn needs_update(&self, definition: &ListDefinition) -> SyncResult<bool> {
        Ok(self.classify(definition).await?.needs_sync())
    }
}
