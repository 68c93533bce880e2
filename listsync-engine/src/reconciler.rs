//! Per-list reconciliation.
//!
//! Writes a list's metadata row, then its values, then the fingerprint.
//! The fingerprint goes last so that a list whose values failed to write
//! stays stale and is retried by the next run.

use crate::error::{SyncError, SyncResult};
use crate::fingerprint::fingerprint;
use crate::report::{ListOutcome, SyncAction};
use crate::values::ValueReconciler;
use listsync_storage::{CatalogStore, ListFilter};
use listsync_types::{ListDefinition, ListPatch, NewList};
use std::sync::Arc;
use tracing::{debug, warn};

/// Reconciles one list definition at a time.
#[derive(Clone)]
pub struct ListReconciler {
    store: Arc<dyn CatalogStore>,
    values: ValueReconciler,
}

impl ListReconciler {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self {
            values: ValueReconciler::new(Arc::clone(&store)),
            store,
        }
    }

    /// Creates, updates or skips one list. Never fails: errors become a
    /// `Failed` outcome so a batch can continue past one bad definition.
    pub async fn sync_single_list(&self, definition: &ListDefinition) -> ListOutcome {
        self.run(definition, false).await
    }

    /// Like `sync_single_list`, but rewrites the list even if its stored
    /// fingerprint matches.
    pub async fn force_sync_single_list(&self, definition: &ListDefinition) -> ListOutcome {
        self.run(definition, true).await
    }

    async fn run(&self, definition: &ListDefinition, force: bool) -> ListOutcome {
        match self.try_sync(definition, force).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Failed to sync list {}: {}", definition.code, e);
                ListOutcome::failed(&definition.code, e.to_string())
            }
        }
    }

    async fn try_sync(&self, definition: &ListDefinition, force: bool) -> SyncResult<ListOutcome> {
        definition.validate()?;
        let hash = fingerprint(definition);

        let existing = self
            .store
            .find_list(&definition.code)
            .await
            .map_err(SyncError::Lookup)?;

        let (list_id, action) = match existing {
            None => {
                let row = self
                    .store
                    .insert_list(NewList::from_definition(definition))
                    .await
                    .map_err(SyncError::Write)?;
                (row.id, SyncAction::Created)
            }
            Some(row) if !force && row.sync_hash.as_deref() == Some(hash.as_str()) => {
                debug!("List {} unchanged ({})", definition.code, hash);
                return Ok(ListOutcome::skipped(&definition.code));
            }
            Some(row) => {
                self.store
                    .update_list(&ListFilter::by_id(row.id), ListPatch::metadata(definition))
                    .await
                    .map_err(SyncError::Write)?;
                (row.id, SyncAction::Updated)
            }
        };

        let changes = self.values.sync_list_values(list_id, definition).await?;

        self.store
            .update_list(&ListFilter::by_id(list_id), ListPatch::sync_hash(hash))
            .await
            .map_err(SyncError::Write)?;

        debug!("List {} {} ({})", definition.code, action, changes);
        Ok(ListOutcome::new(
            &definition.code,
            action,
            Some(changes.to_string()),
        ))
    }
}
