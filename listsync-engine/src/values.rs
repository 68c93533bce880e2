//! Value reconciliation for a single list.
//!
//! Stale codes are deleted first, then declared values are updated in place
//! or inserted in declaration order. Parent codes resolve against the rows
//! of the same list that exist at that point, so a parent must be declared
//! before its children unless it was already stored.

use crate::error::{SyncError, SyncResult};
use listsync_storage::{CatalogStore, ValueFilter};
use listsync_types::{
    ListDefinition, ListId, NewValue, ValueDefinition, ValueFields, ValueId, ValuePatch,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Row changes made while reconciling one list's values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueChanges {
    pub inserted: usize,
    pub updated: usize,
    pub deleted: usize,
    /// Declared parent codes that could not be linked.
    pub unresolved_parents: usize,
}

impl fmt::Display for ValueChanges {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} inserted, {} updated, {} deleted",
            self.inserted, self.updated, self.deleted
        )?;
        if self.unresolved_parents > 0 {
            write!(f, ", {} unresolved parent(s)", self.unresolved_parents)?;
        }
        Ok(())
    }
}

/// Makes a list's stored values match its definition.
#[derive(Clone)]
pub struct ValueReconciler {
    store: Arc<dyn CatalogStore>,
}

impl ValueReconciler {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    /// Reconciles the values stored under `list_id` with `definition`.
    pub async fn sync_list_values(
        &self,
        list_id: ListId,
        definition: &ListDefinition,
    ) -> SyncResult<ValueChanges> {
        let stored = self
            .store
            .select_values(&ValueFilter::for_list(list_id))
            .await
            .map_err(SyncError::Lookup)?;

        let declared: HashSet<&str> = definition.values.iter().map(|v| v.code.as_str()).collect();
        let (kept, stale): (Vec<_>, Vec<_>) = stored
            .into_iter()
            .partition(|v| declared.contains(v.code.as_str()));

        let mut changes = ValueChanges::default();
        if !stale.is_empty() {
            let codes: Vec<String> = stale.into_iter().map(|v| v.code).collect();
            changes.deleted = self
                .store
                .delete_values(&ValueFilter::for_list(list_id).with_codes(codes))
                .await
                .map_err(SyncError::Write)?;
        }

        // Rows of this list present right now, by code.
        let mut ids: HashMap<String, ValueId> = kept.into_iter().map(|v| (v.code, v.id)).collect();

        for value in &definition.values {
            let parent_id = resolve_parent(definition, value, &ids, &mut changes);
            let fields = ValueFields::from_definition(value, parent_id);

            match ids.get(&value.code) {
                Some(&id) => {
                    self.store
                        .update_value(&ValueFilter::by_id(id), ValuePatch::activate(fields))
                        .await
                        .map_err(SyncError::Write)?;
                    changes.updated += 1;
                }
                None => {
                    let row = self
                        .store
                        .insert_value(NewValue {
                            list_id,
                            code: value.code.clone(),
                            fields,
                        })
                        .await
                        .map_err(SyncError::Write)?;
                    ids.insert(row.code, row.id);
                    changes.inserted += 1;
                }
            }
        }

        debug!("Values of list {}: {}", definition.code, changes);
        Ok(changes)
    }
}

/// Looks up the parent link of a value. Unresolvable parents are left unset.
fn resolve_parent(
    definition: &ListDefinition,
    value: &ValueDefinition,
    ids: &HashMap<String, ValueId>,
    changes: &mut ValueChanges,
) -> Option<ValueId> {
    if !definition.hierarchical {
        return None;
    }
    let parent_code = value.parent_code.as_deref()?;
    if parent_code == value.code {
        debug!(
            "Value {} of list {} names itself as parent, leaving it unlinked",
            value.code, definition.code
        );
        changes.unresolved_parents += 1;
        return None;
    }
    match ids.get(parent_code) {
        Some(&id) => Some(id),
        None => {
            debug!(
                "Parent {} of value {} in list {} not found, leaving it unlinked",
                parent_code, value.code, definition.code
            );
            changes.unresolved_parents += 1;
            None
        }
    }
}
