//! Stored rows and the payloads used to write them.

use crate::{ListDefinition, ListId, Metadata, Scope, ValueDefinition, ValueId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted list row. Mirrors its definition plus the sync hash of the
/// content last written in full.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredList {
    pub id: ListId,
    /// Unique, immutable once created.
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub scope: Scope,
    pub hierarchical: bool,
    /// `None` while a write is incomplete, so the list is always stale.
    pub sync_hash: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredList {
    /// Applies a patch in place. The id and code never change.
    pub fn apply_patch(&mut self, patch: &ListPatch, now: DateTime<Utc>) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(description) = &patch.description {
            self.description = description.clone();
        }
        if let Some(scope) = &patch.scope {
            self.scope = scope.clone();
        }
        if let Some(hierarchical) = patch.hierarchical {
            self.hierarchical = hierarchical;
        }
        if let Some(sync_hash) = &patch.sync_hash {
            self.sync_hash = sync_hash.clone();
        }
        if let Some(active) = patch.active {
            self.active = active;
        }
        self.updated_at = now;
    }
}

/// Insert payload for a list row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewList {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub scope: Scope,
    pub hierarchical: bool,
    pub sync_hash: Option<String>,
    pub active: bool,
}

impl NewList {
    /// Builds an active list row from a definition, without a sync hash.
    pub fn from_definition(definition: &ListDefinition) -> Self {
        Self {
            code: definition.code.clone(),
            name: definition.name.clone(),
            description: definition.description.clone(),
            scope: definition.scope.clone(),
            hierarchical: definition.hierarchical,
            sync_hash: None,
            active: true,
        }
    }
}

/// Partial update of a list row. `None` leaves a column unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListPatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub scope: Option<Scope>,
    pub hierarchical: Option<bool>,
    /// `Some(None)` clears the stored hash.
    pub sync_hash: Option<Option<String>>,
    pub active: Option<bool>,
}

impl ListPatch {
    /// Rewrites every metadata column from the definition, reactivates the
    /// list and clears its hash until the values have been written.
    pub fn metadata(definition: &ListDefinition) -> Self {
        Self {
            name: Some(definition.name.clone()),
            description: Some(definition.description.clone()),
            scope: Some(definition.scope.clone()),
            hierarchical: Some(definition.hierarchical),
            sync_hash: Some(None),
            active: Some(true),
        }
    }

    /// Only sets the sync hash.
    pub fn sync_hash(hash: impl Into<String>) -> Self {
        Self {
            sync_hash: Some(Some(hash.into())),
            ..Self::default()
        }
    }
}

/// A persisted value row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredValue {
    pub id: ValueId,
    pub list_id: ListId,
    /// Unique within `list_id`.
    pub code: String,
    pub label: String,
    pub secondary_label: Option<String>,
    /// Always a value of the same list.
    pub parent_id: Option<ValueId>,
    pub sort_order: i32,
    pub level: Option<i32>,
    pub metadata: Metadata,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredValue {
    /// Applies a patch in place. The id, list and code never change.
    pub fn apply_patch(&mut self, patch: &ValuePatch, now: DateTime<Utc>) {
        let fields = &patch.fields;
        self.label = fields.label.clone();
        self.secondary_label = fields.secondary_label.clone();
        self.parent_id = fields.parent_id;
        self.sort_order = fields.sort_order;
        self.level = fields.level;
        self.metadata = fields.metadata.clone();
        self.active = patch.active;
        self.updated_at = now;
    }
}

/// The mutable columns of a value row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueFields {
    pub label: String,
    pub secondary_label: Option<String>,
    pub parent_id: Option<ValueId>,
    pub sort_order: i32,
    pub level: Option<i32>,
    pub metadata: Metadata,
}

impl ValueFields {
    /// Copies the declared columns of a value, with an already resolved parent.
    pub fn from_definition(value: &ValueDefinition, parent_id: Option<ValueId>) -> Self {
        Self {
            label: value.label.clone(),
            secondary_label: value.secondary_label.clone(),
            parent_id,
            sort_order: value.sort_order,
            level: value.level,
            metadata: value.metadata.clone(),
        }
    }
}

/// Insert payload for a value row. New values are always active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewValue {
    pub list_id: ListId,
    pub code: String,
    pub fields: ValueFields,
}

/// Full replacement of a value row's mutable columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuePatch {
    pub fields: ValueFields,
    pub active: bool,
}

impl ValuePatch {
    /// Replaces the fields and forces the row active.
    pub fn activate(fields: ValueFields) -> Self {
        Self {
            fields,
            active: true,
        }
    }
}
