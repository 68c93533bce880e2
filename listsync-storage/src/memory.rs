//! In-memory catalog store.
//!
//! Holds both tables in ordered maps behind a tokio `RwLock`. Besides
//! serving as a lightweight host store it carries fault injection and
//! concurrency probes so engine behaviour can be exercised without a
//! database.

use crate::error::{StorageError, StorageResult};
use crate::store::{CatalogStore, ListFilter, ValueFilter};
use async_trait::async_trait;
use chrono::Utc;
use listsync_types::{
    ListId, ListPatch, NewList, NewValue, StoredList, StoredValue, ValueId, ValuePatch,
};
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock as StdRwLock;
use std::time::Duration;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Tables {
    lists: BTreeMap<ListId, StoredList>,
    values: BTreeMap<ValueId, StoredValue>,
}

impl Tables {
    fn list_code(&self, list_id: &ListId) -> Option<&str> {
        self.lists.get(list_id).map(|l| l.code.as_str())
    }

    /// Checks that `parent_id` names a value of `list_id` other than `own_id`.
    fn check_parent(
        &self,
        list_id: ListId,
        own_id: Option<ValueId>,
        parent_id: Option<ValueId>,
    ) -> StorageResult<()> {
        let Some(parent_id) = parent_id else {
            return Ok(());
        };
        if Some(parent_id) == own_id {
            return Err(StorageError::InvalidData(format!(
                "value {parent_id} cannot be its own parent"
            )));
        }
        match self.values.get(&parent_id) {
            Some(parent) if parent.list_id == list_id => Ok(()),
            Some(_) => Err(StorageError::InvalidData(format!(
                "parent {parent_id} belongs to another list"
            ))),
            None => Err(StorageError::InvalidData(format!(
                "parent {parent_id} does not exist"
            ))),
        }
    }
}

#[derive(Debug, Default)]
struct Faults {
    list_writes: HashSet<String>,
    value_writes: HashSet<String>,
    lookups: bool,
}

/// Decrements the in-flight counter when an operation settles.
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A `CatalogStore` kept entirely in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    faults: StdRwLock<Faults>,
    latency: Option<Duration>,
    writes: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays every operation by `latency`, so concurrent callers overlap.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Makes every list-table write for `code` fail.
    pub fn fail_writes_for_list_code(&self, code: impl Into<String>) {
        self.faults_mut().list_writes.insert(code.into());
    }

    /// Makes every value-table write for the list with `code` fail.
    pub fn fail_value_writes_for_list_code(&self, code: impl Into<String>) {
        self.faults_mut().value_writes.insert(code.into());
    }

    /// Makes every select fail.
    pub fn fail_lookups(&self) {
        self.faults_mut().lookups = true;
    }

    /// Lets selects succeed again.
    pub fn restore_lookups(&self) {
        self.faults_mut().lookups = false;
    }

    /// Removes every injected fault.
    pub fn clear_faults(&self) {
        *self.faults_mut() = Faults::default();
    }

    /// Number of successful insert/update/delete calls so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Highest number of operations observed in flight at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn faults_mut(&self) -> std::sync::RwLockWriteGuard<'_, Faults> {
        self.faults.write().unwrap_or_else(|e| e.into_inner())
    }

    fn check_lookup(&self) -> StorageResult<()> {
        let faults = self.faults.read().unwrap_or_else(|e| e.into_inner());
        if faults.lookups {
            return Err(StorageError::Unavailable("lookup rejected".to_string()));
        }
        Ok(())
    }

    fn check_list_write(&self, code: &str) -> StorageResult<()> {
        let faults = self.faults.read().unwrap_or_else(|e| e.into_inner());
        if faults.list_writes.contains(code) {
            return Err(StorageError::Unavailable(format!("write to list {code} rejected")));
        }
        Ok(())
    }

    fn check_value_write(&self, list_code: Option<&str>) -> StorageResult<()> {
        let faults = self.faults.read().unwrap_or_else(|e| e.into_inner());
        if let Some(code) = list_code {
            if faults.value_writes.contains(code) {
                return Err(StorageError::Unavailable(format!(
                    "write to values of list {code} rejected"
                )));
            }
        }
        Ok(())
    }

    async fn enter(&self) -> InFlight<'_> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let guard = InFlight(&self.in_flight);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        guard
    }

    fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn select_lists(&self, filter: &ListFilter) -> StorageResult<Vec<StoredList>> {
        let _op = self.enter().await;
        self.check_lookup()?;
        let tables = self.tables.read().await;
        let mut rows: Vec<StoredList> = tables
            .lists
            .values()
            .filter(|l| filter.matches(l))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(rows)
    }

    async fn insert_list(&self, row: NewList) -> StorageResult<StoredList> {
        let _op = self.enter().await;
        self.check_list_write(&row.code)?;
        let mut tables = self.tables.write().await;
        if tables.lists.values().any(|l| l.code == row.code) {
            return Err(StorageError::Conflict(format!("list {} already exists", row.code)));
        }
        let now = Utc::now();
        let stored = StoredList {
            id: ListId::new(),
            code: row.code,
            name: row.name,
            description: row.description,
            scope: row.scope,
            hierarchical: row.hierarchical,
            sync_hash: row.sync_hash,
            active: row.active,
            created_at: now,
            updated_at: now,
        };
        tables.lists.insert(stored.id, stored.clone());
        self.record_write();
        Ok(stored)
    }

    async fn update_list(
        &self,
        filter: &ListFilter,
        patch: ListPatch,
    ) -> StorageResult<StoredList> {
        let _op = self.enter().await;
        let mut tables = self.tables.write().await;
        let ids: Vec<ListId> = tables
            .lists
            .values()
            .filter(|l| filter.matches(l))
            .map(|l| l.id)
            .collect();
        let id = match ids.as_slice() {
            [] => return Err(StorageError::NotFound(format!("list matching {filter:?}"))),
            [id] => *id,
            _ => {
                return Err(StorageError::Ambiguous(format!(
                    "{} lists match {filter:?}",
                    ids.len()
                )));
            }
        };
        let row = tables
            .lists
            .get_mut(&id)
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;
        self.check_list_write(&row.code)?;
        row.apply_patch(&patch, Utc::now());
        let updated = row.clone();
        self.record_write();
        Ok(updated)
    }

    async fn delete_lists(&self, filter: &ListFilter) -> StorageResult<usize> {
        let _op = self.enter().await;
        let mut tables = self.tables.write().await;
        let doomed: Vec<(ListId, String)> = tables
            .lists
            .values()
            .filter(|l| filter.matches(l))
            .map(|l| (l.id, l.code.clone()))
            .collect();
        for (_, code) in &doomed {
            self.check_list_write(code)?;
        }
        let ids: HashSet<ListId> = doomed.iter().map(|(id, _)| *id).collect();
        tables.lists.retain(|id, _| !ids.contains(id));
        tables.values.retain(|_, v| !ids.contains(&v.list_id));
        self.record_write();
        Ok(doomed.len())
    }

    async fn select_values(&self, filter: &ValueFilter) -> StorageResult<Vec<StoredValue>> {
        let _op = self.enter().await;
        self.check_lookup()?;
        let tables = self.tables.read().await;
        let mut rows: Vec<StoredValue> = tables
            .values
            .values()
            .filter(|v| filter.matches(v))
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then_with(|| a.code.cmp(&b.code)));
        Ok(rows)
    }

    async fn insert_value(&self, row: NewValue) -> StorageResult<StoredValue> {
        let _op = self.enter().await;
        let mut tables = self.tables.write().await;
        let Some(list_code) = tables.list_code(&row.list_id) else {
            return Err(StorageError::InvalidData(format!("list {} does not exist", row.list_id)));
        };
        self.check_value_write(Some(list_code))?;
        if tables
            .values
            .values()
            .any(|v| v.list_id == row.list_id && v.code == row.code)
        {
            return Err(StorageError::Conflict(format!(
                "value {} already exists in list {list_code}",
                row.code
            )));
        }
        tables.check_parent(row.list_id, None, row.fields.parent_id)?;

        let now = Utc::now();
        let fields = row.fields;
        let stored = StoredValue {
            id: ValueId::new(),
            list_id: row.list_id,
            code: row.code,
            label: fields.label,
            secondary_label: fields.secondary_label,
            parent_id: fields.parent_id,
            sort_order: fields.sort_order,
            level: fields.level,
            metadata: fields.metadata,
            active: true,
            created_at: now,
            updated_at: now,
        };
        tables.values.insert(stored.id, stored.clone());
        self.record_write();
        Ok(stored)
    }

    async fn update_value(
        &self,
        filter: &ValueFilter,
        patch: ValuePatch,
    ) -> StorageResult<StoredValue> {
        let _op = self.enter().await;
        let mut tables = self.tables.write().await;
        let matched: Vec<(ValueId, ListId)> = tables
            .values
            .values()
            .filter(|v| filter.matches(v))
            .map(|v| (v.id, v.list_id))
            .collect();
        let (id, list_id) = match matched.as_slice() {
            [] => return Err(StorageError::NotFound(format!("value matching {filter:?}"))),
            [one] => *one,
            _ => {
                return Err(StorageError::Ambiguous(format!(
                    "{} values match {filter:?}",
                    matched.len()
                )));
            }
        };
        self.check_value_write(tables.list_code(&list_id))?;
        tables.check_parent(list_id, Some(id), patch.fields.parent_id)?;

        let row = tables
            .values
            .get_mut(&id)
            .ok_or_else(|| StorageError::NotFound(id.to_string()))?;
        row.apply_patch(&patch, Utc::now());
        let updated = row.clone();
        self.record_write();
        Ok(updated)
    }

    async fn delete_values(&self, filter: &ValueFilter) -> StorageResult<usize> {
        let _op = self.enter().await;
        let mut tables = self.tables.write().await;
        let doomed: Vec<(ValueId, ListId)> = tables
            .values
            .values()
            .filter(|v| filter.matches(v))
            .map(|v| (v.id, v.list_id))
            .collect();
        for (_, list_id) in &doomed {
            self.check_value_write(tables.list_code(list_id))?;
        }

        let ids: HashSet<ValueId> = doomed.iter().map(|(id, _)| *id).collect();
        tables.values.retain(|id, _| !ids.contains(id));
        let now = Utc::now();
        for value in tables.values.values_mut() {
            if value.parent_id.is_some_and(|p| ids.contains(&p)) {
                value.parent_id = None;
                value.updated_at = now;
            }
        }
        self.record_write();
        Ok(doomed.len())
    }
}
