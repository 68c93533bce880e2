//! SQLite-backed catalog store.
//!
//! One connection behind a mutex; every statement runs on the blocking
//! pool so the async engine never stalls a runtime worker. Scope and
//! metadata are stored as JSON text, timestamps as RFC 3339 text.

use crate::error::{StorageError, StorageResult};
use crate::layout::TableLayout;
use crate::store::{CatalogStore, ListFilter, ValueFilter};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use listsync_types::{
    ListId, ListPatch, NewList, NewValue, StoredList, StoredValue, ValueId, ValuePatch,
};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::debug;

const LIST_COLUMNS: &str =
    "id, code, name, description, scope, hierarchical, sync_hash, active, created_at, updated_at";

/// Codes bound per statement, well below SQLite's host parameter limit.
const CODES_PER_STATEMENT: usize = 500;

const VALUE_COLUMNS: &str = "id, list_id, code, label, secondary_label, parent_id, sort_order, \
     level, metadata, active, created_at, updated_at";

/// Persistent catalog store backed by SQLite.
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
    layout: Arc<TableLayout>,
}

impl SqliteStore {
    /// Opens (or creates) a store at the given path.
    pub fn open(path: impl AsRef<Path>, layout: TableLayout) -> StorageResult<Self> {
        let conn = Connection::open(path.as_ref())?;
        Self::with_connection(conn, layout)
    }

    /// Opens an in-memory store (for testing).
    pub fn open_in_memory(layout: TableLayout) -> StorageResult<Self> {
        Self::with_connection(Connection::open_in_memory()?, layout)
    }

    fn with_connection(conn: Connection, layout: TableLayout) -> StorageResult<Self> {
        layout.validate()?;
        init_schema(&conn, &layout)?;
        debug!("Opened catalog store with tables {} / {}", layout.lists, layout.values);
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            layout: Arc::new(layout),
        })
    }

    /// Returns the table layout this store writes to.
    pub fn layout(&self) -> &TableLayout {
        &self.layout
    }

    async fn with_conn<T, F>(&self, f: F) -> StorageResult<T>
    where
        F: FnOnce(&Connection, &TableLayout) -> StorageResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        let layout = Arc::clone(&self.layout);
        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|_| StorageError::Unavailable("connection lock poisoned".to_string()))?;
            f(&conn, &layout)
        })
        .await?
    }
}

fn init_schema(conn: &Connection, layout: &TableLayout) -> StorageResult<()> {
    let TableLayout { lists, values } = layout;
    conn.execute_batch(&format!(
        "
        PRAGMA foreign_keys = ON;

        CREATE TABLE IF NOT EXISTS {lists} (
            id TEXT PRIMARY KEY,
            code TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            description TEXT,
            scope TEXT NOT NULL,
            hierarchical INTEGER NOT NULL,
            sync_hash TEXT,
            active INTEGER NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS {values} (
            id TEXT PRIMARY KEY,
            list_id TEXT NOT NULL REFERENCES {lists}(id) ON DELETE CASCADE,
            code TEXT NOT NULL,
            label TEXT NOT NULL,
            secondary_label TEXT,
            parent_id TEXT REFERENCES {values}(id) ON DELETE SET NULL,
            sort_order INTEGER NOT NULL,
            level INTEGER,
            metadata TEXT NOT NULL,
            active INTEGER NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE(list_id, code)
        );

        CREATE INDEX IF NOT EXISTS {values}_list_idx ON {values}(list_id);
        "
    ))?;
    Ok(())
}

// ── Filters ──────────────────────────────────────────────────────

fn push_param(params: &mut Vec<String>, value: String) -> String {
    params.push(value);
    format!("?{}", params.len())
}

fn where_clause(clauses: Vec<String>) -> String {
    if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    }
}

fn list_where(filter: &ListFilter) -> (String, Vec<String>) {
    let mut params = Vec::new();
    let mut clauses = Vec::new();
    if let Some(id) = filter.id {
        clauses.push(format!("id = {}", push_param(&mut params, id.to_string())));
    }
    if let Some(code) = &filter.code {
        clauses.push(format!("code = {}", push_param(&mut params, code.clone())));
    }
    (where_clause(clauses), params)
}

fn value_where(filter: &ValueFilter) -> (String, Vec<String>) {
    let mut params = Vec::new();
    let mut clauses = Vec::new();
    if let Some(id) = filter.id {
        clauses.push(format!("id = {}", push_param(&mut params, id.to_string())));
    }
    if let Some(list_id) = filter.list_id {
        clauses.push(format!("list_id = {}", push_param(&mut params, list_id.to_string())));
    }
    if let Some(codes) = &filter.codes {
        if codes.is_empty() {
            clauses.push("0".to_string());
        } else {
            let placeholders: Vec<String> = codes
                .iter()
                .map(|c| push_param(&mut params, c.clone()))
                .collect();
            clauses.push(format!("code IN ({})", placeholders.join(", ")));
        }
    }
    (where_clause(clauses), params)
}

/// Splits a filter whose code set would not fit in one statement.
fn split_codes(filter: &ValueFilter) -> Vec<ValueFilter> {
    match &filter.codes {
        Some(codes) if codes.len() > CODES_PER_STATEMENT => codes
            .chunks(CODES_PER_STATEMENT)
            .map(|chunk| ValueFilter {
                id: filter.id,
                list_id: filter.list_id,
                codes: Some(chunk.to_vec()),
            })
            .collect(),
        _ => vec![filter.clone()],
    }
}

// ── Row decoding ─────────────────────────────────────────────────

struct RawList {
    id: String,
    code: String,
    name: String,
    description: Option<String>,
    scope: String,
    hierarchical: bool,
    sync_hash: Option<String>,
    active: bool,
    created_at: String,
    updated_at: String,
}

impl RawList {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            code: row.get(1)?,
            name: row.get(2)?,
            description: row.get(3)?,
            scope: row.get(4)?,
            hierarchical: row.get(5)?,
            sync_hash: row.get(6)?,
            active: row.get(7)?,
            created_at: row.get(8)?,
            updated_at: row.get(9)?,
        })
    }

    fn decode(self) -> StorageResult<StoredList> {
        Ok(StoredList {
            id: parse_list_id(&self.id)?,
            code: self.code,
            name: self.name,
            description: self.description,
            scope: serde_json::from_str(&self.scope)?,
            hierarchical: self.hierarchical,
            sync_hash: self.sync_hash,
            active: self.active,
            created_at: parse_time(&self.created_at)?,
            updated_at: parse_time(&self.updated_at)?,
        })
    }
}

struct RawValue {
    id: String,
    list_id: String,
    code: String,
    label: String,
    secondary_label: Option<String>,
    parent_id: Option<String>,
    sort_order: i32,
    level: Option<i32>,
    metadata: String,
    active: bool,
    created_at: String,
    updated_at: String,
}

impl RawValue {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            list_id: row.get(1)?,
            code: row.get(2)?,
            label: row.get(3)?,
            secondary_label: row.get(4)?,
            parent_id: row.get(5)?,
            sort_order: row.get(6)?,
            level: row.get(7)?,
            metadata: row.get(8)?,
            active: row.get(9)?,
            created_at: row.get(10)?,
            updated_at: row.get(11)?,
        })
    }

    fn decode(self) -> StorageResult<StoredValue> {
        let parent_id = match self.parent_id {
            Some(s) => Some(parse_value_id(&s)?),
            None => None,
        };
        Ok(StoredValue {
            id: parse_value_id(&self.id)?,
            list_id: parse_list_id(&self.list_id)?,
            code: self.code,
            label: self.label,
            secondary_label: self.secondary_label,
            parent_id,
            sort_order: self.sort_order,
            level: self.level,
            metadata: serde_json::from_str(&self.metadata)?,
            active: self.active,
            created_at: parse_time(&self.created_at)?,
            updated_at: parse_time(&self.updated_at)?,
        })
    }
}

fn parse_list_id(s: &str) -> StorageResult<ListId> {
    ListId::parse(s).map_err(|e| StorageError::InvalidData(format!("list id {s}: {e}")))
}

fn parse_value_id(s: &str) -> StorageResult<ValueId> {
    ValueId::parse(s).map_err(|e| StorageError::InvalidData(format!("value id {s}: {e}")))
}

fn parse_time(s: &str) -> StorageResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StorageError::InvalidData(format!("invalid timestamp {s}: {e}")))
}

// ── Blocking queries ─────────────────────────────────────────────

fn query_lists(
    conn: &Connection,
    layout: &TableLayout,
    filter: &ListFilter,
) -> StorageResult<Vec<StoredList>> {
    let (clause, params) = list_where(filter);
    let mut stmt = conn.prepare(&format!(
        "SELECT {LIST_COLUMNS} FROM {}{clause} ORDER BY code",
        layout.lists
    ))?;
    let rows = stmt.query_map(params_from_iter(params.iter()), RawList::from_row)?;
    let mut result = Vec::new();
    for row in rows {
        result.push(row?.decode()?);
    }
    Ok(result)
}

fn query_values(
    conn: &Connection,
    layout: &TableLayout,
    filter: &ValueFilter,
) -> StorageResult<Vec<StoredValue>> {
    let chunks = split_codes(filter);
    let mut result = Vec::new();
    for chunk in &chunks {
        let (clause, params) = value_where(chunk);
        let mut stmt = conn.prepare(&format!(
            "SELECT {VALUE_COLUMNS} FROM {}{clause} ORDER BY sort_order, code",
            layout.values
        ))?;
        let rows = stmt.query_map(params_from_iter(params.iter()), RawValue::from_row)?;
        for row in rows {
            result.push(row?.decode()?);
        }
    }
    if chunks.len() > 1 {
        result.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then_with(|| a.code.cmp(&b.code)));
    }
    Ok(result)
}

/// Checks that `parent_id` names a value of `list_id` other than `own_id`.
fn check_parent(
    conn: &Connection,
    layout: &TableLayout,
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
    let parent_list: Option<String> = conn
        .query_row(
            &format!("SELECT list_id FROM {} WHERE id = ?1", layout.values),
            params![parent_id.to_string()],
            |row| row.get(0),
        )
        .optional()?;
    match parent_list {
        Some(owner) if owner == list_id.to_string() => Ok(()),
        Some(_) => Err(StorageError::InvalidData(format!(
            "parent {parent_id} belongs to another list"
        ))),
        None => Err(StorageError::InvalidData(format!(
            "parent {parent_id} does not exist"
        ))),
    }
}

fn write_list(conn: &Connection, layout: &TableLayout, row: &StoredList) -> StorageResult<()> {
    conn.execute(
        &format!(
            "UPDATE {} SET name = ?2, description = ?3, scope = ?4, hierarchical = ?5, \
             sync_hash = ?6, active = ?7, updated_at = ?8 WHERE id = ?1",
            layout.lists
        ),
        params![
            row.id.to_string(),
            row.name,
            row.description,
            serde_json::to_string(&row.scope)?,
            row.hierarchical,
            row.sync_hash,
            row.active,
            row.updated_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

fn write_value(conn: &Connection, layout: &TableLayout, row: &StoredValue) -> StorageResult<()> {
    conn.execute(
        &format!(
            "UPDATE {} SET label = ?2, secondary_label = ?3, parent_id = ?4, sort_order = ?5, \
             level = ?6, metadata = ?7, active = ?8, updated_at = ?9 WHERE id = ?1",
            layout.values
        ),
        params![
            row.id.to_string(),
            row.label,
            row.secondary_label,
            row.parent_id.map(|p| p.to_string()),
            row.sort_order,
            row.level,
            serde_json::to_string(&row.metadata)?,
            row.active,
            row.updated_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

#[async_trait]
impl CatalogStore for SqliteStore {
    async fn select_lists(&self, filter: &ListFilter) -> StorageResult<Vec<StoredList>> {
        let filter = filter.clone();
        self.with_conn(move |conn, layout| query_lists(conn, layout, &filter))
            .await
    }

    async fn insert_list(&self, row: NewList) -> StorageResult<StoredList> {
        self.with_conn(move |conn, layout| {
            if !query_lists(conn, layout, &ListFilter::by_code(row.code.clone()))?.is_empty() {
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
            conn.execute(
                &format!(
                    "INSERT INTO {} ({LIST_COLUMNS}) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                    layout.lists
                ),
                params![
                    stored.id.to_string(),
                    stored.code,
                    stored.name,
                    stored.description,
                    serde_json::to_string(&stored.scope)?,
                    stored.hierarchical,
                    stored.sync_hash,
                    stored.active,
                    stored.created_at.to_rfc3339(),
                    stored.updated_at.to_rfc3339(),
                ],
            )?;
            Ok(stored)
        })
        .await
    }

    async fn update_list(
        &self,
        filter: &ListFilter,
        patch: ListPatch,
    ) -> StorageResult<StoredList> {
        let filter = filter.clone();
        self.with_conn(move |conn, layout| {
            let matched = query_lists(conn, layout, &filter)?;
            let mut row = match <[StoredList; 1]>::try_from(matched) {
                Ok([row]) => row,
                Err(rows) if rows.is_empty() => {
                    return Err(StorageError::NotFound(format!("list matching {filter:?}")));
                }
                Err(rows) => {
                    return Err(StorageError::Ambiguous(format!(
                        "{} lists match {filter:?}",
                        rows.len()
                    )));
                }
            };
            row.apply_patch(&patch, Utc::now());
            write_list(conn, layout, &row)?;
            Ok(row)
        })
        .await
    }

    async fn delete_lists(&self, filter: &ListFilter) -> StorageResult<usize> {
        let (clause, params) = list_where(filter);
        self.with_conn(move |conn, layout| {
            let removed = conn.execute(
                &format!("DELETE FROM {}{clause}", layout.lists),
                params_from_iter(params.iter()),
            )?;
            Ok(removed)
        })
        .await
    }

    async fn select_values(&self, filter: &ValueFilter) -> StorageResult<Vec<StoredValue>> {
        let filter = filter.clone();
        self.with_conn(move |conn, layout| query_values(conn, layout, &filter))
            .await
    }

    async fn insert_value(&self, row: NewValue) -> StorageResult<StoredValue> {
        self.with_conn(move |conn, layout| {
            if query_lists(conn, layout, &ListFilter::by_id(row.list_id))?.is_empty() {
                return Err(StorageError::InvalidData(format!(
                    "list {} does not exist",
                    row.list_id
                )));
            }
            let existing = ValueFilter::for_list(row.list_id).with_code(row.code.clone());
            if !query_values(conn, layout, &existing)?.is_empty() {
                return Err(StorageError::Conflict(format!(
                    "value {} already exists in list {}",
                    row.code, row.list_id
                )));
            }
            check_parent(conn, layout, row.list_id, None, row.fields.parent_id)?;

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
            conn.execute(
                &format!(
                    "INSERT INTO {} ({VALUE_COLUMNS}) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                    layout.values
                ),
                params![
                    stored.id.to_string(),
                    stored.list_id.to_string(),
                    stored.code,
                    stored.label,
                    stored.secondary_label,
                    stored.parent_id.map(|p| p.to_string()),
                    stored.sort_order,
                    stored.level,
                    serde_json::to_string(&stored.metadata)?,
                    stored.active,
                    stored.created_at.to_rfc3339(),
                    stored.updated_at.to_rfc3339(),
                ],
            )?;
            Ok(stored)
        })
        .await
    }

    async fn update_value(
        &self,
        filter: &ValueFilter,
        patch: ValuePatch,
    ) -> StorageResult<StoredValue> {
        let filter = filter.clone();
        self.with_conn(move |conn, layout| {
            let matched = query_values(conn, layout, &filter)?;
            let mut row = match <[StoredValue; 1]>::try_from(matched) {
                Ok([row]) => row,
                Err(rows) if rows.is_empty() => {
                    return Err(StorageError::NotFound(format!("value matching {filter:?}")));
                }
                Err(rows) => {
                    return Err(StorageError::Ambiguous(format!(
                        "{} values match {filter:?}",
                        rows.len()
                    )));
                }
            };
            check_parent(conn, layout, row.list_id, Some(row.id), patch.fields.parent_id)?;
            row.apply_patch(&patch, Utc::now());
            write_value(conn, layout, &row)?;
            Ok(row)
        })
        .await
    }

    async fn delete_values(&self, filter: &ValueFilter) -> StorageResult<usize> {
        let chunks = split_codes(filter);
        self.with_conn(move |conn, layout| {
            let tx = conn.unchecked_transaction()?;
            let mut removed = 0;
            for chunk in &chunks {
                let (clause, params) = value_where(chunk);
                removed += tx.execute(
                    &format!("DELETE FROM {}{clause}", layout.values),
                    params_from_iter(params.iter()),
                )?;
            }
            tx.commit()?;
            Ok(removed)
        })
        .await
    }
}
