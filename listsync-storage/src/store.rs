//! Persistence collaborator abstraction.
//!
//! The engine never talks to a database directly. It reads and writes the
//! two logical tables (lists, values) through [`CatalogStore`], so any
//! backing store with row-level select/insert/update/delete can host it.

use crate::error::StorageResult;
use async_trait::async_trait;
use listsync_types::{
    ListId, ListPatch, NewList, NewValue, StoredList, StoredValue, ValueId, ValuePatch,
};

/// Row filter for the list table. Present fields are AND-ed; an empty
/// filter matches every row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilter {
    pub id: Option<ListId>,
    pub code: Option<String>,
}

impl ListFilter {
    /// Matches the list with the given code.
    pub fn by_code(code: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            ..Self::default()
        }
    }

    /// Matches the list with the given id.
    pub fn by_id(id: ListId) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    /// Returns true if the row satisfies the filter.
    pub fn matches(&self, row: &StoredList) -> bool {
        self.id.is_none_or(|id| row.id == id)
            && self.code.as_deref().is_none_or(|code| row.code == code)
    }
}

/// Row filter for the value table. Present fields are AND-ed; `codes`
/// matches any of the listed codes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValueFilter {
    pub id: Option<ValueId>,
    pub list_id: Option<ListId>,
    pub codes: Option<Vec<String>>,
}

impl ValueFilter {
    /// Matches every value of a list.
    pub fn for_list(list_id: ListId) -> Self {
        Self {
            list_id: Some(list_id),
            ..Self::default()
        }
    }

    /// Matches the value with the given id.
    pub fn by_id(id: ValueId) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    /// Narrows the filter to a single code.
    #[must_use]
    pub fn with_code(self, code: impl Into<String>) -> Self {
        self.with_codes(vec![code.into()])
    }

    /// Narrows the filter to any of the given codes.
    #[must_use]
    pub fn with_codes(mut self, codes: Vec<String>) -> Self {
        self.codes = Some(codes);
        self
    }

    /// Returns true if the row satisfies the filter.
    pub fn matches(&self, row: &StoredValue) -> bool {
        self.id.is_none_or(|id| row.id == id)
            && self.list_id.is_none_or(|list_id| row.list_id == list_id)
            && self
                .codes
                .as_ref()
                .is_none_or(|codes| codes.iter().any(|c| *c == row.code))
    }
}

/// Generic table access used by the engine.
///
/// Every method is a suspension point and may fail with a transport or
/// validation error. Implementations must enforce:
/// - list codes are unique;
/// - value codes are unique within a list;
/// - a value's parent belongs to the same list;
/// - deleting a value clears its children's parent link.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Returns the lists matching the filter.
    async fn select_lists(&self, filter: &ListFilter) -> StorageResult<Vec<StoredList>>;

    /// Inserts a list and returns the stored row with its generated id.
    async fn insert_list(&self, row: NewList) -> StorageResult<StoredList>;

    /// Updates exactly one list and returns the updated row.
    async fn update_list(&self, filter: &ListFilter, patch: ListPatch) -> StorageResult<StoredList>;

    /// Deletes matching lists together with their values.
    /// Returns the number of lists removed.
    async fn delete_lists(&self, filter: &ListFilter) -> StorageResult<usize>;

    /// Returns the values matching the filter, ordered by sort order then code.
    async fn select_values(&self, filter: &ValueFilter) -> StorageResult<Vec<StoredValue>>;

    /// Inserts an active value and returns the stored row.
    async fn insert_value(&self, row: NewValue) -> StorageResult<StoredValue>;

    /// Updates exactly one value and returns the updated row.
    async fn update_value(&self, filter: &ValueFilter, patch: ValuePatch)
        -> StorageResult<StoredValue>;

    /// Deletes matching values. Returns the number of rows removed.
    async fn delete_values(&self, filter: &ValueFilter) -> StorageResult<usize>;

    /// Returns the list with the given code, if stored.
    async fn find_list(&self, code: &str) -> StorageResult<Option<StoredList>> {
        Ok(self
            .select_lists(&ListFilter::by_code(code))
            .await?
            .into_iter()
            .next())
    }
}
