//! Table naming for the two list families.
//!
//! System lists and autocomplete lists share one schema and differ only in
//! the tables they live in.

use crate::error::{StorageError, StorageResult};
use serde::{Deserialize, Serialize};

/// Names of the list table and the value table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableLayout {
    pub lists: String,
    pub values: String,
}

impl TableLayout {
    /// Creates a layout after checking both names are plain SQL identifiers.
    pub fn new(lists: impl Into<String>, values: impl Into<String>) -> StorageResult<Self> {
        let layout = Self {
            lists: lists.into(),
            values: values.into(),
        };
        layout.validate()?;
        Ok(layout)
    }

    /// Tables backing the platform's system lists.
    pub fn system_lists() -> Self {
        Self {
            lists: "system_lists".to_string(),
            values: "system_list_values".to_string(),
        }
    }

    /// Tables backing the autocomplete lists.
    pub fn autocomplete_lists() -> Self {
        Self {
            lists: "autocomplete_lists".to_string(),
            values: "autocomplete_values".to_string(),
        }
    }

    /// Rejects names that cannot be interpolated into SQL verbatim.
    pub fn validate(&self) -> StorageResult<()> {
        for name in [&self.lists, &self.values] {
            if !is_identifier(name) {
                return Err(StorageError::InvalidData(format!(
                    "invalid table name: {name:?}"
                )));
            }
        }
        if self.lists == self.values {
            return Err(StorageError::InvalidData(
                "list and value tables must differ".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for TableLayout {
    fn default() -> Self {
        Self::system_lists()
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
