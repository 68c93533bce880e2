//! Declarative list definitions.
//!
//! A definition is the in-code source of truth for one controlled
//! vocabulary. The engine makes the backing store match it; definitions are
//! supplied fresh on every run and never persisted as-is.

use crate::{Error, Metadata, Result, Scope};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One controlled vocabulary: a named list plus its allowed values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListDefinition {
    /// Unique, immutable key of the list.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Classification attributes (portal, module, form, ...). Opaque to the engine.
    #[serde(default)]
    pub scope: Scope,
    /// Whether values form a parent/child tree.
    #[serde(default)]
    pub hierarchical: bool,
    /// Values in declaration order. Parents must precede their children.
    #[serde(default)]
    pub values: Vec<ValueDefinition>,
}

impl ListDefinition {
    /// Creates an empty, flat list definition.
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            description: None,
            scope: Scope::new(),
            hierarchical: false,
            values: Vec::new(),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Adds (or replaces) one scope attribute.
    #[must_use]
    pub fn with_scope(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.scope.insert(key.into(), value.into());
        self
    }

    /// Marks the list as hierarchical.
    #[must_use]
    pub fn hierarchical(mut self) -> Self {
        self.hierarchical = true;
        self
    }

    /// Appends a value.
    #[must_use]
    pub fn with_value(mut self, value: ValueDefinition) -> Self {
        self.values.push(value);
        self
    }

    /// Returns the value with the given code, if declared.
    pub fn value(&self, code: &str) -> Option<&ValueDefinition> {
        self.values.iter().find(|v| v.code == code)
    }

    /// Checks the structural rules a definition must satisfy before it can be
    /// written: non-empty codes and unique value codes within the list.
    pub fn validate(&self) -> Result<()> {
        if self.code.trim().is_empty() {
            return Err(Error::InvalidDefinition("list code is empty".into()));
        }

        let mut seen = HashSet::with_capacity(self.values.len());
        for value in &self.values {
            if value.code.trim().is_empty() {
                return Err(Error::InvalidDefinition(format!(
                    "list {} declares a value with an empty code",
                    self.code
                )));
            }
            if !seen.insert(value.code.as_str()) {
                return Err(Error::InvalidDefinition(format!(
                    "list {} declares value {} more than once",
                    self.code, value.code
                )));
            }
        }
        Ok(())
    }
}

/// One allowed value of a list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueDefinition {
    /// Key of the value, unique within its list.
    pub code: String,
    /// Display label.
    pub label: String,
    /// Label in the secondary language.
    #[serde(default)]
    pub secondary_label: Option<String>,
    /// Code of the parent value. Only honoured for hierarchical lists.
    #[serde(default)]
    pub parent_code: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default)]
    pub level: Option<i32>,
    /// Passed through to storage verbatim.
    #[serde(default)]
    pub metadata: Metadata,
}

impl ValueDefinition {
    /// Creates a value with the given code and label.
    pub fn new(code: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            label: label.into(),
            secondary_label: None,
            parent_code: None,
            sort_order: 0,
            level: None,
            metadata: Metadata::new(),
        }
    }

    #[must_use]
    pub fn with_secondary_label(mut self, label: impl Into<String>) -> Self {
        self.secondary_label = Some(label.into());
        self
    }

    #[must_use]
    pub fn with_parent(mut self, parent_code: impl Into<String>) -> Self {
        self.parent_code = Some(parent_code.into());
        self
    }

    #[must_use]
    pub fn with_sort_order(mut self, sort_order: i32) -> Self {
        self.sort_order = sort_order;
        self
    }

    #[must_use]
    pub fn with_level(mut self, level: i32) -> Self {
        self.level = Some(level);
        self
    }

    /// Adds one metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}
