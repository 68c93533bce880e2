//! Core type definitions for the list synchronization engine.
//!
//! This crate defines the plain data shared by the storage and engine
//! crates:
//! - List and value identifiers (UUID v7)
//! - Declarative list definitions supplied by the host application
//! - Stored list/value rows and the insert/patch payloads used to write them
//!
//! Nothing here performs I/O.

mod definition;
mod ids;
mod record;

pub use definition::{ListDefinition, ValueDefinition};
pub use ids::{ListId, ValueId};
pub use record::{ListPatch, NewList, NewValue, StoredList, StoredValue, ValueFields, ValuePatch};

/// Opaque key-value data attached to a value and passed through verbatim.
pub type Metadata = std::collections::BTreeMap<String, serde_json::Value>;

/// Opaque scope/classification attributes attached to a list.
pub type Scope = std::collections::BTreeMap<String, String>;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid definition: {0}")]
    InvalidDefinition(String),

    #[error("invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),
}
