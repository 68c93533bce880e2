//! Persistence layer for the list synchronization engine.
//!
//! The engine treats the backing store as an opaque collaborator with
//! row-level select/insert/update/delete on two logical tables: lists and
//! their values. This crate defines that collaborator and ships two
//! implementations.
//!
//! # Architecture
//!
//! - [`CatalogStore`] is the async trait the engine is written against
//! - [`MemoryStore`] keeps both tables in memory and supports fault injection
//! - [`SqliteStore`] persists both tables in SQLite
//! - [`TableLayout`] names the tables, so system lists and autocomplete
//!   lists share one schema

mod error;
mod layout;
mod memory;
mod sqlite;
mod store;

pub use error::{StorageError, StorageResult};
pub use layout::TableLayout;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use store::{CatalogStore, ListFilter, ValueFilter};
