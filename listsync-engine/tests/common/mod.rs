#![allow(dead_code)]

use listsync_engine::{ListSyncEngine, SyncConfig};
use listsync_storage::{CatalogStore, MemoryStore, ValueFilter};
use listsync_types::{ListDefinition, StoredList, StoredValue, ValueDefinition};
use std::sync::Arc;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("listsync=debug")
        .with_test_writer()
        .try_init();
}

pub fn list(code: &str, values: &[&str]) -> ListDefinition {
    values.iter().enumerate().fold(
        ListDefinition::new(code, format!("{code} list")),
        |def, (i, v)| {
            def.with_value(ValueDefinition::new(*v, v.to_uppercase()).with_sort_order(i as i32))
        },
    )
}

pub fn engine_with(store: Arc<MemoryStore>, config: SyncConfig) -> ListSyncEngine {
    ListSyncEngine::new(store, config)
}

pub fn engine(store: Arc<MemoryStore>) -> ListSyncEngine {
    engine_with(store, SyncConfig::default())
}

pub async fn stored_list(store: &dyn CatalogStore, code: &str) -> StoredList {
    store
        .find_list(code)
        .await
        .unwrap()
        .unwrap_or_else(|| panic!("list {code} not stored"))
}

pub async fn stored_values(store: &dyn CatalogStore, code: &str) -> Vec<StoredValue> {
    let list = stored_list(store, code).await;
    store.select_values(&ValueFilter::for_list(list.id)).await.unwrap()
}

pub async fn stored_codes(store: &dyn CatalogStore, code: &str) -> Vec<String> {
    stored_values(store, code)
        .await
        .into_iter()
        .map(|v| v.code)
        .collect()
}
