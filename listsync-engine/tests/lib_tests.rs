use listsync_engine::{
    ConcurrentRunPolicy, ListSyncEngine, SyncConfig, DEFAULT_BATCH_SIZE, FINGERPRINT_LEN,
};
use listsync_storage::MemoryStore;
use std::sync::Arc;

#[test]
fn sync_engine_creation() {
    let engine = ListSyncEngine::new(Arc::new(MemoryStore::new()), SyncConfig::default());
    assert_eq!(engine.batch_size(), DEFAULT_BATCH_SIZE);
    assert!(!engine.is_sync_in_progress());
}

#[test]
fn default_config() {
    let config = SyncConfig::default();
    assert_eq!(config.batch_size, 5);
    assert_eq!(config.concurrent_run_policy, ConcurrentRunPolicy::Reject);
    assert_eq!(config.status_channel_capacity, 64);
    assert_eq!(SyncConfig::system_lists(), config);
    assert_eq!(SyncConfig::autocomplete_lists().batch_size, 3);
}

#[test]
fn zero_batch_size_is_clamped() {
    let config = SyncConfig::default().with_batch_size(0);
    assert_eq!(config.effective_batch_size(), 1);
    let engine = ListSyncEngine::new(Arc::new(MemoryStore::new()), config);
    assert_eq!(engine.batch_size(), 1);
}

#[test]
fn config_deserializes_with_defaults() {
    let config: SyncConfig =
        serde_json::from_str(r#"{"concurrent_run_policy":"return_empty"}"#).unwrap();
    assert_eq!(config.concurrent_run_policy, ConcurrentRunPolicy::ReturnEmpty);
    assert_eq!(config.batch_size, DEFAULT_BATCH_SIZE);
}

#[test]
fn fingerprint_length() {
    assert_eq!(FINGERPRINT_LEN, 16);
}
