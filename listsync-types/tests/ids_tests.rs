use listsync_types::{Error, ListId, ValueId};
use std::collections::HashSet;
use std::str::FromStr;

// ── ListId ────────────────────────────────────────────────────────

#[test]
fn list_id_new_is_unique() {
    assert_ne!(ListId::new(), ListId::new());
}

#[test]
fn list_id_from_uuid_roundtrip() {
    let uuid = uuid::Uuid::now_v7();
    assert_eq!(ListId::from_uuid(uuid).as_uuid(), uuid);
}

#[test]
fn list_id_display_and_parse() {
    let id = ListId::new();
    assert_eq!(ListId::parse(&id.to_string()).unwrap(), id);
    assert_eq!(ListId::from_str(&id.to_string()).unwrap(), id);
}

#[test]
fn list_id_parse_invalid() {
    assert!(ListId::parse("not-a-uuid").is_err());
    assert!(ListId::from_str("garbage").is_err());
}

#[test]
fn invalid_ids_report_invalid_uuid() {
    let err = ValueId::parse("not-a-uuid").unwrap_err();
    assert!(matches!(err, Error::InvalidUuid(_)));
    assert!(err.to_string().starts_with("invalid UUID"));
    assert!(matches!(ListId::from_str("x"), Err(Error::InvalidUuid(_))));
}

#[test]
fn list_id_serializes_as_plain_uuid() {
    let id = ListId::new();
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, format!("\"{id}\""));
    let parsed: ListId = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, id);
}

#[test]
fn list_ids_are_time_ordered() {
    let a = ListId::new();
    std::thread::sleep(std::time::Duration::from_millis(2));
    let b = ListId::new();
    assert!(a < b);
}

// ── ValueId ───────────────────────────────────────────────────────

#[test]
fn value_id_new_is_unique() {
    assert_ne!(ValueId::new(), ValueId::new());
}

#[test]
fn value_id_display_and_parse() {
    let id = ValueId::new();
    assert_eq!(ValueId::parse(&id.to_string()).unwrap(), id);
}

#[test]
fn value_id_hash_and_eq() {
    let id = ValueId::new();
    let mut set = HashSet::new();
    set.insert(id);
    set.insert(id);
    assert_eq!(set.len(), 1);
}

#[test]
fn value_id_debug_contains_type_name() {
    assert!(format!("{:?}", ValueId::new()).contains("ValueId"));
}
