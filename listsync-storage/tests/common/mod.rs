//! Behaviour every `CatalogStore` implementation must share.

#![allow(dead_code)]

use listsync_storage::{CatalogStore, ListFilter, StorageError, ValueFilter};
use listsync_types::{
    ListDefinition, ListId, ListPatch, NewList, NewValue, StoredValue, ValueFields, ValueId,
    ValuePatch,
};

pub fn new_list(code: &str) -> NewList {
    NewList::from_definition(
        &ListDefinition::new(code, code.to_uppercase()).with_scope("portal", "library"),
    )
}

pub fn fields(label: &str, parent_id: Option<ValueId>) -> ValueFields {
    ValueFields {
        label: label.to_string(),
        secondary_label: None,
        parent_id,
        sort_order: 0,
        level: None,
        metadata: Default::default(),
    }
}

pub fn new_value(list_id: ListId, code: &str, label: &str) -> NewValue {
    NewValue {
        list_id,
        code: code.to_string(),
        fields: fields(label, None),
    }
}

pub async fn insert_and_select_list(store: &dyn CatalogStore) {
    let inserted = store.insert_list(new_list("genres")).await.unwrap();
    assert_eq!(inserted.code, "genres");
    assert!(inserted.active);
    assert_eq!(inserted.sync_hash, None);

    let found = store.find_list("genres").await.unwrap().unwrap();
    assert_eq!(found, inserted);
    assert!(store.find_list("missing").await.unwrap().is_none());

    let by_id = store.select_lists(&ListFilter::by_id(inserted.id)).await.unwrap();
    assert_eq!(by_id.len(), 1);
}

pub async fn duplicate_list_code_conflicts(store: &dyn CatalogStore) {
    store.insert_list(new_list("genres")).await.unwrap();
    let err = store.insert_list(new_list("genres")).await.unwrap_err();
    assert!(matches!(err, StorageError::Conflict(_)), "{err}");
}

pub async fn update_list_patches_in_place(store: &dyn CatalogStore) {
    let inserted = store.insert_list(new_list("genres")).await.unwrap();
    let updated = store
        .update_list(&ListFilter::by_code("genres"), ListPatch::sync_hash("0123"))
        .await
        .unwrap();
    assert_eq!(updated.id, inserted.id);
    assert_eq!(updated.sync_hash.as_deref(), Some("0123"));
    assert_eq!(updated.name, inserted.name);

    let reread = store.find_list("genres").await.unwrap().unwrap();
    assert_eq!(reread.sync_hash.as_deref(), Some("0123"));
}

pub async fn update_missing_list_is_not_found(store: &dyn CatalogStore) {
    let err = store
        .update_list(&ListFilter::by_code("nope"), ListPatch::sync_hash("x"))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound(_)), "{err}");
}

pub async fn update_matching_many_lists_is_ambiguous(store: &dyn CatalogStore) {
    store.insert_list(new_list("a")).await.unwrap();
    store.insert_list(new_list("b")).await.unwrap();
    let err = store
        .update_list(&ListFilter::default(), ListPatch::sync_hash("x"))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Ambiguous(_)), "{err}");
}

pub async fn values_are_scoped_to_their_list(store: &dyn CatalogStore) {
    let a = store.insert_list(new_list("a")).await.unwrap();
    let b = store.insert_list(new_list("b")).await.unwrap();
    store.insert_value(new_value(a.id, "x", "X in A")).await.unwrap();
    store.insert_value(new_value(b.id, "x", "X in B")).await.unwrap();

    let err = store.insert_value(new_value(a.id, "x", "again")).await.unwrap_err();
    assert!(matches!(err, StorageError::Conflict(_)), "{err}");

    let in_a = store.select_values(&ValueFilter::for_list(a.id)).await.unwrap();
    assert_eq!(in_a.len(), 1);
    assert_eq!(in_a[0].label, "X in A");
}

pub async fn values_sorted_by_sort_order_then_code(store: &dyn CatalogStore) {
    let list = store.insert_list(new_list("l")).await.unwrap();
    for (code, order) in [("c", 1), ("a", 2), ("b", 1)] {
        let mut row = new_value(list.id, code, code);
        row.fields.sort_order = order;
        store.insert_value(row).await.unwrap();
    }
    let codes: Vec<String> = store
        .select_values(&ValueFilter::for_list(list.id))
        .await
        .unwrap()
        .into_iter()
        .map(|v| v.code)
        .collect();
    assert_eq!(codes, vec!["b", "c", "a"]);
}

pub async fn parent_must_share_list(store: &dyn CatalogStore) {
    let a = store.insert_list(new_list("a")).await.unwrap();
    let b = store.insert_list(new_list("b")).await.unwrap();
    let parent = store.insert_value(new_value(a.id, "p", "P")).await.unwrap();

    let child = NewValue {
        list_id: b.id,
        code: "c".into(),
        fields: fields("C", Some(parent.id)),
    };
    let err = store.insert_value(child).await.unwrap_err();
    assert!(matches!(err, StorageError::InvalidData(_)), "{err}");

    let child = NewValue {
        list_id: a.id,
        code: "c".into(),
        fields: fields("C", Some(parent.id)),
    };
    let stored = store.insert_value(child).await.unwrap();
    assert_eq!(stored.parent_id, Some(parent.id));
}

pub async fn value_for_unknown_list_is_rejected(store: &dyn CatalogStore) {
    let err = store
        .insert_value(new_value(ListId::new(), "x", "X"))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::InvalidData(_)), "{err}");
}

pub async fn update_value_replaces_fields(store: &dyn CatalogStore) {
    let list = store.insert_list(new_list("l")).await.unwrap();
    let value = store.insert_value(new_value(list.id, "v1", "A")).await.unwrap();

    let mut next = fields("A2", None);
    next.level = Some(3);
    next.metadata.insert("icon".into(), serde_json::json!("book"));
    let updated: StoredValue = store
        .update_value(
            &ValueFilter::for_list(list.id).with_code("v1"),
            ValuePatch::activate(next),
        )
        .await
        .unwrap();
    assert_eq!(updated.id, value.id);
    assert_eq!(updated.label, "A2");
    assert_eq!(updated.level, Some(3));
    assert_eq!(updated.metadata["icon"], serde_json::json!("book"));

    let reread = store.select_values(&ValueFilter::by_id(value.id)).await.unwrap();
    assert_eq!(reread[0].label, "A2");
}

pub async fn value_cannot_parent_itself(store: &dyn CatalogStore) {
    let list = store.insert_list(new_list("l")).await.unwrap();
    let value = store.insert_value(new_value(list.id, "v1", "A")).await.unwrap();
    let err = store
        .update_value(
            &ValueFilter::by_id(value.id),
            ValuePatch::activate(fields("A", Some(value.id))),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::InvalidData(_)), "{err}");
}

pub async fn deleting_parent_clears_child_link(store: &dyn CatalogStore) {
    let list = store.insert_list(new_list("l")).await.unwrap();
    let parent = store.insert_value(new_value(list.id, "p", "P")).await.unwrap();
    let child = store
        .insert_value(NewValue {
            list_id: list.id,
            code: "c".into(),
            fields: fields("C", Some(parent.id)),
        })
        .await
        .unwrap();

    let removed = store
        .delete_values(&ValueFilter::for_list(list.id).with_code("p"))
        .await
        .unwrap();
    assert_eq!(removed, 1);

    let rows = store.select_values(&ValueFilter::for_list(list.id)).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, child.id);
    assert_eq!(rows[0].parent_id, None);
}

pub async fn delete_with_code_set(store: &dyn CatalogStore) {
    let list = store.insert_list(new_list("l")).await.unwrap();
    for code in ["a", "b", "c"] {
        store.insert_value(new_value(list.id, code, code)).await.unwrap();
    }
    let removed = store
        .delete_values(&ValueFilter::for_list(list.id).with_codes(vec!["a".into(), "c".into()]))
        .await
        .unwrap();
    assert_eq!(removed, 2);

    let none = store
        .delete_values(&ValueFilter::for_list(list.id).with_codes(Vec::new()))
        .await
        .unwrap();
    assert_eq!(none, 0);

    let rows = store.select_values(&ValueFilter::for_list(list.id)).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].code, "b");
}

pub async fn deleting_list_removes_its_values(store: &dyn CatalogStore) {
    let list = store.insert_list(new_list("l")).await.unwrap();
    store.insert_value(new_value(list.id, "a", "A")).await.unwrap();
    let removed = store.delete_lists(&ListFilter::by_code("l")).await.unwrap();
    assert_eq!(removed, 1);
    assert!(store.find_list("l").await.unwrap().is_none());
    assert!(store
        .select_values(&ValueFilter::for_list(list.id))
        .await
        .unwrap()
        .is_empty());
}
