use listsync_engine::fingerprint::canonical_json;
use listsync_engine::{fingerprint, FINGERPRINT_LEN};
use listsync_types::{ListDefinition, ValueDefinition};
use proptest::prelude::*;

fn base() -> ListDefinition {
    ListDefinition::new("L1", "List one")
        .with_description("first list")
        .with_scope("portal", "library")
        .with_scope("form", "deposit")
        .with_value(ValueDefinition::new("v1", "A"))
        .with_value(ValueDefinition::new("v2", "B"))
}

#[test]
fn fingerprint_is_short_lowercase_hex() {
    let fp = fingerprint(&base());
    assert_eq!(fp.len(), FINGERPRINT_LEN);
    assert!(fp.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
}

#[test]
fn fingerprint_is_deterministic() {
    assert_eq!(fingerprint(&base()), fingerprint(&base()));
}

#[test]
fn scope_declaration_order_is_irrelevant() {
    let a = ListDefinition::new("L1", "n").with_scope("x", "1").with_scope("y", "2");
    let b = ListDefinition::new("L1", "n").with_scope("y", "2").with_scope("x", "1");
    assert_eq!(fingerprint(&a), fingerprint(&b));
}

#[test]
fn metadata_key_order_is_irrelevant() {
    let a = ListDefinition::new("L1", "n").with_value(
        ValueDefinition::new("v", "V")
            .with_metadata("b", serde_json::json!({"z": 1, "a": 2}))
            .with_metadata("a", serde_json::json!(true)),
    );
    let b = ListDefinition::new("L1", "n").with_value(
        ValueDefinition::new("v", "V")
            .with_metadata("a", serde_json::json!(true))
            .with_metadata("b", serde_json::json!({"a": 2, "z": 1})),
    );
    assert_eq!(fingerprint(&a), fingerprint(&b));
}

#[test]
fn label_change_changes_fingerprint() {
    let mut changed = base();
    changed.values[0].label = "A2".into();
    assert_ne!(fingerprint(&base()), fingerprint(&changed));
}

#[test]
fn adding_or_removing_a_value_changes_fingerprint() {
    let added = base().with_value(ValueDefinition::new("v3", "C"));
    assert_ne!(fingerprint(&base()), fingerprint(&added));

    let mut removed = base();
    removed.values.pop();
    assert_ne!(fingerprint(&base()), fingerprint(&removed));
}

#[test]
fn value_order_changes_fingerprint() {
    let mut reordered = base();
    reordered.values.reverse();
    assert_ne!(fingerprint(&base()), fingerprint(&reordered));
}

#[test]
fn description_scope_and_hierarchy_change_fingerprint() {
    let original = fingerprint(&base());
    assert_ne!(original, fingerprint(&base().with_description("other")));
    assert_ne!(original, fingerprint(&base().with_scope("module", "cms")));
    assert_ne!(original, fingerprint(&base().hierarchical()));
}

#[test]
fn value_details_change_fingerprint() {
    let original = fingerprint(&base());
    let mut parent = base();
    parent.values[1].parent_code = Some("v1".into());
    let mut order = base();
    order.values[1].sort_order = 9;
    let mut secondary = base();
    secondary.values[0].secondary_label = Some("a".into());
    for changed in [parent, order, secondary] {
        assert_ne!(original, fingerprint(&changed));
    }
}

#[test]
fn field_boundaries_are_unambiguous() {
    let a = ListDefinition::new("L", "n").with_value(ValueDefinition::new("ab", "c"));
    let b = ListDefinition::new("L", "n").with_value(ValueDefinition::new("a", "bc"));
    assert_ne!(fingerprint(&a), fingerprint(&b));
}

#[test]
fn canonical_json_sorts_keys_and_strips_whitespace() {
    let value = serde_json::json!({"b": [1, {"d": null, "c": "x\"y"}], "a": false});
    assert_eq!(canonical_json(&value), r#"{"a":false,"b":[1,{"c":"x\"y","d":null}]}"#);
}

proptest! {
    #[test]
    fn equal_definitions_have_equal_fingerprints(
        labels in proptest::collection::vec("[a-zA-Z ]{0,12}", 0..8),
        name in "[a-z]{1,10}",
    ) {
        let build = || {
            let mut def = ListDefinition::new("L", name.clone());
            for (i, label) in labels.iter().enumerate() {
                def = def.with_value(ValueDefinition::new(format!("v{i}"), label.clone()));
            }
            def
        };
        prop_assert_eq!(fingerprint(&build()), fingerprint(&build()));
    }

    #[test]
    fn distinct_labels_have_distinct_fingerprints(a in "[a-z]{1,12}", b in "[a-z]{1,12}") {
        prop_assume!(a != b);
        let left = ListDefinition::new("L", "n").with_value(ValueDefinition::new("v", a));
        let right = ListDefinition::new("L", "n").with_value(ValueDefinition::new("v", b));
        prop_assert_ne!(fingerprint(&left), fingerprint(&right));
    }
}
