use listsync_types::{Error, ListDefinition, ValueDefinition};
use pretty_assertions::assert_eq;

fn regions() -> ListDefinition {
    ListDefinition::new("regions", "Regions")
        .with_description("Administrative regions")
        .with_scope("portal", "public")
        .with_scope("module", "deposit")
        .hierarchical()
        .with_value(ValueDefinition::new("north", "North").with_sort_order(1).with_level(1))
        .with_value(
            ValueDefinition::new("north-city", "North City")
                .with_parent("north")
                .with_sort_order(2)
                .with_level(2),
        )
}

#[test]
fn builder_sets_fields() {
    let def = regions();
    assert_eq!(def.code, "regions");
    assert_eq!(def.description.as_deref(), Some("Administrative regions"));
    assert!(def.hierarchical);
    assert_eq!(def.scope.len(), 2);
    assert_eq!(def.values.len(), 2);
    assert_eq!(def.value("north-city").unwrap().parent_code.as_deref(), Some("north"));
    assert!(def.value("south").is_none());
}

#[test]
fn value_builder_sets_optional_fields() {
    let value = ValueDefinition::new("v1", "Label")
        .with_secondary_label("Étiquette")
        .with_metadata("color", serde_json::json!("red"));
    assert_eq!(value.secondary_label.as_deref(), Some("Étiquette"));
    assert_eq!(value.metadata["color"], serde_json::json!("red"));
    assert_eq!(value.sort_order, 0);
    assert_eq!(value.level, None);
}

#[test]
fn valid_definition_passes() {
    assert!(regions().validate().is_ok());
    assert!(ListDefinition::new("empty", "Empty").validate().is_ok());
}

#[test]
fn empty_list_code_is_rejected() {
    let err = ListDefinition::new("  ", "Blank").validate().unwrap_err();
    assert!(matches!(err, Error::InvalidDefinition(_)));
}

#[test]
fn empty_value_code_is_rejected() {
    let def = ListDefinition::new("l", "L").with_value(ValueDefinition::new("", "Nothing"));
    assert!(matches!(def.validate(), Err(Error::InvalidDefinition(_))));
}

#[test]
fn duplicate_value_code_is_rejected() {
    let def = ListDefinition::new("l", "L")
        .with_value(ValueDefinition::new("a", "A"))
        .with_value(ValueDefinition::new("a", "A again"));
    let err = def.validate().unwrap_err();
    assert!(err.to_string().contains("more than once"));
}

#[test]
fn deserializes_with_defaults() {
    let def: ListDefinition = serde_json::from_str(
        r#"{"code":"genres","name":"Genres","values":[{"code":"novel","label":"Novel"}]}"#,
    )
    .unwrap();
    assert_eq!(def.description, None);
    assert!(!def.hierarchical);
    assert!(def.scope.is_empty());
    assert_eq!(def.values[0], ValueDefinition::new("novel", "Novel"));
}

#[test]
fn scope_order_does_not_matter() {
    let a = ListDefinition::new("l", "L").with_scope("a", "1").with_scope("b", "2");
    let b = ListDefinition::new("l", "L").with_scope("b", "2").with_scope("a", "1");
    assert_eq!(a, b);
}
