//! Content fingerprints for change detection.
//!
//! A fingerprint is the truncated SHA-256 of a canonical JSON rendering of
//! everything in a definition that ends up in storage. Canonical means
//! object keys sorted at every depth and no whitespace, so the digest is
//! stable across processes and independent of map insertion order.

use listsync_types::{ListDefinition, ValueDefinition};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::fmt::Write;

/// Length of a fingerprint in hex characters.
pub const FINGERPRINT_LEN: usize = 16;

/// Computes the fingerprint of a definition.
pub fn fingerprint(definition: &ListDefinition) -> String {
    let canonical = canonical_json(&fingerprint_document(definition));
    let mut digest = hex::encode(Sha256::digest(canonical.as_bytes()));
    digest.truncate(FINGERPRINT_LEN);
    digest
}

fn fingerprint_document(definition: &ListDefinition) -> Value {
    let values: Vec<Value> = definition.values.iter().map(value_document).collect();
    json!({
        "code": definition.code,
        "name": definition.name,
        "description": definition.description,
        "scope": definition.scope,
        "hierarchical": definition.hierarchical,
        "values": values,
    })
}

fn value_document(value: &ValueDefinition) -> Value {
    json!({
        "code": value.code,
        "label": value.label,
        "secondary_label": value.secondary_label,
        "parent_code": value.parent_code,
        "sort_order": value.sort_order,
        "level": value.level,
        "metadata": value.metadata,
    })
}

/// Renders a JSON value with sorted keys and no insignificant whitespace.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {
            // Display on scalars is compact and escapes strings.
            let _ = write!(out, "{value}");
        }
        Value::Array(items) => {
            out.push('[');
            for (idx, item) in items.iter().enumerate() {
                if idx > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (idx, key) in keys.iter().enumerate() {
                if idx > 0 {
                    out.push(',');
                }
                let _ = write!(out, "{}", Value::String((*key).clone()));
                out.push(':');
                write_canonical(&map[*key], out);
            }
            out.push('}');
        }
    }
}
