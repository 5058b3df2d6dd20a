//! Tree flattener
//!
//! Reduces a raw document (see [`crate::raw`]) to a nested dictionary keyed
//! by element names. Named elements introduce a level keyed by their name,
//! repeated siblings are merged under their shared tag, table-shaped
//! elements are replaced by their extracted columns, and remaining scalar
//! values survive only as presence markers (`value -> {}`).

use crate::config::Identifiers;
use crate::diagnostics::Diagnostics;
use crate::table;
use crate::value::{Object, Value};

/// Flatten a whole raw document
///
/// The top level is treated as an anonymous element, so the result is keyed
/// by the root tag.
pub fn flatten(raw: &Value, ids: &Identifiers, diags: &mut Diagnostics) -> Object {
    match raw {
        Value::Object(doc) => flatten_node(doc, "", ids, diags),
        _ => Object::new(),
    }
}

/// Flatten one raw element whose tag is `tag`
pub fn flatten_node(node: &Object, tag: &str, ids: &Identifiers, diags: &mut Diagnostics) -> Object {
    if table::is_table(node, ids) {
        return table::extract(node, tag, ids, diags);
    }

    let name = node
        .get(&ids.name_key)
        .and_then(Value::scalar_text)
        .filter(|name| !name.is_empty());

    let mut out = Object::new();
    if let Some(name) = &name {
        out.insert(name.clone(), Value::empty_object());
    }

    for (key, value) in node {
        if *key == ids.name_key {
            continue;
        }
        match value {
            Value::Object(child) => {
                let sub = flatten_node(child, key, ids, diags);
                attach(&mut out, name.as_deref(), key, sub);
            }
            Value::Array(items) => {
                let mut combined = Object::new();
                for item in items {
                    match item {
                        Value::Object(child) => combined.merge(flatten_node(child, key, ids, diags)),
                        scalar => mark(&mut combined, scalar),
                    }
                }
                attach(&mut out, name.as_deref(), key, combined);
            }
            scalar => mark(&mut out, scalar),
        }
    }

    out
}

/// Store `sub` under `key`, inside the name entry when the element is named
fn attach(out: &mut Object, name: Option<&str>, key: &str, sub: Object) {
    let Some(name) = name else {
        out.insert(key, sub);
        return;
    };

    match out.get_mut(name) {
        Some(Value::Object(named)) => {
            named.insert(key, sub);
        }
        _ => {
            // A scalar marker with the same text replaced the name entry.
            let mut named = Object::new();
            named.insert(key, sub);
            out.insert(name, named);
        }
    }
}

fn mark(out: &mut Object, scalar: &Value) {
    if !scalar.is_truthy() {
        return;
    }
    if let Some(text) = scalar.scalar_text().filter(|t| !t.is_empty()) {
        out.insert(text, Value::empty_object());
    }
}
