//! Projection engine
//!
//! Resolves every configured table's paths against a flattened dictionary.
//! A path is consumed left to right through plain mapping lookups. A
//! wildcard segment expands the mapping found at its key: one child is
//! stepped into transparently, several children each become an instance
//! keyed by the child's name. Child tables from the tree are resolved again
//! inside every instance, which is how a child table inherits its parent's
//! position in the document.

use crate::config::{CompiledConfig, PathSpec, Segment, TableTree};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::value::{Object, Value};

/// Project a flattened payload through a compiled configuration
pub fn project(config: &CompiledConfig, payload: &Object, diags: &mut Diagnostics) -> Object {
    let mut projector = Projector { config, diags };
    projector.tables(&config.tree, payload)
}

struct Projector<'a> {
    config: &'a CompiledConfig,
    diags: &'a mut Diagnostics,
}

/// Where a path is being resolved
#[derive(Clone, Copy)]
struct Target<'t> {
    table: &'t str,
    children: &'t TableTree,
    path: &'t PathSpec,
    in_instance: bool,
}

impl Projector<'_> {
    fn tables(&mut self, tables: &TableTree, payload: &Object) -> Object {
        let config = self.config;
        let mut out = Object::new();
        for (table, children) in tables.iter() {
            let mut table_out = Object::new();
            for path in config.paths_for(table) {
                let target = Target {
                    table,
                    children,
                    path,
                    in_instance: false,
                };
                self.resolve(target, path.segments(), payload, &mut table_out);
            }
            tracing::debug!(table = %table, keys = table_out.len(), "projected table");
            out.insert(table.clone(), table_out);
        }
        out
    }

    fn resolve(&mut self, target: Target<'_>, segments: &[Segment], payload: &Object, out: &mut Object) {
        let Some(wildcard_at) = segments.iter().position(|s| s.wildcard) else {
            self.resolve_direct(target, segments, payload, out);
            return;
        };
        let (prefix, rest) = segments.split_at(wildcard_at);
        let Some((wildcard, rest)) = rest.split_first() else {
            return;
        };

        let group = match lookup(payload, prefix) {
            Some(Found::Mapping(base)) => base.get(&wildcard.key),
            _ => None,
        };
        let group = match group {
            Some(Value::Object(group)) if !group.is_empty() => group,
            _ => {
                self.unavailable(target);
                return;
            }
        };

        if let Some((child_key, only)) = group.single() {
            self.step_into(target, rest, child_key, only, out);
            return;
        }

        for (instance, value) in group {
            let mut instance_out = Object::new();
            let target = Target {
                in_instance: true,
                ..target
            };
            self.step_into(target, rest, instance, value, &mut instance_out);
            merge_into(out, instance, instance_out);
        }
    }

    /// Continue resolving `rest` inside a wildcard child
    fn step_into(
        &mut self,
        target: Target<'_>,
        rest: &[Segment],
        child_key: &str,
        child: &Value,
        out: &mut Object,
    ) {
        match child {
            Value::Object(inner) => self.resolve(target, rest, inner, out),
            other if rest.is_empty() => {
                if self.allowed(target.table, child_key) {
                    out.insert(child_key, other.clone());
                }
            }
            _ => self.unavailable(target),
        }
    }

    fn resolve_direct(&mut self, target: Target<'_>, segments: &[Segment], payload: &Object, out: &mut Object) {
        match lookup(payload, segments) {
            Some(Found::Mapping(found)) => {
                for (key, value) in found {
                    if self.allowed(target.table, key) {
                        out.insert(key.clone(), value.clone());
                    }
                }
            }
            Some(Found::Leaf(value)) => {
                if let Some(last) = segments.last() {
                    if self.allowed(target.table, &last.key) {
                        out.insert(last.key.clone(), value.clone());
                    }
                }
            }
            None => self.unavailable(target),
        }

        // children resolve per instance whether or not the parent path was found
        if target.in_instance && !target.children.is_empty() {
            let nested = self.tables(target.children, payload);
            out.merge(nested);
        }
    }

    fn allowed(&self, table: &str, key: &str) -> bool {
        self.config
            .key_filters
            .get(table)
            .is_none_or(|keys| keys.contains(key))
    }

    fn unavailable(&mut self, target: Target<'_>) {
        self.diags.push(Diagnostic::ResourceUnavailable {
            table: target.table.to_string(),
            path: target.path.to_string(),
        });
    }
}

/// Outcome of following a path
enum Found<'p> {
    Mapping(&'p Object),
    Leaf(&'p Value),
}

/// Follow `segments` from `payload`, `None` as soon as a key is missing
fn lookup<'p>(payload: &'p Object, segments: &[Segment]) -> Option<Found<'p>> {
    let Some((last, init)) = segments.split_last() else {
        return Some(Found::Mapping(payload));
    };
    let mut current = payload;
    for segment in init {
        current = current.get(&segment.key)?.as_object()?;
    }
    match current.get(&last.key)? {
        Value::Object(found) => Some(Found::Mapping(found)),
        leaf => Some(Found::Leaf(leaf)),
    }
}

fn merge_into(out: &mut Object, key: &str, entries: Object) {
    match out.get_mut(key) {
        Some(Value::Object(existing)) => existing.merge(entries),
        _ => {
            out.insert(key, entries);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Identifiers;

    fn object(text: &str) -> Object {
        serde_json::from_str::<Value>(text)
            .ok()
            .and_then(|v| v.as_object().cloned())
            .unwrap_or_default()
    }

    fn run(config: &str, payload: &str) -> (Object, Diagnostics) {
        let config = CompiledConfig::from_json_str(config, &Identifiers::default()).unwrap_or_default();
        let mut diags = Diagnostics::new();
        let out = project(&config, &object(payload), &mut diags);
        (out, diags)
    }

    #[test]
    fn test_direct_paths_merge_into_table() {
        let (out, diags) = run(
            r#"{"TREE": {"TABLE_A": {}}, "TABLE_A": ["table,info", "table,metadata"]}"#,
            r#"{"table": {"info": {"x": "1"}, "metadata": {"y": "2"}}}"#,
        );
        assert_eq!(out, object(r#"{"TABLE_A": {"x": "1", "y": "2"}}"#));
        assert!(diags.is_empty());
    }

    #[test]
    fn test_leaf_value_kept_under_last_segment() {
        let (out, _) = run(
            r#"{"TREE": {"T": {}}, "T": "table,images,id"}"#,
            r#"{"table": {"images": {"id": ["1", "2"]}}}"#,
        );
        assert_eq!(out, object(r#"{"T": {"id": ["1", "2"]}}"#));
    }

    #[test]
    fn test_missing_segment_reports_and_continues() {
        let (out, diags) = run(
            r#"{"TREE": {"A": {}, "B": {}}, "A": ["nope,info", "table,info"], "B": ["table,info"]}"#,
            r#"{"table": {"info": {"x": "1"}}}"#,
        );
        assert_eq!(out, object(r#"{"A": {"x": "1"}, "B": {"x": "1"}}"#));
        assert_eq!(
            diags.iter().next(),
            Some(&Diagnostic::ResourceUnavailable {
                table: "A".to_string(),
                path: "nope,info".to_string(),
            })
        );
    }

    #[test]
    fn test_wildcard_instances_and_collapse() {
        let payload = r#"{"container": {
            "c1": {"node": {"n1": {"table": {"images": {"id": ["1"]}}}}},
            "c2": {"node": {"n2": {"table": {"images": {"id": ["2"]}}}}}
        }}"#;
        let (out, diags) = run(
            r#"{"TREE": {"B": {}}, "B": ["container*,node*,table,images"]}"#,
            payload,
        );
        assert_eq!(
            out,
            object(r#"{"B": {"c1": {"id": ["1"]}, "c2": {"id": ["2"]}}}"#)
        );
        assert!(diags.is_empty());
    }

    #[test]
    fn test_tables_outside_tree_are_ignored() {
        let (out, _) = run(
            r#"{"TREE": {"A": {}}, "A": [], "Z": ["table"]}"#,
            r#"{"table": {"x": {}}}"#,
        );
        assert_eq!(out, object(r#"{"A": {}}"#));
    }
}
