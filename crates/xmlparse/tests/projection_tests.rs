//! Projection of flattened dictionaries through compiled configurations

use xmlparse::project::project;
use xmlparse::{CompiledConfig, Diagnostic, Diagnostics, Identifiers, Object, Value};

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
fn test_direct_paths_merge() {
    let (out, diags) = run(
        r#"{"TREE": {"TABLE_A": {}}, "TABLE_A": ["table,info", "table,metadata"]}"#,
        r#"{"table": {"info": {"x": "1"}, "metadata": {"y": "2"}}}"#,
    );
    assert_eq!(out, object(r#"{"TABLE_A": {"x": "1", "y": "2"}}"#));
    assert!(diags.is_empty());
}

#[test]
fn test_wildcard_containers_become_instances() {
    let (out, diags) = run(
        r#"{"TREE": {"TABLE_B": {}}, "TABLE_B": ["container*,node*,table,images"]}"#,
        r#"{"container": {
            "c1": {"node": {"n1": {"table": {"images": {"id": ["1", "2"]}}}}},
            "c2": {"node": {"n2": {"table": {"images": {"id": ["3"]}}}}}
        }}"#,
    );
    assert_eq!(
        out,
        object(r#"{"TABLE_B": {"c1": {"id": ["1", "2"]}, "c2": {"id": ["3"]}}}"#)
    );
    assert!(diags.is_empty());
}

#[test]
fn test_single_child_collapses() {
    let (out, _) = run(
        r#"{"TREE": {"T": {}}, "T": ["container*,table,images"]}"#,
        r#"{"container": {"only": {"table": {"images": {"id": ["1"]}}}}}"#,
    );
    assert_eq!(out, object(r#"{"T": {"id": ["1"]}}"#));
}

#[test]
fn test_nested_wildcards_nest_instances() {
    let (out, diags) = run(
        r#"{"TREE": {"T": {}}, "T": ["container*,node*,table,images"]}"#,
        r#"{"container": {
            "c1": {"node": {
                "n1": {"table": {"images": {"id": ["1"]}}},
                "n2": {"table": {"images": {"id": ["2"]}}}
            }},
            "c2": {"node": {"n3": {"table": {"images": {"id": ["3"]}}}}}
        }}"#,
    );
    assert_eq!(
        out,
        object(
            r#"{"T": {
                "c1": {"n1": {"id": ["1"]}, "n2": {"id": ["2"]}},
                "c2": {"id": ["3"]}
            }}"#
        )
    );
    assert!(diags.is_empty());
}

#[test]
fn test_child_tables_resolve_inside_each_instance() {
    let (out, diags) = run(
        r#"{
            "TREE": {"ALBUMS": {"IMAGES": {}}},
            "ALBUMS": ["container*,table,meta"],
            "IMAGES": ["node*,table,images"]
        }"#,
        r#"{"container": {
            "a1": {"table": {"meta": {"year": ["2021"]}},
                   "node": {"n1": {"table": {"images": {"id": ["1"]}}}}},
            "a2": {"table": {"meta": {"year": ["2022"]}},
                   "node": {"n2": {"table": {"images": {"id": ["2"]}}}}}
        }}"#,
    );
    assert_eq!(
        out,
        object(
            r#"{"ALBUMS": {
                "a1": {"year": ["2021"], "IMAGES": {"id": ["1"]}},
                "a2": {"year": ["2022"], "IMAGES": {"id": ["2"]}}
            }}"#
        )
    );
    assert!(diags.is_empty());
}

#[test]
fn test_child_table_missing_in_one_instance() {
    let (out, diags) = run(
        r#"{
            "TREE": {"ALBUMS": {"IMAGES": {}}},
            "ALBUMS": ["container*,table,meta"],
            "IMAGES": ["node*,table,images"]
        }"#,
        r#"{"container": {
            "a1": {"table": {"meta": {"year": ["2021"]}},
                   "node": {"n1": {"table": {"images": {"id": ["1"]}}}}},
            "a2": {"table": {"meta": {"year": ["2022"]}}}
        }}"#,
    );
    assert_eq!(
        out,
        object(
            r#"{"ALBUMS": {
                "a1": {"year": ["2021"], "IMAGES": {"id": ["1"]}},
                "a2": {"year": ["2022"], "IMAGES": {}}
            }}"#
        )
    );
    assert_eq!(
        diags.into_vec(),
        vec![Diagnostic::ResourceUnavailable {
            table: "IMAGES".to_string(),
            path: "node*,table,images".to_string(),
        }]
    );
}

#[test]
fn test_child_table_resolved_when_parent_path_missing() {
    let (out, diags) = run(
        r#"{
            "TREE": {"ALBUMS": {"IMAGES": {}}},
            "ALBUMS": ["container*,table,meta"],
            "IMAGES": ["node*,table,images"]
        }"#,
        r#"{"container": {
            "a1": {"table": {"meta": {"year": ["2021"]}},
                   "node": {"n1": {"table": {"images": {"id": ["1"]}}}}},
            "a2": {"node": {"n2": {"table": {"images": {"id": ["2"]}}}}}
        }}"#,
    );
    assert_eq!(
        out,
        object(
            r#"{"ALBUMS": {
                "a1": {"year": ["2021"], "IMAGES": {"id": ["1"]}},
                "a2": {"IMAGES": {"id": ["2"]}}
            }}"#
        )
    );
    assert_eq!(
        diags.into_vec(),
        vec![Diagnostic::ResourceUnavailable {
            table: "ALBUMS".to_string(),
            path: "container*,table,meta".to_string(),
        }]
    );
}

#[test]
fn test_key_filter_applies_to_declaring_table_only() {
    let (out, _) = run(
        r#"{
            "TREE": {"P": {"KEYS": "keep", "C": {}}},
            "P": ["item*,info"],
            "C": ["detail"]
        }"#,
        r#"{"item": {
            "i1": {"info": {"keep": "1", "drop": "2"}, "detail": {"drop": "3"}},
            "i2": {"info": {"keep": "4"}, "detail": {"other": "5"}}
        }}"#,
    );
    assert_eq!(
        out,
        object(
            r#"{"P": {
                "i1": {"keep": "1", "C": {"drop": "3"}},
                "i2": {"keep": "4", "C": {"other": "5"}}
            }}"#
        )
    );
}

#[test]
fn test_missing_resources_do_not_abort() {
    let (out, diags) = run(
        r#"{
            "TREE": {"A": {}, "B": {}, "C": {}},
            "A": ["missing,path", "table,info"],
            "B": ["gone*,x"],
            "C": ["table,info"]
        }"#,
        r#"{"table": {"info": {"x": "1"}}}"#,
    );
    assert_eq!(out, object(r#"{"A": {"x": "1"}, "B": {}, "C": {"x": "1"}}"#));
    assert_eq!(diags.len(), 2);
}

#[test]
fn test_scalar_child_under_wildcard_is_unavailable() {
    let (out, diags) = run(
        r#"{"TREE": {"T": {}}, "T": ["group*,table"]}"#,
        r#"{"group": {"only": "text"}}"#,
    );
    assert_eq!(out, object(r#"{"T": {}}"#));
    assert!(matches!(
        diags.iter().next(),
        Some(Diagnostic::ResourceUnavailable { table, .. }) if table == "T"
    ));
}

#[test]
fn test_trailing_wildcard_takes_all_children() {
    let (out, _) = run(
        r#"{"TREE": {"T": {}}, "T": ["table*"]}"#,
        r#"{"table": {"images": {"id": ["1"]}, "sizes": {"w": ["2"]}}}"#,
    );
    assert_eq!(
        out,
        object(r#"{"T": {"images": {"id": ["1"]}, "sizes": {"w": ["2"]}}}"#)
    );
}
