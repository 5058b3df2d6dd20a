//! Configuration compiler
//!
//! A configuration is a mapping with one reserved entry holding the table
//! tree and one entry per table name holding that table's path strings:
//!
//! ```json
//! {
//!   "TREE": { "TABLE_A": {}, "TABLE_B": { "TABLE_C": { "KEYS": "key1,key2" } } },
//!   "TABLE_A": ["table,info", "table,metadata"],
//!   "TABLE_B": ["container*,node*,table,images"],
//!   "TABLE_C": ["table,images"]
//! }
//! ```
//!
//! Compiling it yields the pruned [`TableTree`], the parsed [`PathSpec`]s per
//! table and the [`KeyFilters`] collected from `KEYS` directives.

use std::fmt;
use std::str::FromStr;

use indexmap::{IndexMap, IndexSet};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::value::{Object, Value};

/// Marker suffix for wildcard path segments
pub const WILDCARD: char = '*';
/// Separator between path segments, and between `KEYS` entries
pub const PATH_SEPARATOR: char = ',';

/// Reserved keys used in documents and configurations
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Identifiers {
    /// Attribute naming an element
    pub name_key: String,
    /// Header cell tag
    pub table_key: String,
    /// Header container tag
    pub header_key: String,
    /// Row data tag
    pub data_key: String,
    /// Key holding a header cell's text
    pub header_text_key: String,
    /// Configuration entry holding the table tree
    pub tree_key: String,
    /// Tree directive restricting a table's keys
    pub keys_key: String,
}

impl Default for Identifiers {
    fn default() -> Self {
        Self {
            name_key: "@name".to_string(),
            table_key: "th".to_string(),
            header_key: "header".to_string(),
            data_key: "rows".to_string(),
            header_text_key: "#text".to_string(),
            tree_key: "TREE".to_string(),
            keys_key: "KEYS".to_string(),
        }
    }
}

/// One step of a path
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Segment {
    pub key: String,
    pub wildcard: bool,
}

/// A comma-separated key sequence, e.g. `container*,node*,table,images`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathSpec {
    raw: String,
    segments: Vec<Segment>,
}

impl PathSpec {
    pub fn parse(raw: &str) -> Self {
        let segments = raw
            .split(PATH_SEPARATOR)
            .map(|part| {
                let part = part.trim();
                Segment {
                    key: part.trim_matches(WILDCARD).to_string(),
                    wildcard: part.contains(WILDCARD),
                }
            })
            .collect();
        Self {
            raw: raw.to_string(),
            segments,
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl FromStr for PathSpec {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl fmt::Display for PathSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Table inclusion plan: each table maps to the child tables nested in it
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TableTree(IndexMap<String, TableTree>);

impl TableTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, table: impl Into<String>, children: Self) {
        self.0.insert(table.into(), children);
    }

    pub fn get(&self, table: &str) -> Option<&Self> {
        self.0.get(table)
    }

    pub fn contains(&self, table: &str) -> bool {
        self.0.contains_key(table)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, String, Self> {
        self.0.iter()
    }

    /// Every table name at any depth, parents before children
    pub fn all_tables(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_tables(&mut names);
        names
    }

    fn collect_tables<'a>(&'a self, names: &mut Vec<&'a str>) {
        for (name, children) in &self.0 {
            names.push(name);
            children.collect_tables(names);
        }
    }
}

/// Allowed keys per table
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeyFilters(IndexMap<String, IndexSet<String>>);

impl KeyFilters {
    pub fn get(&self, table: &str) -> Option<&IndexSet<String>> {
        self.0.get(table)
    }

    pub fn insert(&mut self, table: impl Into<String>, keys: impl IntoIterator<Item = String>) {
        self.0.insert(table.into(), keys.into_iter().collect());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Configuration ready to drive a projection
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompiledConfig {
    pub tree: TableTree,
    pub paths: IndexMap<String, Vec<PathSpec>>,
    pub key_filters: KeyFilters,
}

impl CompiledConfig {
    /// Compile a configuration mapping
    ///
    /// `Value::Null` stands for an absent configuration and compiles to an
    /// empty plan. Anything that is present but not shaped like a
    /// configuration is an error.
    pub fn compile(config: &Value, ids: &Identifiers) -> Result<Self> {
        let root = match config {
            Value::Null => return Ok(Self::default()),
            Value::Object(root) => root,
            _ => return Err(Error::invalid_config("configuration must be an object")),
        };

        let mut key_filters = KeyFilters::default();
        let tree = match root.get(&ids.tree_key) {
            None | Some(Value::Null) => TableTree::new(),
            Some(Value::Object(plan)) => build_tree(plan, ids, &mut key_filters)?,
            Some(_) => {
                return Err(Error::invalid_config(format!(
                    "[{}] must be an object",
                    ids.tree_key
                )))
            }
        };

        let mut paths = IndexMap::new();
        for table in tree.all_tables() {
            let specs = match root.get(table) {
                None | Some(Value::Null) => Vec::new(),
                Some(value) => parse_paths(table, value)?,
            };
            paths.insert(table.to_string(), specs);
        }

        tracing::debug!(
            tables = paths.len(),
            filters = key_filters.0.len(),
            "compiled configuration"
        );
        Ok(Self {
            tree,
            paths,
            key_filters,
        })
    }

    /// Compile a JSON configuration document
    pub fn from_json_str(text: &str, ids: &Identifiers) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::compile(&value, ids)
    }

    /// True when no table is configured
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub fn paths_for(&self, table: &str) -> &[PathSpec] {
        self.paths.get(table).map(Vec::as_slice).unwrap_or_default()
    }
}

fn build_tree(node: &Object, ids: &Identifiers, filters: &mut KeyFilters) -> Result<TableTree> {
    let mut tree = TableTree::new();
    for (table, value) in node {
        if *table == ids.keys_key {
            continue;
        }
        let children = match value {
            Value::Null => TableTree::new(),
            Value::Object(child) => {
                if let Some(keys) = child.get(&ids.keys_key) {
                    let keys = parse_keys(table, keys)?;
                    if !keys.is_empty() {
                        filters.insert(table.clone(), keys);
                    }
                }
                build_tree(child, ids, filters)?
            }
            _ => {
                return Err(Error::invalid_config(format!(
                    "tree entry [{table}] must be an object"
                )))
            }
        };
        tree.insert(table.clone(), children);
    }
    Ok(tree)
}

fn parse_keys(table: &str, value: &Value) -> Result<Vec<String>> {
    let split = |text: &str| -> Vec<String> {
        text.split(PATH_SEPARATOR)
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect()
    };

    match value {
        Value::Null => Ok(Vec::new()),
        Value::String(text) => Ok(split(text)),
        Value::Array(items) => {
            let mut keys = Vec::with_capacity(items.len());
            for item in items {
                let text = item.as_string().ok_or_else(|| {
                    Error::invalid_config(format!("keys of [{table}] must be strings"))
                })?;
                let key = text.trim();
                if !key.is_empty() {
                    keys.push(key.to_string());
                }
            }
            Ok(keys)
        }
        _ => Err(Error::invalid_config(format!(
            "keys of [{table}] must be a comma separated string"
        ))),
    }
}

fn parse_paths(table: &str, value: &Value) -> Result<Vec<PathSpec>> {
    match value {
        Value::String(path) => Ok(vec![PathSpec::parse(path)]),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_string().map(PathSpec::parse).ok_or_else(|| {
                    Error::invalid_config(format!("paths of [{table}] must be strings"))
                })
            })
            .collect(),
        _ => Err(Error::invalid_config(format!(
            "paths of [{table}] must be a list of strings"
        ))),
    }
}
