//! Table extractor
//!
//! A table-shaped element carries a header listing its columns and a block
//! of delimited row text:
//!
//! ```xml
//! <table name="images">
//!   <header><th>id</th><th>size</th></header>
//!   <rows><![CDATA[1,10
//! 2,20]]></rows>
//! </table>
//! ```
//!
//! Extraction turns it into `{"images": {"id": ["1", "2"], "size": ["10", "20"]}}`.

use crate::config::Identifiers;
use crate::diagnostics::{Diagnostic, Diagnostics, TableSide};
use crate::value::{Array, Object, Value};

/// Separator between rows of table data
pub const ROW_SEPARATOR: char = '\n';
/// Separator between cells of a row
pub const COLUMN_SEPARATOR: char = ',';

/// True when the node holds row data and should be extracted as a table
pub fn is_table(node: &Object, ids: &Identifiers) -> bool {
    node.contains_key(&ids.data_key)
}

/// Name a table-shaped element is known by
///
/// The name attribute wins, the element's tag is used when it is missing.
pub fn element_name(node: &Object, tag: &str, ids: &Identifiers) -> String {
    node.get(&ids.name_key)
        .and_then(Value::scalar_text)
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| tag.to_string())
}

/// Extract a table-shaped node into `{element_name: {column: [values]}}`
///
/// A missing header or empty row data yields an empty column map. A header
/// whose cell count disagrees with the row data's column count also yields
/// an empty column map, and records a [`Diagnostic::ShapeMismatch`].
pub fn extract(node: &Object, tag: &str, ids: &Identifiers, diags: &mut Diagnostics) -> Object {
    let name = element_name(node, tag, ids);
    let mut columns_by_name = Object::new();

    let data = node.get(&ids.data_key).and_then(|data| row_text(data, ids));
    let header = header_cells(node, ids);

    if let Some(data) = data.filter(|d| !d.is_empty()) {
        if !header.is_empty() {
            let columns = transpose(&split_rows(&data));
            if columns.len() == header.len() {
                for (cell, column) in header.into_iter().zip(columns) {
                    let values: Array = column.into_iter().map(Value::String).collect();
                    columns_by_name.insert(cell, Value::Array(values));
                }
            } else {
                let incomplete = if columns.len() < header.len() {
                    TableSide::Rows
                } else {
                    TableSide::Header
                };
                diags.push(Diagnostic::ShapeMismatch {
                    element: name.clone(),
                    header_cells: header.len(),
                    columns: columns.len(),
                    incomplete,
                });
            }
        }
    }

    let mut out = Object::new();
    out.insert(name, Value::Object(columns_by_name));
    out
}

/// Column names listed by the node's header, in header order
pub fn header_cells(node: &Object, ids: &Identifiers) -> Vec<String> {
    let cells = node
        .get(&ids.header_key)
        .and_then(Value::as_object)
        .and_then(|header| header.get(&ids.table_key));

    match cells {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(cells)) => cells.iter().map(|c| cell_text(c, ids)).collect(),
        Some(cell) => vec![cell_text(cell, ids)],
    }
}

fn cell_text(cell: &Value, ids: &Identifiers) -> String {
    match cell {
        Value::Object(cell) => cell
            .get(&ids.header_text_key)
            .and_then(Value::scalar_text)
            .unwrap_or_default(),
        other => other.scalar_text().unwrap_or_default(),
    }
}

fn row_text(data: &Value, ids: &Identifiers) -> Option<String> {
    match data {
        Value::Object(data) => data.get(&ids.header_text_key).and_then(Value::scalar_text),
        other => other.scalar_text(),
    }
}

/// Split row text into a row-major grid of cells
pub fn split_rows(data: &str) -> Vec<Vec<String>> {
    data.split(ROW_SEPARATOR)
        .map(|line| {
            line.strip_suffix('\r')
                .unwrap_or(line)
                .split(COLUMN_SEPARATOR)
                .map(str::to_string)
                .collect()
        })
        .collect()
}

/// Turn rows into columns
///
/// The column count is that of the shortest row, cells beyond it are
/// dropped.
pub fn transpose(rows: &[Vec<String>]) -> Vec<Vec<String>> {
    let width = rows.iter().map(Vec::len).min().unwrap_or(0);
    (0..width)
        .map(|col| {
            rows.iter()
                .filter_map(|row| row.get(col).cloned())
                .collect()
        })
        .collect()
}
