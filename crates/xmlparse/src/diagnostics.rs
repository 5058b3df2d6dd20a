//! Recoverable problems found while extracting data
//!
//! None of these abort a parse. Each one is logged through `tracing` when it
//! is recorded and kept in a [`Diagnostics`] list returned to the caller.

use std::fmt;

/// Which side of a table disagrees with the other
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TableSide {
    Rows,
    Header,
}

impl fmt::Display for TableSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rows => write!(f, "rows"),
            Self::Header => write!(f, "header"),
        }
    }
}

/// A single recoverable problem
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Diagnostic {
    /// A path segment, wildcard key or table resource is absent
    ResourceUnavailable { table: String, path: String },
    /// Header cell count and row column count differ
    ShapeMismatch {
        element: String,
        header_cells: usize,
        columns: usize,
        incomplete: TableSide,
    },
    /// The input document could not be read or parsed
    CorruptInput { source: String, reason: String },
    /// The configuration cannot drive the projection
    BadConfiguration { reason: String },
    /// A configured table produced no data
    EmptyTable { table: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ResourceUnavailable { table, path } => {
                write!(f, "resource `{path}` for table [{table}] is not available")
            }
            Self::ShapeMismatch {
                element, incomplete, ..
            } => write!(
                f,
                "header and rows for [{element}] do not match, [{incomplete}] is incomplete"
            ),
            Self::CorruptInput { source, reason } => write!(f, "corrupt input {source}: {reason}"),
            Self::BadConfiguration { reason } => {
                write!(f, "bad configuration, using unformatted output: {reason}")
            }
            Self::EmptyTable { table } => write!(f, "\"{table}\" table is empty"),
        }
    }
}

/// Ordered collection of diagnostics for one operation
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic and log it
    pub fn push(&mut self, diagnostic: Diagnostic) {
        tracing::warn!("{diagnostic}");
        self.items.push(diagnostic);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.items.iter()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.items
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_mismatch_names_incomplete_side() {
        let diag = Diagnostic::ShapeMismatch {
            element: "images".to_string(),
            header_cells: 3,
            columns: 2,
            incomplete: TableSide::Rows,
        };
        assert_eq!(
            diag.to_string(),
            "header and rows for [images] do not match, [rows] is incomplete"
        );
    }

    #[test]
    fn test_push_keeps_order() {
        let mut diags = Diagnostics::new();
        assert!(diags.is_empty());
        diags.push(Diagnostic::EmptyTable {
            table: "A".to_string(),
        });
        diags.push(Diagnostic::BadConfiguration {
            reason: "tree is not an object".to_string(),
        });
        assert_eq!(diags.len(), 2);
        assert!(matches!(
            diags.iter().next(),
            Some(Diagnostic::EmptyTable { table }) if table == "A"
        ));
    }
}
