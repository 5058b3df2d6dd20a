//! xmlparse - configuration driven XML to dictionary extraction
//!
//! Documents are parsed with the crate's own XML parser and turned into
//! order preserving [`Value`] dictionaries, either in their raw shape or
//! flattened and projected into named tables described by a JSON
//! configuration. Dictionaries can be written back out as XML.
//!
//! # Quick Start
//!
//! ```
//! use xmlparse::{ConfigSource, ParserMode, Value, XmlParser};
//! # fn main() -> Result<(), xmlparse::Error> {
//! let xml = r#"<root>
//!   <table name="images">
//!     <header><th>id</th><th>size</th></header>
//!     <rows>1,10
//! 2,20</rows>
//!   </table>
//! </root>"#;
//!
//! let config: Value = serde_json::from_str(
//!     r#"{"TREE": {"IMAGES": {}}, "IMAGES": ["table,images"]}"#,
//! )?;
//! let mut parser = XmlParser::new(ParserMode::Custom).with_config(ConfigSource::Inline(config));
//! let tables = parser.parse_str(xml);
//!
//! let ids = tables
//!     .as_object()
//!     .and_then(|t| t.get("IMAGES"))
//!     .and_then(Value::as_object)
//!     .and_then(|images| images.get("id"))
//!     .and_then(Value::as_array)
//!     .map(|column| column.len())
//!     .unwrap_or_default();
//! assert_eq!(ids, 2);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub use error::{Error, ErrorKind, Pos, Result, Span};

pub mod value;
pub use value::{Array, Object, Value};

pub mod diagnostics;
pub use diagnostics::{Diagnostic, Diagnostics, TableSide};

pub mod xml;

pub mod config;
pub use config::{CompiledConfig, Identifiers, KeyFilters, PathSpec, Segment, TableTree};

pub mod flatten;
pub mod project;
pub mod raw;
pub mod serialize;
pub mod table;

pub mod parser;
pub use parser::{
    ConfigSource, DumpFormat, DumpOptions, ParseReport, ParserMode, XmlParser, DEFAULT_HEADER,
    DEFAULT_ROOT,
};

/// Parse XML text into its raw dictionary shape
pub fn from_str(xml: &str) -> Result<Value> {
    let doc = xml::parse_str(xml)?;
    Ok(raw::document_to_value(&doc))
}

/// Parse XML bytes into their raw dictionary shape
pub fn from_bytes(bytes: &[u8]) -> Result<Value> {
    let doc = xml::Parser::new(bytes).parse()?;
    Ok(raw::document_to_value(&doc))
}

/// Render a dictionary as XML under `root`, see [`serialize::serialize`]
pub fn to_xml_string(data: &Value, root: &str, pretty: bool) -> Result<String> {
    serialize::serialize(data, root, DEFAULT_HEADER, pretty)
}
