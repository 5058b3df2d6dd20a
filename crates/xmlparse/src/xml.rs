//! XML model, parser and writer

pub mod cursor;
pub mod model;
pub mod parser;
pub mod writer;

pub use model::{Content, Document, Element};
pub use parser::Parser;
pub use writer::{write_document, write_element, WriteOptions};

use crate::error::Result;

/// Parse an XML document from text
pub fn parse_str(input: &str) -> Result<Document> {
    Parser::new(input.as_bytes()).parse()
}
