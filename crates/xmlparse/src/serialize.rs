//! Dictionary to XML serializer
//!
//! Every mapping key becomes an element, list entries become `item`
//! elements and scalars become text. Unlike the raw shape there are no
//! attributes: `@` and `#text` keys are written as ordinary elements.

use crate::error::Result;
use crate::value::Value;
use crate::xml::{self, Content, Element, WriteOptions};

/// Tag used for list entries
pub const ITEM_TAG: &str = "item";
/// Indent unit for pretty output
pub const PRETTY_INDENT: &str = "    ";

/// Build the element tree for `data` under a root element named `root`
pub fn to_element(data: &Value, root: &str) -> Element {
    let mut element = Element::new(root);
    fill(&mut element, data);
    element
}

fn fill(element: &mut Element, value: &Value) {
    match value {
        Value::Object(entries) => {
            for (key, value) in entries {
                let mut child = Element::new(key.as_str());
                fill(&mut child, value);
                element.children.push(Content::Element(child));
            }
        }
        Value::Array(items) => {
            for item in items {
                let mut child = Element::new(ITEM_TAG);
                fill(&mut child, item);
                element.children.push(Content::Element(child));
            }
        }
        Value::Null => {}
        scalar => {
            if let Some(text) = scalar.scalar_text().filter(|t| !t.is_empty()) {
                element.children.push(Content::Text(text));
            }
        }
    }
}

/// Serialize `data` as XML text preceded by `header`
///
/// Pretty output is produced by parsing the compact markup back and writing
/// it with four-space indentation, so keys that are not valid XML names fail
/// here with the parser's error.
pub fn serialize(data: &Value, root: &str, header: &str, pretty: bool) -> Result<String> {
    let element = to_element(data, root);
    let compact = format!("{header}{}", xml::write_element(&element, &WriteOptions::compact()));
    if !pretty {
        return Ok(compact);
    }

    let reparsed = xml::parse_str(&compact)?;
    let body = xml::write_element(&reparsed.root, &WriteOptions::indented(PRETTY_INDENT));
    if header.is_empty() {
        Ok(body)
    } else {
        Ok(format!("{header}\n{body}"))
    }
}
