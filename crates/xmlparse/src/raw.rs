//! Raw document shape: XML as a nested dictionary
//!
//! Every element becomes an entry keyed by its tag. Attributes are stored
//! under `@`-prefixed keys and character data under `#text`; repeated
//! sibling tags collapse into an array, text-only elements into a string and
//! empty elements into null. The inverse direction accepts the same shape.

use indexmap::IndexMap;

use crate::error::{Error, ErrorKind, Result};
use crate::value::{Object, Value};
use crate::xml::model::{Content, Document, Element};

/// Prefix marking attribute keys
pub const ATTRIBUTE_PREFIX: &str = "@";
/// Key holding an element's character data
pub const TEXT_KEY: &str = "#text";

/// Declaration written in front of raw documents
pub const RAW_DECLARATION: &str = "version=\"1.0\" encoding=\"utf-8\"";

/// Convert a parsed document into its raw dictionary
pub fn document_to_value(doc: &Document) -> Value {
    let mut root = Object::new();
    root.insert(doc.root.name.clone(), element_to_value(&doc.root));
    Value::Object(root)
}

/// Convert one element into its raw dictionary value
pub fn element_to_value(element: &Element) -> Value {
    let text = element.text();
    let text = text.trim();

    if element.attributes.is_empty() && element.is_text_only() {
        return if text.is_empty() {
            Value::Null
        } else {
            Value::String(text.to_string())
        };
    }

    let mut obj = Object::new();
    for (key, value) in &element.attributes {
        obj.insert(format!("{ATTRIBUTE_PREFIX}{key}"), value.clone());
    }

    for child in element.elements() {
        let value = element_to_value(child);
        match obj.get_mut(&child.name) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = std::mem::take(existing);
                *existing = Value::from(vec![first, value]);
            }
            None => {
                obj.insert(child.name.clone(), value);
            }
        }
    }

    if !text.is_empty() {
        obj.insert(TEXT_KEY, text);
    }

    Value::Object(obj)
}

/// Convert a raw dictionary back into a document
///
/// The dictionary must hold exactly one key, the root element. When
/// `cdata_element` is set, text of elements with that tag is written as a
/// CDATA section.
pub fn value_to_document(value: &Value, cdata_element: Option<&str>) -> Result<Document> {
    let root = match value {
        Value::Object(obj) => obj.single(),
        _ => None,
    };
    let Some((name, content)) = root else {
        return Err(Error::message_only(
            ErrorKind::InvalidDocument,
            "document must have exactly one root",
        ));
    };
    if content.is_array() {
        return Err(Error::message_only(
            ErrorKind::InvalidDocument,
            "document root cannot be a list",
        ));
    }

    let writer = RawWriter { cdata_element };
    let mut elements = writer.value_to_elements(name, content);
    let root = elements.pop().unwrap_or_else(|| Element::new(name.as_str()));
    Ok(Document {
        declaration: Some(RAW_DECLARATION.to_string()),
        root,
    })
}

struct RawWriter<'a> {
    cdata_element: Option<&'a str>,
}

impl RawWriter<'_> {
    fn value_to_elements(&self, name: &str, value: &Value) -> Vec<Element> {
        match value {
            Value::Array(items) => items
                .iter()
                .flat_map(|item| self.value_to_elements(name, item))
                .collect(),
            Value::Object(obj) => {
                let mut attributes = IndexMap::new();
                let mut children = Vec::new();
                let mut text = None;

                for (key, value) in obj {
                    if let Some(attr) = key.strip_prefix(ATTRIBUTE_PREFIX) {
                        attributes.insert(attr.to_string(), value.scalar_text().unwrap_or_default());
                    } else if key == TEXT_KEY {
                        text = value.scalar_text();
                    } else {
                        children.extend(
                            self.value_to_elements(key, value)
                                .into_iter()
                                .map(Content::Element),
                        );
                    }
                }

                if let Some(text) = text.filter(|t| !t.is_empty()) {
                    children.insert(0, self.character_data(name, text));
                }

                vec![Element {
                    name: name.to_string(),
                    attributes,
                    children,
                }]
            }
            Value::Null => vec![Element::new(name)],
            scalar => {
                let mut element = Element::new(name);
                if let Some(text) = scalar.scalar_text().filter(|t| !t.is_empty()) {
                    element.children.push(self.character_data(name, text));
                }
                vec![element]
            }
        }
    }

    fn character_data(&self, name: &str, text: String) -> Content {
        if self.cdata_element == Some(name) {
            Content::CData(text)
        } else {
            Content::Text(text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::{parse_str, write_document, WriteOptions};

    fn raw(xml: &str) -> Result<Value> {
        Ok(document_to_value(&parse_str(xml)?))
    }

    #[test]
    fn test_text_only_and_empty_elements() -> Result<()> {
        let value = raw("<root><a>hello</a><b/><c>  </c></root>")?;
        let root = value.as_object().and_then(|o| o.get("root")).cloned();
        let mut expected = Object::new();
        expected.insert("a", "hello");
        expected.insert("b", Value::Null);
        expected.insert("c", Value::Null);
        assert_eq!(root, Some(Value::Object(expected)));
        Ok(())
    }

    #[test]
    fn test_attributes_children_and_text() -> Result<()> {
        let value = raw("<t name=\"images\" kind=\"x\"><h>a</h> tail </t>")?;
        let t = value
            .as_object()
            .and_then(|o| o.get("t"))
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        let keys: Vec<_> = t.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["@name", "@kind", "h", "#text"]);
        assert_eq!(t["#text"], Value::from("tail"));
        Ok(())
    }

    #[test]
    fn test_repeated_siblings_become_array() -> Result<()> {
        let value = raw("<r><th>a</th><x/><th>b</th><th>c</th></r>")?;
        let th = value
            .as_object()
            .and_then(|o| o.get("r"))
            .and_then(Value::as_object)
            .and_then(|r| r.get("th"))
            .cloned();
        assert_eq!(
            th,
            Some(Value::from(vec![
                Value::from("a"),
                Value::from("b"),
                Value::from("c")
            ]))
        );
        Ok(())
    }

    #[test]
    fn test_cdata_merges_into_text() -> Result<()> {
        let value = raw("<t name=\"n\"><rows><![CDATA[1,2\n3,4]]></rows></t>")?;
        let rows = value
            .as_object()
            .and_then(|o| o.get("t"))
            .and_then(Value::as_object)
            .and_then(|t| t.get("rows"))
            .cloned();
        assert_eq!(rows, Some(Value::from("1,2\n3,4")));
        Ok(())
    }

    #[test]
    fn test_value_to_document_roundtrip() -> Result<()> {
        let xml = "<root><table name=\"t\"><header><th>a</th><th>b</th></header><rows>1,2\n3,4</rows></table></root>";
        let value = raw(xml)?;
        let doc = value_to_document(&value, Some("rows"))?;
        let written = write_document(&doc, &WriteOptions::compact());
        assert!(written.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>\n"));
        assert!(written.contains("<rows><![CDATA[1,2\n3,4]]></rows>"));
        assert!(written.contains("<th>a</th><th>b</th>"));
        assert_eq!(raw(&written)?, value);
        Ok(())
    }

    #[test]
    fn test_value_to_document_requires_single_root() {
        let mut two = Object::new();
        two.insert("a", "1");
        two.insert("b", "2");
        let err = value_to_document(&Value::Object(two), None).err();
        assert_eq!(err.map(|e| e.kind().clone()), Some(ErrorKind::InvalidDocument));

        let err = value_to_document(&Value::from("scalar"), None).err();
        assert_eq!(err.map(|e| e.kind().clone()), Some(ErrorKind::InvalidDocument));
    }
}
