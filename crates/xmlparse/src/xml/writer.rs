//! XML serialization, compact or indented

use crate::xml::model::{Content, Document, Element};

/// Output layout
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WriteOptions {
    /// Indent unit for nested elements, `None` for compact output
    pub indent: Option<String>,
}

impl WriteOptions {
    pub fn compact() -> Self {
        Self::default()
    }

    pub fn indented(indent: impl Into<String>) -> Self {
        Self {
            indent: Some(indent.into()),
        }
    }
}

/// Serialize a document, including its declaration when present
pub fn write_document(doc: &Document, options: &WriteOptions) -> String {
    let mut output = String::new();
    if let Some(declaration) = &doc.declaration {
        output.push_str("<?xml ");
        output.push_str(declaration);
        output.push_str("?>");
        output.push('\n');
    }
    output.push_str(&write_element(&doc.root, options));
    output
}

/// Serialize a single element tree
pub fn write_element(element: &Element, options: &WriteOptions) -> String {
    let mut output = String::new();
    match &options.indent {
        Some(unit) => write_indented(element, unit, 0, &mut output),
        None => write_compact(element, &mut output),
    }
    output
}

fn open_tag(element: &Element, output: &mut String) {
    output.push('<');
    output.push_str(&element.name);
    for (key, value) in &element.attributes {
        output.push(' ');
        output.push_str(key);
        output.push_str("=\"");
        output.push_str(&escape_attribute(value));
        output.push('"');
    }
}

fn close_tag(element: &Element, output: &mut String) {
    output.push_str("</");
    output.push_str(&element.name);
    output.push('>');
}

fn write_character_data(content: &Content, output: &mut String) {
    match content {
        Content::Text(text) => output.push_str(&escape_text(text)),
        Content::CData(text) => {
            output.push_str("<![CDATA[");
            output.push_str(&text.replace("]]>", "]]]]><![CDATA[>"));
            output.push_str("]]>");
        }
        Content::Element(_) => {}
    }
}

fn write_compact(element: &Element, output: &mut String) {
    open_tag(element, output);
    if element.children.is_empty() {
        output.push_str(" />");
        return;
    }

    output.push('>');
    for child in &element.children {
        match child {
            Content::Element(child) => write_compact(child, output),
            data => write_character_data(data, output),
        }
    }
    close_tag(element, output);
}

fn write_indented(element: &Element, unit: &str, depth: usize, output: &mut String) {
    let pad = unit.repeat(depth);
    output.push_str(&pad);
    open_tag(element, output);

    if element.children.is_empty() {
        output.push_str(" />\n");
        return;
    }

    output.push('>');
    if element.is_text_only() {
        for child in &element.children {
            write_character_data(child, output);
        }
        close_tag(element, output);
        output.push('\n');
        return;
    }

    output.push('\n');
    let inner_pad = unit.repeat(depth + 1);
    for child in &element.children {
        match child {
            Content::Element(child) => write_indented(child, unit, depth + 1, output),
            data => {
                output.push_str(&inner_pad);
                write_character_data(data, output);
                output.push('\n');
            }
        }
    }
    output.push_str(&pad);
    close_tag(element, output);
    output.push('\n');
}

fn escape_text(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attribute(input: &str) -> String {
    escape_text(input).replace('"', "&quot;")
}
