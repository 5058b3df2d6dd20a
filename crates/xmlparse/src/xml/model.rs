//! XML data model

use indexmap::IndexMap;

/// XML document
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    /// Body of the `<?xml ...?>` declaration, without the delimiters
    pub declaration: Option<String>,
    pub root: Element,
}

/// XML element
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Element {
    pub name: String,
    pub attributes: IndexMap<String, String>,
    pub children: Vec<Content>,
}

/// XML content node
#[derive(Clone, Debug, PartialEq)]
pub enum Content {
    Element(Element),
    Text(String),
    CData(String),
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Element holding a single text node
    pub fn with_text(name: impl Into<String>, text: impl Into<String>) -> Self {
        let mut element = Self::new(name);
        element.children.push(Content::Text(text.into()));
        element
    }

    /// Concatenated text and CDATA content of this element only
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|child| match child {
                Content::Text(text) | Content::CData(text) => Some(text.as_str()),
                Content::Element(_) => None,
            })
            .collect()
    }

    /// Child elements in document order
    pub fn elements(&self) -> impl Iterator<Item = &Self> {
        self.children.iter().filter_map(|child| match child {
            Content::Element(element) => Some(element),
            Content::Text(_) | Content::CData(_) => None,
        })
    }

    /// True when every child is character data
    pub fn is_text_only(&self) -> bool {
        self.children
            .iter()
            .all(|child| !matches!(child, Content::Element(_)))
    }
}

impl Document {
    pub fn new(root: Element) -> Self {
        Self {
            declaration: None,
            root,
        }
    }
}
