//! XML parser implementation

use indexmap::IndexMap;

use crate::error::{Error, ErrorKind, Result, Span};
use crate::xml::cursor::Cursor;
use crate::xml::model::{Content, Document, Element};

/// XML parser
#[derive(Debug)]
pub struct Parser<'a> {
    cursor: Cursor<'a>,
}

impl<'a> Parser<'a> {
    /// Create a new XML parser
    pub const fn new(input: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(input),
        }
    }

    /// Parse an XML document
    pub fn parse(&mut self) -> Result<Document> {
        if self.cursor.starts_with("\u{feff}".as_bytes()) {
            self.cursor.advance_by(3);
        }

        let declaration = self.parse_prolog()?;
        let root = self.parse_element()?;
        self.skip_misc()?;

        if !self.cursor.is_eof() {
            return Err(self.error_here(ErrorKind::InvalidToken, "content after root element"));
        }

        Ok(Document { declaration, root })
    }

    fn parse_prolog(&mut self) -> Result<Option<String>> {
        let mut declaration = None;
        loop {
            self.cursor.skip_whitespace();
            if self.cursor.starts_with(b"<?xml")
                && self
                    .cursor
                    .peek(5)
                    .is_some_and(|b| b.is_ascii_whitespace() || b == b'?')
            {
                self.cursor.advance_by(5);
                let start = self.cursor.pos();
                let end = self.skip_until(b"?>")?;
                let raw = self.cursor.slice_from(start);
                let body = raw.get(..end.saturating_sub(start)).unwrap_or_default();
                declaration = Some(bytes_to_string(body)?.trim().to_string());
            } else if self.cursor.starts_with(b"<!DOCTYPE") {
                self.skip_doctype()?;
            } else if !self.skip_markup()? {
                return Ok(declaration);
            }
        }
    }

    /// Skip comments and processing instructions, returning false when the
    /// cursor is not at either
    fn skip_markup(&mut self) -> Result<bool> {
        if self.cursor.starts_with(b"<!--") {
            self.cursor.advance_by(4);
            self.skip_until(b"-->")?;
            Ok(true)
        } else if self.cursor.starts_with(b"<?") {
            self.cursor.advance_by(2);
            self.skip_until(b"?>")?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn skip_misc(&mut self) -> Result<()> {
        loop {
            self.cursor.skip_whitespace();
            if !self.skip_markup()? {
                return Ok(());
            }
        }
    }

    fn skip_doctype(&mut self) -> Result<()> {
        let mut depth = 0usize;
        while let Some(b) = self.cursor.current() {
            self.cursor.advance();
            match b {
                b'[' => depth += 1,
                b']' => depth = depth.saturating_sub(1),
                b'>' if depth == 0 => return Ok(()),
                _ => {}
            }
        }
        Err(self.error_here(ErrorKind::UnexpectedEof, "unterminated doctype"))
    }

    fn parse_element(&mut self) -> Result<Element> {
        if !self.cursor.consume(b'<') {
            return Err(self.error_here(ErrorKind::InvalidToken, "expected element"));
        }
        if self.cursor.current() == Some(b'/') {
            return Err(self.error_here(ErrorKind::InvalidToken, "unexpected closing tag"));
        }

        let name = self.parse_name()?;
        let attributes = self.parse_attributes()?;

        if self.cursor.consume(b'/') {
            self.expect_byte(b'>')?;
            return Ok(Element {
                name,
                attributes,
                children: Vec::new(),
            });
        }
        self.expect_byte(b'>')?;

        let children = self.parse_content(&name)?;
        Ok(Element {
            name,
            attributes,
            children,
        })
    }

    fn parse_content(&mut self, name: &str) -> Result<Vec<Content>> {
        let mut children = Vec::new();
        loop {
            if self.cursor.is_eof() {
                return Err(self.error_here(
                    ErrorKind::UnexpectedEof,
                    format!("unterminated element <{name}>"),
                ));
            }

            if self.cursor.starts_with(b"</") {
                self.cursor.advance_by(2);
                let close_name = self.parse_name()?;
                if close_name != name {
                    return Err(Error::at(
                        ErrorKind::MismatchedTag {
                            expected: name.to_string(),
                            found: close_name,
                        },
                        self.cursor.position(),
                    ));
                }
                self.cursor.skip_whitespace();
                self.expect_byte(b'>')?;
                return Ok(children);
            }

            if self.cursor.starts_with(b"<![CDATA[") {
                self.cursor.advance_by(9);
                let start = self.cursor.pos();
                let end = self.skip_until(b"]]>")?;
                let raw = self.cursor.slice_from(start);
                let body = raw.get(..end.saturating_sub(start)).unwrap_or_default();
                children.push(Content::CData(bytes_to_string(body)?));
                continue;
            }

            if self.skip_markup()? {
                continue;
            }

            if self.cursor.current() == Some(b'<') {
                children.push(Content::Element(self.parse_element()?));
                continue;
            }

            if let Some(text) = self.parse_text()? {
                children.push(Content::Text(text));
            }
        }
    }

    fn parse_attributes(&mut self) -> Result<IndexMap<String, String>> {
        let mut attrs = IndexMap::new();

        loop {
            self.cursor.skip_whitespace();
            match self.cursor.current() {
                Some(b'/') | Some(b'>') => break,
                Some(_) => {}
                None => {
                    return Err(self.error_here(ErrorKind::UnexpectedEof, "unterminated start tag"))
                }
            }

            let name = self.parse_name()?;
            self.cursor.skip_whitespace();
            self.expect_byte(b'=')?;
            self.cursor.skip_whitespace();
            let value = self.parse_attribute_value()?;

            if attrs.contains_key(&name) {
                return Err(Error::at(
                    ErrorKind::DuplicateAttribute { name },
                    self.cursor.position(),
                ));
            }
            attrs.insert(name, value);
        }

        Ok(attrs)
    }

    fn parse_attribute_value(&mut self) -> Result<String> {
        let quote = match self.cursor.current() {
            Some(b'"') => b'"',
            Some(b'\'') => b'\'',
            _ => {
                return Err(
                    self.error_here(ErrorKind::InvalidToken, "expected quoted attribute value")
                )
            }
        };
        self.cursor.advance();

        let start = self.cursor.pos();
        while let Some(b) = self.cursor.current() {
            if b == quote {
                let raw = self.cursor.slice_from(start);
                self.cursor.advance();
                return decode_entities(&bytes_to_string(raw)?);
            }
            self.cursor.advance();
        }

        Err(self.error_here(ErrorKind::UnexpectedEof, "unterminated attribute value"))
    }

    fn parse_text(&mut self) -> Result<Option<String>> {
        let start = self.cursor.pos();
        while let Some(b) = self.cursor.current() {
            if b == b'<' {
                break;
            }
            self.cursor.advance();
        }

        let text = decode_entities(&bytes_to_string(self.cursor.slice_from(start))?)?;
        if text.trim().is_empty() {
            Ok(None)
        } else {
            Ok(Some(text))
        }
    }

    fn parse_name(&mut self) -> Result<String> {
        let start = self.cursor.pos();

        match self.cursor.current() {
            Some(first) if is_name_start(first) => self.cursor.advance(),
            Some(_) => return Err(self.error_here(ErrorKind::InvalidToken, "invalid name")),
            None => return Err(self.error_here(ErrorKind::UnexpectedEof, "expected name")),
        }

        while let Some(b) = self.cursor.current() {
            if is_name_char(b) {
                self.cursor.advance();
            } else {
                break;
            }
        }

        bytes_to_string(self.cursor.slice_from(start))
    }

    /// Advance past `pattern`, returning the offset where it started
    fn skip_until(&mut self, pattern: &[u8]) -> Result<usize> {
        while !self.cursor.is_eof() {
            if self.cursor.starts_with(pattern) {
                let found = self.cursor.pos();
                self.cursor.advance_by(pattern.len());
                return Ok(found);
            }
            self.cursor.advance();
        }
        Err(self.error_here(ErrorKind::UnexpectedEof, "unterminated markup"))
    }

    fn expect_byte(&mut self, expected: u8) -> Result<()> {
        if self.cursor.consume(expected) {
            Ok(())
        } else {
            Err(self.error_here(
                ErrorKind::InvalidToken,
                format!("expected `{}`", char::from(expected)),
            ))
        }
    }

    fn error_here(&self, kind: ErrorKind, message: impl Into<String>) -> Error {
        Error::with_message(kind, Span::at(self.cursor.position()), message)
    }
}

fn bytes_to_string(bytes: &[u8]) -> Result<String> {
    std::str::from_utf8(bytes)
        .map(str::to_string)
        .map_err(|_| Error::new(ErrorKind::InvalidUtf8, Span::empty()))
}

fn is_name_start(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'_' | b':') || b >= 0x80
}

fn is_name_char(b: u8) -> bool {
    is_name_start(b) || matches!(b, b'0'..=b'9' | b'-' | b'.')
}

fn decode_entities(input: &str) -> Result<String> {
    if !input.contains('&') {
        return Ok(input.to_string());
    }

    let mut result = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(amp) = rest.find('&') {
        result.push_str(rest.get(..amp).unwrap_or_default());
        let after = rest.get(amp + 1..).unwrap_or_default();
        let Some(semi) = after.find(';') else {
            return Err(invalid_entity(after));
        };
        let entity = after.get(..semi).unwrap_or_default();

        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ => decode_numeric_entity(entity),
        };
        match decoded {
            Some(ch) => result.push(ch),
            None => return Err(invalid_entity(entity)),
        }
        rest = after.get(semi + 1..).unwrap_or_default();
    }
    result.push_str(rest);

    Ok(result)
}

fn invalid_entity(entity: &str) -> Error {
    Error::new(
        ErrorKind::InvalidEntity {
            entity: entity.chars().take(16).collect(),
        },
        Span::empty(),
    )
}

fn decode_numeric_entity(entity: &str) -> Option<char> {
    if let Some(hex) = entity.strip_prefix("#x") {
        u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
    } else if let Some(dec) = entity.strip_prefix('#') {
        dec.parse::<u32>().ok().and_then(char::from_u32)
    } else {
        None
    }
}
