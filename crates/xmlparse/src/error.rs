//! Error types for xmlparse
//!
//! Only unrecoverable conditions are errors. Problems found while
//! extracting data from an otherwise readable document are reported as
//! [`Diagnostic`](crate::Diagnostic)s instead.

use std::fmt;
use thiserror::Error;

/// Position in source text
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pos {
    pub offset: usize,
    pub line: u32,
    pub col: u32,
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

impl Pos {
    pub const fn new(offset: usize, line: u32, col: u32) -> Self {
        Self { offset, line, col }
    }
}

/// Span representing a range in source text
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Span {
    pub start: Pos,
    pub end: Pos,
}

impl Span {
    pub const fn new(start: Pos, end: Pos) -> Self {
        Self { start, end }
    }

    pub const fn at(pos: Pos) -> Self {
        Self {
            start: pos,
            end: pos,
        }
    }

    pub const fn empty() -> Self {
        Self {
            start: Pos::new(0, 0, 0),
            end: Pos::new(0, 0, 0),
        }
    }

    pub const fn is_empty(&self) -> bool {
        self.start.line == 0
    }
}

/// Error kind for detailed categorization
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed markup
    InvalidToken,
    UnexpectedEof,
    MismatchedTag { expected: String, found: String },
    DuplicateAttribute { name: String },
    InvalidEntity { entity: String },
    InvalidUtf8,
    /// Parser mode other than `raw` or `custom`
    InvalidMode { given: String },
    /// Configuration present but structurally unusable
    InvalidConfig,
    /// Value cannot be written as an XML document
    InvalidDocument,
    Io,
    Json,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidToken => write!(f, "invalid token"),
            Self::UnexpectedEof => write!(f, "unexpected end of input"),
            Self::MismatchedTag { expected, found } => {
                write!(f, "mismatched closing tag: expected </{expected}>, found </{found}>")
            }
            Self::DuplicateAttribute { name } => write!(f, "duplicate attribute: {name}"),
            Self::InvalidEntity { entity } => write!(f, "invalid xml entity: &{entity};"),
            Self::InvalidUtf8 => write!(f, "invalid utf-8"),
            Self::InvalidMode { given } => {
                write!(f, "invalid parser mode [{given}], valid options [raw, custom]")
            }
            Self::InvalidConfig => write!(f, "invalid configuration"),
            Self::InvalidDocument => write!(f, "invalid document"),
            Self::Io => write!(f, "i/o error"),
            Self::Json => write!(f, "json error"),
        }
    }
}

/// Main error type for xmlparse
#[derive(Error, Clone, Debug, PartialEq)]
pub struct Error {
    kind: ErrorKind,
    span: Span,
    message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, span: Span) -> Self {
        let message = kind.to_string();
        Self {
            kind,
            span,
            message,
        }
    }

    pub fn with_message(kind: ErrorKind, span: Span, message: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            message: message.into(),
        }
    }

    /// Error without a source location
    pub fn message_only(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::with_message(kind, Span::empty(), message)
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Create error at specific position
    pub fn at(kind: ErrorKind, pos: Pos) -> Self {
        Self::new(kind, Span::at(pos))
    }

    pub fn invalid_mode(given: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::InvalidMode {
                given: given.into(),
            },
            Span::empty(),
        )
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::message_only(ErrorKind::InvalidConfig, message)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.span.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "error at {}: {}", self.span.start, self.message)
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::message_only(ErrorKind::Io, err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        let line = u32::try_from(err.line()).unwrap_or(u32::MAX);
        let col = u32::try_from(err.column()).unwrap_or(u32::MAX);
        let pos = Pos::new(0, line, col);
        Self::with_message(ErrorKind::Json, Span::at(pos), err.to_string())
    }
}

/// Result type alias for xmlparse
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pos_display() {
        let pos = Pos::new(42, 10, 5);
        assert_eq!(pos.to_string(), "10:5");
    }

    #[test]
    fn test_error_creation() {
        let err = Error::at(ErrorKind::InvalidToken, Pos::new(0, 1, 1));
        assert_eq!(err.kind(), &ErrorKind::InvalidToken);
        assert_eq!(err.span().start.line, 1);
    }

    #[test]
    fn test_error_display_with_location() {
        let err = Error::at(ErrorKind::UnexpectedEof, Pos::new(10, 2, 5));
        let display = err.to_string();
        assert!(display.contains("error at 2:5"));
        assert!(display.contains("unexpected end of input"));
    }

    #[test]
    fn test_invalid_mode_names_valid_options() {
        let err = Error::invalid_mode("fancy");
        assert_eq!(
            err.kind(),
            &ErrorKind::InvalidMode {
                given: "fancy".to_string()
            }
        );
        assert!(err.to_string().contains("[fancy]"));
        assert!(err.to_string().contains("raw, custom"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing.xml");
        let err: Error = io.into();
        assert_eq!(err.kind(), &ErrorKind::Io);
        assert!(err.to_string().contains("missing.xml"));
    }
}
