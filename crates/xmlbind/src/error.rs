//! Error types for xmlbind

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
        write!(f, "{}:{}:{}", self.offset, self.line, self.col)
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

    pub const fn empty() -> Self {
        Self {
            start: Pos::new(0, 0, 0),
            end: Pos::new(0, 0, 0),
        }
    }

    pub const fn is_empty(&self) -> bool {
        self.start.line == 0 && self.end.line == 0
    }
}

/// Error kind for detailed categorization
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// The markup itself is broken: bad names, unterminated tags, bad entities
    MalformedInput,
    /// The node stream does not have the shape the parser expects at this point
    StructuralMismatch { expected: String, found: String },
    /// A path, selector or relative that the caller required does not exist
    NotFound { what: String },
    /// Single and collection bindings collided on one element
    LinkConflict,
    AttributeNotFound { name: String, element: String },
    /// Write-back found a bound child that none of its container's collections claims
    InvariantViolation,
    InvalidSelector { selector: String },
    /// `Instance::load_from` refused the element
    Rejected { element: String },
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedInput => write!(f, "malformed input"),
            Self::StructuralMismatch { expected, found } => {
                write!(f, "expected {expected}, found {found}")
            }
            Self::NotFound { what } => write!(f, "not found: {what}"),
            Self::LinkConflict => write!(f, "link conflict"),
            Self::AttributeNotFound { name, element } => {
                write!(f, "attribute {name} not found in element {element}")
            }
            Self::InvariantViolation => write!(f, "invariant violation"),
            Self::InvalidSelector { selector } => write!(f, "invalid selector: {selector}"),
            Self::Rejected { element } => write!(f, "instance rejected element {element}"),
            Self::Io => write!(f, "i/o error"),
        }
    }
}

/// Main error type for xmlbind
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

    /// Error without a source position, for everything that happens after parsing
    pub fn detached(kind: ErrorKind) -> Self {
        Self::new(kind, Span::empty())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::detached(ErrorKind::NotFound { what: what.into() })
    }

    pub fn link_conflict(message: impl Into<String>) -> Self {
        Self::with_message(ErrorKind::LinkConflict, Span::empty(), message)
    }

    pub fn attribute_not_found(name: &str, element: &str) -> Self {
        Self::detached(ErrorKind::AttributeNotFound {
            name: name.to_string(),
            element: element.to_string(),
        })
    }

    pub fn rejected(element: &str) -> Self {
        Self::detached(ErrorKind::Rejected {
            element: element.to_string(),
        })
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        Self::with_message(ErrorKind::InvariantViolation, Span::empty(), message)
    }

    pub fn io(path: &std::path::Path, err: &std::io::Error) -> Self {
        Self::with_message(
            ErrorKind::Io,
            Span::empty(),
            format!("{}: {err}", path.display()),
        )
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
    pub fn at(kind: ErrorKind, offset: usize, line: u32, col: u32) -> Self {
        let pos = Pos::new(offset, line, col);
        Self::new(kind, Span::new(pos, pos))
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

/// Result type alias for xmlbind
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pos_display() {
        let pos = Pos::new(42, 10, 5);
        assert_eq!(pos.to_string(), "42:10:5");
    }

    #[test]
    fn test_error_creation() {
        let err = Error::at(ErrorKind::MalformedInput, 0, 1, 1);
        assert_eq!(err.kind(), &ErrorKind::MalformedInput);
    }

    #[test]
    fn test_error_display_with_position() {
        let err = Error::at(
            ErrorKind::StructuralMismatch {
                expected: "end tag".to_string(),
                found: "element".to_string(),
            },
            10,
            2,
            5,
        );
        let display = err.to_string();
        assert!(display.contains("error at 10:2:5"));
        assert!(display.contains("expected end tag, found element"));
    }

    #[test]
    fn test_detached_error_has_no_position() {
        let err = Error::not_found("Root/Item");
        assert!(err.span().is_empty());
        assert_eq!(err.to_string(), "not found: Root/Item");
    }
}
