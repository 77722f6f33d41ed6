//! xmlbind - Queryable XML element tree with typed instance binding
//!
//! A [`Document`] is a mutable element tree kept in an arena. Elements are
//! found with compact selectors (`Item[id=2]`) and `/`-separated paths, and
//! application types implementing [`Instance`] can be bound onto single
//! elements or onto the matching children of a container as a
//! [`Collection`]. Writing the document flushes every bound instance back
//! into its element and brings each container's children in line with its
//! collections.
//!
//! # Quick Start
//!
//! ```
//! use xmlbind::Document;
//! # fn main() -> Result<(), xmlbind::Error> {
//! let doc = Document::parse(r#"<Config><Server port="80">web</Server></Config>"#)?;
//! let server = doc
//!     .access_from_root("Server[port=80]")?
//!     .and_then(|id| doc.get(id))
//!     .and_then(|server| server.value());
//! assert_eq!(server, Some("web"));
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub use error::{Error, ErrorKind, Pos, Result, Span};

pub mod lexer;

pub mod xml;
pub use xml::{Attribute, Fragment, ParseOptions, WriteOptions};

pub mod document;
pub use document::{Document, ElementMut, ElementRef, NodeId};

pub mod selector;
pub use selector::Selector;

pub mod navigate;

pub mod binding;
pub use binding::{Bound, Collection, Instance};

pub mod reconcile;

pub mod io;
pub use io::LoadCache;

/// Parse a document from a string
pub fn from_str(s: &str) -> Result<Document> {
    Document::parse(s)
}

/// Parse a document from bytes, which must be UTF-8
pub fn from_bytes(bytes: &[u8]) -> Result<Document> {
    let fragment = xml::Parser::new(bytes).parse()?;
    Ok(Document::from_fragment(&fragment))
}

/// Parse with custom options
pub fn from_str_with_options(s: &str, options: ParseOptions) -> Result<Document> {
    Document::parse_with(s, options)
}

/// Reconcile and write a document with default options
pub fn to_string(doc: &mut Document) -> Result<String> {
    doc.to_xml()
}
