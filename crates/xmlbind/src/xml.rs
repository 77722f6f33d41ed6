//! Markup boundary: the owned [`Fragment`] model, the parser producing it and
//! the writer emitting documents

pub mod model;
pub mod parser;
pub mod writer;

pub use model::{Attribute, Fragment, NAMESPACE_ATTRIBUTE};
pub use parser::{ParseOptions, Parser};
pub use writer::{WriteOptions, Writer, DECLARATION};
