//! Typed views bound onto document elements
//!
//! An [`Instance`] is application data that knows how to read itself from an
//! element and write itself back. Binding associates one instance with one
//! element ([`Bound`]) or a list of instances with the matching children of a
//! container ([`Collection`]). The association lives in the element's
//! `Link` slot, which keeps the two kinds mutually exclusive.
//!
//! ```
//! use xmlbind::{Document, ElementMut, ElementRef, Fragment, Instance};
//!
//! #[derive(Default)]
//! struct Item {
//!     id: u32,
//!     label: String,
//! }
//!
//! impl Instance for Item {
//!     fn example(&self) -> Fragment {
//!         Fragment::new("Item").with_attribute("id", "0")
//!     }
//!
//!     fn load_from(&mut self, element: ElementRef<'_>) -> bool {
//!         match element.attribute_as("id") {
//!             Some(id) => {
//!                 self.id = id;
//!                 self.label = element.value().unwrap_or_default().to_string();
//!                 true
//!             }
//!             None => false,
//!         }
//!     }
//!
//!     fn store_into(&self, element: &mut ElementMut<'_>) {
//!         element
//!             .upsert_attribute("id", self.id.to_string())
//!             .set_value(self.label.as_str());
//!     }
//! }
//!
//! # fn main() -> xmlbind::Result<()> {
//! let mut doc = Document::parse(r#"<Root><Item id="1">a</Item><Item id="2">b</Item></Root>"#)?;
//! let items = doc.bind_collection::<Item>(doc.root(), "", "Item")?;
//! items.retain(|item| item.borrow().id != 1);
//! items.push_new(Item { id: 3, label: "c".to_string() });
//!
//! let xml = doc.to_xml()?;
//! assert!(!xml.contains(r#"id="1""#));
//! assert!(xml.find(r#"id="2""#) < xml.find(r#"id="3""#));
//! # Ok(())
//! # }
//! ```

pub mod collection;
pub mod instance;
pub(crate) mod link;
mod materialize;

pub use collection::Collection;
pub use instance::{Bound, Instance};
