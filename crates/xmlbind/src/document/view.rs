//! Borrowed views of a single element
//!
//! [`ElementRef`] is what [`crate::Instance::load_from`] reads from and
//! [`ElementMut`] is what [`crate::Instance::store_into`] writes to.

use std::str::FromStr;

use crate::document::{Document, Node, NodeId};
use crate::error::{Error, Result};
use crate::selector::Selector;
use crate::xml::model::Attribute;

/// Read-only view of one element and, through its document, its relatives
#[derive(Clone, Copy)]
pub struct ElementRef<'a> {
    doc: &'a Document,
    id: NodeId,
    node: &'a Node,
}

impl std::fmt::Debug for ElementRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElementRef")
            .field("id", &self.id)
            .field("name", &self.node.name)
            .finish()
    }
}

impl<'a> ElementRef<'a> {
    pub(crate) const fn new(doc: &'a Document, id: NodeId, node: &'a Node) -> Self {
        Self { doc, id, node }
    }

    pub const fn id(&self) -> NodeId {
        self.id
    }

    pub fn document(&self) -> &'a Document {
        self.doc
    }

    pub fn name(&self) -> &'a str {
        &self.node.name
    }

    pub fn value(&self) -> Option<&'a str> {
        self.node.value.as_deref()
    }

    /// Parse the text value, `None` when absent or unparsable
    pub fn value_as<T: FromStr>(&self) -> Option<T> {
        self.value().and_then(|value| value.trim().parse().ok())
    }

    pub fn attributes(&self) -> &'a [Attribute] {
        &self.node.attributes
    }

    /// Value of the first attribute with this name (case-insensitive)
    pub fn attribute(&self, name: &str) -> Option<&'a str> {
        self.node
            .attributes
            .iter()
            .find(|attr| attr.is_named(name))
            .map(|attr| attr.value.as_str())
    }

    /// Parse an attribute value, `None` when absent or unparsable
    pub fn attribute_as<T: FromStr>(&self, name: &str) -> Option<T> {
        self.attribute(name)
            .and_then(|value| value.trim().parse().ok())
    }

    /// Like [`Self::attribute`] but reports a missing attribute as an error
    pub fn require_attribute(&self, name: &str) -> Result<&'a str> {
        self.attribute(name)
            .ok_or_else(|| Error::attribute_not_found(name, &self.node.name))
    }

    pub fn parent(&self) -> Option<Self> {
        self.node.parent.and_then(|parent| self.doc.get(parent))
    }

    pub fn children(&self) -> impl Iterator<Item = ElementRef<'a>> + 'a {
        let doc = self.doc;
        let node = self.node;
        node.children
            .iter()
            .filter_map(move |child| doc.get(*child))
    }

    pub fn child_count(&self) -> usize {
        self.node.children.len()
    }

    pub fn matches(&self, selector: &Selector) -> bool {
        selector.matches(*self)
    }

    /// First direct child matching `selector`
    pub fn child(&self, selector: &str) -> Result<Option<Self>> {
        let found = self.doc.find_first(self.id, selector, false)?;
        Ok(found.and_then(|id| self.doc.get(id)))
    }

    /// Resolve a `/`-separated path below this element
    pub fn access(&self, path: &str) -> Result<Option<Self>> {
        let found = self.doc.access(self.id, path)?;
        Ok(found.and_then(|id| self.doc.get(id)))
    }

    /// Whether an instance is bound to this element, as single or collection
    pub fn is_bound(&self) -> bool {
        !self.node.link.is_empty()
    }
}

/// Mutable view of one element's own name, value and attributes
pub struct ElementMut<'a> {
    id: NodeId,
    node: &'a mut Node,
}

impl std::fmt::Debug for ElementMut<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElementMut")
            .field("id", &self.id)
            .field("name", &self.node.name)
            .finish()
    }
}

impl<'a> ElementMut<'a> {
    pub(crate) fn new(id: NodeId, node: &'a mut Node) -> Self {
        Self { id, node }
    }

    pub const fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.node.name
    }

    pub fn value(&self) -> Option<&str> {
        self.node.value.as_deref()
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.node
            .attributes
            .iter()
            .find(|attr| attr.is_named(name))
            .map(|attr| attr.value.as_str())
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.node.attributes
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.node.name = name.into();
        self
    }

    pub fn set_value(&mut self, value: impl Into<String>) -> &mut Self {
        self.node.value = Some(value.into());
        self
    }

    pub fn clear_value(&mut self) -> &mut Self {
        self.node.value = None;
        self
    }

    /// Overwrite an existing attribute; fails when no attribute has this name
    pub fn set_attribute(&mut self, name: &str, value: impl Into<String>) -> Result<&mut Self> {
        match self
            .node
            .attributes
            .iter_mut()
            .find(|attr| attr.is_named(name))
        {
            Some(attr) => {
                attr.value = value.into();
                Ok(self)
            }
            None => Err(Error::attribute_not_found(name, &self.node.name)),
        }
    }

    /// Overwrite the first attribute with this name, or append a new one
    pub fn upsert_attribute(&mut self, name: &str, value: impl Into<String>) -> &mut Self {
        let value = value.into();
        match self
            .node
            .attributes
            .iter_mut()
            .find(|attr| attr.is_named(name))
        {
            Some(attr) => attr.value = value,
            None => self.node.attributes.push(Attribute::new(name, value)),
        }
        self
    }

    /// Append an attribute even if one with the same name exists
    pub fn add_attribute(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.node.attributes.push(Attribute::new(name, value));
        self
    }

    /// Remove the first attribute with this name and return its value
    pub fn remove_attribute(&mut self, name: &str) -> Option<String> {
        let index = self
            .node
            .attributes
            .iter()
            .position(|attr| attr.is_named(name))?;
        Some(self.node.attributes.remove(index).value)
    }
}
