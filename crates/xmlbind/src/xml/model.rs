//! Owned, arena-free element trees
//!
//! A [`Fragment`] is what the parser produces, what instances hand out as
//! their example element, and what [`crate::Document::export`] returns. It is
//! plain data: cloning it never shares bindings.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Reserved attribute name written as the element's namespace declaration
pub const NAMESPACE_ATTRIBUTE: &str = "xmlns";

/// Name/value pair owned by an element
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Case-insensitive name comparison
    pub fn is_named(&self, name: &str) -> bool {
        names_eq(&self.name, name)
    }

    /// Whether this attribute is the reserved namespace declaration
    pub fn is_namespace_declaration(&self) -> bool {
        self.is_named(NAMESPACE_ATTRIBUTE)
    }
}

/// Element tree detached from any document
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Fragment {
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub value: Option<String>,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Vec::is_empty"))]
    pub attributes: Vec<Attribute>,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Vec::is_empty"))]
    pub children: Vec<Fragment>,
}

impl Fragment {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Append an attribute (duplicates are kept, lookups use the first)
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push(Attribute::new(name, value));
        self
    }

    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Append a child element; clears the text value like an insertion does
    #[must_use]
    pub fn with_child(mut self, child: Self) -> Self {
        self.value = None;
        self.children.push(child);
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.is_named(name))
            .map(|attr| attr.value.as_str())
    }

    /// First direct child with the given name
    pub fn child(&self, name: &str) -> Option<&Self> {
        self.children.iter().find(|child| names_eq(&child.name, name))
    }

    /// Number of elements in this tree, including itself
    pub fn element_count(&self) -> usize {
        1 + self.children.iter().map(Self::element_count).sum::<usize>()
    }
}

/// Case-insensitive comparison used for element and attribute names
pub(crate) fn names_eq(left: &str, right: &str) -> bool {
    if left.is_ascii() && right.is_ascii() {
        return left.eq_ignore_ascii_case(right);
    }
    left.chars()
        .flat_map(char::to_lowercase)
        .eq(right.chars().flat_map(char::to_lowercase))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_eq_ignores_case() {
        assert!(names_eq("Item", "item"));
        assert!(names_eq("ÉLÉMENT", "élément"));
        assert!(!names_eq("Item", "Items"));
    }

    #[test]
    fn test_fragment_builder() {
        let fragment = Fragment::new("Root")
            .with_attribute("id", "1")
            .with_attribute("ID", "2")
            .with_child(Fragment::new("Item").with_value("a"));

        assert_eq!(fragment.attribute("Id"), Some("1"));
        assert_eq!(fragment.attributes.len(), 2);
        assert_eq!(
            fragment.child("item").and_then(|c| c.value.as_deref()),
            Some("a")
        );
        assert_eq!(fragment.element_count(), 2);
    }

    #[test]
    fn test_with_child_clears_value() {
        let fragment = Fragment::new("a")
            .with_value("text")
            .with_child(Fragment::new("b"));
        assert_eq!(fragment.value, None);
    }

    #[test]
    fn test_namespace_attribute_detection() {
        assert!(Attribute::new("XMLNS", "urn:x").is_namespace_declaration());
        assert!(!Attribute::new("xmlns:p", "urn:x").is_namespace_declaration());
    }
}
