//! Arena-backed mutable element tree
//!
//! Every element lives in one [`generational_arena::Arena`] owned by the
//! [`Document`]. Parents and children refer to each other through [`NodeId`]
//! handles, so structural edits are index updates and a removed element's
//! handle simply stops resolving.

pub mod view;

use std::fmt::Write as _;
use std::str::FromStr;

use generational_arena::{Arena, Index};
use tracing::{debug, instrument, trace};

use crate::binding::link::Link;
use crate::error::{Error, Result};
use crate::xml::model::{Attribute, Fragment};
use crate::xml::parser::{ParseOptions, Parser};

pub use view::{ElementMut, ElementRef};

/// Stable handle to an element inside a [`Document`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(Index);

/// Element storage
pub(crate) struct Node {
    pub(crate) name: String,
    pub(crate) value: Option<String>,
    pub(crate) attributes: Vec<Attribute>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) link: Link,
}

impl Node {
    fn new(name: String) -> Self {
        Self {
            name,
            value: None,
            attributes: Vec::new(),
            parent: None,
            children: Vec::new(),
            link: Link::default(),
        }
    }
}

/// Mutable, queryable element tree with a single root
pub struct Document {
    arena: Arena<Node>,
    root: NodeId,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("root", &self.root)
            .field("nodes", &self.arena.len())
            .finish()
    }
}

impl Document {
    /// Create a document holding a single empty root element
    pub fn new(root_name: impl Into<String>) -> Self {
        let mut arena = Arena::new();
        let root = NodeId(arena.insert(Node::new(root_name.into())));
        Self { arena, root }
    }

    /// Build a document whose root is a copy of `fragment`
    pub fn from_fragment(fragment: &Fragment) -> Self {
        let mut arena = Arena::with_capacity(fragment.element_count());
        let root = Self::import_into(&mut arena, fragment);
        Self { arena, root }
    }

    /// Parse markup text with default options
    pub fn parse(text: &str) -> Result<Self> {
        Self::parse_with(text, ParseOptions::default())
    }

    #[instrument(level = "debug", skip(text), fields(len = text.len()))]
    pub fn parse_with(text: &str, options: ParseOptions) -> Result<Self> {
        let fragment = Parser::with_options(text.as_bytes(), options).parse()?;
        let doc = Self::from_fragment(&fragment);
        debug!(nodes = doc.arena.len(), root = %fragment.name, "parsed document");
        Ok(doc)
    }

    pub const fn root(&self) -> NodeId {
        self.root
    }

    /// Make a detached element the new root; the previous root becomes detached
    pub fn set_root(&mut self, id: NodeId) -> Result<NodeId> {
        let node = self.node(id)?;
        if node.parent.is_some() {
            return Err(Error::invariant(
                "new root must be detached from its current parent",
            ));
        }
        let previous = self.root;
        self.root = id;
        Ok(previous)
    }

    /// Number of live elements, detached ones included
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    /// Whether `id` still refers to a live element
    pub fn contains(&self, id: NodeId) -> bool {
        self.arena.contains(id.0)
    }

    /// Whether `id` is reachable from the root
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node_id) = current {
            if node_id == self.root {
                return true;
            }
            current = self.arena.get(node_id.0).and_then(|node| node.parent);
        }
        false
    }

    pub fn get(&self, id: NodeId) -> Option<ElementRef<'_>> {
        self.arena
            .get(id.0)
            .map(|node| ElementRef::new(self, id, node))
    }

    /// Like [`Self::get`] but reports a stale handle as an error
    pub fn element(&self, id: NodeId) -> Result<ElementRef<'_>> {
        self.get(id).ok_or_else(|| stale(id))
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<ElementMut<'_>> {
        self.arena
            .get_mut(id.0)
            .map(|node| ElementMut::new(id, node))
    }

    pub fn element_mut(&mut self, id: NodeId) -> Result<ElementMut<'_>> {
        self.get_mut(id).ok_or_else(|| stale(id))
    }

    pub fn root_element(&self) -> Result<ElementRef<'_>> {
        self.element(self.root)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.arena.get(id.0).and_then(|node| node.parent)
    }

    /// Child handles in document order (empty for a stale handle)
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.arena
            .get(id.0)
            .map(|node| node.children.as_slice())
            .unwrap_or_default()
    }

    /// Create a detached element
    pub fn create_element(&mut self, name: impl Into<String>) -> NodeId {
        NodeId(self.arena.insert(Node::new(name.into())))
    }

    /// Copy `fragment` into the arena as a detached subtree
    pub fn import(&mut self, fragment: &Fragment) -> NodeId {
        Self::import_into(&mut self.arena, fragment)
    }

    fn import_into(arena: &mut Arena<Node>, fragment: &Fragment) -> NodeId {
        let mut node = Node::new(fragment.name.clone());
        node.value.clone_from(&fragment.value);
        node.attributes.clone_from(&fragment.attributes);
        let id = NodeId(arena.insert(node));

        let children: Vec<NodeId> = fragment
            .children
            .iter()
            .map(|child| Self::import_into(arena, child))
            .collect();
        for child in &children {
            if let Some(node) = arena.get_mut(child.0) {
                node.parent = Some(id);
            }
        }
        if let Some(node) = arena.get_mut(id.0) {
            node.children = children;
        }
        id
    }

    /// Copy a subtree out of the arena
    pub fn export(&self, id: NodeId) -> Result<Fragment> {
        let node = self.node(id)?;
        let children = node
            .children
            .iter()
            .map(|child| self.export(*child))
            .collect::<Result<Vec<_>>>()?;
        Ok(Fragment {
            name: node.name.clone(),
            value: node.value.clone(),
            attributes: node.attributes.clone(),
            children,
        })
    }

    /// Deep copy of a subtree as a new detached element; bindings are not copied
    pub fn clone_subtree(&mut self, id: NodeId) -> Result<NodeId> {
        let fragment = self.export(id)?;
        Ok(self.import(&fragment))
    }

    /// Append `child` as the last child of `parent`, clearing the parent's value
    pub fn insert_inside(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.prepare_insert(parent, child)?;
        self.node_mut(parent)?.value = None;
        self.link_child(parent, child);
        trace!(?parent, ?child, "inserted child");
        Ok(())
    }

    /// Insert `new` directly before `sibling`
    pub fn insert_before(&mut self, sibling: NodeId, new: NodeId) -> Result<()> {
        self.insert_beside(sibling, new, 0)
    }

    /// Insert `new` directly after `sibling`
    pub fn insert_after(&mut self, sibling: NodeId, new: NodeId) -> Result<()> {
        self.insert_beside(sibling, new, 1)
    }

    /// Put `new` in the place of `old` and destroy the `old` subtree
    pub fn replace(&mut self, old: NodeId, new: NodeId) -> Result<()> {
        if old == new {
            return Err(Error::invariant("an element cannot replace itself"));
        }
        let parent = self.require_parent(old)?;
        self.prepare_insert(parent, new)?;
        let index = self.child_index(parent, old)?;
        let siblings = &mut self.node_mut(parent)?.children;
        if let Some(slot) = siblings.get_mut(index) {
            *slot = new;
        }
        self.node_mut(new)?.parent = Some(parent);
        self.node_mut(old)?.parent = None;
        self.destroy(old);
        Ok(())
    }

    /// Unlink an element from its parent and destroy its subtree
    pub fn remove(&mut self, id: NodeId) -> Result<()> {
        self.detach(id)?;
        self.destroy(id);
        Ok(())
    }

    /// Destroy a detached subtree, such as an unused example element
    ///
    /// Fails on the root and on elements that still have a parent; use
    /// [`Self::remove`] for those.
    pub fn discard(&mut self, id: NodeId) -> Result<()> {
        let node = self.node(id)?;
        if id == self.root || node.parent.is_some() {
            return Err(Error::invariant(format!(
                "element {} is attached and cannot be discarded",
                node.name
            )));
        }
        self.destroy(id);
        Ok(())
    }

    /// Unlink an element from its parent, keeping it alive as a detached subtree
    pub fn detach(&mut self, id: NodeId) -> Result<()> {
        let parent = self.require_parent(id)?;
        let index = self.child_index(parent, id)?;
        self.node_mut(parent)?.children.remove(index);
        self.node_mut(id)?.parent = None;
        Ok(())
    }

    /// Destroy all children of an element
    pub fn clear(&mut self, id: NodeId) -> Result<()> {
        let children = std::mem::take(&mut self.node_mut(id)?.children);
        for child in children {
            if let Some(node) = self.arena.get_mut(child.0) {
                node.parent = None;
            }
            self.destroy(child);
        }
        Ok(())
    }

    /// Indented outline of a subtree: `name : value (attribute count)` per line
    pub fn print(&self, id: NodeId) -> Result<String> {
        let mut out = String::new();
        self.print_into(id, 0, &mut out)?;
        Ok(out)
    }

    fn print_into(&self, id: NodeId, level: usize, out: &mut String) -> Result<()> {
        let node = self.node(id)?;
        let _ = writeln!(
            out,
            "{}{} : {} ({})",
            " ".repeat(level),
            node.name,
            node.value.as_deref().unwrap_or_default(),
            node.attributes.len()
        );
        for child in &node.children {
            self.print_into(*child, level + 1, out)?;
        }
        Ok(())
    }

    fn insert_beside(&mut self, sibling: NodeId, new: NodeId, offset: usize) -> Result<()> {
        if sibling == new {
            return Err(Error::invariant("an element cannot be inserted beside itself"));
        }
        let parent = self.require_parent(sibling)?;
        self.prepare_insert(parent, new)?;
        let index = self.child_index(parent, sibling)? + offset;
        self.node_mut(parent)?.children.insert(index, new);
        self.node_mut(new)?.parent = Some(parent);
        Ok(())
    }

    /// Validate an insertion and detach `child` from any previous holder
    fn prepare_insert(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.node(parent)?;
        self.node(child)?;
        if child == self.root {
            return Err(Error::invariant("the root element cannot be inserted"));
        }
        let mut ancestor = Some(parent);
        while let Some(current) = ancestor {
            if current == child {
                return Err(Error::invariant(
                    "an element cannot be inserted into its own subtree",
                ));
            }
            ancestor = self.parent(current);
        }
        if self.parent(child).is_some() {
            self.detach(child)?;
        }
        Ok(())
    }

    fn link_child(&mut self, parent: NodeId, child: NodeId) {
        if let Some(node) = self.arena.get_mut(child.0) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.arena.get_mut(parent.0) {
            node.children.push(child);
        }
    }

    fn require_parent(&self, id: NodeId) -> Result<NodeId> {
        let node = self.node(id)?;
        node.parent
            .ok_or_else(|| Error::not_found(format!("parent of element {}", node.name)))
    }

    fn child_index(&self, parent: NodeId, child: NodeId) -> Result<usize> {
        let node = self.node(parent)?;
        node.children
            .iter()
            .position(|candidate| *candidate == child)
            .ok_or_else(|| Error::not_found(format!("child in parent {}", node.name)))
    }

    /// Free a detached subtree and forget the elements its instances remember
    pub(crate) fn destroy(&mut self, id: NodeId) {
        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            if let Some(node) = self.arena.remove(current.0) {
                node.link.release(current);
                pending.extend(node.children);
            }
        }
    }

    pub(crate) fn node(&self, id: NodeId) -> Result<&Node> {
        self.arena.get(id.0).ok_or_else(|| stale(id))
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.arena.get_mut(id.0).ok_or_else(|| stale(id))
    }
}

impl FromStr for Document {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn stale(id: NodeId) -> Error {
    Error::not_found(format!("element {:?}", id.0.into_raw_parts()))
}
