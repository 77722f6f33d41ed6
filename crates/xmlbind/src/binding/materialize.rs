//! Binding instances to elements and creating elements for instances

use std::any::{type_name, TypeId};
use std::rc::Rc;

use tracing::debug;

use crate::binding::collection::Collection;
use crate::binding::instance::{Bound, Instance};
use crate::document::{Document, NodeId};
use crate::error::{Error, Result};
use crate::selector::Selector;

impl Document {
    /// Bind `id` as a single instance of `T`
    ///
    /// Binding is idempotent: an element that already holds a `T` returns the
    /// same handle. Fails with `LinkConflict` when the element carries
    /// collections or a single of another type, and with `Rejected` when
    /// [`Instance::load_from`] refuses the element.
    pub fn bind<T: Instance>(&mut self, id: NodeId) -> Result<Bound<T>> {
        let node = self.node(id)?;
        if node.link.has_collections() {
            return Err(Error::link_conflict(format!(
                "element {} already carries collection bindings",
                node.name
            )));
        }
        if let Some(existing) = &node.link.single {
            let bound_type = existing.type_name();
            return Bound::from_erased(Rc::clone(existing)).ok_or_else(|| {
                Error::link_conflict(format!(
                    "element {} is bound to {bound_type}, not {}",
                    node.name,
                    type_name::<T>()
                ))
            });
        }

        let mut value = T::default();
        let element = self.element(id)?;
        if !value.load_from(element) {
            return Err(Error::rejected(element.name()));
        }

        let bound = Bound::new(value);
        bound.set_element(Some(id));
        let node = self.node_mut(id)?;
        node.link.single = Some(bound.erased());
        debug!(element = %node.name, instance = type_name::<T>(), "bound single");
        Ok(bound)
    }

    /// Resolve `path` below `root` and bind the result as a single `T`
    ///
    /// A missing path falls back to a detached element built from the
    /// instance's example, so absent data binds to defaults. That element
    /// stays in the arena until [`Document::discard`] frees it. An empty path
    /// binds `root` itself.
    pub fn bind_path<T: Instance>(&mut self, root: NodeId, path: &str) -> Result<Bound<T>> {
        if let Some(id) = self.access(root, path)? {
            return self.bind(id);
        }

        let id = self.import(&T::default().example());
        debug!(path, instance = type_name::<T>(), "path missing, binding example");
        self.bind(id).inspect_err(|_| self.destroy(id))
    }

    /// Bind the children of `container` matching `selector` as a collection
    /// of `T`
    ///
    /// One collection exists per (element, `T`); later calls return a handle
    /// aliasing the first one without searching again.
    pub fn bind_collection_at<T: Instance>(
        &mut self,
        container: NodeId,
        selector: &str,
    ) -> Result<Collection<T>> {
        let selector = Selector::parse(selector)?;
        let node = self.node(container)?;
        if let Some(single) = &node.link.single {
            return Err(Error::link_conflict(format!(
                "element {} is already bound to {}",
                node.name,
                single.type_name()
            )));
        }
        if let Some(existing) = node.link.collections.get(&TypeId::of::<T>()) {
            return Collection::from_erased(Rc::clone(existing)).ok_or_else(|| {
                Error::invariant(format!(
                    "collection registered for {} has another element type",
                    type_name::<T>()
                ))
            });
        }

        let matches = self.find_with(container, &selector, false)?;
        let items = matches
            .into_iter()
            .map(|id| self.bind::<T>(id))
            .collect::<Result<Vec<_>>>()?;
        let collection = Collection::from_items(items);

        let node = self.node_mut(container)?;
        node.link
            .collections
            .insert(TypeId::of::<T>(), collection.erased());
        debug!(
            element = %node.name,
            %selector,
            instance = type_name::<T>(),
            len = collection.len(),
            "bound collection"
        );
        Ok(collection)
    }

    /// Resolve `path` below `root` and bind a collection on that container
    pub fn bind_collection<T: Instance>(
        &mut self,
        root: NodeId,
        path: &str,
        selector: &str,
    ) -> Result<Collection<T>> {
        let container = self
            .access(root, path)?
            .ok_or_else(|| Error::not_found(format!("collection container '{path}'")))?;
        self.bind_collection_at(container, selector)
    }

    /// Append a new element built from `T`'s example to `parent` and bind it
    ///
    /// Collections already bound on `parent` are not updated.
    pub fn create_inside<T: Instance>(&mut self, parent: NodeId) -> Result<Bound<T>> {
        self.node(parent)?;
        let id = self.import(&T::default().example());
        let bound = self.bind::<T>(id).inspect_err(|_| self.destroy(id))?;
        self.insert_inside(parent, id)?;
        Ok(bound)
    }

    /// New document whose root is `T`'s example, bound to a `T`
    pub fn from_example<T: Instance>() -> Result<(Self, Bound<T>)> {
        let mut doc = Self::from_fragment(&T::default().example());
        let root = doc.root();
        let bound = doc.bind(root)?;
        Ok((doc, bound))
    }

    /// Drop every binding held by `id`
    pub fn unbind(&mut self, id: NodeId) -> Result<()> {
        let node = self.node_mut(id)?;
        let link = std::mem::take(&mut node.link);
        link.release(id);
        debug!(element = %node.name, "unbound");
        Ok(())
    }
}
