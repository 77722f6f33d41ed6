//! The [`Instance`] capability and the shared [`Bound`] handle

use std::any::{type_name, Any, TypeId};
use std::cell::{Cell, Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use crate::document::{Document, ElementMut, ElementRef, NodeId};
use crate::error::{Error, Result};
use crate::xml::model::Fragment;
use crate::xml::writer::{WriteOptions, Writer};

/// Application data that can be projected onto an element
pub trait Instance: Default + 'static {
    /// Template element used when a new element has to be created for this
    /// instance
    fn example(&self) -> Fragment;

    /// Populate fields from `element`; returning `false` refuses the binding
    fn load_from(&mut self, element: ElementRef<'_>) -> bool;

    /// Flush fields back into the element before it is written
    fn store_into(&self, element: &mut ElementMut<'_>);
}

/// Shared storage behind a [`Bound`]: the instance and the element it was last
/// bound to
pub(crate) struct Slot<T> {
    value: RefCell<T>,
    element: Cell<Option<NodeId>>,
}

/// Shared handle to a bound instance
///
/// Clones alias the same instance. Identity is the allocation, compare it with
/// [`Bound::ptr_eq`].
pub struct Bound<T: Instance>(Rc<Slot<T>>);

impl<T: Instance> Clone for Bound<T> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<T: Instance + fmt::Debug> fmt::Debug for Bound<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("Bound");
        match self.0.value.try_borrow() {
            Ok(value) => out.field("value", &*value),
            Err(_) => out.field("value", &"<borrowed>"),
        };
        out.field("element", &self.0.element.get()).finish()
    }
}

impl<T: Instance> Bound<T> {
    /// Wrap a value that is not bound to any element yet
    pub fn new(value: T) -> Self {
        Self(Rc::new(Slot {
            value: RefCell::new(value),
            element: Cell::new(None),
        }))
    }

    /// # Panics
    ///
    /// Panics if the instance is currently mutably borrowed.
    pub fn borrow(&self) -> Ref<'_, T> {
        self.0.value.borrow()
    }

    /// # Panics
    ///
    /// Panics if the instance is currently borrowed.
    pub fn borrow_mut(&self) -> RefMut<'_, T> {
        self.0.value.borrow_mut()
    }

    /// Element this instance was last bound to, if it still exists
    pub fn element(&self) -> Option<NodeId> {
        self.0.element.get()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Flush this instance's element subtree and write it without a
    /// declaration
    pub fn to_xml(&self, doc: &mut Document) -> Result<String> {
        let id = self
            .element()
            .ok_or_else(|| Error::not_found(format!("element bound to {}", type_name::<T>())))?;
        doc.reconcile_node(id)?;
        Writer::new(WriteOptions::default().with_declaration(false)).write(doc, id)
    }

    pub(crate) fn set_element(&self, id: Option<NodeId>) {
        self.0.element.set(id);
    }

    pub(crate) fn erased(&self) -> Rc<dyn ErasedInstance> {
        Rc::clone(&self.0) as Rc<dyn ErasedInstance>
    }

    /// Recover the typed handle, `None` when the instance is of another type
    pub(crate) fn from_erased(erased: Rc<dyn ErasedInstance>) -> Option<Self> {
        erased.into_any().downcast::<Slot<T>>().ok().map(Self)
    }

    pub(crate) fn identity(&self) -> *const () {
        Rc::as_ptr(&self.0).cast::<()>()
    }
}

/// Type-erased view of a [`Slot`], as stored in element links
pub(crate) trait ErasedInstance {
    fn example(&self) -> Result<Fragment>;
    fn store_into(&self, element: &mut ElementMut<'_>) -> Result<()>;
    fn element(&self) -> Option<NodeId>;
    fn set_element(&self, id: Option<NodeId>);
    fn instance_type(&self) -> TypeId;
    fn type_name(&self) -> &'static str;
    fn into_any(self: Rc<Self>) -> Rc<dyn Any>;
}

impl<T: Instance> Slot<T> {
    fn read(&self) -> Result<Ref<'_, T>> {
        self.value.try_borrow().map_err(|_| {
            Error::invariant(format!(
                "{} is mutably borrowed during write-back",
                type_name::<T>()
            ))
        })
    }
}

impl<T: Instance> ErasedInstance for Slot<T> {
    fn example(&self) -> Result<Fragment> {
        Ok(self.read()?.example())
    }

    fn store_into(&self, element: &mut ElementMut<'_>) -> Result<()> {
        self.read()?.store_into(element);
        Ok(())
    }

    fn element(&self) -> Option<NodeId> {
        self.element.get()
    }

    fn set_element(&self, id: Option<NodeId>) {
        self.element.set(id);
    }

    fn instance_type(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn type_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn into_any(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }
}

/// Identity of an erased instance, comparable with [`Bound::identity`]
pub(crate) fn identity(instance: &Rc<dyn ErasedInstance>) -> *const () {
    Rc::as_ptr(instance).cast::<()>()
}
