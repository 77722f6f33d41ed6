//! Shared, mutable lists of bound instances

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::binding::instance::{Bound, ErasedInstance, Instance};

/// Ordered list of instances bound under one container element
///
/// Every handle returned for the same (element, type) pair aliases one
/// backing list, so a change made through one clone is seen through all of
/// them. Write-back treats this list as the source of truth for which bound
/// children the container keeps.
pub struct Collection<T: Instance> {
    items: Rc<RefCell<Vec<Bound<T>>>>,
}

impl<T: Instance> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            items: Rc::clone(&self.items),
        }
    }
}

impl<T: Instance> Default for Collection<T> {
    fn default() -> Self {
        Self::from_items(Vec::new())
    }
}

impl<T: Instance + fmt::Debug> fmt::Debug for Collection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: Instance> Collection<T> {
    pub(crate) fn from_items(items: Vec<Bound<T>>) -> Self {
        Self {
            items: Rc::new(RefCell::new(items)),
        }
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Bound<T>> {
        self.items.borrow().get(index).cloned()
    }

    /// Snapshot of the current members
    pub fn iter(&self) -> std::vec::IntoIter<Bound<T>> {
        self.items.borrow().clone().into_iter()
    }

    pub fn push(&self, item: Bound<T>) {
        self.items.borrow_mut().push(item);
    }

    /// Wrap `value` in a new handle, append it and return the handle
    pub fn push_new(&self, value: T) -> Bound<T> {
        let item = Bound::new(value);
        self.push(item.clone());
        item
    }

    /// Insert at `index`, clamped to the current length
    pub fn insert(&self, index: usize, item: Bound<T>) {
        let mut items = self.items.borrow_mut();
        let index = index.min(items.len());
        items.insert(index, item);
    }

    pub fn remove(&self, index: usize) -> Option<Bound<T>> {
        let mut items = self.items.borrow_mut();
        (index < items.len()).then(|| items.remove(index))
    }

    /// Remove `item` by identity; returns whether it was a member
    pub fn remove_item(&self, item: &Bound<T>) -> bool {
        match self.position(item) {
            Some(index) => self.remove(index).is_some(),
            None => false,
        }
    }

    /// Keep only the members for which `keep` returns true
    pub fn retain(&self, mut keep: impl FnMut(&Bound<T>) -> bool) {
        let kept: Vec<_> = self.iter().filter(|item| keep(item)).collect();
        *self.items.borrow_mut() = kept;
    }

    pub fn position(&self, item: &Bound<T>) -> Option<usize> {
        self.items
            .borrow()
            .iter()
            .position(|member| member.ptr_eq(item))
    }

    pub fn contains(&self, item: &Bound<T>) -> bool {
        self.position(item).is_some()
    }

    pub fn clear(&self) {
        self.items.borrow_mut().clear();
    }

    /// Whether two handles alias the same backing list
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.items, &other.items)
    }

    pub(crate) fn erased(&self) -> Rc<dyn ErasedCollection> {
        Rc::clone(&self.items) as Rc<dyn ErasedCollection>
    }

    pub(crate) fn from_erased(erased: Rc<dyn ErasedCollection>) -> Option<Self> {
        erased
            .into_any()
            .downcast::<RefCell<Vec<Bound<T>>>>()
            .ok()
            .map(|items| Self { items })
    }
}

impl<T: Instance> IntoIterator for &Collection<T> {
    type Item = Bound<T>;
    type IntoIter = std::vec::IntoIter<Bound<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Type-erased backing list, as registered in element links
pub(crate) trait ErasedCollection {
    fn members(&self) -> Vec<Rc<dyn ErasedInstance>>;
    fn into_any(self: Rc<Self>) -> Rc<dyn Any>;
}

impl<T: Instance> ErasedCollection for RefCell<Vec<Bound<T>>> {
    fn members(&self) -> Vec<Rc<dyn ErasedInstance>> {
        self.borrow().iter().map(Bound::erased).collect()
    }

    fn into_any(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{ElementMut, ElementRef};
    use crate::xml::model::Fragment;

    #[derive(Debug, Default)]
    struct Tag(u8);

    impl Instance for Tag {
        fn example(&self) -> Fragment {
            Fragment::new("Tag")
        }

        fn load_from(&mut self, _element: ElementRef<'_>) -> bool {
            true
        }

        fn store_into(&self, _element: &mut ElementMut<'_>) {}
    }

    fn values(collection: &Collection<Tag>) -> Vec<u8> {
        collection.iter().map(|item| item.borrow().0).collect()
    }

    #[test]
    fn test_clones_alias_one_list() {
        let a = Collection::<Tag>::default();
        let b = a.clone();
        a.push_new(Tag(1));
        b.push_new(Tag(2));
        assert_eq!(values(&a), vec![1, 2]);
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&Collection::default()));
    }

    #[test]
    fn test_identity_based_removal() {
        let list = Collection::<Tag>::default();
        let first = list.push_new(Tag(1));
        let lookalike = Bound::new(Tag(1));
        list.push_new(Tag(2));

        assert!(!list.remove_item(&lookalike));
        assert!(list.contains(&first));
        assert!(list.remove_item(&first));
        assert_eq!(values(&list), vec![2]);
        assert_eq!(list.remove(5).map(|item| item.borrow().0), None);
    }

    #[test]
    fn test_insert_retain_and_clear() {
        let list = Collection::<Tag>::default();
        for n in 1..=4 {
            list.push_new(Tag(n));
        }
        list.insert(0, Bound::new(Tag(0)));
        list.insert(100, Bound::new(Tag(9)));
        assert_eq!(values(&list), vec![0, 1, 2, 3, 4, 9]);

        list.retain(|item| item.borrow().0 % 2 == 0);
        assert_eq!(values(&list), vec![0, 2, 4]);
        assert_eq!(list.get(1).map(|item| item.borrow().0), Some(2));

        list.clear();
        assert!(list.is_empty());
    }

    #[test]
    fn test_erased_members_follow_list() {
        let list = Collection::<Tag>::default();
        let item = list.push_new(Tag(7));
        let erased = list.erased();
        assert_eq!(erased.members().len(), 1);
        list.clear();
        assert!(erased.members().is_empty());

        let back = Collection::<Tag>::from_erased(erased);
        assert!(back.is_some_and(|back| back.ptr_eq(&list)));
        assert_eq!(item.borrow().0, 7);
    }
}
