//! Per-element binding slot

use std::any::TypeId;
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::binding::collection::ErasedCollection;
use crate::binding::instance::{identity, ErasedInstance};
use crate::document::NodeId;

/// Either one bound instance or a set of collections keyed by instance type
#[derive(Default)]
pub(crate) struct Link {
    pub(crate) single: Option<Rc<dyn ErasedInstance>>,
    pub(crate) collections: IndexMap<TypeId, Rc<dyn ErasedCollection>>,
}

impl fmt::Debug for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Link")
            .field("single", &self.single.as_ref().map(|s| s.type_name()))
            .field("collections", &self.collections.len())
            .finish()
    }
}

impl Link {
    pub(crate) fn is_empty(&self) -> bool {
        self.single.is_none() && self.collections.is_empty()
    }

    pub(crate) fn has_collections(&self) -> bool {
        !self.collections.is_empty()
    }

    pub(crate) fn has_collection_for(&self, instance_type: TypeId) -> bool {
        self.collections.contains_key(&instance_type)
    }

    /// Members of every collection in registration order, each instance once
    pub(crate) fn live_set(&self) -> Vec<Rc<dyn ErasedInstance>> {
        let mut seen = HashSet::new();
        self.collections
            .values()
            .flat_map(|collection| collection.members())
            .filter(|member| seen.insert(identity(member)))
            .collect()
    }

    /// The element `id` is going away: the single instance forgets it
    pub(crate) fn release(&self, id: NodeId) {
        if let Some(single) = &self.single {
            if single.element() == Some(id) {
                single.set_element(None);
            }
        }
    }
}
