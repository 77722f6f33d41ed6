//! Write-back: flush bound instances into their elements before writing
//!
//! A container's bound collections decide which bound children it keeps.
//! Children whose instance is still listed stay where they are, children
//! whose instance left its collection are removed, and listed instances with
//! no element yet get one appended. Unbound children are never touched.

use std::rc::Rc;

use tracing::{debug, instrument, warn};

use crate::binding::instance::{identity, ErasedInstance};
use crate::document::{Document, NodeId};
use crate::error::{Error, Result};
use crate::xml::writer::{WriteOptions, Writer};

impl Document {
    /// Reconcile the whole tree from the root
    #[instrument(level = "debug", skip(self))]
    pub fn reconcile(&mut self) -> Result<()> {
        self.reconcile_node(self.root())
    }

    /// Reconcile the subtree rooted at `id`
    pub fn reconcile_node(&mut self, id: NodeId) -> Result<()> {
        let (single, mut pending, has_collections) = {
            let link = &self.node(id)?.link;
            (link.single.clone(), link.live_set(), link.has_collections())
        };

        if let Some(instance) = single {
            instance.store_into(&mut self.element_mut(id)?)?;
        }

        let children = self.children(id).to_vec();
        for child in children {
            let bound = self.node(child)?.link.single.clone();
            match bound {
                Some(instance) if has_collections => {
                    let key = identity(&instance);
                    if let Some(position) = pending.iter().position(|live| identity(live) == key) {
                        pending.remove(position);
                        self.reconcile_node(child)?;
                    } else if self.node(id)?.link.has_collection_for(instance.instance_type()) {
                        warn!(
                            container = %self.node(id)?.name,
                            instance = instance.type_name(),
                            "removing element whose instance left its collection"
                        );
                        self.remove(child)?;
                    } else {
                        return Err(Error::invariant(format!(
                            "child {} of {} is bound to {}, which no collection on the container claims",
                            self.node(child)?.name,
                            self.node(id)?.name,
                            instance.type_name()
                        )));
                    }
                }
                _ => self.reconcile_node(child)?,
            }
        }

        for instance in pending {
            self.materialize(id, &instance)?;
        }
        Ok(())
    }

    /// Give a collection member without an element its own child of `parent`
    fn materialize(&mut self, parent: NodeId, instance: &Rc<dyn ErasedInstance>) -> Result<()> {
        let created = self.import(&instance.example()?);
        instance.store_into(&mut self.element_mut(created)?)?;
        self.insert_inside(parent, created)?;

        // an element left behind in another container is dropped when that
        // container is reconciled
        self.node_mut(created)?.link.single = Some(Rc::clone(instance));
        instance.set_element(Some(created));
        debug!(
            container = %self.node(parent)?.name,
            instance = instance.type_name(),
            "materialized collection member"
        );
        Ok(())
    }

    /// Reconcile, then write the document with default options
    pub fn to_xml(&mut self) -> Result<String> {
        self.to_xml_with(WriteOptions::default())
    }

    #[instrument(level = "debug", skip(self))]
    pub fn to_xml_with(&mut self, options: WriteOptions) -> Result<String> {
        self.reconcile()?;
        Writer::new(options).write(self, self.root())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::{Bound, Instance};
    use crate::document::{ElementMut, ElementRef};
    use crate::error::ErrorKind;
    use crate::xml::model::Fragment;

    #[derive(Debug, Default)]
    struct Entry {
        key: String,
    }

    impl Instance for Entry {
        fn example(&self) -> Fragment {
            Fragment::new("Entry").with_attribute("key", "")
        }

        fn load_from(&mut self, element: ElementRef<'_>) -> bool {
            self.key = element.attribute("key").unwrap_or_default().to_string();
            true
        }

        fn store_into(&self, element: &mut ElementMut<'_>) {
            element.upsert_attribute("key", self.key.as_str());
        }
    }

    #[derive(Debug, Default)]
    struct Note(String);

    impl Instance for Note {
        fn example(&self) -> Fragment {
            Fragment::new("Note")
        }

        fn load_from(&mut self, element: ElementRef<'_>) -> bool {
            self.0 = element.value().unwrap_or_default().to_string();
            true
        }

        fn store_into(&self, element: &mut ElementMut<'_>) {
            element.set_value(self.0.as_str());
        }
    }

    fn keys(doc: &Document, container: NodeId) -> Vec<String> {
        doc.children(container)
            .iter()
            .filter_map(|child| doc.get(*child))
            .map(|child| {
                child
                    .attribute("key")
                    .map_or_else(|| child.name().to_string(), str::to_string)
            })
            .collect()
    }

    fn entry(key: &str) -> Entry {
        Entry {
            key: key.to_string(),
        }
    }

    #[test]
    fn test_single_is_flushed_before_writing() -> Result<()> {
        let mut doc = Document::parse("<Root><Note>old</Note></Root>")?;
        let note = doc.bind_path::<Note>(doc.root(), "Note")?;
        note.borrow_mut().0 = "new".to_string();
        let xml = doc.to_xml()?;
        assert!(xml.contains("<Note>new</Note>"));
        Ok(())
    }

    #[test]
    fn test_kept_entries_stay_in_place_and_new_ones_append() -> Result<()> {
        let mut doc = Document::parse(
            r#"<List><Entry key="x"/><Free/><Entry key="y"/><Entry key="z"/></List>"#,
        )?;
        let root = doc.root();
        let entries = doc.bind_collection_at::<Entry>(root, "Entry")?;

        entries.retain(|item| item.borrow().key == "y");
        entries.push_new(entry("w"));
        doc.reconcile()?;

        assert_eq!(keys(&doc, root), vec!["Free", "y", "w"]);
        Ok(())
    }

    #[test]
    fn test_second_pass_does_not_duplicate() -> Result<()> {
        let mut doc = Document::parse("<List/>")?;
        let root = doc.root();
        let entries = doc.bind_collection_at::<Entry>(root, "Entry")?;
        let added = entries.push_new(entry("a"));

        let first = doc.to_xml()?;
        let second = doc.to_xml()?;
        assert_eq!(first, second);
        assert_eq!(doc.children(root).len(), 1);
        assert!(added.element().is_some_and(|id| doc.is_attached(id)));
        Ok(())
    }

    #[test]
    fn test_edits_to_kept_members_are_flushed() -> Result<()> {
        let mut doc = Document::parse(r#"<List><Entry key="a"/></List>"#)?;
        let root = doc.root();
        let entries = doc.bind_collection_at::<Entry>(root, "Entry")?;
        if let Some(first) = entries.get(0) {
            first.borrow_mut().key = "b".to_string();
        }
        doc.reconcile()?;
        assert_eq!(keys(&doc, root), vec!["b"]);
        Ok(())
    }

    #[test]
    fn test_unclaimed_bound_child_is_invariant_violation() -> Result<()> {
        let mut doc = Document::parse(r#"<List><Entry key="a"/><Note>n</Note></List>"#)?;
        let root = doc.root();
        let note = doc.access_required(root, "Note")?;
        doc.bind::<Note>(note)?;
        doc.bind_collection_at::<Entry>(root, "Entry")?;

        let err = doc.reconcile().err();
        assert_eq!(err.map(|e| e.kind().clone()), Some(ErrorKind::InvariantViolation));
        Ok(())
    }

    #[test]
    fn test_bound_children_kept_without_collections() -> Result<()> {
        let mut doc = Document::parse(r#"<List><Entry key="a"/></List>"#)?;
        let root = doc.root();
        let child = doc.access_required(root, "Entry")?;
        let single = doc.bind::<Entry>(child)?;
        single.borrow_mut().key = "c".to_string();
        doc.reconcile()?;
        assert_eq!(keys(&doc, root), vec!["c"]);
        Ok(())
    }

    #[test]
    fn test_member_moved_between_containers() -> Result<()> {
        let mut doc = Document::parse(r#"<Root><A><Entry key="m"/></A><B/></Root>"#)?;
        let root = doc.root();
        let a = doc.bind_collection::<Entry>(root, "A", "Entry")?;
        let b = doc.bind_collection::<Entry>(root, "B", "Entry")?;

        let moved: Option<Bound<Entry>> = a.remove(0);
        if let Some(moved) = moved {
            b.push(moved);
        }
        doc.reconcile()?;

        let a_id = doc.access_required(root, "A")?;
        let b_id = doc.access_required(root, "B")?;
        assert!(doc.children(a_id).is_empty());
        assert_eq!(keys(&doc, b_id), vec!["m"]);
        Ok(())
    }
}
