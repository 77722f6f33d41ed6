//! Write-back through bound collections

use xmlbind::{Document, ElementMut, ElementRef, Error, ErrorKind, Fragment, Instance, Result};

#[derive(Debug, Default)]
struct Item {
    id: String,
    text: String,
}

impl Item {
    fn new(id: &str, text: &str) -> Self {
        Self {
            id: id.to_string(),
            text: text.to_string(),
        }
    }
}

impl Instance for Item {
    fn example(&self) -> Fragment {
        Fragment::new("Item").with_attribute("id", "")
    }

    fn load_from(&mut self, element: ElementRef<'_>) -> bool {
        self.id = element.attribute("id").unwrap_or_default().to_string();
        self.text = element.value().unwrap_or_default().to_string();
        true
    }

    fn store_into(&self, element: &mut ElementMut<'_>) {
        element
            .upsert_attribute("id", self.id.as_str())
            .set_value(self.text.as_str());
    }
}

#[derive(Debug, Default)]
struct Marker;

impl Instance for Marker {
    fn example(&self) -> Fragment {
        Fragment::new("Marker")
    }

    fn load_from(&mut self, _element: ElementRef<'_>) -> bool {
        true
    }

    fn store_into(&self, _element: &mut ElementMut<'_>) {}
}

fn child_ids(doc: &Document, container: &str) -> Result<Vec<String>> {
    let container = doc.access_required(doc.root(), container)?;
    Ok(doc
        .children(container)
        .iter()
        .filter_map(|child| doc.get(*child))
        .map(|child| match child.attribute("id") {
            Some(id) => format!("{}:{id}", child.name()),
            None => child.name().to_string(),
        })
        .collect())
}

#[test]
fn test_remove_one_add_one() -> Result<()> {
    let mut doc = Document::parse(r#"<Root><Item id="1">a</Item><Item id="2">b</Item></Root>"#)?;
    let items = doc.bind_collection::<Item>(doc.root(), "", "Item")?;

    items.retain(|item| item.borrow().id != "1");
    items.push_new(Item::new("3", "c"));

    let written = doc.to_xml()?;
    assert_eq!(
        written,
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n\
         <Root>\n  <Item id=\"2\">b</Item>\n  <Item id=\"3\">c</Item>\n</Root>"
    );
    Ok(())
}

#[test]
fn test_kept_members_keep_position_among_unbound_siblings() -> Result<()> {
    let mut doc = Document::parse(
        r#"<Root><List>
            <Item id="x"/><Note/><Item id="y"/><Comment/><Item id="z"/>
        </List></Root>"#,
    )?;
    let items = doc.bind_collection::<Item>(doc.root(), "List", "Item")?;

    // [X, Y, Z] becomes [Y, W]
    items.retain(|item| item.borrow().id == "y");
    items.push_new(Item::new("w", ""));
    doc.reconcile()?;

    assert_eq!(
        child_ids(&doc, "List")?,
        vec!["Note", "Item:y", "Comment", "Item:w"]
    );
    Ok(())
}

#[test]
fn test_reordering_the_collection_does_not_move_existing_children() -> Result<()> {
    let mut doc = Document::parse(r#"<List><Item id="1"/><Item id="2"/></List>"#)?;
    let root = doc.root();
    let items = doc.bind_collection_at::<Item>(root, "Item")?;
    let first = items.remove(0).ok_or_else(|| Error::not_found("first item"))?;
    items.push(first);
    doc.reconcile()?;

    let ids: Vec<_> = doc
        .children(root)
        .iter()
        .filter_map(|child| doc.get(*child))
        .filter_map(|child| child.attribute("id"))
        .collect();
    assert_eq!(ids, vec!["1", "2"]);
    Ok(())
}

#[test]
fn test_text_edits_flush_on_every_write() -> Result<()> {
    let mut doc = Document::parse(r#"<Root><Item id="1">a</Item></Root>"#)?;
    let items = doc.bind_collection::<Item>(doc.root(), "", "Item")?;
    let item = items.get(0).ok_or_else(|| Error::not_found("item"))?;

    item.borrow_mut().text = "b".to_string();
    assert!(doc.to_xml()?.contains(r#"<Item id="1">b</Item>"#));
    item.borrow_mut().text = "c".to_string();
    assert!(doc.to_xml()?.contains(r#"<Item id="1">c</Item>"#));
    Ok(())
}

#[test]
fn test_cleared_collection_removes_every_bound_child() -> Result<()> {
    let mut doc = Document::parse(r#"<Root><Item id="1"/><Keep/><Item id="2"/></Root>"#)?;
    let items = doc.bind_collection::<Item>(doc.root(), "", "Item")?;
    let removed = items.get(1).ok_or_else(|| Error::not_found("item"))?;
    items.clear();
    doc.reconcile()?;

    assert_eq!(child_ids(&doc, "")?, vec!["Keep"]);
    assert_eq!(removed.element(), None);
    Ok(())
}

#[test]
fn test_two_collections_share_a_container() -> Result<()> {
    let mut doc = Document::parse(r#"<Root><Item id="1"/><Marker/></Root>"#)?;
    let root = doc.root();
    let items = doc.bind_collection_at::<Item>(root, "Item")?;
    let markers = doc.bind_collection_at::<Marker>(root, "Marker")?;

    markers.clear();
    items.push_new(Item::new("2", ""));
    markers.push_new(Marker);
    doc.reconcile()?;

    assert_eq!(child_ids(&doc, "")?, vec!["Item:1", "Item:2", "Marker"]);
    Ok(())
}

#[test]
fn test_unclaimed_single_under_collection_container_fails() -> Result<()> {
    let mut doc = Document::parse(r#"<Root><Item id="1"/><Marker/></Root>"#)?;
    let root = doc.root();
    let marker = doc.access_required(root, "Marker")?;
    doc.bind::<Marker>(marker)?;
    doc.bind_collection_at::<Item>(root, "Item")?;

    let err = doc.to_xml().err();
    assert_eq!(err.map(|e| e.kind().clone()), Some(ErrorKind::InvariantViolation));
    Ok(())
}

#[test]
fn test_nested_collections_reconcile_recursively() -> Result<()> {
    let mut doc = Document::parse(
        r#"<Root><Group><Item id="a"/></Group><Group><Item id="b"/></Group></Root>"#,
    )?;
    let groups = doc.access_all(doc.root(), "Group")?;
    let (Some(&first), Some(&second)) = (groups.first(), groups.get(1)) else {
        return Err(Error::not_found("groups"));
    };
    let first_items = doc.bind_collection_at::<Item>(first, "Item")?;
    let second_items = doc.bind_collection_at::<Item>(second, "Item")?;

    first_items.push_new(Item::new("a2", ""));
    second_items.clear();
    doc.reconcile()?;

    assert_eq!(doc.children(first).len(), 2);
    assert!(doc.children(second).is_empty());
    Ok(())
}
