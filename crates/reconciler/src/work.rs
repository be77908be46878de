//! One step of the render traversal.

use crate::element::{ElementType, TEXT_VALUE};
use crate::fiber::{FiberId, FiberTree};
use crate::properties::update_properties;
use crate::props::Props;
use crate::reconcile::reconcile_children;
use anyhow::{Context as _, Result};
use core::slice;
use host::Host;
use log::trace;

/// Process `fiber` and return the fiber to visit next, or `None` once the
/// traversal rooted at `root` is exhausted.
///
/// Components are invoked and their single result reconciled; host fibers get
/// a host node when they have none and then have their children reconciled.
/// Host nodes are created here but only attached during commit.
pub(crate) fn perform_unit_of_work<H: Host + ?Sized>(
    tree: &mut FiberTree,
    host: &mut H,
    fiber: FiberId,
    root: FiberId,
    deletions: &mut Vec<FiberId>,
) -> Result<Option<FiberId>> {
    let current = tree.get(fiber)?;
    trace!("unit of work: {}", current.label());
    let kind = current.element_type.clone();
    let props = current.props.clone();
    let needs_host_node = current.host_node.is_none();

    match kind {
        Some(ElementType::Component(component)) => {
            let rendered = component.render(&props);
            reconcile_children(tree, fiber, slice::from_ref(&rendered), deletions)
                .with_context(|| format!("reconciling output of component {}", component.name()))?;
        }
        Some(ElementType::Text) => {
            if needs_host_node {
                let value = match props.get(TEXT_VALUE) {
                    Some(value) => value.to_attribute_value().unwrap_or_default(),
                    None => String::new(),
                };
                let node = host.create_text(&value)?;
                tree.get_mut(fiber)?.host_node = Some(node);
            }
        }
        Some(ElementType::Host(tag)) => {
            if needs_host_node {
                let node = host.create_element(&tag)?;
                update_properties(host, node, &Props::empty(), &props)
                    .with_context(|| format!("applying initial attributes of <{tag}>"))?;
                tree.get_mut(fiber)?.host_node = Some(node);
            }
            reconcile_children(tree, fiber, props.children(), deletions)?;
        }
        None => reconcile_children(tree, fiber, props.children(), deletions)?,
    }

    if let Some(child) = tree.child(fiber) {
        return Ok(Some(child));
    }
    let mut next = Some(fiber);
    while let Some(id) = next {
        if id == root {
            return Ok(None);
        }
        if let Some(sibling) = tree.sibling(id) {
            return Ok(Some(sibling));
        }
        next = tree.parent(id);
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Component, build, text};
    use crate::fiber::Fiber;
    use crate::props::PropValue;
    use anyhow::Context;
    use host::MemoryDom;

    fn labels_in_visit_order(tree: &mut FiberTree, dom: &mut MemoryDom, root: FiberId) -> Result<Vec<String>> {
        let mut deletions = Vec::new();
        let mut visited = Vec::new();
        let mut cursor = Some(root);
        while let Some(fiber) = cursor {
            visited.push(tree.get(fiber)?.label().to_owned());
            cursor = perform_unit_of_work(tree, dom, fiber, root, &mut deletions)?;
        }
        Ok(visited)
    }

    #[test]
    fn traversal_is_depth_first_then_sibling_then_ancestor() -> Result<()> {
        let mut dom = MemoryDom::new();
        let container = dom.create_container("main")?;
        let element = build(
            "div",
            [],
            [build("a", [], ["bar".into()]).into(), build("b", [], []).into()],
        );
        let mut tree = FiberTree::new();
        let root = tree.insert(Fiber::root(container, element, None));

        let visited = labels_in_visit_order(&mut tree, &mut dom, root)?;
        assert_eq!(visited, ["#root", "div", "a", "TEXT_ELEMENT", "b"]);
        Ok(())
    }

    #[test]
    fn host_nodes_are_created_but_not_attached() -> Result<()> {
        let mut dom = MemoryDom::new();
        let container = dom.create_container("main")?;
        let element = build("div", [("id".to_owned(), PropValue::from("foo"))], ["hi".into()]);
        let mut tree = FiberTree::new();
        let root = tree.insert(Fiber::root(container, element, None));
        labels_in_visit_order(&mut tree, &mut dom, root)?;

        let div = tree.child(root).context("div fiber")?;
        let node = tree.get(div)?.host_node().context("div host node")?;
        assert_eq!(dom.attribute(node, "id"), Some("foo"));
        assert_eq!(dom.parent(node), None);
        assert!(dom.children(container).is_empty());
        Ok(())
    }

    #[test]
    fn components_own_no_host_node() -> Result<()> {
        let mut dom = MemoryDom::new();
        let container = dom.create_container("main")?;
        let greeting = Component::new("Greeting", |props| {
            let name = props.get("name").and_then(PropValue::to_attribute_value).unwrap_or_default();
            build("h1", [], [format!("hello {name}").into()])
        });
        let element = build(&greeting, [("name".to_owned(), PropValue::from("ada"))], []);
        let mut tree = FiberTree::new();
        let root = tree.insert(Fiber::root(container, element, None));

        let visited = labels_in_visit_order(&mut tree, &mut dom, root)?;
        assert_eq!(visited, ["#root", "Greeting", "h1", "TEXT_ELEMENT"]);

        let component = tree.child(root).context("component fiber")?;
        assert!(tree.get(component)?.host_node().is_none());
        let heading = tree.child(component).context("heading fiber")?;
        let node = tree.get(heading)?.host_node().context("heading node")?;
        let text_fiber = tree.child(heading).context("text fiber")?;
        let text_node = tree.get(text_fiber)?.host_node().context("text node")?;
        assert_eq!(dom.text_content(text_node), "hello ada");
        assert_ne!(node, text_node);
        Ok(())
    }

    #[test]
    fn traversal_stops_at_the_given_root() -> Result<()> {
        let mut dom = MemoryDom::new();
        let container = dom.create_container("main")?;
        let mut tree = FiberTree::new();
        let root = tree.insert(Fiber::root(container, text("only"), None));
        let mut deletions = Vec::new();

        let first = perform_unit_of_work(&mut tree, &mut dom, root, root, &mut deletions)?;
        let leaf = first.context("text fiber")?;
        assert_eq!(perform_unit_of_work(&mut tree, &mut dom, leaf, root, &mut deletions)?, None);
        Ok(())
    }
}
