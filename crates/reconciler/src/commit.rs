//! Applying a finished work-in-progress tree to the host in one pass.

use crate::fiber::{EffectTag, FiberId, FiberTree};
use crate::properties::update_properties;
use anyhow::{Context as _, Result, anyhow};
use host::{Host, NodeKey};
use log::{debug, trace};

/// Counters for one commit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CommitStats {
    /// Fibers of the new tree visited, root excluded.
    pub fibers: usize,
    pub placements: usize,
    pub updates: usize,
    pub deletions: usize,
    /// Host calls issued, attribute and listener deltas included.
    pub host_calls: usize,
    /// Units of work and slices spent building the tree; filled in by the renderer.
    pub units: usize,
    pub slices: usize,
}

/// Commit the tree under `root`: deletions first, then placements and updates
/// in depth-first order. Never yields.
pub(crate) fn commit_root<H: Host + ?Sized>(
    tree: &FiberTree,
    host: &mut H,
    root: FiberId,
    deletions: &[FiberId],
) -> Result<CommitStats> {
    let mut stats = CommitStats::default();

    for &deleted in deletions {
        if commit_deletion(tree, host, deleted)? {
            stats.host_calls += 1;
        }
        stats.deletions += 1;
    }

    let mut stack: Vec<FiberId> = tree.child(root).into_iter().collect();
    while let Some(id) = stack.pop() {
        if let Some(sibling) = tree.sibling(id) {
            stack.push(sibling);
        }
        if let Some(child) = tree.child(id) {
            stack.push(child);
        }

        let fiber = tree.get(id)?;
        stats.fibers += 1;
        match fiber.effect_tag {
            EffectTag::Placement => {
                stats.placements += 1;
                if let Some(node) = fiber.host_node {
                    let parent = host_parent(tree, id)?;
                    trace!("commit: append {} {node:?} to {parent:?}", fiber.label());
                    host.append_child(parent, node)?;
                    stats.host_calls += 1;
                }
            }
            EffectTag::Update => {
                stats.updates += 1;
                if let Some(node) = fiber.host_node {
                    let previous = fiber
                        .alternate
                        .ok_or_else(|| anyhow!("Updated fiber {} has no previous generation", fiber.label()))?;
                    let prev_props = &tree.get(previous)?.props;
                    stats.host_calls += update_properties(host, node, prev_props, &fiber.props)
                        .with_context(|| format!("updating {}", fiber.label()))?;
                }
            }
            EffectTag::Deletion | EffectTag::None => {}
        }
    }

    host.commit_finished()?;
    debug!(
        "commit: {} fibers, {} placements, {} updates, {} deletions, {} host calls",
        stats.fibers, stats.placements, stats.updates, stats.deletions, stats.host_calls
    );
    Ok(stats)
}

/// Remove the host node owned by `deleted`, or by its first host-owning
/// descendant when `deleted` is a component. Returns whether a node was removed.
fn commit_deletion<H: Host + ?Sized>(tree: &FiberTree, host: &mut H, deleted: FiberId) -> Result<bool> {
    let mut owner = Some(deleted);
    while let Some(id) = owner {
        if let Some(node) = tree.get(id)?.host_node {
            let parent = host_parent(tree, id)?;
            trace!("commit: remove {node:?} from {parent:?}");
            host.remove_child(parent, node)?;
            return Ok(true);
        }
        owner = tree.child(id);
    }
    debug!("commit: deleted fiber {} owns no host node", tree.get(deleted)?.label());
    Ok(false)
}

/// Host node of the nearest ancestor that owns one.
fn host_parent(tree: &FiberTree, id: FiberId) -> Result<NodeKey> {
    let mut ancestor = tree.parent(id);
    while let Some(parent) = ancestor {
        if let Some(node) = tree.get(parent)?.host_node {
            return Ok(node);
        }
        ancestor = tree.parent(parent);
    }
    Err(anyhow!("Fiber {id:?} has no ancestor with a host node"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Element, build};
    use crate::fiber::Fiber;
    use crate::work::perform_unit_of_work;
    use host::{HostMutation, MemoryDom};

    fn build_tree(
        tree: &mut FiberTree,
        dom: &mut MemoryDom,
        container: NodeKey,
        element: Element,
        alternate: Option<FiberId>,
    ) -> Result<(FiberId, Vec<FiberId>)> {
        let root = tree.insert(Fiber::root(container, element, alternate));
        let mut deletions = Vec::new();
        let mut cursor = Some(root);
        while let Some(fiber) = cursor {
            cursor = perform_unit_of_work(tree, dom, fiber, root, &mut deletions)?;
        }
        Ok((root, deletions))
    }

    #[test]
    fn first_commit_attaches_everything() -> Result<()> {
        let mut dom = MemoryDom::new();
        let container = dom.create_container("main")?;
        let mut tree = FiberTree::new();
        let element = build("ul", [], [build("li", [], ["one".into()]).into(), build("li", [], []).into()]);
        let (root, deletions) = build_tree(&mut tree, &mut dom, container, element, None)?;

        let stats = commit_root(&tree, &mut dom, root, &deletions)?;
        assert_eq!(stats.placements, 4);
        assert_eq!(stats.fibers, 4);
        assert_eq!(stats.deletions, 0);
        assert_eq!(dom.text_content(container), "one");
        assert_eq!(dom.children(container).len(), 1);
        Ok(())
    }

    #[test]
    fn deletions_run_before_placements() -> Result<()> {
        let mut dom = MemoryDom::new();
        let container = dom.create_container("main")?;
        let mut tree = FiberTree::new();
        let (first, none) = build_tree(&mut tree, &mut dom, container, build("a", [], []), None)?;
        commit_root(&tree, &mut dom, first, &none)?;
        dom.clear_mutations();

        let (second, deletions) = build_tree(&mut tree, &mut dom, container, build("b", [], []), Some(first))?;
        assert_eq!(deletions.len(), 1);
        let stats = commit_root(&tree, &mut dom, second, &deletions)?;
        assert_eq!((stats.placements, stats.deletions), (1, 1));

        let structural: Vec<&HostMutation> = dom
            .mutations()
            .iter()
            .filter(|mutation| matches!(mutation, HostMutation::AppendChild { .. } | HostMutation::RemoveChild { .. }))
            .collect();
        assert!(matches!(structural[0], HostMutation::RemoveChild { .. }));
        assert!(matches!(structural[1], HostMutation::AppendChild { .. }));
        assert_eq!(dom.children(container).len(), 1);
        Ok(())
    }

    #[test]
    fn deleting_a_component_removes_its_rendered_node() -> Result<()> {
        use crate::element::Component;

        let mut dom = MemoryDom::new();
        let container = dom.create_container("main")?;
        let badge = Component::new("Badge", |_props| build("span", [], ["!".into()]));
        let mut tree = FiberTree::new();
        let first_element = build("div", [], [build(&badge, [], []).into()]);
        let (first, none) = build_tree(&mut tree, &mut dom, container, first_element, None)?;
        commit_root(&tree, &mut dom, first, &none)?;
        assert_eq!(dom.text_content(container), "!");

        let (second, deletions) = build_tree(&mut tree, &mut dom, container, build("div", [], []), Some(first))?;
        commit_root(&tree, &mut dom, second, &deletions)?;
        assert_eq!(dom.text_content(container), "");
        Ok(())
    }
}
