//! Positional diff of a fiber's new child elements against its previous generation.
//!
//! Children are matched strictly by index and type; there is no keyed matching,
//! so reordering a list produces Placement/Deletion pairs instead of reuse.

use crate::element::Element;
use crate::fiber::{EffectTag, Fiber, FiberId, FiberTree};
use anyhow::Result;
use log::trace;

/// Build `parent`'s new child chain from `elements`, tagging each new fiber and
/// appending old fibers without a counterpart to `deletions`.
pub(crate) fn reconcile_children(
    tree: &mut FiberTree,
    parent: FiberId,
    elements: &[Element],
    deletions: &mut Vec<FiberId>,
) -> Result<()> {
    let mut old_fiber = tree.get(parent)?.alternate.and_then(|alternate| tree.child(alternate));
    let mut index = 0;

    while index < elements.len() || old_fiber.is_some() {
        let element = elements.get(index);

        let same_type = match (old_fiber, element) {
            (Some(old), Some(element)) => tree.get(old)?.element_type.as_ref() == Some(element.kind()),
            _ => false,
        };

        let new_fiber = if same_type {
            match (old_fiber, element) {
                (Some(old), Some(element)) => {
                    let fiber = Fiber::update(element, old, tree.get(old)?);
                    Some(tree.insert(fiber))
                }
                _ => None,
            }
        } else {
            if let Some(old) = old_fiber {
                tree.get_mut(old)?.effect_tag = EffectTag::Deletion;
                trace!("reconcile: deleting {}", tree.get(old)?.label());
                deletions.push(old);
            }
            element.map(|element| tree.insert(Fiber::placement(element)))
        };

        if let Some(fiber) = new_fiber {
            tree.append_child(parent, fiber)?;
        }

        old_fiber = old_fiber.and_then(|old| tree.sibling(old));
        index += 1;
    }
    Ok(())
}
