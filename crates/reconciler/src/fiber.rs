//! Fiber records and the arena that links them.
//!
//! Structure (parent/child/sibling) lives in the arena's own links; the
//! cross-generation `alternate` is a plain handle into the same arena.

use crate::element::{Element, ElementType};
use crate::props::Props;
use anyhow::{Result, anyhow};
use host::NodeKey;
use indextree::{Arena, Node, NodeId};

/// Stable handle of a fiber in a [`FiberTree`].
pub type FiberId = NodeId;

/// Mutation a fiber requires at commit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EffectTag {
    #[default]
    None,
    Placement,
    Update,
    Deletion,
}

/// Mutable unit of reconciliation work.
#[derive(Debug)]
pub struct Fiber {
    /// `None` only for a root fiber.
    pub(crate) element_type: Option<ElementType>,
    pub(crate) props: Props,
    pub(crate) host_node: Option<NodeKey>,
    pub(crate) alternate: Option<FiberId>,
    pub(crate) effect_tag: EffectTag,
}

impl Fiber {
    /// Root fiber bound to an existing host container.
    pub(crate) fn root(container: NodeKey, element: Element, alternate: Option<FiberId>) -> Self {
        Self {
            element_type: None,
            props: Props::with_children(vec![element]),
            host_node: Some(container),
            alternate,
            effect_tag: EffectTag::None,
        }
    }

    /// Brand-new fiber for an element with no previous counterpart.
    pub(crate) fn placement(element: &Element) -> Self {
        Self {
            element_type: Some(element.kind().clone()),
            props: element.props().clone(),
            host_node: None,
            alternate: None,
            effect_tag: EffectTag::Placement,
        }
    }

    /// Fiber reusing `old`'s host node for an element of the same type.
    pub(crate) fn update(element: &Element, old_id: FiberId, old: &Self) -> Self {
        Self {
            element_type: Some(element.kind().clone()),
            props: element.props().clone(),
            host_node: old.host_node,
            alternate: Some(old_id),
            effect_tag: EffectTag::Update,
        }
    }

    #[inline]
    pub const fn element_type(&self) -> Option<&ElementType> {
        self.element_type.as_ref()
    }

    #[inline]
    pub const fn props(&self) -> &Props {
        &self.props
    }

    #[inline]
    pub const fn host_node(&self) -> Option<NodeKey> {
        self.host_node
    }

    #[inline]
    pub const fn alternate(&self) -> Option<FiberId> {
        self.alternate
    }

    #[inline]
    pub const fn effect_tag(&self) -> EffectTag {
        self.effect_tag
    }

    #[inline]
    pub const fn is_root(&self) -> bool {
        self.element_type.is_none()
    }

    /// Label for logs.
    pub fn label(&self) -> &str {
        self.element_type.as_ref().map_or("#root", ElementType::label)
    }
}

/// Arena of fibers for every generation a renderer holds.
#[derive(Debug, Default)]
pub struct FiberTree {
    arena: Arena<Fiber>,
}

impl FiberTree {
    pub fn new() -> Self {
        Self { arena: Arena::new() }
    }

    pub(crate) fn insert(&mut self, fiber: Fiber) -> FiberId {
        self.arena.new_node(fiber)
    }

    /// Fiber behind a handle.
    ///
    /// # Errors
    /// Returns an error if the handle is stale.
    pub fn get(&self, id: FiberId) -> Result<&Fiber> {
        if id.is_removed(&self.arena) {
            return Err(anyhow!("Stale fiber handle {id:?}"));
        }
        self.arena
            .get(id)
            .map(Node::get)
            .ok_or_else(|| anyhow!("Stale fiber handle {id:?}"))
    }

    pub(crate) fn get_mut(&mut self, id: FiberId) -> Result<&mut Fiber> {
        if id.is_removed(&self.arena) {
            return Err(anyhow!("Stale fiber handle {id:?}"));
        }
        self.arena
            .get_mut(id)
            .map(Node::get_mut)
            .ok_or_else(|| anyhow!("Stale fiber handle {id:?}"))
    }

    #[inline]
    pub fn parent(&self, id: FiberId) -> Option<FiberId> {
        self.arena.get(id)?.parent()
    }

    #[inline]
    pub fn child(&self, id: FiberId) -> Option<FiberId> {
        self.arena.get(id)?.first_child()
    }

    #[inline]
    pub fn sibling(&self, id: FiberId) -> Option<FiberId> {
        self.arena.get(id)?.next_sibling()
    }

    /// Link `child` as the last child of `parent`.
    pub(crate) fn append_child(&mut self, parent: FiberId, child: FiberId) -> Result<()> {
        parent
            .checked_append(child, &mut self.arena)
            .map_err(|err| anyhow!("Cannot link fiber {child:?} under {parent:?}: {err}"))
    }

    /// `root` and everything below it, depth-first pre-order.
    pub fn descendants(&self, root: FiberId) -> impl Iterator<Item = FiberId> + '_ {
        root.descendants(&self.arena)
    }

    /// Release `root` and its subtree.
    pub(crate) fn release(&mut self, root: FiberId) {
        if !root.is_removed(&self.arena) {
            root.remove_subtree(&mut self.arena);
        }
    }

    /// Number of fibers not yet released.
    pub fn live_count(&self) -> usize {
        self.arena.iter().filter(|node| !node.is_removed()).count()
    }
}
