use crate::{Host, HostEvent, HostMutation, HostSubscriber, Listener, NodeKey};
use anyhow::{Result, anyhow, bail};
use core::mem;
use indextree::{Arena, Node, NodeId};
use log::{debug, trace};
use smallvec::SmallVec;
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::broadcast;

mod printing;

/// Attribute name that a text node maps onto its content.
pub const TEXT_VALUE_ATTRIBUTE: &str = "nodeValue";

/// Capacity of the commit broadcast channel.
const BATCH_CHANNEL_CAPACITY: usize = 64;

/// Minted keys keep the epoch above this bit.
const EPOCH_SHIFT: u32 = 48;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum NodeKind {
    #[default]
    Document,
    Element { tag: String },
    Text { text: String },
}

#[derive(Debug, Clone, Default)]
pub struct DomNode {
    pub key: NodeKey,
    pub kind: NodeKind,
    pub attrs: SmallVec<(String, String), 4>,
    pub listeners: Vec<(String, Listener)>,
}

/// An in-memory document that implements [`Host`].
///
/// Every mutation is recorded in an inspectable log. Mutations issued between two
/// [`Host::commit_finished`] calls form one batch, published to subscribers.
pub struct MemoryDom {
    dom: Arena<DomNode>,
    root: NodeId,
    nodes: HashMap<NodeKey, NodeId>,
    next_key: u64,
    log: Vec<HostMutation>,
    pending: Vec<HostMutation>,
    update_sender: Option<broadcast::Sender<Vec<HostMutation>>>,
}

impl MemoryDom {
    /// Create a document whose keys carry a time-derived epoch.
    pub fn new() -> Self {
        let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
        Self::with_epoch((((now.as_secs() as u32) ^ now.subsec_nanos()) & 0xFFFF) as u16)
    }

    /// Create a document with a fixed key epoch; two documents created with the
    /// same epoch mint identical keys for identical mutation sequences.
    pub fn with_epoch(epoch: u16) -> Self {
        let mut dom = Arena::new();
        let root = dom.new_node(DomNode::default());
        let mut nodes = HashMap::new();
        nodes.insert(NodeKey::ROOT, root);
        Self {
            dom,
            root,
            nodes,
            next_key: (u64::from(epoch) << EPOCH_SHIFT) | 1,
            log: Vec::new(),
            pending: Vec::new(),
            update_sender: None,
        }
    }

    /// Key of the document node.
    #[inline]
    pub const fn root_key(&self) -> NodeKey {
        NodeKey::ROOT
    }

    /// Create an element and attach it under the document, returning a container
    /// suitable as a render target.
    ///
    /// # Errors
    /// Never fails for a live document; errors mirror [`Host::append_child`].
    pub fn create_container(&mut self, tag: &str) -> Result<NodeKey> {
        let container = self.create_element(tag)?;
        self.append_child(NodeKey::ROOT, container)?;
        Ok(container)
    }

    /// Subscribe to committed mutation batches.
    pub fn subscribe(&mut self) -> broadcast::Receiver<Vec<HostMutation>> {
        self.update_sender
            .get_or_insert_with(|| broadcast::channel(BATCH_CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// All mutations recorded so far, oldest first.
    #[inline]
    pub fn mutations(&self) -> &[HostMutation] {
        &self.log
    }

    /// Take the recorded mutations, leaving the log empty.
    pub fn take_mutations(&mut self) -> Vec<HostMutation> {
        mem::take(&mut self.log)
    }

    /// Drop the recorded mutations.
    pub fn clear_mutations(&mut self) {
        self.log.clear();
    }

    /// Number of nodes currently alive, including detached ones and the document.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Look up a node by key.
    pub fn node(&self, key: NodeKey) -> Option<&DomNode> {
        let id = *self.nodes.get(&key)?;
        self.dom.get(id).map(Node::get)
    }

    /// Parent of a node, if attached.
    pub fn parent(&self, key: NodeKey) -> Option<NodeKey> {
        let id = *self.nodes.get(&key)?;
        let parent = self.dom.get(id)?.parent()?;
        self.dom.get(parent).map(|node| node.get().key)
    }

    /// Children of a node in document order.
    pub fn children(&self, key: NodeKey) -> Vec<NodeKey> {
        self.nodes.get(&key).map_or_else(Vec::new, |id| {
            id.children(&self.dom)
                .filter_map(|child| self.dom.get(child))
                .map(|node| node.get().key)
                .collect()
        })
    }

    /// Value of a plain attribute.
    pub fn attribute(&self, key: NodeKey, name: &str) -> Option<&str> {
        self.node(key)?
            .attrs
            .iter()
            .find(|(attr, _)| attr == name)
            .map(|(_, value)| value.as_str())
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self, key: NodeKey) -> String {
        let Some(id) = self.nodes.get(&key) else {
            return String::new();
        };
        id.descendants(&self.dom)
            .filter_map(|node| self.dom.get(node))
            .filter_map(|node| match &node.get().kind {
                NodeKind::Text { text } => Some(text.as_str()),
                NodeKind::Document | NodeKind::Element { .. } => None,
            })
            .collect()
    }

    /// Number of listeners registered for `event` on a node.
    pub fn listener_count(&self, key: NodeKey, event: &str) -> usize {
        self.node(key).map_or(0, |node| {
            node.listeners.iter().filter(|(name, _)| name == event).count()
        })
    }

    /// Invoke every listener registered for `event` on `target`, returning how many ran.
    ///
    /// # Errors
    /// Returns an error if `target` is unknown.
    pub fn dispatch(&self, target: NodeKey, event: &str) -> Result<usize> {
        let node = self.node(target).ok_or_else(|| anyhow!("Unknown node {target:?}"))?;
        let payload = HostEvent { target, name: event.to_owned() };
        let mut invoked = 0;
        for (_, listener) in node.listeners.iter().filter(|(name, _)| name == event) {
            listener.call(&payload);
            invoked += 1;
        }
        Ok(invoked)
    }

    fn id_of(&self, key: NodeKey) -> Result<NodeId> {
        self.nodes.get(&key).copied().ok_or_else(|| anyhow!("Unknown node {key:?}"))
    }

    fn node_mut(&mut self, key: NodeKey) -> Result<&mut DomNode> {
        let id = self.id_of(key)?;
        self.dom
            .get_mut(id)
            .map(Node::get_mut)
            .ok_or_else(|| anyhow!("Node {key:?} was removed from the arena"))
    }

    fn record(&mut self, mutation: HostMutation) {
        trace!("MemoryDom: {mutation:?}");
        self.pending.push(mutation.clone());
        self.log.push(mutation);
    }

    fn insert_node(&mut self, key: Option<NodeKey>, kind: NodeKind) -> Result<NodeKey> {
        if let Some(existing) = key
            && self.nodes.contains_key(&existing)
        {
            bail!("Node {existing:?} already exists");
        }
        let id = self.dom.new_node(DomNode { key: NodeKey::ROOT, kind, ..DomNode::default() });
        let key = key.unwrap_or_else(|| {
            let minted = NodeKey(self.next_key);
            self.next_key = self.next_key.wrapping_add(1);
            minted
        });
        if let Some(node) = self.dom.get_mut(id) {
            node.get_mut().key = key;
        }
        self.nodes.insert(key, id);
        Ok(key)
    }

    fn create_element_with_key(&mut self, key: Option<NodeKey>, tag: &str) -> Result<NodeKey> {
        let node = self.insert_node(key, NodeKind::Element { tag: tag.to_owned() })?;
        self.record(HostMutation::CreateElement { node, tag: tag.to_owned() });
        Ok(node)
    }

    fn create_text_with_key(&mut self, key: Option<NodeKey>, text: &str) -> Result<NodeKey> {
        let node = self.insert_node(key, NodeKind::Text { text: text.to_owned() })?;
        self.record(HostMutation::CreateText { node, text: text.to_owned() });
        Ok(node)
    }
}

impl Default for MemoryDom {
    fn default() -> Self {
        Self::new()
    }
}

impl Host for MemoryDom {
    fn create_element(&mut self, tag: &str) -> Result<NodeKey> {
        self.create_element_with_key(None, tag)
    }

    fn create_text(&mut self, text: &str) -> Result<NodeKey> {
        self.create_text_with_key(None, text)
    }

    fn set_attribute(&mut self, node: NodeKey, name: &str, value: &str) -> Result<()> {
        let target = self.node_mut(node)?;
        match &mut target.kind {
            NodeKind::Text { text } => {
                if name != TEXT_VALUE_ATTRIBUTE {
                    bail!("Text node {node:?} has no attribute {name}");
                }
                value.clone_into(text);
            }
            NodeKind::Element { .. } => {
                if let Some(slot) = target.attrs.iter_mut().find(|(attr, _)| attr == name) {
                    value.clone_into(&mut slot.1);
                } else {
                    target.attrs.push((name.to_owned(), value.to_owned()));
                }
            }
            NodeKind::Document => bail!("Cannot set attribute {name} on the document"),
        }
        self.record(HostMutation::SetAttribute { node, name: name.to_owned(), value: value.to_owned() });
        Ok(())
    }

    fn remove_attribute(&mut self, node: NodeKey, name: &str) -> Result<()> {
        let target = self.node_mut(node)?;
        target.attrs.retain(|(attr, _)| attr != name);
        self.record(HostMutation::RemoveAttribute { node, name: name.to_owned() });
        Ok(())
    }

    fn add_event_listener(&mut self, node: NodeKey, event: &str, listener: &Listener) -> Result<()> {
        let target = self.node_mut(node)?;
        let duplicate = target.listeners.iter().any(|(name, existing)| name == event && existing == listener);
        if !duplicate {
            target.listeners.push((event.to_owned(), listener.clone()));
        }
        self.record(HostMutation::AddEventListener { node, event: event.to_owned(), listener: listener.clone() });
        Ok(())
    }

    fn remove_event_listener(&mut self, node: NodeKey, event: &str, listener: &Listener) -> Result<()> {
        let target = self.node_mut(node)?;
        target.listeners.retain(|(name, existing)| !(name == event && existing == listener));
        self.record(HostMutation::RemoveEventListener { node, event: event.to_owned(), listener: listener.clone() });
        Ok(())
    }

    fn append_child(&mut self, parent: NodeKey, child: NodeKey) -> Result<()> {
        let parent_id = self.id_of(parent)?;
        let child_id = self.id_of(child)?;
        if matches!(self.dom.get(parent_id).map(|node| &node.get().kind), Some(NodeKind::Text { .. })) {
            bail!("Cannot append {child:?} to text node {parent:?}");
        }
        // Appending an attached node moves it, as in a browser DOM.
        child_id.detach(&mut self.dom);
        parent_id
            .checked_append(child_id, &mut self.dom)
            .map_err(|err| anyhow!("Cannot append {child:?} to {parent:?}: {err}"))?;
        self.record(HostMutation::AppendChild { parent, child });
        Ok(())
    }

    fn remove_child(&mut self, parent: NodeKey, child: NodeKey) -> Result<()> {
        let parent_id = self.id_of(parent)?;
        let child_id = self.id_of(child)?;
        let actual = self.dom.get(child_id).and_then(Node::parent);
        if actual != Some(parent_id) {
            bail!("Node {child:?} is not a child of {parent:?}");
        }
        child_id.detach(&mut self.dom);
        self.record(HostMutation::RemoveChild { parent, child });
        Ok(())
    }

    fn commit_finished(&mut self) -> Result<()> {
        let batch = mem::take(&mut self.pending);
        if batch.is_empty() {
            return Ok(());
        }
        if let Some(sender) = &self.update_sender
            && let Err(err) = sender.send(batch)
        {
            debug!("MemoryDom: no live subscribers for batch ({} mutations)", err.0.len());
        }
        Ok(())
    }
}

impl HostSubscriber for MemoryDom {
    /// Replays a mutation produced by another document, keeping its keys.
    fn apply_update(&mut self, update: HostMutation) -> Result<()> {
        match update {
            HostMutation::CreateElement { node, tag } => {
                self.create_element_with_key(Some(node), &tag)?;
            }
            HostMutation::CreateText { node, text } => {
                self.create_text_with_key(Some(node), &text)?;
            }
            HostMutation::SetAttribute { node, name, value } => self.set_attribute(node, &name, &value)?,
            HostMutation::RemoveAttribute { node, name } => self.remove_attribute(node, &name)?,
            HostMutation::AddEventListener { node, event, listener } => {
                self.add_event_listener(node, &event, &listener)?;
            }
            HostMutation::RemoveEventListener { node, event, listener } => {
                self.remove_event_listener(node, &event, &listener)?;
            }
            HostMutation::AppendChild { parent, child } => self.append_child(parent, child)?,
            HostMutation::RemoveChild { parent, child } => self.remove_child(parent, child)?,
        }
        Ok(())
    }
}
