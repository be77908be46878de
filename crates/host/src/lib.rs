//! Host-platform facade consumed by the reconciler.
//! This crate centralizes the node handle, the mutation vocabulary, the host
//! operations a renderer is allowed to perform, and the mirror pattern used to
//! replay committed mutation batches into other subscribers.

use anyhow::Result;
use core::fmt;
use std::sync::Arc;
use tokio::sync::broadcast;

/// In-memory DOM implementing [`Host`], used by tests, benches and the demo.
pub mod dom;
pub use dom::{DomNode, MemoryDom, NodeKind};

// ============================
// Stable Node keys
// ============================

/// A 64-bit stable key for host nodes, shared between the renderer and the host.
///
/// Documents mint keys from a counter whose high 16 bits hold the document's
/// epoch, see [`MemoryDom::with_epoch`].
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, PartialOrd, Ord)]
pub struct NodeKey(pub u64);

impl NodeKey {
    /// The document root key (always present).
    pub const ROOT: Self = Self(0);
}

impl Default for NodeKey {
    fn default() -> Self {
        Self::ROOT
    }
}

// ============================
// Event listeners
// ============================

/// An event delivered to a listener by the host.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostEvent {
    /// Node the event was dispatched on.
    pub target: NodeKey,
    /// Lower-case event name, e.g. `click`.
    pub name: String,
}

/// Shared event handler. Two listeners are equal only when they are the same
/// allocation, which is what registering and unregistering on a host relies on.
#[derive(Clone)]
pub struct Listener(Arc<dyn Fn(&HostEvent) + Send + Sync>);

impl Listener {
    /// Wrap a closure as a listener.
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&HostEvent) + Send + Sync + 'static,
    {
        Self(Arc::new(handler))
    }

    /// Invoke the handler.
    #[inline]
    pub fn call(&self, event: &HostEvent) { (self.0)(event); }
}

impl PartialEq for Listener {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Listener({:p})", Arc::as_ptr(&self.0).cast::<()>())
    }
}

// ============================
// Host operations
// ============================

/// The operations a renderer may perform on the persistent host tree.
///
/// Every operation is fallible; failures propagate to the caller unchanged.
pub trait Host {
    /// Create a detached element node for `tag`.
    fn create_element(&mut self, tag: &str) -> Result<NodeKey>;
    /// Create a detached text node holding `text`.
    fn create_text(&mut self, text: &str) -> Result<NodeKey>;
    /// Set (or overwrite) a plain attribute.
    fn set_attribute(&mut self, node: NodeKey, name: &str, value: &str) -> Result<()>;
    /// Remove a plain attribute.
    fn remove_attribute(&mut self, node: NodeKey, name: &str) -> Result<()>;
    /// Register `listener` for `event` on `node`.
    fn add_event_listener(&mut self, node: NodeKey, event: &str, listener: &Listener) -> Result<()>;
    /// Unregister a listener previously registered for `event` on `node`.
    fn remove_event_listener(&mut self, node: NodeKey, event: &str, listener: &Listener) -> Result<()>;
    /// Append `child` as the last child of `parent`.
    fn append_child(&mut self, parent: NodeKey, child: NodeKey) -> Result<()>;
    /// Detach `child` from `parent`.
    fn remove_child(&mut self, parent: NodeKey, child: NodeKey) -> Result<()>;
    /// Marks the end of one atomic batch of mutations.
    fn commit_finished(&mut self) -> Result<()> {
        Ok(())
    }
}

// ============================
// Mutation model + mirror pattern
// ============================

/// A recorded host mutation; one variant per [`Host`] operation.
#[derive(Debug, Clone, PartialEq)]
pub enum HostMutation {
    CreateElement { node: NodeKey, tag: String },
    CreateText { node: NodeKey, text: String },
    SetAttribute { node: NodeKey, name: String, value: String },
    RemoveAttribute { node: NodeKey, name: String },
    AddEventListener { node: NodeKey, event: String, listener: Listener },
    RemoveEventListener { node: NodeKey, event: String, listener: Listener },
    AppendChild { parent: NodeKey, child: NodeKey },
    RemoveChild { parent: NodeKey, child: NodeKey },
}

impl HostMutation {
    /// True for attribute sets and removals.
    #[inline]
    pub const fn is_attribute(&self) -> bool {
        matches!(self, Self::SetAttribute { .. } | Self::RemoveAttribute { .. })
    }
    /// True for listener registrations and removals.
    #[inline]
    pub const fn is_listener(&self) -> bool {
        matches!(self, Self::AddEventListener { .. } | Self::RemoveEventListener { .. })
    }
    /// True for node creation.
    #[inline]
    pub const fn is_creation(&self) -> bool {
        matches!(self, Self::CreateElement { .. } | Self::CreateText { .. })
    }
}

/// A subscriber that receives HostMutation values and mirrors them into its own state.
pub trait HostSubscriber {
    /// Apply a single HostMutation to the subscriber state.
    fn apply_update(&mut self, update: HostMutation) -> Result<()>;
}

/// Generic mirror that applies committed mutation batches to a subscriber.
pub struct HostMirror<T: HostSubscriber> {
    in_updater: broadcast::Receiver<Vec<HostMutation>>,
    mirror: T,
}

impl<T: HostSubscriber> HostMirror<T> {
    /// Create a new HostMirror wrapping a subscriber implementation.
    pub const fn new(in_updater: broadcast::Receiver<Vec<HostMutation>>, mirror: T) -> Self { Self { in_updater, mirror } }
    /// Wait for the next batch and apply it. Returns false once the sender is gone.
    ///
    /// # Errors
    /// Returns an error if the subscriber rejects a mutation or the mirror lagged
    /// behind and lost batches.
    pub async fn update(&mut self) -> Result<bool> {
        use tokio::sync::broadcast::error::RecvError;
        match self.in_updater.recv().await {
            Ok(batch) => {
                for update in batch { self.mirror.apply_update(update)?; }
                Ok(true)
            }
            Err(RecvError::Closed) => Ok(false),
            Err(RecvError::Lagged(missed)) => Err(anyhow::anyhow!("Host mirror lagged, {missed} batches lost")),
        }
    }
    /// Synchronous, non-async variant for draining pending batches.
    ///
    /// # Errors
    /// Returns an error if the subscriber rejects a mutation or batches were lost.
    pub fn try_update_sync(&mut self) -> Result<usize> {
        use tokio::sync::broadcast::error::TryRecvError;
        let mut applied = 0;
        loop {
            match self.in_updater.try_recv() {
                Ok(batch) => {
                    applied += batch.len();
                    for update in batch { self.mirror.apply_update(update)?; }
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
                Err(TryRecvError::Lagged(missed)) => {
                    return Err(anyhow::anyhow!("Host mirror lagged, {missed} batches lost"));
                }
            }
        }
        Ok(applied)
    }
    /// Access the inner mirror mutably
    pub fn mirror_mut(&mut self) -> &mut T { &mut self.mirror }
    /// Access the inner mirror immutably
    pub const fn mirror(&self) -> &T { &self.mirror }
    /// Unwrap the subscriber.
    pub fn into_inner(self) -> T { self.mirror }
}
