//! Attribute values and the attribute/children bundle carried by elements and fibers.

use crate::element::Element;
use core::{fmt, iter};
use host::Listener;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Key reserved for child descriptions; never treated as an attribute.
pub const CHILDREN_KEY: &str = "children";

/// Prefix marking an attribute as an event handler (`onClick` -> `click`).
pub const EVENT_PREFIX: &str = "on";

/// True when `key` names an event handler.
#[inline]
#[must_use]
pub fn is_event(key: &str) -> bool {
    key.starts_with(EVENT_PREFIX)
}

/// True when `key` names a plain attribute.
#[inline]
#[must_use]
pub fn is_attribute(key: &str) -> bool {
    key != CHILDREN_KEY && !is_event(key)
}

/// Host event name for an event key: the lower-cased remainder after the prefix.
#[inline]
#[must_use]
pub fn event_name(key: &str) -> String {
    key.strip_prefix(EVENT_PREFIX).unwrap_or(key).to_lowercase()
}

/// Value of a single attribute.
#[derive(Clone, Debug)]
pub enum PropValue {
    Str(String),
    Number(f64),
    Bool(bool),
    Listener(Listener),
}

impl PropValue {
    /// String form handed to the host for plain attributes; `None` for listeners.
    #[must_use]
    pub fn to_attribute_value(&self) -> Option<String> {
        match self {
            Self::Str(value) => Some(value.clone()),
            Self::Number(value) => Some(value.to_string()),
            Self::Bool(value) => Some(value.to_string()),
            Self::Listener(_) => None,
        }
    }

    /// The listener, if this value is one.
    #[inline]
    #[must_use]
    pub const fn as_listener(&self) -> Option<&Listener> {
        match self {
            Self::Listener(listener) => Some(listener),
            Self::Str(_) | Self::Number(_) | Self::Bool(_) => None,
        }
    }
}

/// Numbers compare by bit pattern, so `NaN` equals itself and `-0.0` differs
/// from `0.0`, matching the strings handed to the host.
impl PartialEq for PropValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Str(left), Self::Str(right)) => left == right,
            (Self::Number(left), Self::Number(right)) => left.to_bits() == right.to_bits(),
            (Self::Bool(left), Self::Bool(right)) => left == right,
            (Self::Listener(left), Self::Listener(right)) => left == right,
            (Self::Str(_) | Self::Number(_) | Self::Bool(_) | Self::Listener(_), _) => false,
        }
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for PropValue {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Listener> for PropValue {
    fn from(value: Listener) -> Self {
        Self::Listener(value)
    }
}

/// Ordered attributes plus materialized children. Cheap to clone.
#[derive(Clone, PartialEq)]
pub struct Props {
    attributes: Arc<BTreeMap<String, PropValue>>,
    children: Arc<[Element]>,
}

impl Props {
    /// Build props, dropping any attribute that uses the reserved children key.
    pub fn new(attributes: impl IntoIterator<Item = (String, PropValue)>, children: Vec<Element>) -> Self {
        let attributes = attributes
            .into_iter()
            .filter(|(key, _)| key != CHILDREN_KEY)
            .collect();
        Self {
            attributes: Arc::new(attributes),
            children: children.into(),
        }
    }

    /// Props with no attributes and the given children.
    #[must_use]
    pub fn with_children(children: Vec<Element>) -> Self {
        Self::new(iter::empty(), children)
    }

    /// Props with nothing in them; the "previous" side when a host node is new.
    #[must_use]
    pub fn empty() -> Self {
        Self::with_children(Vec::new())
    }

    #[inline]
    pub fn get(&self, key: &str) -> Option<&PropValue> {
        self.attributes.get(key)
    }

    /// Attributes in key order, events included.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.attributes.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Event-handler attributes in key order.
    pub fn events(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.attributes().filter(|(key, _)| is_event(key))
    }

    /// Plain attributes in key order.
    pub fn plain(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.attributes().filter(|(key, _)| is_attribute(key))
    }

    #[inline]
    pub fn children(&self) -> &[Element] {
        &self.children
    }

    /// True when both sides share storage or compare equal.
    #[must_use]
    pub fn same_as(&self, other: &Self) -> bool {
        (Arc::ptr_eq(&self.attributes, &other.attributes) && Arc::ptr_eq(&self.children, &other.children))
            || self == other
    }
}

impl Default for Props {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for Props {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Props")
            .field("attributes", &self.attributes)
            .field("children", &self.children.len())
            .finish()
    }
}
