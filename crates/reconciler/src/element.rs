//! Immutable element descriptions and the factory that builds them.

use crate::props::{PropValue, Props};
use core::fmt;
use std::sync::Arc;

/// Reserved tag of synthetic text elements.
pub const TEXT_ELEMENT: &str = "TEXT_ELEMENT";

/// Attribute that carries a text element's value.
pub const TEXT_VALUE: &str = "nodeValue";

/// Render function of a component: attributes (and children) in, one element out.
pub type RenderFn = dyn Fn(&Props) -> Element + Send + Sync;

/// A named, shared render function. Two components are the same type only when
/// they share the render function allocation.
#[derive(Clone)]
pub struct Component {
    name: Arc<str>,
    render: Arc<RenderFn>,
}

impl Component {
    pub fn new<F>(name: &str, render: F) -> Self
    where
        F: Fn(&Props) -> Element + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            render: Arc::new(render),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invoke the render function.
    #[inline]
    pub fn render(&self, props: &Props) -> Element {
        (self.render)(props)
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.render, &other.render)
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Component({})", self.name)
    }
}

/// What an element describes.
#[derive(Clone, Debug, PartialEq)]
pub enum ElementType {
    /// A host tag, mapped directly to a host element.
    Host(Arc<str>),
    /// A text node; see [`TEXT_ELEMENT`].
    Text,
    /// A component invoked during reconciliation.
    Component(Component),
}

impl ElementType {
    /// Tag used in logs: the host tag, [`TEXT_ELEMENT`], or the component name.
    pub fn label(&self) -> &str {
        match self {
            Self::Host(tag) => tag.as_ref(),
            Self::Text => TEXT_ELEMENT,
            Self::Component(component) => component.name(),
        }
    }
}

impl From<&str> for ElementType {
    fn from(tag: &str) -> Self {
        Self::Host(tag.into())
    }
}

impl From<Component> for ElementType {
    fn from(component: Component) -> Self {
        Self::Component(component)
    }
}

impl From<&Component> for ElementType {
    fn from(component: &Component) -> Self {
        Self::Component(component.clone())
    }
}

/// Immutable description of a node: a type, attributes and ordered children.
#[derive(Clone, Debug, PartialEq)]
pub struct Element {
    kind: ElementType,
    props: Props,
}

impl Element {
    #[inline]
    pub const fn kind(&self) -> &ElementType {
        &self.kind
    }

    #[inline]
    pub const fn props(&self) -> &Props {
        &self.props
    }

    #[inline]
    pub fn children(&self) -> &[Element] {
        self.props.children()
    }

    /// Value of a text element, `None` for anything else.
    pub fn text_value(&self) -> Option<&str> {
        if self.kind != ElementType::Text {
            return None;
        }
        match self.props.get(TEXT_VALUE) {
            Some(PropValue::Str(value)) => Some(value.as_str()),
            _ => None,
        }
    }
}

/// A child as given to [`build`]: an element, or a value that becomes text.
#[derive(Clone, Debug)]
pub enum Child {
    Element(Element),
    Text(String),
}

impl Child {
    fn into_element(self) -> Element {
        match self {
            Self::Element(element) => element,
            Self::Text(value) => text(value),
        }
    }
}

impl From<Element> for Child {
    fn from(element: Element) -> Self {
        Self::Element(element)
    }
}

impl From<&str> for Child {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for Child {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for Child {
    fn from(value: i64) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<i32> for Child {
    fn from(value: i32) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<f64> for Child {
    fn from(value: f64) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<bool> for Child {
    fn from(value: bool) -> Self {
        Self::Text(value.to_string())
    }
}

/// Build an element. Children that are not elements are wrapped as text elements.
pub fn build(
    kind: impl Into<ElementType>,
    attributes: impl IntoIterator<Item = (String, PropValue)>,
    children: impl IntoIterator<Item = Child>,
) -> Element {
    let children = children.into_iter().map(Child::into_element).collect();
    Element {
        kind: kind.into(),
        props: Props::new(attributes, children),
    }
}

/// Synthetic text element with a single value attribute and no children.
pub fn text(value: impl Into<String>) -> Element {
    Element {
        kind: ElementType::Text,
        props: Props::new([(TEXT_VALUE.to_owned(), PropValue::Str(value.into()))], Vec::new()),
    }
}
