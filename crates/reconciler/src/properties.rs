//! Attribute and event-handler deltas for a single host node.

use crate::props::{PropValue, Props, event_name};
use anyhow::Result;
use host::{Host, NodeKey};
use log::warn;

/// Apply the difference between `prev` and `next` onto `node`, returning the
/// number of host calls issued.
///
/// Order: stale handlers are removed, vanished attributes cleared, changed
/// attributes set, then new or changed handlers registered.
pub(crate) fn update_properties<H: Host + ?Sized>(
    host: &mut H,
    node: NodeKey,
    prev: &Props,
    next: &Props,
) -> Result<usize> {
    if prev.same_as(next) {
        return Ok(0);
    }
    let mut calls = 0;

    for (key, value) in prev.events() {
        if next.get(key) == Some(value) {
            continue;
        }
        if let Some(listener) = value.as_listener() {
            host.remove_event_listener(node, &event_name(key), listener)?;
            calls += 1;
        }
    }

    for (key, _) in prev.plain() {
        if next.get(key).is_none() {
            host.remove_attribute(node, key)?;
            calls += 1;
        }
    }

    for (key, value) in next.plain() {
        if prev.get(key) == Some(value) {
            continue;
        }
        match value.to_attribute_value() {
            Some(text) => {
                host.set_attribute(node, key, &text)?;
                calls += 1;
            }
            None => warn!("Attribute {key} holds a listener but is not an event key; ignored"),
        }
    }

    for (key, value) in next.events() {
        if prev.get(key) == Some(value) {
            continue;
        }
        match value {
            PropValue::Listener(listener) => {
                host.add_event_listener(node, &event_name(key), listener)?;
                calls += 1;
            }
            PropValue::Str(_) | PropValue::Number(_) | PropValue::Bool(_) => {
                warn!("Event key {key} does not hold a listener; ignored");
            }
        }
    }

    Ok(calls)
}
