use core::fmt;

use super::{DomNode, MemoryDom, NodeKind};
use indextree::NodeId;

use serde_json::{Map, Value, json};

// -----------------------
// Module-scope helpers
// -----------------------

fn sorted_attrs(node: &DomNode) -> Vec<(String, String)> {
    let mut pairs: Vec<(String, String)> = node.attrs.iter().cloned().collect();
    pairs.sort_by(|left, right| left.0.cmp(&right.0));
    pairs
}

/// JSON string literal for `raw`, quotes included, escaped like the snapshot.
fn quoted(raw: &str) -> String {
    Value::String(raw.to_owned()).to_string()
}

fn node_to_json(dom: &MemoryDom, id: NodeId) -> Value {
    let Some(node_ref) = dom.dom.get(id) else {
        return Value::Null;
    };
    let node = node_ref.get();
    let children: Vec<Value> = id
        .children(&dom.dom)
        .map(|child| node_to_json(dom, child))
        .filter(|value| !value.is_null())
        .collect();
    match &node.kind {
        NodeKind::Document => json!({ "type": "document", "children": children }),
        NodeKind::Element { tag } => {
            let mut attrs_obj = Map::new();
            for (name, value) in sorted_attrs(node) {
                attrs_obj.insert(name, Value::String(value));
            }
            json!({
                "type": "element",
                "tag": tag.to_lowercase(),
                "attrs": Value::Object(attrs_obj),
                "children": children,
            })
        }
        NodeKind::Text { text } => json!({ "type": "text", "text": text }),
    }
}

fn write_indent(f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
    for _ in 0..depth {
        f.write_str("  ")?;
    }
    Ok(())
}

fn fmt_node(dom: &MemoryDom, id: NodeId, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
    let Some(node_ref) = dom.dom.get(id) else {
        return Ok(());
    };
    let node = node_ref.get();
    match &node.kind {
        NodeKind::Document => {
            write_indent(f, depth)?;
            writeln!(f, "#document")?;
        }
        NodeKind::Element { tag } => {
            write_indent(f, depth)?;
            write!(f, "<{}", tag.to_lowercase())?;
            for (name, value) in sorted_attrs(node) {
                write!(f, " {name}={}", quoted(&value))?;
            }
            if !node.listeners.is_empty() {
                let mut events: Vec<&str> = node.listeners.iter().map(|(name, _)| name.as_str()).collect();
                events.sort_unstable();
                write!(f, " @{}", events.join(",@"))?;
            }
            writeln!(f, ">")?;
        }
        NodeKind::Text { text } => {
            write_indent(f, depth)?;
            writeln!(f, "{}", quoted(text))?;
            return Ok(());
        }
    }
    for child in id.children(&dom.dom) {
        fmt_node(dom, child, f, depth + 1)?;
    }
    if let NodeKind::Element { tag } = &node.kind {
        write_indent(f, depth)?;
        writeln!(f, "</{}>", tag.to_lowercase())?;
    }
    Ok(())
}

impl fmt::Debug for MemoryDom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_node(self, self.root, f, 0)
    }
}

impl MemoryDom {
    /// Build a deterministic JSON representation of the attached tree.
    /// Schema:
    /// - Document: { "type":"document", "children":[ ... ] }
    /// - Element: { "type":"element", "tag": "div", "attrs": {..}, "children":[ ... ] }
    /// - Text: { "type":"text", "text":"..." }
    pub fn to_json_value(&self) -> Value {
        node_to_json(self, self.root)
    }

    /// Pretty JSON string for snapshots and test comparisons.
    pub fn to_json_string(&self) -> String {
        serde_json::to_string_pretty(&self.to_json_value()).unwrap_or_else(|_| String::from("{}"))
    }

    /// Pretty-print the attached tree, the same text as the `Debug` output.
    pub fn pretty(&self) -> String {
        format!("{self:?}")
    }
}
