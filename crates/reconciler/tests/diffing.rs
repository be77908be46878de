//! Observable diffing behaviour across two generations, checked against the
//! mutation log of an in-memory document.

use anyhow::{Result, anyhow};
use host::{HostMutation, Listener, MemoryDom, NodeKey};
use reconciler::{Component, EffectTag, Element, PropValue, Renderer, element};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn init_logger() {
        let _ = env_logger::builder()
            .filter_level(log::LevelFilter::Debug)
            .is_test(true)
            .try_init();
    }

    fn renderer() -> Result<(Renderer<MemoryDom>, NodeKey)> {
        init_logger();
        let mut dom = MemoryDom::new();
        let container = dom.create_container("main")?;
        Ok((Renderer::new(dom), container))
    }

    /// Host node of the committed fiber reached by following child indices from the root.
    fn committed_node(renderer: &Renderer<MemoryDom>, path: &[usize]) -> Result<NodeKey> {
        let fibers = renderer.fibers();
        let mut fiber = renderer.current_root().ok_or_else(|| anyhow!("nothing committed"))?;
        for &index in path {
            let mut child = fibers.child(fiber).ok_or_else(|| anyhow!("no children at {path:?}"))?;
            for _ in 0..index {
                child = fibers.sibling(child).ok_or_else(|| anyhow!("no child {index} at {path:?}"))?;
            }
            fiber = child;
        }
        fibers.get(fiber)?.host_node().ok_or_else(|| anyhow!("fiber at {path:?} owns no host node"))
    }

    fn commit(renderer: &mut Renderer<MemoryDom>, element: Element, container: NodeKey) -> Result<reconciler::CommitStats> {
        renderer.host_mut().clear_mutations();
        renderer.render(element, container);
        renderer.flush()?.ok_or_else(|| anyhow!("render did not commit"))
    }

    #[test]
    fn rendering_the_same_tree_twice_is_all_updates_and_no_host_calls() -> Result<()> {
        let (mut renderer, container) = renderer()?;
        let handler = Listener::new(|_| {});
        let tree = element!("div", { id: "foo", onClick: handler }, [
            element!("a", ["bar"]),
            element!("b"),
        ]);

        let first = commit(&mut renderer, tree.clone(), container)?;
        assert_eq!(first.placements, 4);

        let second = commit(&mut renderer, tree, container)?;
        assert_eq!(second.updates, second.fibers);
        assert_eq!((second.placements, second.deletions, second.host_calls), (0, 0, 0));
        assert!(renderer.host().mutations().is_empty());

        let root = renderer.current_root().ok_or_else(|| anyhow!("nothing committed"))?;
        for id in renderer.fibers().descendants(root).skip(1) {
            assert_eq!(renderer.fibers().get(id)?.effect_tag(), EffectTag::Update);
        }
        Ok(())
    }

    #[test]
    fn rebuilt_tree_with_nan_attribute_issues_no_host_calls() -> Result<()> {
        let (mut renderer, container) = renderer()?;
        let build_tree = || element!("meter", { value: f64::NAN, low: -0.0 }, ["?"]);

        commit(&mut renderer, build_tree(), container)?;
        let second = commit(&mut renderer, build_tree(), container)?;
        assert_eq!(second.host_calls, 0);
        assert!(renderer.host().mutations().is_empty());
        Ok(())
    }

    #[test]
    fn unchanged_types_keep_their_host_nodes() -> Result<()> {
        let (mut renderer, container) = renderer()?;
        commit(&mut renderer, element!("section", { class: "a" }, [element!("p", ["one"])]), container)?;
        let section = committed_node(&renderer, &[0])?;
        let paragraph = committed_node(&renderer, &[0, 0])?;

        commit(&mut renderer, element!("section", { class: "b" }, [element!("p", ["two"])]), container)?;
        assert_eq!(committed_node(&renderer, &[0])?, section);
        assert_eq!(committed_node(&renderer, &[0, 0])?, paragraph);
        assert_eq!(renderer.host().attribute(section, "class"), Some("b"));
        assert_eq!(renderer.host().text_content(container), "two");
        assert!(!renderer.host().mutations().iter().any(HostMutation::is_creation));
        Ok(())
    }

    #[test]
    fn changed_type_replaces_the_node_deletions_first() -> Result<()> {
        let (mut renderer, container) = renderer()?;
        commit(&mut renderer, element!("div", [element!("a", ["x"])]), container)?;
        let old = committed_node(&renderer, &[0, 0])?;

        let stats = commit(&mut renderer, element!("div", [element!("b", ["x"])]), container)?;
        assert_eq!((stats.placements, stats.deletions), (2, 1));
        let replacement = committed_node(&renderer, &[0, 0])?;
        let div = committed_node(&renderer, &[0])?;

        let log = renderer.host().mutations();
        let removed = log
            .iter()
            .position(|mutation| matches!(mutation, HostMutation::RemoveChild { child, .. } if *child == old))
            .ok_or_else(|| anyhow!("old node was not removed"))?;
        let attached = log
            .iter()
            .position(|mutation| matches!(mutation, HostMutation::AppendChild { child, .. } if *child == replacement))
            .ok_or_else(|| anyhow!("replacement was not attached"))?;
        assert!(removed < attached);
        assert_eq!(renderer.host().parent(old), None);
        assert_eq!(renderer.host().children(div), vec![replacement]);
        Ok(())
    }

    #[test]
    fn shrinking_a_list_deletes_only_the_tail() -> Result<()> {
        let (mut renderer, container) = renderer()?;
        let item = |label: &str| element!("li", [label.to_owned()]);
        commit(&mut renderer, element!("ul", [item("a"), item("b"), item("c")]), container)?;
        let third = committed_node(&renderer, &[0, 2])?;
        let list = committed_node(&renderer, &[0])?;

        let stats = commit(&mut renderer, element!("ul", [item("a"), item("b")]), container)?;
        assert_eq!(stats.deletions, 1);
        assert_eq!(stats.placements, 0);
        // ul, two li and their two text nodes.
        assert_eq!(stats.updates, 5);

        let removed: Vec<NodeKey> = renderer
            .host()
            .mutations()
            .iter()
            .filter_map(|mutation| match mutation {
                HostMutation::RemoveChild { child, .. } => Some(*child),
                _ => None,
            })
            .collect();
        assert_eq!(removed, vec![third]);
        assert_eq!(renderer.host().children(list).len(), 2);
        assert_eq!(renderer.host().text_content(container), "ab");
        Ok(())
    }

    #[test]
    fn class_change_with_same_handler_is_a_single_attribute_set() -> Result<()> {
        let (mut renderer, container) = renderer()?;
        let handler = Listener::new(|_| {});
        commit(&mut renderer, element!("button", { class: "a", onClick: handler.clone() }), container)?;
        let button = committed_node(&renderer, &[0])?;

        let stats = commit(&mut renderer, element!("button", { class: "b", onClick: handler }), container)?;
        assert_eq!(stats.host_calls, 1);
        assert_eq!(
            renderer.host().mutations(),
            &[HostMutation::SetAttribute { node: button, name: "class".to_owned(), value: "b".to_owned() }]
        );
        assert_eq!(renderer.host().listener_count(button, "click"), 1);
        Ok(())
    }

    #[test]
    fn swapping_handlers_rebinds_the_event() -> Result<()> {
        let (mut renderer, container) = renderer()?;
        let clicks = Arc::new(AtomicUsize::new(0));
        let first = Listener::new(|_| {});
        let counter = Arc::clone(&clicks);
        let second = Listener::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        commit(&mut renderer, element!("button", { onClick: first }), container)?;
        let button = committed_node(&renderer, &[0])?;

        commit(&mut renderer, element!("button", { onClick: second }), container)?;
        assert_eq!(renderer.host().listener_count(button, "click"), 1);
        assert_eq!(renderer.host().dispatch(button, "click")?, 1);
        assert_eq!(clicks.load(Ordering::SeqCst), 1);

        commit(&mut renderer, element!("button"), container)?;
        assert_eq!(renderer.host().listener_count(button, "click"), 0);
        Ok(())
    }

    #[test]
    fn components_are_reinvoked_and_their_output_diffed_positionally() -> Result<()> {
        let (mut renderer, container) = renderer()?;
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let title = Component::new("Title", move |props| {
            seen.fetch_add(1, Ordering::SeqCst);
            let label = props.get("label").and_then(PropValue::to_attribute_value).unwrap_or_default();
            element!("h1", [label])
        });

        commit(&mut renderer, element!(&title, { label: "first" }), container)?;
        let heading = committed_node(&renderer, &[0, 0])?;

        let stats = commit(&mut renderer, element!(&title, { label: "second" }), container)?;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        // Component, heading and text are all reused.
        assert_eq!((stats.updates, stats.placements, stats.deletions), (3, 0, 0));
        assert_eq!(committed_node(&renderer, &[0, 0])?, heading);
        assert_eq!(renderer.host().text_content(container), "second");
        assert_eq!(renderer.host().mutations().len(), 1);
        Ok(())
    }

    #[test]
    fn component_output_type_change_is_replaced_under_the_nearest_host_parent() -> Result<()> {
        let (mut renderer, container) = renderer()?;
        let status = Component::new("Status", |props| match props.get("ok") {
            Some(PropValue::Bool(true)) => element!("span", ["ok"]),
            _ => element!("strong", ["failed"]),
        });

        commit(&mut renderer, element!(&status, { ok: true }), container)?;
        let span = committed_node(&renderer, &[0, 0])?;
        assert_eq!(renderer.host().parent(span), Some(container));

        let stats = commit(&mut renderer, element!(&status, { ok: false }), container)?;
        assert_eq!((stats.placements, stats.deletions), (2, 1));
        let strong = committed_node(&renderer, &[0, 0])?;
        assert_eq!(renderer.host().parent(span), None);
        assert_eq!(renderer.host().children(container), vec![strong]);
        assert_eq!(renderer.host().text_content(container), "failed");
        Ok(())
    }

    #[test]
    fn printed_document_after_two_generations() -> Result<()> {
        let (mut renderer, container) = renderer()?;
        commit(&mut renderer, element!("div", { id: "foo" }, [element!("a", ["bar"]), element!("b")]), container)?;
        commit(&mut renderer, element!("div", { id: "baz" }, [element!("a", ["bar"])]), container)?;

        let snapshot = renderer.host().to_json_value();
        let main = &snapshot["children"][0];
        assert_eq!(main["tag"], "main");
        let div = &main["children"][0];
        assert_eq!(div["attrs"]["id"], "baz");
        assert_eq!(div["children"].as_array().map(Vec::len), Some(1));
        assert_eq!(div["children"][0]["children"][0]["text"], "bar");
        Ok(())
    }
}
