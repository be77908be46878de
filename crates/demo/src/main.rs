use anyhow::{Result, anyhow};
use host::{Listener, MemoryDom, NodeKey};
use log::info;
use reconciler::{CommitStats, Component, Element, FrameBudget, PropValue, Renderer, RendererConfig, drive, element};
use tokio::runtime::Builder;

fn first_generation(on_click: &Listener) -> Element {
    element!("div", { id: "foo" }, [
        element!("a", { onClick: on_click.clone() }, ["bar"]),
        element!("b"),
    ])
}

fn second_generation(on_click: &Listener, greeting: &Component) -> Element {
    element!("div", { id: "foo", class: "updated" }, [
        element!("a", { onClick: on_click.clone() }, ["bar"]),
        element!(greeting, { name: "reconciler" }),
    ])
}

fn log_commit(label: &str, stats: Option<CommitStats>, dom: &MemoryDom) -> Result<()> {
    let stats = stats.ok_or_else(|| anyhow!("{label}: nothing was rendered"))?;
    info!(
        "{label}: {} units over {} slices; {} placements, {} updates, {} deletions, {} host calls",
        stats.units, stats.slices, stats.placements, stats.updates, stats.deletions, stats.host_calls
    );
    info!("{label}:\n{}", dom.pretty());
    Ok(())
}

/// Host node of the first child of the container's first element.
fn first_link(renderer: &Renderer<MemoryDom>, container: NodeKey) -> Result<NodeKey> {
    let dom = renderer.host();
    let div = dom.children(container).first().copied().ok_or_else(|| anyhow!("container is empty"))?;
    dom.children(div).first().copied().ok_or_else(|| anyhow!("div has no children"))
}

pub fn main() -> Result<()> {
    env_logger::init();

    let config = RendererConfig::from_env();
    info!("Slice budget {:?}, yield margin {:?}", config.frame_budget(), config.yield_margin());
    let mut frames = FrameBudget::from_config(&config);

    let mut dom = MemoryDom::new();
    let container = dom.create_container("main")?;
    let mut renderer = Renderer::new(dom);

    let on_click = Listener::new(|event| info!("clicked {:?}", event.target));
    let greeting = Component::new("Greeting", |props| {
        let name = props.get("name").and_then(PropValue::to_attribute_value).unwrap_or_default();
        element!("p", [format!("hello {name}")])
    });

    let runtime = Builder::new_current_thread().build()?;

    renderer.render(first_generation(&on_click), container);
    let stats = runtime.block_on(drive(&mut renderer, &mut frames))?;
    log_commit("first render", stats, renderer.host())?;

    renderer.render(second_generation(&on_click, &greeting), container);
    let stats = runtime.block_on(drive(&mut renderer, &mut frames))?;
    log_commit("second render", stats, renderer.host())?;

    let link = first_link(&renderer, container)?;
    let handled = renderer.host().dispatch(link, "click")?;
    info!("click dispatched to {handled} listener(s); {} slices granted", frames.granted());
    Ok(())
}
