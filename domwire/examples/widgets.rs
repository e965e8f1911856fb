//! Basic example of the Domwire container with a toy in-memory DOM.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use domwire::prelude::*;
use parking_lot::Mutex;
use tracing::info;

// === A tiny DOM ===

struct Node {
    tag: &'static str,
    listeners: Mutex<Vec<(String, Listener)>>,
    children: Mutex<HashMap<String, Vec<NodeRef>>>,
}

impl Node {
    fn new(tag: &'static str) -> Arc<Self> {
        Arc::new(Self {
            tag,
            listeners: Mutex::new(Vec::new()),
            children: Mutex::new(HashMap::new()),
        })
    }

    fn append(&self, selector: &str, child: NodeRef) {
        self.children
            .lock()
            .entry(selector.to_string())
            .or_default()
            .push(child);
    }

    fn fire(&self, kind: &str) {
        let listeners: Vec<Listener> = self
            .listeners
            .lock()
            .iter()
            .filter(|(event, _)| event == kind)
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in listeners {
            listener(&Event::new(kind));
        }
    }
}

impl DomNode for Node {
    fn node_type(&self) -> u16 {
        ELEMENT_NODE
    }

    fn add_event_listener(&self, event: &str, listener: Listener) -> DomResult<()> {
        info!(tag = self.tag, event, "addEventListener");
        self.listeners.lock().push((event.to_string(), listener));
        Ok(())
    }

    fn query_selector_all(&self, selector: &str) -> DomResult<Vec<NodeRef>> {
        Ok(self.children.lock().get(selector).cloned().unwrap_or_default())
    }
}

// === Services and controllers ===

struct Logger;

impl Logger {
    fn log(&self, msg: &str) {
        println!("[LOG] {msg}");
    }
}

struct Counter {
    clicks: AtomicUsize,
}

struct Menu {
    title: String,
    logger: Arc<Logger>,
    counter: Arc<Counter>,
}

impl Menu {
    fn on_open(&self, _event: &Event) {
        self.logger.log(&format!("{} opened", self.title));
    }

    fn on_item_click(&self, event: &Event) {
        let total = self.counter.clicks.fetch_add(1, Ordering::SeqCst) + 1;
        self.logger.log(&format!("{} item {} #{total}", self.title, event.kind()));
    }
}

impl Controller for Menu {
    fn events(&self) -> Option<EventMap> {
        Some(
            EventMap::new()
                .on("mouseenter", "onOpen")
                .on("ul li click", "onItemClick"),
        )
    }

    fn handler(&self, name: &str) -> Option<Handler<Self>> {
        match name {
            "onOpen" => Some(Self::on_open),
            "onItemClick" => Some(Self::on_item_click),
            _ => None,
        }
    }
}

fn main() -> Result<()> {
    // Initialize tracing (logging)
    tracing_subscriber::fmt()
        .with_env_filter("domwire_container=debug,widgets=info")
        .init();

    let container = Container::new();
    container
        // Registered before its dependencies: resolution is lazy
        .controller(
            "menu",
            DefinitionSpec::depends_on(["logger", "counter"]).controller(|deps| {
                let logger = deps.get::<Logger>(0)?;
                let counter = deps.get::<Counter>(1)?;
                Ok(move |args: &[Arg]| -> std::result::Result<Menu, BoxError> {
                    let title = args
                        .iter()
                        .find_map(|arg| arg.downcast_ref::<&str>())
                        .ok_or("menu needs a title")?;
                    Ok(Menu {
                        title: title.to_string(),
                        logger,
                        counter,
                    })
                })
            }),
        )?
        .service("logger", ServiceFactory::new(|_| Ok(Logger)))?
        .service(
            "counter",
            ServiceFactory::new(|_| Ok(Counter { clicks: AtomicUsize::new(0) })),
        )?;

    println!("{container:?}");

    // Two menus on the page, each with one list item
    let first = Node::new("nav");
    let first_item = Node::new("li");
    first.append("ul li", first_item.clone());

    let second = Node::new("aside");
    let second_item = Node::new("li");
    second.append("ul li", second_item.clone());

    container.get("menu", &[Arg::from(first.clone()), Arg::value("main")])?;
    container.get("menu", &[Arg::value("side"), Arg::from(second.clone())])?;

    // A menu without a title is rejected before any listener is attached
    if let Err(err) = container.get("menu", &[Arg::from(Node::new("footer"))]) {
        println!("{err}");
    }

    first.fire("mouseenter");
    first_item.fire("click");
    second_item.fire("click");

    // Both menus share the counter singleton
    let counter = container.get_as::<Counter>("counter", &[])?;
    println!("Total clicks: {}", counter.clicks.load(Ordering::SeqCst));

    Ok(())
}
