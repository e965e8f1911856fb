//! Declarative event binding for controllers.
//!
//! A controller describes its listeners with an [`EventMap`]: each key is
//! either a bare event name (`"click"`, bound on the root element) or a
//! selector followed by an event name (`"ul li click"`, bound on every
//! descendant the selector matches). The event name is whatever follows the
//! last space.
//!
//! # Examples
//! ```
//! use domwire_container::events::{Controller, EventMap, Handler};
//! use domwire_container::dom::Event;
//!
//! struct Menu;
//!
//! impl Menu {
//!     fn on_item_click(&self, _event: &Event) {}
//! }
//!
//! impl Controller for Menu {
//!     fn events(&self) -> Option<EventMap> {
//!         Some(EventMap::new().on("ul li click", "onItemClick"))
//!     }
//!
//!     fn handler(&self, name: &str) -> Option<Handler<Self>> {
//!         match name {
//!             "onItemClick" => Some(Self::on_item_click),
//!             _ => None,
//!         }
//!     }
//! }
//! ```

use std::sync::Arc;

use tracing::{debug, trace};

use crate::dom::{Event, Listener, NodeRef};
use crate::error::{ContainerError, Result};

/// A controller method usable as an event handler.
pub type Handler<C> = fn(&C, &Event);

/// Instances produced by controller definitions.
///
/// Both methods default to "nothing to bind", so a plain struct only needs
/// an empty `impl Controller for T {}`.
pub trait Controller: Send + Sync + 'static {
    /// Listeners to attach once the instance is constructed.
    fn events(&self) -> Option<EventMap> {
        None
    }

    /// Looks up a handler method by the name used in [`EventMap`].
    fn handler(&self, name: &str) -> Option<Handler<Self>> {
        let _ = name;
        None
    }
}

/// Ordered mapping from event keys to handler names.
///
/// Iteration follows insertion order. Setting a key that already exists
/// replaces its handler without moving it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventMap {
    entries: Vec<(String, String)>,
}

impl EventMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`insert`](EventMap::insert).
    pub fn on(mut self, key: impl Into<String>, handler: impl Into<String>) -> Self {
        self.insert(key, handler);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, handler: impl Into<String>) {
        let (key, handler) = (key.into(), handler.into());
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some(entry) => entry.1 = handler,
            None => self.entries.push((key, handler)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, h)| (k.as_str(), h.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, H: Into<String>> FromIterator<(K, H)> for EventMap {
    fn from_iter<I: IntoIterator<Item = (K, H)>>(iter: I) -> Self {
        let mut map = EventMap::new();
        for (key, handler) in iter {
            map.insert(key, handler);
        }
        map
    }
}

/// Where an event key attaches its listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventTarget<'a> {
    /// The controller's root element.
    Root,
    /// Every descendant of the root matching the selector.
    Selector(&'a str),
}

/// Splits an event key on its last space into target and event name.
///
/// ```
/// use domwire_container::events::{split_event_key, EventTarget};
///
/// assert_eq!(split_event_key("click"), (EventTarget::Root, "click"));
/// assert_eq!(
///     split_event_key("ul li click"),
///     (EventTarget::Selector("ul li"), "click")
/// );
/// ```
pub fn split_event_key(key: &str) -> (EventTarget<'_>, &str) {
    match key.rfind(' ') {
        None => (EventTarget::Root, key),
        Some(index) => (EventTarget::Selector(&key[..index]), &key[index + 1..]),
    }
}

/// Attaches every listener in `events` for `controller`.
///
/// Handlers are called with the controller they were bound from. A handler
/// name is only looked up once there is a node to attach it to, so a
/// selector matching nothing never fails.
///
/// # Errors
/// - [`ContainerError::UnknownHandler`] — the controller has no such handler
/// - [`ContainerError::Dom`] — the host rejected a query or registration
pub fn bind_events<C: Controller>(
    events: &EventMap,
    root: &NodeRef,
    controller: &Arc<C>,
) -> Result<()> {
    for (key, handler_name) in events.iter() {
        let (target, event) = split_event_key(key);

        let targets = match target {
            EventTarget::Root => vec![Arc::clone(root)],
            EventTarget::Selector(selector) => {
                let found = root
                    .query_selector_all(selector)
                    .map_err(|source| ContainerError::Dom { source })?;
                trace!(selector, matched = found.len(), "Queried event targets");
                found
            }
        };

        for node in &targets {
            let handler = controller.handler(handler_name).ok_or_else(|| {
                ContainerError::UnknownHandler {
                    handler: handler_name.to_string(),
                    event: key.to_string(),
                }
            })?;

            let this = Arc::clone(controller);
            let listener: Listener = Arc::new(move |fired: &Event| handler(&this, fired));
            node.add_event_listener(event, listener)
                .map_err(|source| ContainerError::Dom { source })?;
        }

        debug!(key, event, handler = handler_name, targets = targets.len(), "Bound event");
    }

    Ok(())
}
