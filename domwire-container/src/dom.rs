//! Host DOM boundary.
//!
//! The container never touches a concrete DOM. Hosts expose their nodes
//! through [`DomNode`], which covers exactly the three operations the
//! container needs: a node-type tag, listener registration and selector
//! queries.
//!
//! Controller resolution takes a list of [`Arg`]s. The first argument that
//! [`is_element`] accepts becomes the controller's root element.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::error::BoxError;
use crate::registry::Instance;

/// `nodeType` tag of element nodes.
pub const ELEMENT_NODE: u16 = 1;
/// `nodeType` tag of text nodes.
pub const TEXT_NODE: u16 = 3;

/// Result type returned by host DOM calls.
pub type DomResult<T> = std::result::Result<T, BoxError>;

/// Callback attached to a node for one event type.
pub type Listener = Arc<dyn Fn(&Event) + Send + Sync>;

/// Shared handle to a host node.
pub type NodeRef = Arc<dyn DomNode>;

/// The node operations the container requires from its host.
pub trait DomNode: Send + Sync {
    /// Node-type discriminant; [`ELEMENT_NODE`] for elements.
    fn node_type(&self) -> u16;

    /// Attaches `listener` for events of type `event`.
    fn add_event_listener(&self, event: &str, listener: Listener) -> DomResult<()>;

    /// Returns every descendant matching `selector`, possibly none.
    fn query_selector_all(&self, selector: &str) -> DomResult<Vec<NodeRef>>;
}

/// Event delivered to a listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    kind: String,
}

impl Event {
    pub fn new(kind: impl Into<String>) -> Self {
        Self { kind: kind.into() }
    }

    /// The event type, e.g. `"click"`.
    pub fn kind(&self) -> &str {
        &self.kind
    }
}

/// One positional argument passed through `get` to a controller constructor.
#[derive(Clone)]
pub enum Arg {
    /// A host node, possibly the controller's root element.
    Node(NodeRef),
    /// Any other value.
    Value(Instance),
}

impl Arg {
    /// Wraps a host node.
    pub fn node(node: NodeRef) -> Self {
        Arg::Node(node)
    }

    /// Wraps a plain value.
    pub fn value<T: Any + Send + Sync>(value: T) -> Self {
        Arg::Value(Arc::new(value))
    }

    /// Returns the node if this argument is one.
    pub fn as_node(&self) -> Option<&NodeRef> {
        match self {
            Arg::Node(node) => Some(node),
            Arg::Value(_) => None,
        }
    }

    /// Returns the plain value as `T`, if it is one.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Arg::Value(value) => value.downcast_ref::<T>(),
            Arg::Node(_) => None,
        }
    }
}

impl<N: DomNode + 'static> From<Arc<N>> for Arg {
    fn from(node: Arc<N>) -> Self {
        Arg::Node(node)
    }
}

impl fmt::Debug for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Node(node) => write!(f, "Arg::Node(nodeType={})", node.node_type()),
            Arg::Value(_) => write!(f, "Arg::Value(..)"),
        }
    }
}

/// Is `arg` an element node?
#[inline]
pub fn is_element(arg: &Arg) -> bool {
    matches!(arg, Arg::Node(node) if node.node_type() == ELEMENT_NODE)
}

/// Returns the first element among `args`, scanning in order.
///
/// `None` means the call carried no element at all.
pub fn first_element_argument(args: &[Arg]) -> Option<&NodeRef> {
    args.iter().find(|arg| is_element(arg)).and_then(Arg::as_node)
}

/// In-memory node used by the crate's unit tests.
#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;

    pub(crate) struct MockNode {
        node_type: u16,
        listeners: Mutex<Vec<(String, Listener)>>,
        queries: Mutex<Vec<String>>,
        matches: Mutex<HashMap<String, Vec<NodeRef>>>,
    }

    impl MockNode {
        pub(crate) fn element() -> Arc<Self> {
            Self::with_type(ELEMENT_NODE)
        }

        pub(crate) fn text() -> Arc<Self> {
            Self::with_type(TEXT_NODE)
        }

        fn with_type(node_type: u16) -> Arc<Self> {
            Arc::new(Self {
                node_type,
                listeners: Mutex::new(Vec::new()),
                queries: Mutex::new(Vec::new()),
                matches: Mutex::new(HashMap::new()),
            })
        }

        /// Makes `query_selector_all(selector)` return `found`.
        pub(crate) fn answer(&self, selector: &str, found: Vec<NodeRef>) {
            self.matches.lock().insert(selector.to_string(), found);
        }

        pub(crate) fn listener_count(&self) -> usize {
            self.listeners.lock().len()
        }

        pub(crate) fn listened_events(&self) -> Vec<String> {
            self.listeners.lock().iter().map(|(event, _)| event.clone()).collect()
        }

        pub(crate) fn queries(&self) -> Vec<String> {
            self.queries.lock().clone()
        }

        /// Fires every listener registered for `event`; returns how many ran.
        pub(crate) fn dispatch(&self, event: &str) -> usize {
            let listeners: Vec<Listener> = self
                .listeners
                .lock()
                .iter()
                .filter(|(kind, _)| kind == event)
                .map(|(_, listener)| listener.clone())
                .collect();

            let payload = Event::new(event);
            for listener in &listeners {
                listener(&payload);
            }
            listeners.len()
        }
    }

    impl DomNode for MockNode {
        fn node_type(&self) -> u16 {
            self.node_type
        }

        fn add_event_listener(&self, event: &str, listener: Listener) -> DomResult<()> {
            self.listeners.lock().push((event.to_string(), listener));
            Ok(())
        }

        fn query_selector_all(&self, selector: &str) -> DomResult<Vec<NodeRef>> {
            self.queries.lock().push(selector.to_string());
            Ok(self.matches.lock().get(selector).cloned().unwrap_or_default())
        }
    }
}
