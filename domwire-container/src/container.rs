//! # The Container — heart of Domwire
//!
//! Holds two mappings: the registry of definitions and the context of
//! already-resolved values. `value` writes to the context directly,
//! `service`/`controller` register definitions, and `get` resolves on
//! demand.
//!
//! # Architecture
//! ```text
//! get(name, args)
//!   │
//!   ├─ context hit ──────────────> cached value
//!   │
//!   └─ registry hit ── instantiate ── resolve deps ── provider strategy
//!                                                       │
//!                                  ServiceProvider ─────┤ (writes context)
//!                               ControllerProvider ─────┘ (binds events)
//! ```
//!
//! # Examples
//! ```rust
//! use domwire_container::prelude::*;
//!
//! struct Logger;
//!
//! struct Widget {
//!     logger: std::sync::Arc<Logger>,
//! }
//! impl Controller for Widget {}
//!
//! # struct Element;
//! # impl DomNode for Element {
//! #     fn node_type(&self) -> u16 { ELEMENT_NODE }
//! #     fn add_event_listener(&self, _: &str, _: Listener) -> DomResult<()> { Ok(()) }
//! #     fn query_selector_all(&self, _: &str) -> DomResult<Vec<NodeRef>> { Ok(vec![]) }
//! # }
//! let container = Container::new();
//! container
//!     .service("logger", ServiceFactory::new(|_| Ok(Logger)))?
//!     .controller(
//!         "widget",
//!         DefinitionSpec::depends_on(["logger"]).controller(|deps| {
//!             let logger = deps.get::<Logger>(0)?;
//!             Ok(move |_args: &[Arg]| Ok(Widget { logger }))
//!         }),
//!     )?;
//!
//! let el = std::sync::Arc::new(Element);
//! let widget = container.get_as::<Widget>("widget", &[Arg::from(el)])?;
//! let logger = container.get_as::<Logger>("logger", &[])?;
//! assert!(std::sync::Arc::ptr_eq(&widget.logger, &logger));
//! # Ok::<(), ContainerError>(())
//! ```

use std::any::{Any, type_name};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use domwire_support::rendering::suggest_similar;
use parking_lot::RwLock;
use tracing::{debug, instrument, trace};

use crate::dom::Arg;
use crate::error::{ContainerError, NotDefinedError, Result};
use crate::registry::{self, Definition, DefinitionSpec, Instance, Registry};
use crate::resolver;
use crate::strategy::Strategy;

const MAX_SUGGESTIONS: usize = 3;

// ============================================================
// ContainerBuilder
// ============================================================

/// Configures a [`Container`].
///
/// # Examples
/// ```rust
/// use domwire_container::prelude::*;
///
/// let strict = Container::builder().allow_override(false).build();
/// strict.service("x", ServiceFactory::new(|_| Ok(1u8))).unwrap();
/// assert!(strict.service("x", ServiceFactory::new(|_| Ok(2u8))).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct ContainerBuilder {
    allow_override: bool,
}

impl ContainerBuilder {
    fn new() -> Self {
        Self {
            allow_override: true,
        }
    }

    /// Allow replacing previously registered definitions (default `true`).
    pub fn allow_override(mut self, allow: bool) -> Self {
        self.allow_override = allow;
        self
    }

    /// Creates an empty container with these settings.
    pub fn build(self) -> Container {
        debug!(allow_override = self.allow_override, "Building container");
        Container {
            state: Arc::new(ContainerState {
                registry: RwLock::new(Registry::new()),
                context: RwLock::new(HashMap::new()),
                allow_override: self.allow_override,
            }),
        }
    }
}

impl Default for ContainerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ═══════════════════════════════════════════
// Container
// ═══════════════════════════════════════════

/// Shared state behind every clone of a [`Container`].
pub(crate) struct ContainerState {
    registry: RwLock<Registry>,
    context: RwLock<HashMap<String, Instance>>,
    allow_override: bool,
}

/// Dependency injection container for services and controllers.
///
/// Cloning is cheap and yields a handle to the same registry and context.
/// Independent containers never share state.
#[derive(Clone)]
pub struct Container {
    state: Arc<ContainerState>,
}

impl Container {
    /// Creates an empty container with default settings.
    pub fn new() -> Self {
        ContainerBuilder::new().build()
    }

    /// Create a new builder.
    pub fn builder() -> ContainerBuilder {
        ContainerBuilder::new()
    }

    pub(crate) fn from_state(state: Arc<ContainerState>) -> Self {
        Self { state }
    }

    pub(crate) fn downgrade(&self) -> Weak<ContainerState> {
        Arc::downgrade(&self.state)
    }

    /// Returns `true` if both handles share one container.
    pub fn same_as(&self, other: &Container) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }

    // ── Registration ──

    /// Writes `value` into the context under `name`.
    ///
    /// The value is stored as `Arc<T>`; read it back with
    /// [`get_as::<T>`](Container::get_as).
    pub fn value<T: Any + Send + Sync>(&self, name: impl Into<String>, value: T) -> &Self {
        self.value_instance(name, Arc::new(value))
    }

    /// Writes an already shared value into the context under `name`.
    pub fn value_instance(&self, name: impl Into<String>, value: Instance) -> &Self {
        let name = name.into();
        debug!(name = %name, "Stored value");
        self.store(&name, value);
        self
    }

    /// Registers a singleton service.
    ///
    /// # Errors
    /// See [`registry::define`].
    pub fn service(
        &self,
        name: impl Into<String>,
        spec: impl Into<DefinitionSpec>,
    ) -> Result<&Self> {
        registry::define(self, Strategy::Service, name, spec)?;
        Ok(self)
    }

    /// Registers an element-bound controller.
    ///
    /// # Errors
    /// See [`registry::define`].
    pub fn controller(
        &self,
        name: impl Into<String>,
        spec: impl Into<DefinitionSpec>,
    ) -> Result<&Self> {
        registry::define(self, Strategy::Controller, name, spec)?;
        Ok(self)
    }

    // ── Resolution ──

    /// Gets a value or resolves a definition.
    ///
    /// A name already in the context is returned as-is and `args` are
    /// ignored, even for a resolved service.
    ///
    /// # Errors
    /// [`ContainerError::NotDefined`] if `name` is neither in the context
    /// nor registered; otherwise whatever resolution raises.
    #[instrument(skip(self, args), fields(args = args.len()))]
    pub fn get(&self, name: &str, args: &[Arg]) -> Result<Instance> {
        if let Some(value) = self.cached(name) {
            trace!("Context hit");
            return Ok(value);
        }

        let definition = self.definition(name).ok_or_else(|| {
            ContainerError::NotDefined(NotDefinedError {
                name: name.to_string(),
                suggestions: self.find_suggestions(name),
            })
        })?;

        resolver::instantiate(&definition, args)
    }

    /// Like [`get`](Container::get), downcast to `T`.
    ///
    /// ```rust,ignore
    /// let logger: Arc<Logger> = container.get_as("logger", &[])?;
    /// ```
    pub fn get_as<T: Any + Send + Sync>(&self, name: &str, args: &[Arg]) -> Result<Arc<T>> {
        self.get(name, args)?
            .downcast::<T>()
            .map_err(|_| ContainerError::TypeMismatch {
                name: name.to_string(),
                expected: type_name::<T>(),
            })
    }

    /// Resolves `definition` against the container that owns it.
    ///
    /// The receiver plays no part in the lookup.
    pub fn instantiate(&self, definition: &Definition, args: &[Arg]) -> Result<Instance> {
        resolver::instantiate(definition, args)
    }

    // ── Introspection ──

    /// Returns a copy of the definition registered under `name`.
    pub fn definition(&self, name: &str) -> Option<Definition> {
        self.state.registry.read().get(name).cloned()
    }

    /// Returns `true` if `name` is in the context or registered.
    pub fn contains(&self, name: &str) -> bool {
        self.is_resolved(name) || self.is_defined(name)
    }

    /// Returns `true` if `name` has a definition.
    pub fn is_defined(&self, name: &str) -> bool {
        self.state.registry.read().contains(name)
    }

    /// Returns `true` if `name` is in the context.
    pub fn is_resolved(&self, name: &str) -> bool {
        self.state.context.read().contains_key(name)
    }

    /// All known names, sorted and deduplicated.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .state
            .registry
            .read()
            .names()
            .map(str::to_string)
            .collect();
        names.extend(self.state.context.read().keys().cloned());
        names.sort();
        names.dedup();
        names
    }

    // ── Internal ──

    pub(crate) fn cached(&self, name: &str) -> Option<Instance> {
        self.state.context.read().get(name).cloned()
    }

    pub(crate) fn store(&self, name: &str, value: Instance) {
        self.state.context.write().insert(name.to_string(), value);
    }

    pub(crate) fn register(&self, definition: Definition) -> Result<()> {
        self.state
            .registry
            .write()
            .register(definition, self.state.allow_override)?;
        Ok(())
    }

    fn find_suggestions(&self, name: &str) -> Vec<String> {
        let names = self.names();
        let available: Vec<&str> = names.iter().map(String::as_str).collect();
        suggest_similar(name, &available, MAX_SUGGESTIONS)
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("definitions", &self.state.registry.read().len())
            .field("resolved", &self.state.context.read().len())
            .field("allow_override", &self.state.allow_override)
            .finish()
    }
}

// ═══════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════

pub mod prelude {
    pub use super::{Container, ContainerBuilder};
    pub use crate::dom::{Arg, DomNode, DomResult, ELEMENT_NODE, Event, Listener, NodeRef};
    pub use crate::error::{BoxError, ContainerError, Result};
    pub use crate::events::{Controller, EventMap, Handler};
    pub use crate::global::{global, install_host};
    pub use crate::registry::{ControllerFactory, DefinitionSpec, Instance, ServiceFactory};
    pub use crate::resolver::Dependencies;
    pub use crate::strategy::Strategy;
}

// ═══════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════
