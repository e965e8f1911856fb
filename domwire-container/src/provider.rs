//! Provider strategy implementations.
//!
//! Both providers share one interface: given a definition, its resolved
//! dependencies and the call arguments, produce an instance.
//!
//! - [`ServiceProvider`] builds the service and writes it to the owning
//!   container's context before returning it.
//! - [`ControllerProvider`] finds the root element, runs the two-phase
//!   controller factory and binds the instance's events.

use std::sync::Arc;

use tracing::debug;

use crate::dom::{first_element_argument, Arg, NodeRef};
use crate::error::{BoxError, ContainerError, Result};
use crate::events::{bind_events, Controller};
use crate::registry::{Build, Definition, Instance};
use crate::resolver::Dependencies;
use crate::strategy::Strategy;

/// Turns resolved dependencies into an instance.
pub trait ProviderStrategy: Send + Sync {
    /// The strategy this provider implements.
    fn strategy(&self) -> Strategy;

    /// Produces an instance of `definition`.
    fn provide(
        &self,
        definition: &Definition,
        dependencies: &Dependencies,
        args: &[Arg],
    ) -> Result<Instance>;
}

/// Controller instance with its concrete type erased.
pub(crate) trait BoundController: Send + Sync {
    /// Attaches the instance's declared events under `root`.
    fn bind(self: Arc<Self>, root: &NodeRef) -> Result<()>;

    fn into_instance(self: Arc<Self>) -> Instance;
}

impl<C: Controller> BoundController for C {
    fn bind(self: Arc<Self>, root: &NodeRef) -> Result<()> {
        match self.events() {
            Some(events) => bind_events(&events, root, &self),
            None => Ok(()),
        }
    }

    fn into_instance(self: Arc<Self>) -> Instance {
        self
    }
}

/// Singleton provider.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServiceProvider;

impl ProviderStrategy for ServiceProvider {
    fn strategy(&self) -> Strategy {
        Strategy::Service
    }

    fn provide(
        &self,
        definition: &Definition,
        dependencies: &Dependencies,
        _args: &[Arg],
    ) -> Result<Instance> {
        let Build::Service(factory) = definition.build() else {
            return Err(mismatched(definition, self.strategy()));
        };

        let instance = (factory.0)(dependencies).map_err(|source| {
            ContainerError::ConstructionFailed {
                name: definition.name().to_string(),
                source,
            }
        })?;

        definition
            .container()?
            .store(definition.name(), Arc::clone(&instance));
        debug!(name = %definition.name(), "Cached service singleton");

        Ok(instance)
    }
}

/// Per-call provider for element-bound controllers.
#[derive(Debug, Clone, Copy, Default)]
pub struct ControllerProvider;

impl ProviderStrategy for ControllerProvider {
    fn strategy(&self) -> Strategy {
        Strategy::Controller
    }

    fn provide(
        &self,
        definition: &Definition,
        dependencies: &Dependencies,
        args: &[Arg],
    ) -> Result<Instance> {
        let Build::Controller(factory) = definition.build() else {
            return Err(mismatched(definition, self.strategy()));
        };

        let root = first_element_argument(args).cloned().ok_or_else(|| {
            ContainerError::MissingElement {
                name: definition.name().to_string(),
            }
        })?;

        let failed = |source: BoxError| ContainerError::ConstructionFailed {
            name: definition.name().to_string(),
            source,
        };
        let construct = (factory.0)(dependencies).map_err(failed)?;
        let controller = construct(args).map_err(failed)?;
        Arc::clone(&controller).bind(&root)?;
        debug!(name = %definition.name(), args = args.len(), "Constructed controller");

        Ok(controller.into_instance())
    }
}

fn mismatched(definition: &Definition, expected: Strategy) -> ContainerError {
    ContainerError::InvalidDefinition {
        name: definition.name().to_string(),
        reason: format!(
            "expected a {expected} factory, found a {} factory",
            definition.build().strategy()
        ),
    }
}
