//! Definition registry — stores the recipe for every registered name.
//!
//! A [`Definition`] records what a name needs (its dependency names), how
//! to build it (a [`Build`] factory) and which provider strategy turns the
//! factory output into an instance. Definitions are created by [`define`]
//! from a [`DefinitionSpec`]: dependency names first, factory last.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};

use tracing::{debug, warn};

use crate::container::{Container, ContainerState};
use crate::dom::Arg;
use crate::error::{AlreadyRegisteredError, BoxError, ContainerError, Result};
use crate::events::Controller;
use crate::provider::BoundController;
use crate::resolver::{self, Dependencies};
use crate::strategy::Strategy;

/// A resolved value: service singleton, controller instance or plain value.
///
/// Identity is pointer identity (`Arc::ptr_eq`).
pub type Instance = Arc<dyn Any + Send + Sync>;

type ServiceFn = Arc<dyn Fn(&Dependencies) -> std::result::Result<Instance, BoxError> + Send + Sync>;

/// Second construction phase of a controller: consumes the call arguments.
pub(crate) type ControllerConstructor =
    Box<dyn FnOnce(&[Arg]) -> std::result::Result<Arc<dyn BoundController>, BoxError>>;

type ControllerFn =
    Arc<dyn Fn(&Dependencies) -> std::result::Result<ControllerConstructor, BoxError> + Send + Sync>;

/// Builds a service from its resolved dependencies.
#[derive(Clone)]
pub struct ServiceFactory(pub(crate) ServiceFn);

impl ServiceFactory {
    /// Wraps a factory returning the service value.
    ///
    /// The value is stored as `Arc<T>`; resolve it back with
    /// [`Container::get_as::<T>`](crate::container::Container::get_as).
    pub fn new<T, F>(factory: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&Dependencies) -> std::result::Result<T, BoxError> + Send + Sync + 'static,
    {
        Self(Arc::new(move |dependencies: &Dependencies| {
            factory(dependencies).map(|value| Arc::new(value) as Instance)
        }))
    }
}

/// Builds a controller in two phases.
///
/// The outer factory receives the resolved dependencies and returns a
/// constructor; the constructor receives every argument passed to `get`.
/// Either phase may fail, which surfaces as
/// [`ContainerError::ConstructionFailed`].
#[derive(Clone)]
pub struct ControllerFactory(pub(crate) ControllerFn);

impl ControllerFactory {
    pub fn new<C, F, K>(factory: F) -> Self
    where
        C: Controller,
        F: Fn(&Dependencies) -> std::result::Result<K, BoxError> + Send + Sync + 'static,
        K: FnOnce(&[Arg]) -> std::result::Result<C, BoxError> + 'static,
    {
        Self(Arc::new(move |dependencies: &Dependencies| {
            let construct = factory(dependencies)?;
            let constructor: ControllerConstructor = Box::new(move |args: &[Arg]| {
                construct(args).map(|controller| Arc::new(controller) as Arc<dyn BoundController>)
            });
            Ok(constructor)
        }))
    }
}

/// The factory at the end of a definition spec.
#[derive(Clone)]
pub enum Build {
    Service(ServiceFactory),
    Controller(ControllerFactory),
}

impl Build {
    /// The strategy this factory is written for.
    pub fn strategy(&self) -> Strategy {
        match self {
            Build::Service(_) => Strategy::Service,
            Build::Controller(_) => Strategy::Controller,
        }
    }
}

impl From<ServiceFactory> for Build {
    fn from(factory: ServiceFactory) -> Self {
        Build::Service(factory)
    }
}

impl From<ControllerFactory> for Build {
    fn from(factory: ControllerFactory) -> Self {
        Build::Controller(factory)
    }
}

/// One entry of a [`DefinitionSpec`].
#[derive(Clone)]
pub enum SpecItem {
    /// Name of a value or definition to inject, by position.
    Dependency(String),
    /// The factory; only valid as the last item.
    Build(Build),
}

impl From<&str> for SpecItem {
    fn from(name: &str) -> Self {
        SpecItem::Dependency(name.to_string())
    }
}

impl From<String> for SpecItem {
    fn from(name: String) -> Self {
        SpecItem::Dependency(name)
    }
}

impl From<Build> for SpecItem {
    fn from(build: Build) -> Self {
        SpecItem::Build(build)
    }
}

impl From<ServiceFactory> for SpecItem {
    fn from(factory: ServiceFactory) -> Self {
        SpecItem::Build(Build::Service(factory))
    }
}

impl From<ControllerFactory> for SpecItem {
    fn from(factory: ControllerFactory) -> Self {
        SpecItem::Build(Build::Controller(factory))
    }
}

impl fmt::Debug for SpecItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecItem::Dependency(name) => write!(f, "Dependency({name:?})"),
            SpecItem::Build(build) => write!(f, "Build({})", build.strategy()),
        }
    }
}

/// Ordered dependency names followed by a factory.
///
/// # Examples
/// ```
/// use domwire_container::dom::Arg;
/// use domwire_container::events::Controller;
/// use domwire_container::registry::DefinitionSpec;
///
/// struct Widget;
/// impl Controller for Widget {}
///
/// let spec = DefinitionSpec::depends_on(["logger", "store"])
///     .controller(|_deps| Ok(|_args: &[Arg]| Ok(Widget)));
/// assert_eq!(spec.items().len(), 3);
/// ```
#[derive(Clone, Debug, Default)]
pub struct DefinitionSpec {
    items: Vec<SpecItem>,
}

impl DefinitionSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a spec with the given dependency names, in order.
    pub fn depends_on<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            items: names
                .into_iter()
                .map(|name| SpecItem::Dependency(name.into()))
                .collect(),
        }
    }

    pub fn dependency(mut self, name: impl Into<String>) -> Self {
        self.items.push(SpecItem::Dependency(name.into()));
        self
    }

    /// Appends a service factory.
    pub fn service<T, F>(mut self, factory: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&Dependencies) -> std::result::Result<T, BoxError> + Send + Sync + 'static,
    {
        self.items.push(ServiceFactory::new(factory).into());
        self
    }

    /// Appends a two-phase controller factory.
    pub fn controller<C, F, K>(mut self, factory: F) -> Self
    where
        C: Controller,
        F: Fn(&Dependencies) -> std::result::Result<K, BoxError> + Send + Sync + 'static,
        K: FnOnce(&[Arg]) -> std::result::Result<C, BoxError> + 'static,
    {
        self.items.push(ControllerFactory::new(factory).into());
        self
    }

    /// Appends a raw item; no validation until [`define`].
    pub fn item(mut self, item: impl Into<SpecItem>) -> Self {
        self.items.push(item.into());
        self
    }

    pub fn items(&self) -> &[SpecItem] {
        &self.items
    }
}

impl From<Vec<SpecItem>> for DefinitionSpec {
    fn from(items: Vec<SpecItem>) -> Self {
        Self { items }
    }
}

impl From<ServiceFactory> for DefinitionSpec {
    fn from(factory: ServiceFactory) -> Self {
        Self { items: vec![factory.into()] }
    }
}

impl From<ControllerFactory> for DefinitionSpec {
    fn from(factory: ControllerFactory) -> Self {
        Self { items: vec![factory.into()] }
    }
}

/// Everything needed to create a registered name on demand.
#[derive(Clone)]
pub struct Definition {
    name: String,
    dependencies: Vec<String>,
    build: Build,
    strategy: Strategy,
    container: Weak<ContainerState>,
}

impl Definition {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Dependency names in constructor order.
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub(crate) fn build(&self) -> &Build {
        &self.build
    }

    /// The container this definition was registered in.
    ///
    /// # Errors
    /// [`ContainerError::ContainerDropped`] once that container is gone.
    pub fn container(&self) -> Result<Container> {
        self.container
            .upgrade()
            .map(Container::from_state)
            .ok_or_else(|| ContainerError::ContainerDropped {
                name: self.name.clone(),
            })
    }

    /// Returns `true` if `container` owns this definition.
    pub fn is_owned_by(&self, container: &Container) -> bool {
        Weak::ptr_eq(&self.container, &container.downgrade())
    }

    /// Resolves this definition against its own container.
    pub fn instantiate(&self, args: &[Arg]) -> Result<Instance> {
        resolver::instantiate(self, args)
    }
}

impl fmt::Debug for Definition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Definition")
            .field("name", &self.name)
            .field("strategy", &self.strategy)
            .field("dependencies", &self.dependencies)
            .finish()
    }
}

/// Stores all definitions of one container, keyed by name.
#[derive(Debug, Default)]
pub(crate) struct Registry {
    definitions: HashMap<String, Definition>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            definitions: HashMap::new(),
        }
    }

    /// Stores a definition, replacing any previous one of the same name.
    ///
    /// # Errors
    /// Returns [`ContainerError::AlreadyRegistered`] if the name is taken
    /// and `allow_override` is false.
    pub fn register(
        &mut self,
        definition: Definition,
        allow_override: bool,
    ) -> Result<Option<Definition>> {
        let name = definition.name.clone();

        if self.definitions.contains_key(&name) {
            if !allow_override {
                return Err(ContainerError::AlreadyRegistered(AlreadyRegisteredError { name }));
            }
            warn!(name = %name, "Replacing existing definition");
        }

        debug!(
            name = %name,
            strategy = %definition.strategy,
            dependencies = definition.dependencies.len(),
            "Registered definition"
        );
        Ok(self.definitions.insert(name, definition))
    }

    pub fn get(&self, name: &str) -> Option<&Definition> {
        self.definitions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    /// Returns the number of definitions.
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.definitions.keys().map(String::as_str)
    }
}

/// Validates `spec` and registers it in `container` under `name`.
///
/// Any string is a valid name, the empty string included, matching what
/// [`Container::value`] accepts. The last item must be a factory matching
/// `strategy`; every item before it must be a dependency name. Nothing is
/// stored when validation fails.
///
/// # Errors
/// - [`ContainerError::InvalidDefinition`] — malformed spec
/// - [`ContainerError::AlreadyRegistered`] — name taken, override disabled
pub fn define(
    container: &Container,
    strategy: Strategy,
    name: impl Into<String>,
    spec: impl Into<DefinitionSpec>,
) -> Result<Definition> {
    let name = name.into();
    let invalid = |reason: String| ContainerError::InvalidDefinition {
        name: name.clone(),
        reason,
    };

    let mut items = spec.into().items;
    let build = match items.pop() {
        Some(SpecItem::Build(build)) => build,
        Some(SpecItem::Dependency(last)) => {
            return Err(invalid(format!(
                "must end with a {strategy} factory, found dependency {last:?}"
            )));
        }
        None => return Err(invalid("definition is empty".to_string())),
    };

    if build.strategy() != strategy {
        return Err(invalid(format!(
            "expected a {strategy} factory, found a {} factory",
            build.strategy()
        )));
    }

    let dependencies = items
        .into_iter()
        .enumerate()
        .map(|(position, item)| match item {
            SpecItem::Dependency(dependency) => Ok(dependency),
            SpecItem::Build(_) => Err(invalid(format!(
                "factory at position {position} must be the last item"
            ))),
        })
        .collect::<Result<Vec<_>>>()?;

    let definition = Definition {
        name,
        dependencies,
        build,
        strategy,
        container: container.downgrade(),
    };
    container.register(definition.clone())?;
    Ok(definition)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Widget;
    impl Controller for Widget {}

    fn service_factory() -> ServiceFactory {
        ServiceFactory::new(|_| Ok(42i32))
    }

    fn controller_factory() -> ControllerFactory {
        ControllerFactory::new(|_| Ok(|_: &[Arg]| Ok(Widget)))
    }

    #[test]
    fn define_bare_factory() {
        let container = Container::new();
        let definition = define(&container, Strategy::Service, "answer", service_factory()).unwrap();

        assert_eq!(definition.name(), "answer");
        assert!(definition.dependencies().is_empty());
        assert_eq!(definition.strategy(), Strategy::Service);
        assert!(definition.is_owned_by(&container));
        assert!(container.is_defined("answer"));
    }

    #[test]
    fn define_keeps_dependency_order() {
        let container = Container::new();
        let spec = DefinitionSpec::depends_on(["b", "a"])
            .dependency("c")
            .item(controller_factory());

        let definition = define(&container, Strategy::Controller, "widget", spec).unwrap();
        assert_eq!(definition.dependencies(), ["b", "a", "c"]);
    }

    #[test]
    fn blank_names_are_valid() {
        for name in ["", "   "] {
            let container = Container::new();
            define(&container, Strategy::Service, name, service_factory()).unwrap();
            assert_eq!(*container.get_as::<i32>(name, &[]).unwrap(), 42);

            let values = Container::new();
            values.value(name, 7u8);
            assert_eq!(*values.get_as::<u8>(name, &[]).unwrap(), 7);
        }
    }

    #[test]
    fn empty_spec_fails() {
        let container = Container::new();
        let result = define(&container, Strategy::Service, "x", DefinitionSpec::new());
        assert!(matches!(result, Err(ContainerError::InvalidDefinition { .. })));
    }

    #[test]
    fn trailing_dependency_fails() {
        let container = Container::new();
        let spec = DefinitionSpec::from(vec![
            SpecItem::from("thing"),
            SpecItem::from(controller_factory()),
            SpecItem::from("thing"),
        ]);

        let result = define(&container, Strategy::Controller, "widget", spec);
        match result {
            Err(ContainerError::InvalidDefinition { name, reason }) => {
                assert_eq!(name, "widget");
                assert!(reason.contains("thing"));
            }
            other => panic!("Expected InvalidDefinition, got: {other:?}"),
        }
        assert!(!container.is_defined("widget"));
    }

    #[test]
    fn factory_before_end_fails() {
        let container = Container::new();
        let spec = DefinitionSpec::new()
            .item(service_factory())
            .item(service_factory());

        let result = define(&container, Strategy::Service, "x", spec);
        assert!(matches!(result, Err(ContainerError::InvalidDefinition { .. })));
    }

    #[test]
    fn strategy_mismatch_fails() {
        let container = Container::new();
        let result = define(&container, Strategy::Controller, "x", service_factory());
        match result {
            Err(ContainerError::InvalidDefinition { reason, .. }) => {
                assert!(reason.contains("controller"));
            }
            other => panic!("Expected InvalidDefinition, got: {other:?}"),
        }
    }

    #[test]
    fn registry_replaces_by_default() {
        let container = Container::new();
        define(&container, Strategy::Service, "x", service_factory()).unwrap();
        define(&container, Strategy::Controller, "x", controller_factory()).unwrap();

        let definition = container.definition("x").unwrap();
        assert_eq!(definition.strategy(), Strategy::Controller);
    }

    #[test]
    fn registry_duplicate_fails_without_override() {
        let container = Container::builder().allow_override(false).build();
        define(&container, Strategy::Service, "x", service_factory()).unwrap();

        let result = define(&container, Strategy::Service, "x", service_factory());
        assert!(matches!(result, Err(ContainerError::AlreadyRegistered(_))));
    }

    #[test]
    fn definition_outliving_container() {
        let definition = {
            let container = Container::new();
            define(&container, Strategy::Service, "x", service_factory()).unwrap()
        };

        assert!(matches!(
            definition.container(),
            Err(ContainerError::ContainerDropped { .. })
        ));
        assert!(definition.instantiate(&[]).is_err());
    }

    #[test]
    fn spec_item_debug() {
        assert_eq!(format!("{:?}", SpecItem::from("logger")), "Dependency(\"logger\")");
        assert_eq!(format!("{:?}", SpecItem::from(service_factory())), "Build(service)");
    }
}
