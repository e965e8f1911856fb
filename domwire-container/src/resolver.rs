//! Dependency resolution.
//!
//! [`instantiate`] walks a definition's dependency names in order. Each name
//! is looked up in the owning container's context first, then in its
//! registry (recursing with no call arguments). The resolved values are
//! handed to the definition's provider strategy.
//!
//! Resolution never caches anything itself; caching belongs to the service
//! strategy. It also never consults any container other than the one that
//! owns the definition being resolved.

use std::any::{Any, type_name};
use std::sync::Arc;

use tracing::{instrument, trace};

use crate::dom::Arg;
use crate::error::{ContainerError, Result, UnresolvedDependencyError};
use crate::registry::{Definition, Instance};

/// Resolved dependency values, in declaration order.
///
/// Handed to service and controller factories.
#[derive(Clone)]
pub struct Dependencies {
    owner: String,
    names: Vec<String>,
    values: Vec<Instance>,
}

impl Dependencies {
    pub(crate) fn new(owner: &str, names: Vec<String>, values: Vec<Instance>) -> Self {
        debug_assert_eq!(names.len(), values.len());
        Self {
            owner: owner.to_string(),
            names,
            values,
        }
    }

    /// Returns the value at `index` as `T`.
    ///
    /// # Errors
    /// - [`ContainerError::DependencyIndex`] — `index` is past the declared list
    /// - [`ContainerError::TypeMismatch`] — the value is not a `T`
    pub fn get<T: Any + Send + Sync>(&self, index: usize) -> Result<Arc<T>> {
        let value = self
            .values
            .get(index)
            .ok_or_else(|| ContainerError::DependencyIndex {
                owner: self.owner.clone(),
                index,
                len: self.values.len(),
            })?;

        Arc::clone(value)
            .downcast::<T>()
            .map_err(|_| ContainerError::TypeMismatch {
                name: self.names[index].clone(),
                expected: type_name::<T>(),
            })
    }

    /// Returns the value declared under `name` as `T`.
    ///
    /// # Errors
    /// [`ContainerError::UndeclaredDependency`] if the definition does not
    /// list `name`; otherwise as [`get`](Dependencies::get).
    pub fn named<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>> {
        let index = self
            .names
            .iter()
            .position(|declared| declared == name)
            .ok_or_else(|| ContainerError::UndeclaredDependency {
                owner: self.owner.clone(),
                dependency: name.to_string(),
            })?;
        self.get(index)
    }

    /// Returns the untyped value at `index`.
    pub fn raw(&self, index: usize) -> Option<&Instance> {
        self.values.get(index)
    }

    /// Declared names, in order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Instance)> {
        self.names.iter().map(String::as_str).zip(self.values.iter())
    }
}

/// Creates an instance of `definition` from its own container.
///
/// `args` are passed to the provider strategy; only controllers use them.
/// Nested dependencies are always resolved without arguments.
///
/// # Errors
/// - [`ContainerError::UnresolvedDependency`] — a dependency name matches
///   neither the context nor the registry
/// - any error raised by a nested resolution or by the provider
#[instrument(
    skip(definition, args),
    fields(name = %definition.name(), strategy = %definition.strategy()),
    level = "trace"
)]
pub fn instantiate(definition: &Definition, args: &[Arg]) -> Result<Instance> {
    let container = definition.container()?;
    let mut values = Vec::with_capacity(definition.dependencies().len());

    for dependency in definition.dependencies() {
        let value = if let Some(cached) = container.cached(dependency) {
            trace!(dependency = %dependency, "Dependency found in context");
            cached
        } else if let Some(nested) = container.definition(dependency) {
            trace!(dependency = %dependency, "Resolving dependency from registry");
            instantiate(&nested, &[]).map_err(|err| err.required_by(definition.name()))?
        } else {
            return Err(ContainerError::UnresolvedDependency(
                UnresolvedDependencyError {
                    dependency: dependency.clone(),
                    chain: vec![definition.name().to_string()],
                },
            ));
        };
        values.push(value);
    }

    let dependencies = Dependencies::new(
        definition.name(),
        definition.dependencies().to_vec(),
        values,
    );
    definition
        .strategy()
        .provider()
        .provide(definition, &dependencies, args)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::container::Container;
    use crate::dom::testing::MockNode;
    use crate::events::Controller;
    use crate::registry::{DefinitionSpec, ServiceFactory};

    struct Logger;

    #[test]
    fn dependencies_typed_access() {
        let values: Vec<Instance> = vec![Arc::new(7u8), Arc::new(String::from("db"))];
        let deps = Dependencies::new("svc", vec!["level".into(), "url".into()], values);

        assert_eq!(*deps.get::<u8>(0).unwrap(), 7);
        assert_eq!(deps.named::<String>("url").unwrap().as_str(), "db");
        assert_eq!(deps.len(), 2);
        assert_eq!(deps.names(), ["level", "url"]);

        assert!(matches!(
            deps.get::<String>(0),
            Err(ContainerError::TypeMismatch { name, .. }) if name == "level"
        ));
        assert!(matches!(
            deps.get::<u8>(5),
            Err(ContainerError::DependencyIndex { owner, index: 5, len: 2 }) if owner == "svc"
        ));
        assert!(matches!(
            deps.named::<u8>("nope"),
            Err(ContainerError::UndeclaredDependency { dependency, .. }) if dependency == "nope"
        ));
    }

    #[test]
    fn resolves_values_then_definitions_in_order() {
        let container = Container::new();
        container.value("url", String::from("postgres://localhost"));
        container
            .service("logger", ServiceFactory::new(|_| Ok(Logger)))
            .unwrap()
            .service(
                "db",
                DefinitionSpec::depends_on(["logger", "url"]).service(|deps| {
                    let _logger = deps.get::<Logger>(0)?;
                    let url = deps.get::<String>(1)?;
                    Ok(url.len())
                }),
            )
            .unwrap();

        let definition = container.definition("db").unwrap();
        let instance = instantiate(&definition, &[]).unwrap();
        assert_eq!(instance.downcast_ref::<usize>(), Some(&20));
        assert!(container.is_resolved("logger"));
    }

    #[test]
    fn missing_dependency_reports_chain() {
        let container = Container::new();
        container
            .service("logger", DefinitionSpec::depends_on(["transport"]).service(|_| Ok(Logger)))
            .unwrap()
            .service("page", DefinitionSpec::depends_on(["logger"]).service(|_| Ok(())))
            .unwrap();

        let definition = container.definition("page").unwrap();
        match instantiate(&definition, &[]) {
            Err(ContainerError::UnresolvedDependency(err)) => {
                assert_eq!(err.dependency, "transport");
                assert_eq!(err.chain, vec!["page".to_string(), "logger".to_string()]);
            }
            other => panic!("Expected UnresolvedDependency, got: {other:?}"),
        }
    }

    #[test]
    fn completed_services_survive_later_failure() {
        let container = Container::new();
        container
            .service("logger", ServiceFactory::new(|_| Ok(Logger)))
            .unwrap()
            .service(
                "page",
                DefinitionSpec::depends_on(["logger", "missing"]).service(|_| Ok(())),
            )
            .unwrap();

        let definition = container.definition("page").unwrap();
        assert!(instantiate(&definition, &[]).is_err());
        assert!(container.is_resolved("logger"));
        assert!(!container.is_resolved("page"));
    }

    #[test]
    fn shared_service_built_once_per_tree() {
        let builds = Arc::new(AtomicUsize::new(0));
        let container = Container::new();
        container
            .service("logger", {
                let builds = builds.clone();
                ServiceFactory::new(move |_| {
                    builds.fetch_add(1, Ordering::SeqCst);
                    Ok(Logger)
                })
            })
            .unwrap()
            .service("a", DefinitionSpec::depends_on(["logger"]).service(|_| Ok(1u8)))
            .unwrap()
            .service("b", DefinitionSpec::depends_on(["logger"]).service(|_| Ok(2u8)))
            .unwrap()
            .service(
                "app",
                DefinitionSpec::depends_on(["a", "b", "logger"]).service(|deps| {
                    let a = deps.get::<Logger>(2)?;
                    Ok(Arc::strong_count(&a))
                }),
            )
            .unwrap();

        container.get("app", &[]).unwrap();
        assert_eq!(builds.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn nested_resolution_gets_no_arguments() {
        struct Child;
        impl Controller for Child {}

        let container = Container::new();
        container
            .controller(
                "child",
                crate::registry::ControllerFactory::new(|_| Ok(|_: &[Arg]| Ok(Child))),
            )
            .unwrap()
            .service("parent", DefinitionSpec::depends_on(["child"]).service(|_| Ok(())))
            .unwrap();

        let el = MockNode::element();
        let result = container.get("parent", &[Arg::from(el)]);
        match result {
            Err(ContainerError::MissingElement { name }) => assert_eq!(name, "child"),
            other => panic!("Expected MissingElement, got: {other:?}"),
        }
    }

    #[test]
    fn resolves_in_owning_container() {
        let owner = Container::new();
        owner.value("greeting", String::from("hello"));
        owner
            .service(
                "shout",
                DefinitionSpec::depends_on(["greeting"]).service(|deps| {
                    Ok(deps.get::<String>(0)?.to_uppercase())
                }),
            )
            .unwrap();

        let other = Container::new();
        other.value("greeting", String::from("bonjour"));

        let definition = owner.definition("shout").unwrap();
        let instance = other.instantiate(&definition, &[]).unwrap();

        assert_eq!(instance.downcast_ref::<String>().map(String::as_str), Some("HELLO"));
        assert!(owner.is_resolved("shout"));
        assert!(!other.is_resolved("shout"));
    }
}
