//! Error types for Domwire container operations.
//!
//! Every failure is raised synchronously and bubbles to the caller of
//! `get`, `instantiate` or the registration method. Nothing is rolled back.

use std::fmt;

use domwire_support::rendering::{render_chain, render_list};

/// Boxed error returned by user factories, constructors and host DOM calls.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Main error type for all Domwire operations.
#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    /// Registration name is not a string.
    ///
    /// Names are typed as `String`, so registration never raises this; it
    /// is kept so callers matching on every kind stay exhaustive.
    #[error("Name must be a string, got {name:?}")]
    InvalidName { name: String },

    /// Registration spec does not end with a matching factory.
    #[error("Invalid definition for {name:?}: {reason}")]
    InvalidDefinition { name: String, reason: String },

    /// Controller resolution received no element among its arguments.
    #[error("Must have element to bind controller {name:?}")]
    MissingElement { name: String },

    /// A declared dependency is neither a value nor a definition.
    #[error("{}", .0)]
    UnresolvedDependency(UnresolvedDependencyError),

    /// `get` was called with an unknown name.
    #[error("{}", .0)]
    NotDefined(NotDefinedError),

    /// Definition was already registered (when override is disabled).
    #[error("{}", .0)]
    AlreadyRegistered(AlreadyRegisteredError),

    /// Factory or constructor returned an error during construction.
    #[error("Failed to construct {name:?}: {source}")]
    ConstructionFailed {
        name: String,
        #[source]
        source: BoxError,
    },

    /// A factory read a dependency position past the declared list.
    #[error("{owner:?} declares {len} dependencies, no dependency at index {index}")]
    DependencyIndex {
        owner: String,
        index: usize,
        len: usize,
    },

    /// A factory read a dependency name its definition does not declare.
    #[error("{owner:?} does not declare dependency {dependency:?}")]
    UndeclaredDependency { owner: String, dependency: String },

    /// Typed access to a value holding another type.
    #[error("Type mismatch for {name:?}: expected {expected}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
    },

    /// Event map names a handler the controller does not expose.
    #[error("No handler {handler:?} on controller for event {event:?}")]
    UnknownHandler { handler: String, event: String },

    /// The host DOM rejected a query or listener registration.
    #[error("DOM operation failed: {source}")]
    Dom {
        #[source]
        source: BoxError,
    },

    /// A definition outlived the container that owns it.
    #[error("Container owning {name:?} has been dropped")]
    ContainerDropped { name: String },
}

impl ContainerError {
    /// Prepends `name` to the resolution chain of an unresolved dependency.
    ///
    /// Other error kinds pass through untouched.
    pub(crate) fn required_by(self, name: &str) -> Self {
        match self {
            ContainerError::UnresolvedDependency(mut err) => {
                err.chain.insert(0, name.to_string());
                ContainerError::UnresolvedDependency(err)
            }
            other => other,
        }
    }
}

/// Error when a declared dependency could not be found.
#[derive(Debug)]
pub struct UnresolvedDependencyError {
    /// The dependency name that matched nothing
    pub dependency: String,
    /// Definitions being resolved when the lookup failed, outermost first
    pub chain: Vec<String>,
}

impl fmt::Display for UnresolvedDependencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} not defined", self.dependency)?;

        if !self.chain.is_empty() {
            write!(f, "\n  Required by: {}", render_chain(&self.chain))?;
        }

        write!(
            f,
            "\n  Hint: register it with .value(), .service() or .controller() before calling .get()"
        )
    }
}

/// Error when `get` is called with a name that was never registered.
#[derive(Debug)]
pub struct NotDefinedError {
    /// The requested name
    pub name: String,
    /// Similar names that ARE registered
    pub suggestions: Vec<String>,
}

impl fmt::Display for NotDefinedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} is not defined", self.name)?;

        if !self.suggestions.is_empty() {
            write!(
                f,
                "\n  Did you mean one of:\n{}",
                render_list(&self.suggestions, "    ")
            )?;
        }

        Ok(())
    }
}

/// Error when trying to register a name that already has a definition.
#[derive(Debug)]
pub struct AlreadyRegisteredError {
    pub name: String,
}

impl fmt::Display for AlreadyRegisteredError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Definition already registered: {}", self.name)?;
        write!(
            f,
            "\n  Hint: build the container with .allow_override(true) to replace definitions"
        )
    }
}

/// Convenient Result type for Domwire operations.
pub type Result<T> = std::result::Result<T, ContainerError>;
