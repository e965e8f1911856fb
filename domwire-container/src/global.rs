//! The default global container.
//!
//! Applications that only need one container can share [`global()`]
//! instead of passing a [`Container`] around. It is created on first access
//! and holds itself under `$module`. Built-in names start with `$`.

use std::any::Any;

use once_cell::sync::Lazy;
use tracing::debug;

use crate::container::Container;
use crate::dom::NodeRef;

/// Name under which the global container stores itself.
pub const MODULE: &str = "$module";
/// Name of the host window value written by [`install_host`].
pub const WINDOW: &str = "$window";
/// Name of the host document node written by [`install_host`].
pub const DOCUMENT: &str = "$document";

static GLOBAL_CONTAINER: Lazy<Container> = Lazy::new(|| {
    let container = Container::new();
    container.value(MODULE, container.clone());
    debug!("Created global container");
    container
});

/// Provides a reference to the global container.
///
/// # Examples
/// ```
/// use domwire_container::global::{global, MODULE};
/// use domwire_container::container::Container;
///
/// let module = global().get_as::<Container>(MODULE, &[]).unwrap();
/// assert!(module.is_resolved(MODULE));
/// ```
pub fn global() -> &'static Container {
    &GLOBAL_CONTAINER
}

/// Writes the host's window and document into `container`.
///
/// The document is stored as a [`NodeRef`], so it can be injected into
/// services that query the page.
pub fn install_host<W: Any + Send + Sync>(
    container: &Container,
    window: W,
    document: NodeRef,
) -> &Container {
    container.value(WINDOW, window).value(DOCUMENT, document)
}
