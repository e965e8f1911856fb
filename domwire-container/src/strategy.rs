//! Provider strategies.
//!
//! A strategy decides what happens to a definition's factory output:
//! - [`Strategy::Service`] — built once, cached in the container context
//! - [`Strategy::Controller`] — built fresh on every `get`, bound to an element
//!
//! # Dispatch
//! Each variant maps to one [`ProviderStrategy`] implementation through a
//! static table, see [`Strategy::provider`].
use std::fmt;

use crate::provider::{ControllerProvider, ProviderStrategy, ServiceProvider};

/// How a definition turns into an instance.
///
/// # Examples
/// ```
/// use domwire_container::strategy::Strategy;
///
/// assert!(Strategy::Service.is_cached());
/// assert!(Strategy::Controller.requires_element());
/// assert_eq!(Strategy::Controller.to_string(), "controller");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// One instance per container.
    ///
    /// Created on first resolve and written to the context, so every later
    /// lookup of the name returns the same instance.
    Service,

    /// New instance on every resolve.
    ///
    /// Needs an element among the call arguments and binds the instance's
    /// declared events to it.
    Controller,
}

static PROVIDERS: [&dyn ProviderStrategy; 2] = [&ServiceProvider, &ControllerProvider];

impl Strategy {
    /// Returns `true` if resolved instances are cached in the context.
    #[inline]
    pub fn is_cached(&self) -> bool {
        matches!(self, Strategy::Service)
    }

    /// Returns `true` if resolution needs an element argument.
    #[inline]
    pub fn requires_element(&self) -> bool {
        matches!(self, Strategy::Controller)
    }

    /// The provider implementing this strategy.
    #[inline]
    pub fn provider(self) -> &'static dyn ProviderStrategy {
        PROVIDERS[self as usize]
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Service => write!(f, "service"),
            Strategy::Controller => write!(f, "controller"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_is_cached() {
        assert!(Strategy::Service.is_cached());
        assert!(!Strategy::Controller.is_cached());
    }

    #[test]
    fn strategy_requires_element() {
        assert!(!Strategy::Service.requires_element());
        assert!(Strategy::Controller.requires_element());
    }

    #[test]
    fn strategy_table_matches_variant() {
        assert_eq!(Strategy::Service.provider().strategy(), Strategy::Service);
        assert_eq!(Strategy::Controller.provider().strategy(), Strategy::Controller);
    }

    #[test]
    fn strategy_display() {
        assert_eq!(format!("{}", Strategy::Service), "service");
        assert_eq!(format!("{}", Strategy::Controller), "controller");
    }
}
