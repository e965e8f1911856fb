//! Core container implementation for Domwire DI.

pub mod container;
pub mod dom;
pub mod error;
pub mod events;
pub mod global;
pub mod provider;
pub mod registry;
pub mod resolver;
pub mod strategy;

pub use container::{prelude, Container, ContainerBuilder};
pub use error::{ContainerError, Result};
pub use global::global;
pub use strategy::Strategy;
