//! # Domwire — dependency injection for DOM-bound controllers
//!
//! A small container with two kinds of registered units:
//! - **services**: lazy singletons, built on first use and cached
//! - **controllers**: built on every `get`, tied to a DOM element, with
//!   declared event listeners attached automatically
//!
//! Dependencies are declared by name and resolved on demand, so
//! registration order does not matter, only what is registered by the time
//! `get` runs.

pub use domwire_container::*;
pub use domwire_support::*;
