//! # Domwire Support
//!
//! Shared utilities for the Domwire DI container.
//!
//! This crate provides:
//! - Text rendering for error messages
//! - Name suggestions for unknown definitions

pub mod rendering;
