//! Passbolt Secret Controller Library
//!
//! This library provides the core functionality for the Passbolt Secret Controller.
//! Tests are included in the module files and in `tests/`.
//!
//! ## Quick Start
//!
//! ```rust
//! use passbolt_secret_controller::prelude::*;
//! ```
//!
//! This brings commonly used types and traits into scope. For more specific imports,
//! use the individual modules.

// Re-export modules so they can be tested
pub mod admission;
pub mod cache;
pub mod config;
pub mod constants;
pub mod controller;
pub mod conversion;
pub mod crd;
pub mod observability;
pub mod prelude;
pub mod provider;
pub mod runtime;
