//! # Prelude
//!
//! Re-exports commonly used types and traits for convenience.
//!
//! ## Usage
//!
//! ```rust
//! use passbolt_secret_controller::prelude::*;
//! ```
//!
//! This brings into scope:
//! - The `v1` CRD types and shared enumerations
//! - The cache, resolver and name lookup traits
//! - Reconciler types (Reconciler, ReconcilerError, etc.)
//! - Config types

// CRD types - most commonly used
pub use crate::crd::*;

// Seams - needed for alternative backends and test fakes
pub use crate::cache::{CacheError, Cacher, InMemoryCache};
pub use crate::conversion::{AnyPassboltSecret, ConversionError, Generation, NameLookup};
pub use crate::provider::{ResolvedSecret, SecretResolver, VaultError};

// Reconciler types - core controller functionality
pub use crate::controller::reconciler::{
    reconcile, ErrorKind, PassPhase, Reconciler, ReconcilerError, SecretStore, StoreError,
    SyncFailure, WriteOutcome,
};
pub use crate::controller::render::{render, RenderedSecret};

// Config types - for configuration management
pub use crate::config::{ControllerConfig, PassboltCredentials};
