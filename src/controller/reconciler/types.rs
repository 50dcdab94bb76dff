//! # Types
//!
//! Core types for the reconciler.

use super::store::{SecretStore, StoreError};
use crate::config::ControllerConfig;
use crate::controller::backoff::ExponentialBackoff;
use crate::observability::ControllerMetrics;
use crate::provider::SecretResolver;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Errors that never reach the status of a `PassboltSecret`
///
/// Everything else is recorded as a sync error and is not an error of the pass.
#[derive(Debug, Error)]
pub enum ReconcilerError {
    #[error("object has no metadata.{0}")]
    MissingMetadata(&'static str),
    #[error("failed to update status of {object}: {source}")]
    Status {
        object: String,
        #[source]
        source: StoreError,
    },
    #[error("reconciliation of {object} did not finish within {seconds}s")]
    Timeout { object: String, seconds: u64 },
}

/// Steps of one pass
///
/// Every trigger starts a fresh pass in `Idle`; `Success` and `Error` end it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassPhase {
    Idle,
    Validating,
    Rendering,
    Persisting,
    Success,
    Error,
}

impl PassPhase {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            PassPhase::Idle => "idle",
            PassPhase::Validating => "validating",
            PassPhase::Rendering => "rendering",
            PassPhase::Persisting => "persisting",
            PassPhase::Success => "success",
            PassPhase::Error => "error",
        }
    }
}

impl fmt::Display for PassPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared context of all passes
///
/// Holds no per-object state; concurrent passes over different objects only share
/// the resolver (and through it the Passbolt session and name cache).
#[derive(Clone)]
pub struct Reconciler {
    pub resolver: Arc<dyn SecretResolver>,
    pub store: Arc<dyn SecretStore>,
    pub config: ControllerConfig,
    pub metrics: ControllerMetrics,
    pub backoff: ExponentialBackoff,
}

impl fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reconciler")
            .field("config", &self.config)
            .field("backoff", &self.backoff)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    pub fn new(
        resolver: Arc<dyn SecretResolver>,
        store: Arc<dyn SecretStore>,
        config: ControllerConfig,
        metrics: ControllerMetrics,
    ) -> Self {
        let backoff = ExponentialBackoff::from_config(&config);
        Self {
            resolver,
            store,
            config,
            metrics,
            backoff,
        }
    }
}
