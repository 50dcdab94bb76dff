//! # Reconciler
//!
//! Reconciliation state machine for `PassboltSecret` resources.
//!
//! ```text
//! Idle -> Validating -> Rendering -> Persisting -> { Success, Error }
//! ```
//!
//! Each trigger runs one pass to completion. Failed passes are not retried here; the
//! returned [`kube_runtime::controller::Action`] carries the requeue hint.

pub mod reconcile;
pub mod store;
pub mod types;

pub use crate::controller::render::{ErrorKind, SyncFailure};
pub use reconcile::reconcile;
pub use store::{KubeSecretStore, SecretStore, StoreError, WriteOutcome};
pub use types::{PassPhase, Reconciler, ReconcilerError};
