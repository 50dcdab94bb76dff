//! # Controller
//!
//! Core controller modules for the Passbolt Secret Controller.
//!
//! - `backoff`: requeue hints for failed passes
//! - `reconciler`: reconciliation state machine and Secret/status writes
//! - `render`: Secret data from a spec and resolved Passbolt records
//! - `server`: HTTP server for metrics, probes and webhooks

pub mod backoff;
pub mod reconciler;
pub mod render;
pub mod server;
