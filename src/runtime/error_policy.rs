//! # Error Policy
//!
//! Error handling and backoff logic for the controller watch loop.
//! This module handles reconciliation errors and watch stream errors.

use crate::controller::reconciler::reconcile::previous_failures;
use crate::controller::reconciler::{Reconciler, ReconcilerError};
use crate::crd::{object_label, PassboltSecret};
use kube_runtime::controller::Action;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, warn};

/// Requeue hint for a pass that failed without recording its failure
///
/// Uses the same progressive backoff as recorded failures, keyed on the failure count
/// already in the status.
pub fn handle_reconciliation_error(
    obj: Arc<PassboltSecret>,
    error: &ReconcilerError,
    ctx: Arc<Reconciler>,
) -> Action {
    let object = object_label(
        obj.metadata.name.as_deref(),
        obj.metadata.namespace.as_deref(),
    );
    error!("Reconciliation error for {}: {}", object, error);

    let (kind, delay) = match error {
        ReconcilerError::Timeout { .. } => ("timeout", ctx.backoff.delay(previous_failures(&obj))),
        ReconcilerError::Status { .. } => ("status", ctx.backoff.delay(previous_failures(&obj))),
        ReconcilerError::MissingMetadata(_) => {
            ("metadata", ctx.config.reconciliation_error_requeue_duration())
        }
    };
    ctx.metrics.increment_reconciliation_errors(kind);
    warn!(
        "Requeueing {} in {}s (trigger source: error-backoff)",
        object,
        delay.as_secs()
    );
    Action::requeue(delay)
}

/// How the watch loop reacts to a stream error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchErrorClass {
    /// 401, RBAC revoked or token expired
    Unauthorized,
    /// 410, resource version too old
    Expired,
    /// 429, API server storage (re)initializing
    Throttled,
    /// 404, object deleted or CRD missing
    NotFound,
    Other,
}

#[must_use]
pub fn classify_watch_error(error_string: &str) -> WatchErrorClass {
    // 404 first: plain text 404 bodies surface as serde errors mentioning WatchFailed
    let is_not_found = error_string.contains("ObjectNotFound")
        || error_string.contains("404")
        || error_string.contains("not found");
    if (error_string.contains("401") || error_string.contains("Unauthorized")) && !is_not_found {
        WatchErrorClass::Unauthorized
    } else if error_string.contains("410")
        || error_string.contains("too old resource version")
        || error_string.contains("Expired")
        || error_string.contains("Gone")
    {
        WatchErrorClass::Expired
    } else if error_string.contains("429")
        || error_string.contains("storage is (re)initializing")
        || error_string.contains("TooManyRequests")
    {
        WatchErrorClass::Throttled
    } else if is_not_found {
        WatchErrorClass::NotFound
    } else {
        WatchErrorClass::Other
    }
}

/// Handle watch stream errors with appropriate classification and backoff
///
/// Returns `None` to filter out the error (allow restart) or `Some(())` to continue.
pub async fn handle_watch_stream_error(
    error_string: &str,
    backoff: &AtomicU64,
    max_backoff_ms: u64,
    watch_restart_delay: Duration,
) -> Option<()> {
    match classify_watch_error(error_string) {
        WatchErrorClass::Unauthorized => {
            error!("Watch authentication failed (401 Unauthorized), RBAC may have been revoked or the token expired");
            error!("Check: kubectl auth can-i watch passboltsecrets.passbolt.tagesspiegel.de --as=system:serviceaccount:<namespace>:<serviceaccount>");
            warn!(
                "Waiting {}s before retrying watch",
                watch_restart_delay.as_secs()
            );
            tokio::time::sleep(watch_restart_delay).await;
            None
        }
        WatchErrorClass::Expired => {
            warn!("Watch resource version expired (410), watch will restart");
            None
        }
        WatchErrorClass::Throttled => {
            let current = backoff.load(Ordering::Relaxed);
            warn!(
                "API server storage reinitializing (429), backing off for {}ms before restart",
                current
            );
            tokio::time::sleep(Duration::from_millis(current)).await;
            backoff.store(
                current.saturating_mul(2).min(max_backoff_ms),
                Ordering::Relaxed,
            );
            None
        }
        WatchErrorClass::NotFound => {
            warn!(
                "Resource not found (404), it may have been deleted or the CRD is missing: {}",
                error_string
            );
            Some(())
        }
        WatchErrorClass::Other => {
            error!("Controller stream error: {}", error_string);
            tokio::time::sleep(watch_restart_delay).await;
            None
        }
    }
}
