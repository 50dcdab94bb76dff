//! # Reconcile
//!
//! One pass over a `PassboltSecret`:
//!
//! 1. Stop if the object hit the failure ceiling and its spec has not changed since,
//!    defer if the backoff of the last failure has not elapsed
//! 2. Validate the defaulted spec (no Passbolt calls on failure)
//! 3. Render the Secret data
//! 4. Create or update the Secret
//! 5. Write the status
//!
//! Every failure of steps 2-4 is recorded in the status with a fresh error list and an
//! incremented failure count. A pass that runs out of time writes nothing.
//!
//! A failure status carries `nextReconcileTime`. The status write itself is a watch
//! event for the same generation, and such triggers must not cut the backoff short.

use super::store::WriteOutcome;
use super::types::{PassPhase, Reconciler, ReconcilerError};
use crate::constants::NEXT_RECONCILE_TOLERANCE_SECS;
use crate::controller::render::{render, ErrorKind, SyncFailure};
use crate::crd::{object_label, PassboltSecret, PassboltSecretStatus, SyncStatus};
use futures::FutureExt;
use kube_runtime::controller::Action;
use std::any::Any;
use chrono::{DateTime, Utc};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Run one pass within the configured deadline
///
/// Panics inside the pass are recorded as template errors.
#[allow(clippy::missing_errors_doc, reason = "See ReconcilerError")]
#[tracing::instrument(
    name = "controller.reconcile",
    skip_all,
    fields(
        resource.name = obj.metadata.name.as_deref().unwrap_or("unknown"),
        resource.namespace = obj.metadata.namespace.as_deref().unwrap_or("default"),
    )
)]
pub async fn reconcile(
    obj: Arc<PassboltSecret>,
    ctx: Arc<Reconciler>,
) -> Result<Action, ReconcilerError> {
    let object = object_label(
        obj.metadata.name.as_deref(),
        obj.metadata.namespace.as_deref(),
    );
    ctx.metrics.increment_reconciliations();
    let started = Instant::now();

    let pass = AssertUnwindSafe(run_pass(&obj, &ctx)).catch_unwind();
    let result = match tokio::time::timeout(ctx.config.pass_timeout(), pass).await {
        Ok(Ok(result)) => result,
        Ok(Err(panic)) => {
            let message = panic_message(panic.as_ref());
            error!("Reconciliation of {} panicked: {}", object, message);
            let failure = SyncFailure::new(
                ErrorKind::Template,
                format!("recovered from panic: {message}"),
            );
            record_failure(&obj, &ctx, failure).await
        }
        Err(_) => {
            warn!(
                "Reconciliation of {} timed out, status left unchanged",
                object
            );
            Err(ReconcilerError::Timeout {
                object,
                seconds: ctx.config.pass_timeout_secs,
            })
        }
    };

    ctx.metrics
        .observe_reconciliation_duration(started.elapsed().as_secs_f64());
    result
}

async fn run_pass(obj: &PassboltSecret, ctx: &Reconciler) -> Result<Action, ReconcilerError> {
    if obj.metadata.name.is_none() {
        return Err(ReconcilerError::MissingMetadata("name"));
    }
    if obj.metadata.namespace.is_none() {
        return Err(ReconcilerError::MissingMetadata("namespace"));
    }
    let object = object_label(
        obj.metadata.name.as_deref(),
        obj.metadata.namespace.as_deref(),
    );
    debug!(phase = %PassPhase::Idle, "Starting pass for {}", object);

    if at_failure_ceiling(obj, ctx.config.failure_ceiling) {
        info!(
            "{} failed {} times in a row, waiting for a spec change",
            object,
            previous_failures(obj)
        );
        return Ok(Action::await_change());
    }

    if let Some(remaining) = retry_pending(obj, Utc::now()) {
        debug!(
            "Backoff of {} still running, deferring pass by {}s",
            object,
            remaining.as_secs()
        );
        return Ok(Action::requeue(remaining));
    }

    debug!(phase = %PassPhase::Validating, "Validating {}", object);
    let mut spec = obj.spec.clone();
    spec.apply_defaults();
    if let Err(e) = spec.validate_for_sync(&object) {
        return record_failure(obj, ctx, SyncFailure::new(ErrorKind::Configuration, e.to_string()))
            .await;
    }

    debug!(phase = %PassPhase::Rendering, "Rendering {}", object);
    let rendered = match render(&spec, ctx.resolver.as_ref()).await {
        Ok(rendered) => rendered,
        Err(failure) => {
            if failure.session_expired {
                info!("Passbolt session expired, logging in again");
                // the next pass picks up the new session
                if let Err(e) = ctx.resolver.re_authenticate().await {
                    warn!("Re-authentication failed: {}", e);
                }
            }
            return record_failure(obj, ctx, failure).await;
        }
    };

    debug!(phase = %PassPhase::Persisting, "Persisting {}", object);
    match ctx.store.apply_secret(obj, &rendered).await {
        Ok(outcome) => record_success(obj, ctx, outcome).await,
        Err(e) => {
            let failure = SyncFailure::new(ErrorKind::Persistence, e.to_string());
            record_failure(obj, ctx, failure).await
        }
    }
}

/// Failures counted against the current generation of the spec
#[must_use]
pub fn previous_failures(obj: &PassboltSecret) -> u32 {
    obj.status
        .as_ref()
        .filter(|status| status.observed_generation == obj.metadata.generation)
        .map_or(0, |status| status.failure_count)
}

/// A ceiling of 0 disables the check
#[must_use]
pub fn at_failure_ceiling(obj: &PassboltSecret, ceiling: u32) -> bool {
    ceiling > 0 && previous_failures(obj) >= ceiling
}

/// Time left until a failed pass of the current generation may be retried
#[must_use]
pub fn retry_pending(obj: &PassboltSecret, now: DateTime<Utc>) -> Option<Duration> {
    let status = obj.status.as_ref()?;
    if status.sync_status != SyncStatus::Error
        || status.observed_generation != obj.metadata.generation
    {
        return None;
    }
    let next = DateTime::parse_from_rfc3339(status.next_reconcile_time.as_deref()?).ok()?;
    let remaining = next.with_timezone(&Utc) - now;
    if remaining <= chrono::Duration::seconds(NEXT_RECONCILE_TOLERANCE_SECS) {
        return None;
    }
    remaining.to_std().ok()
}

async fn record_failure(
    obj: &PassboltSecret,
    ctx: &Reconciler,
    failure: SyncFailure,
) -> Result<Action, ReconcilerError> {
    let object = object_label(
        obj.metadata.name.as_deref(),
        obj.metadata.namespace.as_deref(),
    );
    warn!(
        phase = %PassPhase::Error,
        kind = failure.kind.as_str(),
        secret_id = failure.secret_id.as_str(),
        secret_key = failure.secret_key.as_str(),
        "Sync of {} failed: {}",
        object,
        failure.message
    );
    ctx.metrics
        .increment_reconciliation_errors(failure.kind.as_str());

    let previous = previous_failures(obj);
    let failure_count = previous.saturating_add(1);
    let ceiling_reached =
        ctx.config.failure_ceiling > 0 && failure_count >= ctx.config.failure_ceiling;
    let delay = ctx.backoff.delay(previous);
    let next_reconcile_time = if ceiling_reached {
        None
    } else {
        chrono::Duration::from_std(delay)
            .ok()
            .map(|delay| (Utc::now() + delay).to_rfc3339())
    };
    let status = PassboltSecretStatus {
        sync_status: SyncStatus::Error,
        last_sync: obj.status.as_ref().and_then(|s| s.last_sync.clone()),
        sync_errors: vec![failure.into()],
        failure_count,
        observed_generation: obj.metadata.generation,
        next_reconcile_time,
    };
    write_status(obj, ctx, &status).await?;

    if ceiling_reached {
        warn!(
            "{} failed {} times in a row, sync stopped until the spec changes",
            object, failure_count
        );
        return Ok(Action::await_change());
    }
    Ok(Action::requeue(delay))
}

async fn record_success(
    obj: &PassboltSecret,
    ctx: &Reconciler,
    outcome: WriteOutcome,
) -> Result<Action, ReconcilerError> {
    let object = object_label(
        obj.metadata.name.as_deref(),
        obj.metadata.namespace.as_deref(),
    );
    ctx.metrics.increment_secret_writes(outcome.as_str());

    let status_current = obj.status.as_ref().is_some_and(|status| {
        status.sync_status == SyncStatus::Success
            && status.failure_count == 0
            && status.observed_generation == obj.metadata.generation
    });
    if outcome == WriteOutcome::Unchanged && status_current {
        debug!(phase = %PassPhase::Success, "{} is unchanged, skipping status update", object);
        return Ok(Action::requeue(ctx.config.resync_interval()));
    }

    let status = PassboltSecretStatus {
        sync_status: SyncStatus::Success,
        last_sync: Some(chrono::Utc::now().to_rfc3339()),
        sync_errors: Vec::new(),
        failure_count: 0,
        observed_generation: obj.metadata.generation,
        next_reconcile_time: None,
    };
    write_status(obj, ctx, &status).await?;
    info!(
        phase = %PassPhase::Success,
        "Synced {} (secret {})",
        object,
        outcome.as_str()
    );
    Ok(Action::requeue(ctx.config.resync_interval()))
}

async fn write_status(
    obj: &PassboltSecret,
    ctx: &Reconciler,
    status: &PassboltSecretStatus,
) -> Result<(), ReconcilerError> {
    ctx.store
        .patch_status(obj, status)
        .await
        .map_err(|source| ReconcilerError::Status {
            object: object_label(
                obj.metadata.name.as_deref(),
                obj.metadata.namespace.as_deref(),
            ),
            source,
        })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
