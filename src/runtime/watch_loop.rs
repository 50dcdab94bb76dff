//! # Watch Loop
//!
//! Controller watch loop that monitors `PassboltSecret` resources (and the Secrets
//! they own) and triggers reconciliation when changes are detected.

use crate::constants::{WATCH_BACKOFF_MAX_MS, WATCH_BACKOFF_START_MS};
use crate::controller::reconciler::{reconcile, Reconciler};
use crate::controller::server::ServerState;
use crate::crd::PassboltSecret;
use crate::runtime::error_policy::{handle_reconciliation_error, handle_watch_stream_error};
use futures::StreamExt;
use k8s_openapi::api::core::v1::Secret;
use kube::api::Api;
use kube_runtime::{watcher, Controller};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Run the controller watch loop
///
/// Restarts the watch when its stream ends or fails, until a shutdown signal marks
/// the server as not ready.
#[allow(clippy::missing_errors_doc, reason = "Reserved for fatal watch errors")]
pub async fn run_watch_loop(
    secrets: Api<PassboltSecret>,
    owned: Api<Secret>,
    reconciler: Arc<Reconciler>,
    server_state: Arc<ServerState>,
) -> Result<(), anyhow::Error> {
    let backoff_ms = Arc::new(AtomicU64::new(WATCH_BACKOFF_START_MS));
    let restart_delay = reconciler.config.watch_restart_delay_duration();

    // SIGTERM/SIGINT: stop reporting ready, let in-flight passes finish
    let shutdown_state = Arc::clone(&server_state);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for shutdown signal: {}", e);
            return;
        }
        info!("Received shutdown signal, initiating graceful shutdown...");
        shutdown_state.is_ready.store(false, Ordering::Relaxed);
    });

    loop {
        if !server_state.is_ready.load(Ordering::Relaxed) {
            info!("Shutdown requested, exiting watch loop");
            break;
        }

        info!("Starting controller watch loop...");
        let backoff = Arc::clone(&backoff_ms);
        Controller::new(secrets.clone(), watcher::Config::default().any_semantic())
            .owns(owned.clone(), watcher::Config::default())
            .shutdown_on_signal()
            .run(reconcile, handle_reconciliation_error, Arc::clone(&reconciler))
            .filter_map(move |result| {
                let backoff = Arc::clone(&backoff);
                async move {
                    match &result {
                        Ok((object, _)) => {
                            backoff.store(WATCH_BACKOFF_START_MS, Ordering::Relaxed);
                            debug!(resource = %object, "watch.event.success");
                            Some(result)
                        }
                        Err(e) => {
                            let error_string = format!("{e:?}");
                            handle_watch_stream_error(
                                &error_string,
                                &backoff,
                                WATCH_BACKOFF_MAX_MS,
                                restart_delay,
                            )
                            .await
                            .map(|()| result)
                        }
                    }
                }
            })
            .for_each(|_| futures::future::ready(()))
            .await;

        if !server_state.is_ready.load(Ordering::Relaxed) {
            info!("Shutdown requested, exiting watch loop");
            break;
        }

        warn!(
            "Controller watch stream ended, restarting in {} seconds...",
            restart_delay.as_secs()
        );
        tokio::time::sleep(restart_delay).await;
    }

    info!("Controller stopped gracefully");
    Ok(())
}
