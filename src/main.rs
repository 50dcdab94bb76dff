//! # Passbolt Secret Controller
//!
//! A Kubernetes controller that syncs secrets from a Passbolt vault into Kubernetes Secrets.
//!
//! ## Overview
//!
//! 1. **Watching `PassboltSecret` resources** - across all namespaces, plus the Secrets they own
//! 2. **Resolving Passbolt resources** - by ID, through a GPGAuth session
//! 3. **Rendering Secrets** - single fields, templates, plain text and docker registry credentials
//! 4. **Reporting** - sync status, errors and a failure count on every `PassboltSecret`
//!
//! ## Features
//!
//! - **Four API generations**: `v1alpha1` to `v1`, converted through a webhook
//! - **Name cache**: Passbolt resource names mapped to IDs, refreshed periodically
//! - **Prometheus metrics**: Exposes metrics for monitoring and observability
//! - **Health probes**: HTTP endpoints for liveness and readiness checks
//!
//! ## Usage
//!
//! See the [README.md](../README.md) for detailed usage instructions and examples.

use anyhow::Result;
use passbolt_secret_controller::runtime::cache_refresh::spawn_cache_refresh;
use passbolt_secret_controller::runtime::initialization::initialize;
use passbolt_secret_controller::runtime::watch_loop::run_watch_loop;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let init = initialize().await?;

    let refresh = spawn_cache_refresh(Arc::clone(&init.vault), &init.config);

    run_watch_loop(
        init.secrets,
        init.owned,
        init.reconciler,
        Arc::clone(&init.server_state),
    )
    .await?;

    refresh.abort();
    init.vault.logout().await;
    info!("Logged out of Passbolt");
    Ok(())
}
