//! # Cache Refresh
//!
//! Periodic reload of the Passbolt name/ID cache.
//!
//! A failed refresh is retried after a pause, logging in again first. When every
//! attempt failed the previous mappings stay in place and the loop carries on.

use crate::config::ControllerConfig;
use crate::provider::passbolt::VaultClient;
use crate::provider::{SecretResolver, VaultError};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{error, info, warn};

/// Refresh once, with up to `retries` extra attempts spaced by `pause`
#[allow(clippy::missing_errors_doc, reason = "Error of the last attempt")]
pub async fn refresh_with_retries(
    client: &VaultClient,
    retries: u32,
    pause: Duration,
) -> Result<usize, VaultError> {
    let mut attempt = 0;
    loop {
        match client.refresh_cache().await {
            Ok(count) => return Ok(count),
            Err(e) if attempt < retries => {
                attempt += 1;
                warn!(
                    attempt = attempt,
                    retries = retries,
                    "Cache refresh failed: {}, retrying in {}s",
                    e,
                    pause.as_secs()
                );
                tokio::time::sleep(pause).await;
                if let Err(e) = client.re_authenticate().await {
                    warn!("Re-authentication before cache refresh failed: {}", e);
                }
            }
            Err(e) => return Err(e),
        }
    }
}

/// Refresh every `CACHE_REFRESH_INTERVAL_SECS`, starting one interval from now
pub fn spawn_cache_refresh(client: Arc<VaultClient>, config: &ControllerConfig) -> JoinHandle<()> {
    // tokio intervals panic on a zero period
    let period = config.cache_refresh_interval().max(Duration::from_secs(1));
    let retries = config.cache_refresh_retries;
    let pause = config.cache_refresh_retry_interval();

    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("Refreshing Passbolt name cache every {}s", period.as_secs());
        loop {
            ticker.tick().await;
            match refresh_with_retries(&client, retries, pause).await {
                Ok(count) => info!("Refreshed {} Passbolt resource names", count),
                Err(e) => error!(
                    "Cache refresh failed after {} attempts, keeping previous mappings: {}",
                    retries.saturating_add(1),
                    e
                ),
            }
        }
    })
}
