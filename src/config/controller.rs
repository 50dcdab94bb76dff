//! # Controller Configuration
//!
//! Controller-level settings loaded from environment variables.

use std::time::Duration;
use thiserror::Error;
use zeroize::Zeroizing;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    MissingVar(&'static str),
}

/// Controller-level configuration
///
/// All settings have sensible defaults and can be overridden via environment variables.
/// Environment variables are populated from a ConfigMap using `envFrom` in the deployment.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Port of the metrics / probes / webhook server
    pub metrics_port: u16,
    /// How long to wait for the HTTP server to bind (seconds)
    pub server_startup_timeout_secs: u64,
    /// Poll interval while waiting for the HTTP server (milliseconds)
    pub server_poll_interval_ms: u64,
    /// Deadline for initial login and cache load (seconds)
    pub startup_timeout_secs: u64,
    /// Deadline for one reconciliation pass (seconds)
    pub pass_timeout_secs: u64,
    /// Name cache refresh interval (seconds)
    pub cache_refresh_interval_secs: u64,
    /// Extra attempts after a failed cache refresh
    pub cache_refresh_retries: u32,
    /// Pause between cache refresh attempts (seconds)
    pub cache_refresh_retry_interval_secs: u64,
    /// Failed passes after which an object stops syncing until its spec changes
    pub failure_ceiling: u32,
    /// Requeue hint base (seconds)
    pub backoff_base_secs: u64,
    /// Requeue hint cap (seconds)
    pub backoff_max_secs: u64,
    /// Requeue interval after success (seconds)
    pub resync_interval_secs: u64,
    /// Requeue interval for errors that never reached the status model (seconds)
    pub reconciliation_error_requeue_secs: u64,
    /// Watch stream restart delay after unknown errors (seconds)
    pub watch_restart_delay_secs: u64,
    /// Serve `/validate` and `/convert`
    pub enable_webhooks: bool,
    /// Namespace the controller runs in
    pub controller_namespace: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        use crate::constants::*;
        Self {
            metrics_port: DEFAULT_METRICS_PORT,
            server_startup_timeout_secs: DEFAULT_SERVER_STARTUP_TIMEOUT_SECS,
            server_poll_interval_ms: DEFAULT_SERVER_POLL_INTERVAL_MS,
            startup_timeout_secs: DEFAULT_STARTUP_TIMEOUT_SECS,
            pass_timeout_secs: DEFAULT_PASS_TIMEOUT_SECS,
            cache_refresh_interval_secs: DEFAULT_CACHE_REFRESH_INTERVAL_SECS,
            cache_refresh_retries: DEFAULT_CACHE_REFRESH_RETRIES,
            cache_refresh_retry_interval_secs: DEFAULT_CACHE_REFRESH_RETRY_INTERVAL_SECS,
            failure_ceiling: DEFAULT_FAILURE_CEILING,
            backoff_base_secs: DEFAULT_BACKOFF_BASE_SECS,
            backoff_max_secs: DEFAULT_BACKOFF_MAX_SECS,
            resync_interval_secs: DEFAULT_RESYNC_INTERVAL_SECS,
            reconciliation_error_requeue_secs: DEFAULT_RECONCILIATION_ERROR_REQUEUE_SECS,
            watch_restart_delay_secs: DEFAULT_WATCH_RESTART_DELAY_SECS,
            enable_webhooks: true,
            controller_namespace: "passbolt-system".to_string(),
        }
    }
}

impl ControllerConfig {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        use crate::constants::*;
        Self {
            metrics_port: env_var_or_default("METRICS_PORT", DEFAULT_METRICS_PORT),
            server_startup_timeout_secs: env_var_or_default(
                "SERVER_STARTUP_TIMEOUT_SECS",
                DEFAULT_SERVER_STARTUP_TIMEOUT_SECS,
            ),
            server_poll_interval_ms: env_var_or_default(
                "SERVER_POLL_INTERVAL_MS",
                DEFAULT_SERVER_POLL_INTERVAL_MS,
            ),
            startup_timeout_secs: env_var_or_default(
                "STARTUP_TIMEOUT_SECS",
                DEFAULT_STARTUP_TIMEOUT_SECS,
            ),
            pass_timeout_secs: env_var_or_default("PASS_TIMEOUT_SECS", DEFAULT_PASS_TIMEOUT_SECS),
            cache_refresh_interval_secs: env_var_or_default(
                "CACHE_REFRESH_INTERVAL_SECS",
                DEFAULT_CACHE_REFRESH_INTERVAL_SECS,
            ),
            cache_refresh_retries: env_var_or_default(
                "CACHE_REFRESH_RETRIES",
                DEFAULT_CACHE_REFRESH_RETRIES,
            ),
            cache_refresh_retry_interval_secs: env_var_or_default(
                "CACHE_REFRESH_RETRY_INTERVAL_SECS",
                DEFAULT_CACHE_REFRESH_RETRY_INTERVAL_SECS,
            ),
            failure_ceiling: env_var_or_default("FAILURE_CEILING", DEFAULT_FAILURE_CEILING),
            backoff_base_secs: env_var_or_default("BACKOFF_BASE_SECS", DEFAULT_BACKOFF_BASE_SECS),
            backoff_max_secs: env_var_or_default("BACKOFF_MAX_SECS", DEFAULT_BACKOFF_MAX_SECS),
            resync_interval_secs: env_var_or_default(
                "RESYNC_INTERVAL_SECS",
                DEFAULT_RESYNC_INTERVAL_SECS,
            ),
            reconciliation_error_requeue_secs: env_var_or_default(
                "RECONCILIATION_ERROR_REQUEUE_SECS",
                DEFAULT_RECONCILIATION_ERROR_REQUEUE_SECS,
            ),
            watch_restart_delay_secs: env_var_or_default(
                "WATCH_RESTART_DELAY_SECS",
                DEFAULT_WATCH_RESTART_DELAY_SECS,
            ),
            enable_webhooks: env_var_or_default_bool("ENABLE_WEBHOOKS", true),
            controller_namespace: env_var_or_default_str("POD_NAMESPACE", "passbolt-system"),
        }
    }

    /// Get startup deadline duration
    pub fn startup_timeout(&self) -> Duration {
        Duration::from_secs(self.startup_timeout_secs)
    }

    /// Get per-pass deadline duration
    pub fn pass_timeout(&self) -> Duration {
        Duration::from_secs(self.pass_timeout_secs)
    }

    /// Get cache refresh interval duration
    pub fn cache_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.cache_refresh_interval_secs)
    }

    /// Get pause between cache refresh attempts
    pub fn cache_refresh_retry_interval(&self) -> Duration {
        Duration::from_secs(self.cache_refresh_retry_interval_secs)
    }

    /// Get resync interval duration
    pub fn resync_interval(&self) -> Duration {
        Duration::from_secs(self.resync_interval_secs)
    }

    /// Get reconciliation error requeue duration
    pub fn reconciliation_error_requeue_duration(&self) -> Duration {
        Duration::from_secs(self.reconciliation_error_requeue_secs)
    }

    /// Get watch restart delay duration
    pub fn watch_restart_delay_duration(&self) -> Duration {
        Duration::from_secs(self.watch_restart_delay_secs)
    }
}

/// Passbolt connection settings
///
/// The private key and passphrase are wiped from memory on drop and never printed.
#[derive(Clone)]
pub struct PassboltCredentials {
    /// Base URL of the Passbolt instance
    pub url: String,
    /// ASCII-armored OpenPGP private key of the operator user
    pub private_key: Zeroizing<String>,
    /// Passphrase of the private key
    pub passphrase: Zeroizing<String>,
}

impl std::fmt::Debug for PassboltCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PassboltCredentials")
            .field("url", &self.url)
            .field("private_key", &"***")
            .field("passphrase", &"***")
            .finish()
    }
}

impl PassboltCredentials {
    /// Read `PASSBOLT_URL`, `PASSBOLT_GPG` and `PASSBOLT_PASSWORD`
    pub fn from_env() -> Result<Self, ConfigError> {
        let url = required_var("PASSBOLT_URL")?;
        let private_key = Zeroizing::new(required_var("PASSBOLT_GPG")?);
        let passphrase = Zeroizing::new(required_var("PASSBOLT_PASSWORD")?);
        Ok(Self {
            url: url.trim_end_matches('/').to_string(),
            private_key,
            passphrase,
        })
    }
}

fn required_var(key: &'static str) -> Result<String, ConfigError> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::MissingVar(key))
}

/// Read environment variable or return default value
fn env_var_or_default<T: std::str::FromStr>(key: &str, default: T) -> T
where
    <T as std::str::FromStr>::Err: std::fmt::Debug,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Read environment variable as boolean or return default
fn env_var_or_default_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|v| {
            let v_lower = v.to_lowercase();
            v_lower == "true" || v_lower == "1" || v_lower == "yes" || v_lower == "on"
        })
        .unwrap_or(default)
}

/// Read environment variable as string or return default
fn env_var_or_default_str(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
