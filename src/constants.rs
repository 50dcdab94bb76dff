//! # Constants
//!
//! Shared constants used throughout the controller.
//!
//! These values represent reasonable defaults and can be overridden via
//! configuration or environment variables where applicable.

/// Field manager used for Secret writes and status patches
pub const FIELD_MANAGER: &str = "passbolt-secret-controller";

/// Default HTTP server port for metrics, health probes and webhooks
pub const DEFAULT_METRICS_PORT: u16 = 5000;

/// Default HTTP server startup timeout (how long to wait for server to be ready)
pub const DEFAULT_SERVER_STARTUP_TIMEOUT_SECS: u64 = 10;

/// Default HTTP server readiness poll interval
pub const DEFAULT_SERVER_POLL_INTERVAL_MS: u64 = 50;

/// Deadline for the initial Passbolt login plus first cache load (seconds)
pub const DEFAULT_STARTUP_TIMEOUT_SECS: u64 = 5;

/// Upper bound on a single reconciliation pass (seconds)
pub const DEFAULT_PASS_TIMEOUT_SECS: u64 = 30;

/// Interval between name cache refreshes (seconds)
pub const DEFAULT_CACHE_REFRESH_INTERVAL_SECS: u64 = 300;

/// Extra attempts after a failed cache refresh
pub const DEFAULT_CACHE_REFRESH_RETRIES: u32 = 3;

/// Pause between cache refresh attempts (seconds)
pub const DEFAULT_CACHE_REFRESH_RETRY_INTERVAL_SECS: u64 = 10;

/// Consecutive failed passes after which an object is no longer synced
pub const DEFAULT_FAILURE_CEILING: u32 = 3;

/// Base of the `base * 2^failures` requeue hint (seconds)
pub const DEFAULT_BACKOFF_BASE_SECS: u64 = 5;

/// Cap of the requeue hint (seconds)
pub const DEFAULT_BACKOFF_MAX_SECS: u64 = 300;

/// Slack when comparing a requeue against the stored `nextReconcileTime` (seconds)
pub const NEXT_RECONCILE_TOLERANCE_SECS: i64 = 1;

/// Requeue interval after a successful pass (seconds)
///
/// Picks up changes made on the Passbolt side, which emit no Kubernetes events.
pub const DEFAULT_RESYNC_INTERVAL_SECS: u64 = 300;

/// Default requeue interval for errors that never reached the status model (seconds)
pub const DEFAULT_RECONCILIATION_ERROR_REQUEUE_SECS: u64 = 30;

/// Default delay before restarting watch stream after unknown errors (seconds)
pub const DEFAULT_WATCH_RESTART_DELAY_SECS: u64 = 5;

/// Data key of a `kubernetes.io/dockerconfigjson` Secret
pub const DOCKER_CONFIG_JSON_KEY: &str = ".dockerconfigjson";

/// Cache key prefix for the reverse (identifier -> name) direction
pub const REVERSE_KEY_PREFIX: &str = "id/";

/// Timeout of a single Passbolt HTTP request (seconds)
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Initial pause after a throttled watch (milliseconds)
pub const WATCH_BACKOFF_START_MS: u64 = 1_000;

/// Cap of the throttled watch pause (milliseconds)
pub const WATCH_BACKOFF_MAX_MS: u64 = 30_000;

/// Annotation listing the keys of a `v1alpha2` object that hold plain text fields
///
/// Comma separated. Written when converting down to `v1alpha2`, consumed on the way up.
pub const PLAIN_TEXT_KEYS_ANNOTATION: &str = "passbolt.tagesspiegel.de/plain-text-keys";
