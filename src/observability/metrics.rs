//! # Metrics
//!
//! Prometheus metrics for monitoring the controller.
//!
//! Metric handles are plain values registered into a caller-supplied [`Registry`]
//! and handed to the components that record them, so tests can build as many
//! isolated instances as they like.
//!
//! ## Metrics Exposed
//!
//! - `passbolt_secret_get_attempts_total` - Secret fetches from Passbolt
//! - `passbolt_secret_get_failure_attempts_total` - Failed secret fetches
//! - `passbolt_login_attempts_total` - Logins, initial and repeated
//! - `passbolt_login_failures_total` - Failed logins
//! - `passbolt_relogins_total` - Re-authentication attempts
//! - `passbolt_relogin_errors_total` - Failed re-authentication attempts
//! - `passbolt_cache_sync_total` - Name cache refreshes
//! - `passbolt_cache_sync_errors_total` - Failed name cache refreshes
//! - `passbolt_secret_reconciliations_total` - Reconciliation passes
//! - `passbolt_secret_reconciliation_errors_total` - Failed passes by error kind
//! - `passbolt_secret_reconciliation_duration_seconds` - Pass duration
//! - `passbolt_secret_writes_total` - Secret writes by outcome

use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry};

/// Counters recorded by the Passbolt client
#[derive(Debug, Clone)]
pub struct VaultMetrics {
    secret_get_attempts: IntCounter,
    secret_get_failures: IntCounter,
    login_attempts: IntCounter,
    login_failures: IntCounter,
    relogins: IntCounter,
    relogin_errors: IntCounter,
    cache_syncs: IntCounter,
    cache_sync_errors: IntCounter,
}

impl VaultMetrics {
    /// Create the counters and register them into `registry`
    #[allow(
        clippy::missing_errors_doc,
        reason = "Fails only on duplicate registration"
    )]
    pub fn new(registry: &Registry) -> prometheus::Result<Self> {
        let metrics = Self {
            secret_get_attempts: IntCounter::new(
                "passbolt_secret_get_attempts_total",
                "Number of attempts to get a secret from passbolt",
            )?,
            secret_get_failures: IntCounter::new(
                "passbolt_secret_get_failure_attempts_total",
                "Number of failure attempts to get a secret from passbolt",
            )?,
            login_attempts: IntCounter::new(
                "passbolt_login_attempts_total",
                "Number of login attempts to passbolt",
            )?,
            login_failures: IntCounter::new(
                "passbolt_login_failures_total",
                "Number of failed login attempts to passbolt",
            )?,
            relogins: IntCounter::new(
                "passbolt_relogins_total",
                "Number of re-login attempts to passbolt",
            )?,
            relogin_errors: IntCounter::new(
                "passbolt_relogin_errors_total",
                "Number of re-login error attempts to passbolt",
            )?,
            cache_syncs: IntCounter::new(
                "passbolt_cache_sync_total",
                "Number of cache syncs with passbolt",
            )?,
            cache_sync_errors: IntCounter::new(
                "passbolt_cache_sync_errors_total",
                "Number of cache sync errors",
            )?,
        };
        registry.register(Box::new(metrics.secret_get_attempts.clone()))?;
        registry.register(Box::new(metrics.secret_get_failures.clone()))?;
        registry.register(Box::new(metrics.login_attempts.clone()))?;
        registry.register(Box::new(metrics.login_failures.clone()))?;
        registry.register(Box::new(metrics.relogins.clone()))?;
        registry.register(Box::new(metrics.relogin_errors.clone()))?;
        registry.register(Box::new(metrics.cache_syncs.clone()))?;
        registry.register(Box::new(metrics.cache_sync_errors.clone()))?;
        Ok(metrics)
    }

    pub fn increment_secret_get_attempts(&self) {
        self.secret_get_attempts.inc();
    }

    pub fn increment_secret_get_failures(&self) {
        self.secret_get_failures.inc();
    }

    pub fn increment_login_attempts(&self) {
        self.login_attempts.inc();
    }

    pub fn increment_login_failures(&self) {
        self.login_failures.inc();
    }

    pub fn increment_relogins(&self) {
        self.relogins.inc();
    }

    pub fn increment_relogin_errors(&self) {
        self.relogin_errors.inc();
    }

    pub fn increment_cache_syncs(&self) {
        self.cache_syncs.inc();
    }

    pub fn increment_cache_sync_errors(&self) {
        self.cache_sync_errors.inc();
    }

    pub fn secret_get_attempts(&self) -> u64 {
        self.secret_get_attempts.get()
    }

    pub fn secret_get_failures(&self) -> u64 {
        self.secret_get_failures.get()
    }

    pub fn login_attempts(&self) -> u64 {
        self.login_attempts.get()
    }

    pub fn login_failures(&self) -> u64 {
        self.login_failures.get()
    }

    pub fn relogins(&self) -> u64 {
        self.relogins.get()
    }

    pub fn relogin_errors(&self) -> u64 {
        self.relogin_errors.get()
    }

    pub fn cache_syncs(&self) -> u64 {
        self.cache_syncs.get()
    }

    pub fn cache_sync_errors(&self) -> u64 {
        self.cache_sync_errors.get()
    }
}

/// Counters recorded by the reconciler
#[derive(Debug, Clone)]
pub struct ControllerMetrics {
    reconciliations: IntCounter,
    reconciliation_errors: IntCounterVec,
    reconciliation_duration: Histogram,
    secret_writes: IntCounterVec,
}

impl ControllerMetrics {
    #[allow(
        clippy::missing_errors_doc,
        reason = "Fails only on duplicate registration"
    )]
    pub fn new(registry: &Registry) -> prometheus::Result<Self> {
        let metrics = Self {
            reconciliations: IntCounter::new(
                "passbolt_secret_reconciliations_total",
                "Total number of reconciliation passes",
            )?,
            reconciliation_errors: IntCounterVec::new(
                Opts::new(
                    "passbolt_secret_reconciliation_errors_total",
                    "Total number of failed reconciliation passes by error kind",
                ),
                &["kind"],
            )?,
            reconciliation_duration: Histogram::with_opts(
                HistogramOpts::new(
                    "passbolt_secret_reconciliation_duration_seconds",
                    "Duration of reconciliation passes in seconds",
                )
                .buckets(vec![0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]),
            )?,
            secret_writes: IntCounterVec::new(
                Opts::new(
                    "passbolt_secret_writes_total",
                    "Total number of Kubernetes Secret writes by outcome",
                ),
                &["outcome"],
            )?,
        };
        registry.register(Box::new(metrics.reconciliations.clone()))?;
        registry.register(Box::new(metrics.reconciliation_errors.clone()))?;
        registry.register(Box::new(metrics.reconciliation_duration.clone()))?;
        registry.register(Box::new(metrics.secret_writes.clone()))?;
        Ok(metrics)
    }

    pub fn increment_reconciliations(&self) {
        self.reconciliations.inc();
    }

    pub fn increment_reconciliation_errors(&self, kind: &str) {
        self.reconciliation_errors.with_label_values(&[kind]).inc();
    }

    pub fn observe_reconciliation_duration(&self, seconds: f64) {
        self.reconciliation_duration.observe(seconds);
    }

    pub fn increment_secret_writes(&self, outcome: &str) {
        self.secret_writes.with_label_values(&[outcome]).inc();
    }

    pub fn reconciliations(&self) -> u64 {
        self.reconciliations.get()
    }

    pub fn reconciliation_errors(&self, kind: &str) -> u64 {
        self.reconciliation_errors.with_label_values(&[kind]).get()
    }
}

/// Registry plus every metric family the controller records
#[derive(Debug, Clone)]
pub struct Metrics {
    pub registry: Registry,
    pub vault: VaultMetrics,
    pub controller: ControllerMetrics,
}

impl Metrics {
    /// Build a fresh registry with all metrics registered
    #[allow(
        clippy::missing_errors_doc,
        reason = "Fails only on duplicate registration"
    )]
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();
        let vault = VaultMetrics::new(&registry)?;
        let controller = ControllerMetrics::new(&registry)?;
        Ok(Self {
            registry,
            vault,
            controller,
        })
    }
}
