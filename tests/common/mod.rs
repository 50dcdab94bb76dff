//! Shared fakes for the integration tests.
//!
//! `FakeResolver` stands in for the Passbolt client, `FakeStore` for the Kubernetes API.
#![allow(dead_code)]

use async_trait::async_trait;
use passbolt_secret_controller::config::ControllerConfig;
use passbolt_secret_controller::controller::reconciler::{
    Reconciler, SecretStore, StoreError, WriteOutcome,
};
use passbolt_secret_controller::controller::render::RenderedSecret;
use passbolt_secret_controller::crd::{PassboltSecret, PassboltSecretStatus};
use passbolt_secret_controller::observability::ControllerMetrics;
use passbolt_secret_controller::provider::{ResolvedSecret, SecretResolver, VaultError};
use prometheus::Registry;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use zeroize::Zeroizing;

pub fn record(id: &str, name: &str, username: &str, password: &str, uri: &str) -> ResolvedSecret {
    ResolvedSecret {
        id: id.to_string(),
        name: name.to_string(),
        username: username.to_string(),
        uri: uri.to_string(),
        password: Zeroizing::new(password.to_string()),
        description: String::new(),
        folder_parent_id: String::new(),
    }
}

/// What the fake vault answers for one ID
#[derive(Clone)]
pub enum Entry {
    Found(ResolvedSecret),
    SessionExpired,
    Panic,
    /// Answer only after this long
    Slow(Duration),
}

/// In-process vault counting every resolution
#[derive(Default)]
pub struct FakeResolver {
    entries: BTreeMap<String, Entry>,
    calls: AtomicUsize,
    relogins: AtomicUsize,
    /// Resolutions beyond this fail the test
    max_calls: Option<usize>,
}

impl FakeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, id: &str, entry: Entry) -> Self {
        self.entries.insert(id.to_string(), entry);
        self
    }

    pub fn with_record(self, record: ResolvedSecret) -> Self {
        let id = record.id.clone();
        self.with(&id, Entry::Found(record))
    }

    pub fn at_most(mut self, calls: usize) -> Self {
        self.max_calls = Some(calls);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn relogins(&self) -> usize {
        self.relogins.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SecretResolver for FakeResolver {
    async fn resolve(&self, id: &str) -> Result<ResolvedSecret, VaultError> {
        let calls = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(max) = self.max_calls {
            assert!(calls <= max, "resolved {calls} times, expected at most {max}");
        }
        match self.entries.get(id) {
            Some(Entry::Found(record)) => Ok(record.clone()),
            Some(Entry::SessionExpired) => Err(VaultError::SessionExpired),
            Some(Entry::Panic) => panic!("resolver exploded on {id}"),
            Some(Entry::Slow(delay)) => {
                tokio::time::sleep(*delay).await;
                Err(VaultError::NotFound(id.to_string()))
            }
            None => Err(VaultError::NotFound(id.to_string())),
        }
    }

    async fn re_authenticate(&self) -> Result<(), VaultError> {
        self.relogins.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Records every Secret write and status patch
pub struct FakeStore {
    pub outcome: WriteOutcome,
    pub fail_writes: bool,
    pub fail_status: bool,
    pub writes: Mutex<Vec<RenderedSecret>>,
    pub statuses: Mutex<Vec<PassboltSecretStatus>>,
}

impl FakeStore {
    pub fn new(outcome: WriteOutcome) -> Self {
        Self {
            outcome,
            fail_writes: false,
            fail_status: false,
            writes: Mutex::new(Vec::new()),
            statuses: Mutex::new(Vec::new()),
        }
    }

    pub fn writes(&self) -> Vec<RenderedSecret> {
        self.writes.lock().unwrap().clone()
    }

    pub fn statuses(&self) -> Vec<PassboltSecretStatus> {
        self.statuses.lock().unwrap().clone()
    }
}

#[async_trait]
impl SecretStore for FakeStore {
    async fn apply_secret(
        &self,
        owner: &PassboltSecret,
        rendered: &RenderedSecret,
    ) -> Result<WriteOutcome, StoreError> {
        if self.fail_writes {
            return Err(StoreError::AlreadyOwned(
                owner.metadata.name.clone().unwrap_or_default(),
                "ExternalSecret/other".to_string(),
            ));
        }
        self.writes.lock().unwrap().push(rendered.clone());
        Ok(self.outcome)
    }

    async fn patch_status(
        &self,
        _owner: &PassboltSecret,
        status: &PassboltSecretStatus,
    ) -> Result<(), StoreError> {
        if self.fail_status {
            return Err(StoreError::MissingMetadata("uid"));
        }
        self.statuses.lock().unwrap().push(status.clone());
        Ok(())
    }
}

pub fn test_config() -> ControllerConfig {
    ControllerConfig {
        failure_ceiling: 3,
        backoff_base_secs: 5,
        backoff_max_secs: 300,
        resync_interval_secs: 300,
        pass_timeout_secs: 1,
        ..ControllerConfig::default()
    }
}

pub fn reconciler(
    resolver: Arc<FakeResolver>,
    store: Arc<FakeStore>,
    config: ControllerConfig,
) -> Arc<Reconciler> {
    let registry = Registry::new();
    let metrics = ControllerMetrics::new(&registry).unwrap();
    Arc::new(Reconciler::new(
        resolver as Arc<dyn SecretResolver>,
        store as Arc<dyn SecretStore>,
        config,
        metrics,
    ))
}

/// Parse a `v1` object from YAML and stamp name, namespace and generation on it
pub fn object(yaml: &str, generation: i64) -> PassboltSecret {
    let mut obj: PassboltSecret = serde_yaml::from_str(yaml).unwrap();
    obj.metadata.name.get_or_insert_with(|| "app".to_string());
    obj.metadata.namespace.get_or_insert_with(|| "apps".to_string());
    obj.metadata.generation = Some(generation);
    obj
}
