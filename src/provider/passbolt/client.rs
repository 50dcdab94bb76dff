//! # Vault Client
//!
//! Session owner and metering layer in front of a [`PassboltApi`].
//!
//! Resolutions share the session under a read lock; logins take the write lock, so a
//! re-authentication waits for in-flight calls and blocks new ones until it is done.

use super::{PassboltApi, Resource, ResolvedSecret, Session, VaultError};
use crate::cache::{CacheError, Cacher};
use crate::constants::REVERSE_KEY_PREFIX;
use crate::conversion::{CacheLookup, NameLookup};
use crate::observability::VaultMetrics;
use crate::provider::SecretResolver;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

pub struct VaultClient {
    api: Arc<dyn PassboltApi>,
    session: RwLock<Option<Session>>,
    cache: Arc<dyn Cacher>,
    /// `name -> id` pairs written by the last successful refresh
    snapshot: Mutex<BTreeMap<String, String>>,
    metrics: VaultMetrics,
}

impl std::fmt::Debug for VaultClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultClient")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl VaultClient {
    /// Create a client without logging in
    pub fn new(api: Arc<dyn PassboltApi>, cache: Arc<dyn Cacher>, metrics: VaultMetrics) -> Self {
        Self {
            api,
            session: RwLock::new(None),
            cache,
            snapshot: Mutex::new(BTreeMap::new()),
            metrics,
        }
    }

    /// Create a client and log in
    #[allow(clippy::missing_errors_doc, reason = "See VaultError")]
    pub async fn connect(
        api: Arc<dyn PassboltApi>,
        cache: Arc<dyn Cacher>,
        metrics: VaultMetrics,
    ) -> Result<Self, VaultError> {
        let client = Self::new(api, cache, metrics);
        client.authenticate().await?;
        Ok(client)
    }

    #[allow(clippy::missing_errors_doc, reason = "See VaultError")]
    pub async fn authenticate(&self) -> Result<(), VaultError> {
        self.metrics.increment_login_attempts();
        let mut session = self.session.write().await;
        match self.api.login().await {
            Ok(fresh) => {
                *session = Some(fresh);
                info!("Logged in to Passbolt");
                Ok(())
            }
            Err(e) => {
                self.metrics.increment_login_failures();
                Err(e)
            }
        }
    }

    /// Enumerate every resource and replace the name/ID mappings in the cache
    ///
    /// Nothing is written unless the enumeration succeeds. Names that disappeared since
    /// the previous refresh are removed. When two resources share a name the last one
    /// listed wins.
    ///
    /// A cache backend failure while writing rolls the cache back to the previous
    /// mappings. The rollback is best effort: a backend that keeps failing may be left
    /// with a mix of both until the next successful refresh.
    #[allow(clippy::missing_errors_doc, reason = "See VaultError")]
    #[tracing::instrument(name = "passbolt.cache_refresh", skip(self))]
    pub async fn refresh_cache(&self) -> Result<usize, VaultError> {
        self.metrics.increment_cache_syncs();

        let resources = match self.list_resources().await {
            Ok(resources) => resources,
            Err(e) => {
                self.metrics.increment_cache_sync_errors();
                return Err(e);
            }
        };
        let next = index_by_name(resources);

        let mut snapshot = self.snapshot.lock().await;
        if let Err(e) = self.commit(&snapshot, &next).await {
            self.metrics.increment_cache_sync_errors();
            if let Err(rollback) = self.commit(&next, &snapshot).await {
                warn!("Rolling back the name cache failed: {}", rollback);
            }
            return Err(e.into());
        }
        let count = next.len();
        *snapshot = next;
        debug!(count = count, "refreshed passbolt name cache");
        Ok(count)
    }

    async fn list_resources(&self) -> Result<Vec<Resource>, VaultError> {
        let session = self.session.read().await;
        let session = session
            .as_ref()
            .ok_or_else(|| VaultError::Auth("not logged in".to_string()))?;
        self.api.list_resources(session).await
    }

    async fn commit(
        &self,
        previous: &BTreeMap<String, String>,
        next: &BTreeMap<String, String>,
    ) -> Result<(), CacheError> {
        for (name, id) in next {
            self.cache.set(name, id, Duration::ZERO).await?;
            self.cache
                .set(&format!("{REVERSE_KEY_PREFIX}{id}"), name, Duration::ZERO)
                .await?;
        }
        for (name, id) in previous {
            if !next.contains_key(name) {
                self.cache.delete(name).await?;
            }
            if !next.values().any(|v| v == id) {
                self.cache.delete(&format!("{REVERSE_KEY_PREFIX}{id}")).await?;
            }
        }
        Ok(())
    }

    /// Resource ID for a name, from the cache only
    #[allow(clippy::missing_errors_doc, reason = "Name not cached")]
    pub async fn identifier_for_name(&self, name: &str) -> Result<String, CacheError> {
        self.lookup().identifier_for_name(name).await
    }

    /// Resource name for an ID, from the cache only
    #[allow(clippy::missing_errors_doc, reason = "ID not cached")]
    pub async fn name_for_identifier(&self, id: &str) -> Result<String, CacheError> {
        self.lookup().name_for_identifier(id).await
    }

    /// Cache-backed lookup for the conversion webhook
    #[must_use]
    pub fn lookup(&self) -> CacheLookup {
        CacheLookup::new(Arc::clone(&self.cache))
    }

    /// Best effort logout
    pub async fn logout(&self) {
        let mut session = self.session.write().await;
        if let Some(current) = session.take() {
            if let Err(e) = self.api.logout(&current).await {
                warn!("Passbolt logout failed: {}", e);
            }
        }
    }
}

fn index_by_name(resources: Vec<Resource>) -> BTreeMap<String, String> {
    let mut index = BTreeMap::new();
    for resource in resources {
        if let Some(previous) = index.insert(resource.name.clone(), resource.id) {
            warn!(
                name = resource.name.as_str(),
                replaced = previous.as_str(),
                "duplicate passbolt resource name, the last one listed wins"
            );
        }
    }
    index
}

#[async_trait]
impl SecretResolver for VaultClient {
    async fn resolve(&self, id: &str) -> Result<ResolvedSecret, VaultError> {
        self.metrics.increment_secret_get_attempts();
        let session = self.session.read().await;
        let result = match session.as_ref() {
            Some(session) => self.api.get_resource(session, id).await,
            None => Err(VaultError::SessionExpired),
        };
        if result.is_err() {
            self.metrics.increment_secret_get_failures();
        }
        result
    }

    async fn re_authenticate(&self) -> Result<(), VaultError> {
        self.metrics.increment_relogins();
        let result = self.authenticate().await;
        if let Err(e) = &result {
            warn!("Passbolt re-login failed: {}", e);
            self.metrics.increment_relogin_errors();
        }
        result
    }
}
