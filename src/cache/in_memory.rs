//! # In-Memory Cache
//!
//! `RwLock`-guarded map with per-entry expiry.

use super::{CacheError, Cacher};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct CacheValue {
    value: String,
    expires_at: Option<Instant>,
}

impl CacheValue {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|at| at > now)
    }
}

/// Process-local [`Cacher`]
///
/// Reads take a shared lock, writes an exclusive one. Growth is unbounded; the
/// number of Passbolt resources is small relative to process memory.
#[derive(Debug, Default)]
pub struct InMemoryCache {
    inner: RwLock<HashMap<String, CacheValue>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired ones included
    pub fn len(&self) -> usize {
        self.inner.read().map(|map| map.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn set_with_now(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
        now: Instant,
    ) -> Result<(), CacheError> {
        let expires_at = (!ttl.is_zero()).then(|| now + ttl);
        let mut map = self
            .inner
            .write()
            .map_err(|e| CacheError::Backend(format!("lock poisoned: {e}")))?;
        map.insert(
            key.to_string(),
            CacheValue {
                value: value.to_string(),
                expires_at,
            },
        );
        Ok(())
    }

    fn get_with_now(&self, key: &str, now: Instant) -> Result<String, CacheError> {
        let map = self
            .inner
            .read()
            .map_err(|e| CacheError::Backend(format!("lock poisoned: {e}")))?;
        map.get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.value.clone())
            .ok_or_else(|| CacheError::NotFound(key.to_string()))
    }
}

#[async_trait]
impl Cacher for InMemoryCache {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        self.set_with_now(key, value, ttl, Instant::now())
    }

    async fn get(&self, key: &str) -> Result<String, CacheError> {
        self.get_with_now(key, Instant::now())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut map = self
            .inner
            .write()
            .map_err(|e| CacheError::Backend(format!("lock poisoned: {e}")))?;
        map.remove(key);
        Ok(())
    }
}
