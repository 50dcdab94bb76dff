//! # Name Cache
//!
//! Key/value store mapping Passbolt resource names to resource IDs.
//!
//! Passbolt has no search-by-name endpoint, so the controller enumerates every
//! resource on a timer and keeps the `name -> id` pairs here. Implementations are
//! interchangeable behind [`Cacher`]; the in-process [`InMemoryCache`] is the default.
//!
//! Secret values never go through this cache, only names and identifiers.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

mod in_memory;

pub use in_memory::InMemoryCache;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("key {0:?} not found in cache")]
    NotFound(String),
    #[error("cache backend unavailable: {0}")]
    Backend(String),
}

/// Capability interface for the name/identifier cache
///
/// A `ttl` of [`Duration::ZERO`] means the entry never expires. Backends that cannot
/// honour TTLs may ignore them. `delete` of a missing key succeeds.
#[async_trait]
pub trait Cacher: Send + Sync + std::fmt::Debug {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    async fn get(&self, key: &str) -> Result<String, CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}
