//! # Provider Modules
//!
//! Vault providers the rendering engine resolves references against.
//!
//! The only provider is Passbolt. The reconciler depends on [`SecretResolver`] alone so
//! tests can substitute an in-process fake.

use async_trait::async_trait;

pub mod passbolt;

pub use passbolt::{ResolvedSecret, VaultError};

/// Resolves a stable vault identifier to its full record
#[async_trait]
pub trait SecretResolver: Send + Sync {
    /// Fetch one record straight from the vault. Values are never cached.
    async fn resolve(&self, id: &str) -> Result<ResolvedSecret, VaultError>;

    /// Establish a fresh session after a suspected expiry
    async fn re_authenticate(&self) -> Result<(), VaultError>;
}
