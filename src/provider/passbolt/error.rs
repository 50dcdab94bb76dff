use crate::cache::CacheError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("failed to login to passbolt: {0}")]
    Auth(String),

    #[error("passbolt session expired")]
    SessionExpired,

    #[error("failed to get secret from Passbolt with ID {0:?}: not found")]
    NotFound(String),

    #[error("passbolt request {path} failed with HTTP {status}")]
    Status { path: String, status: u16 },

    #[error("passbolt request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected passbolt response: {0}")]
    Decode(String),

    #[error("gpg: {0}")]
    Crypto(String),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl VaultError {
    /// The session is gone and a re-login may help
    #[must_use]
    pub fn is_session_expired(&self) -> bool {
        matches!(self, VaultError::SessionExpired)
    }

    /// Failure establishing a session rather than fetching data
    #[must_use]
    pub fn is_authentication(&self) -> bool {
        matches!(self, VaultError::Auth(_) | VaultError::SessionExpired)
    }
}
