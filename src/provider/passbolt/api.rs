//! Passbolt API seam and wire types.

use super::{ResolvedSecret, VaultError};
use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;
use zeroize::Zeroizing;

/// Authenticated Passbolt session (the `passbolt_session` cookie)
#[derive(Clone)]
pub struct Session {
    cookie: Zeroizing<String>,
}

impl Session {
    pub fn new(cookie: impl Into<String>) -> Self {
        Self {
            cookie: Zeroizing::new(cookie.into()),
        }
    }

    /// Value for the `Cookie` request header
    #[must_use]
    pub fn cookie_header(&self) -> String {
        format!("passbolt_session={}", self.cookie.as_str())
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session").finish_non_exhaustive()
    }
}

/// Passbolt calls the client depends on
#[async_trait]
pub trait PassboltApi: Send + Sync {
    async fn login(&self) -> Result<Session, VaultError>;

    /// Every resource visible to the user
    async fn list_resources(&self, session: &Session) -> Result<Vec<Resource>, VaultError>;

    /// Metadata plus decrypted secret of one resource
    async fn get_resource(&self, session: &Session, id: &str) -> Result<ResolvedSecret, VaultError>;

    async fn logout(&self, session: &Session) -> Result<(), VaultError>;
}

/// `{"header": {..}, "body": ..}` envelope around every Passbolt response
#[derive(Debug, Deserialize)]
pub(super) struct Envelope<T> {
    pub body: T,
}

/// Resource metadata as listed by `/resources.json`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Resource {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub folder_parent_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct SecretData {
    pub data: String,
}

/// Decrypted secret of resource types that encrypt the description
#[derive(Deserialize)]
struct SecretPayload {
    #[serde(default)]
    password: String,
    #[serde(default)]
    description: Option<String>,
}

/// Merge resource metadata with the decrypted secret payload
///
/// The payload is either the bare password or a JSON object carrying the password and
/// an encrypted description, which takes precedence over the metadata one.
pub(super) fn into_record(resource: Resource, plaintext: &str) -> ResolvedSecret {
    let mut description = resource.description.unwrap_or_default();
    let password = match serde_json::from_str::<SecretPayload>(plaintext) {
        Ok(payload) if plaintext.trim_start().starts_with('{') => {
            if let Some(encrypted) = payload.description {
                description = encrypted;
            }
            payload.password
        }
        _ => plaintext.to_string(),
    };

    ResolvedSecret {
        id: resource.id,
        name: resource.name,
        username: resource.username.unwrap_or_default(),
        uri: resource.uri.unwrap_or_default(),
        password: Zeroizing::new(password),
        description,
        folder_parent_id: resource.folder_parent_id.unwrap_or_default(),
    }
}
