//! # Passbolt HTTP API
//!
//! GPGAuth login and the JSON resource endpoints over `reqwest`.
//!
//! Login is a two-step challenge: the server answers the key fingerprint with an
//! encrypted token, the client posts the decrypted token back and receives the
//! `passbolt_session` cookie.

use super::api::{into_record, Envelope, SecretData};
use super::{MessageCrypto, PassboltApi, Resource, ResolvedSecret, Session, VaultError};
use async_trait::async_trait;
use reqwest::header::{COOKIE, SET_COOKIE};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

const USER_AUTH_TOKEN_HEADER: &str = "X-GPGAuth-User-Auth-Token";
const AUTHENTICATED_HEADER: &str = "X-GPGAuth-Authenticated";
const SESSION_COOKIE: &str = "passbolt_session";

#[derive(Debug)]
pub struct PassboltHttpApi<C> {
    client: reqwest::Client,
    base_url: String,
    crypto: C,
}

impl<C: MessageCrypto> PassboltHttpApi<C> {
    #[allow(clippy::missing_errors_doc, reason = "TLS backend initialisation")]
    pub fn new(base_url: &str, crypto: C, timeout: Duration) -> Result<Self, VaultError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            crypto,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        session: &Session,
        path: &str,
    ) -> Result<T, VaultError> {
        let response = self
            .client
            .get(self.url(path))
            .header(COOKIE, session.cookie_header())
            .send()
            .await?;
        let response = check_status(response, path)?;
        let envelope: Envelope<T> = response
            .json()
            .await
            .map_err(|e| VaultError::Decode(format!("{path}: {e}")))?;
        Ok(envelope.body)
    }
}

#[async_trait]
impl<C: MessageCrypto> PassboltApi for PassboltHttpApi<C> {
    async fn login(&self) -> Result<Session, VaultError> {
        let fingerprint = self.crypto.fingerprint().to_string();
        let challenge = self
            .client
            .post(self.url("/auth/login.json"))
            .json(&json!({ "gpg_auth": { "keyid": fingerprint } }))
            .send()
            .await?;
        let encrypted_token = challenge
            .headers()
            .get(USER_AUTH_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                VaultError::Auth(format!(
                    "no {USER_AUTH_TOKEN_HEADER} header (HTTP {})",
                    challenge.status()
                ))
            })?;
        let encrypted_token = urlencoding::decode(encrypted_token)
            .map_err(|e| VaultError::Auth(format!("malformed user auth token: {e}")))?
            .replace("\\+", " ");
        let token = self.crypto.decrypt(&encrypted_token).await?;
        debug!("Answering GPGAuth challenge for key {}", fingerprint);

        let response = self
            .client
            .post(self.url("/auth/login.json"))
            .json(&json!({
                "gpg_auth": { "keyid": fingerprint, "user_token_result": token.as_str() }
            }))
            .send()
            .await?;
        let authenticated = response
            .headers()
            .get(AUTHENTICATED_HEADER)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.eq_ignore_ascii_case("true"));
        if !authenticated {
            return Err(VaultError::Auth(format!(
                "challenge rejected (HTTP {})",
                response.status()
            )));
        }

        response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find_map(session_cookie)
            .map(Session::new)
            .ok_or_else(|| VaultError::Auth(format!("no {SESSION_COOKIE} cookie in login response")))
    }

    async fn list_resources(&self, session: &Session) -> Result<Vec<Resource>, VaultError> {
        self.get_json(session, "/resources.json").await
    }

    async fn get_resource(&self, session: &Session, id: &str) -> Result<ResolvedSecret, VaultError> {
        let encoded = urlencoding::encode(id);
        let resource: Resource = self
            .get_json(session, &format!("/resources/{encoded}.json"))
            .await
            .map_err(|e| not_found_as(e, id))?;
        let secret: SecretData = self
            .get_json(session, &format!("/secrets/resource/{encoded}.json"))
            .await
            .map_err(|e| not_found_as(e, id))?;
        let plaintext = self.crypto.decrypt(&secret.data).await?;
        Ok(into_record(resource, &plaintext))
    }

    async fn logout(&self, session: &Session) -> Result<(), VaultError> {
        let response = self
            .client
            .get(self.url("/auth/logout.json"))
            .header(COOKIE, session.cookie_header())
            .send()
            .await?;
        check_status(response, "/auth/logout.json").map(|_| ())
    }
}

fn check_status(response: Response, path: &str) -> Result<Response, VaultError> {
    match response.status() {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(VaultError::SessionExpired),
        status if !status.is_success() => Err(VaultError::Status {
            path: path.to_string(),
            status: status.as_u16(),
        }),
        _ => Ok(response),
    }
}

fn not_found_as(error: VaultError, id: &str) -> VaultError {
    match error {
        VaultError::Status { status: 404, .. } => VaultError::NotFound(id.to_string()),
        other => other,
    }
}

/// Value of `passbolt_session` in one `Set-Cookie` header
fn session_cookie(header: &str) -> Option<String> {
    let pair = header.split(';').next()?.trim();
    let (name, value) = pair.split_once('=')?;
    (name == SESSION_COOKIE && !value.is_empty()).then(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cookie() {
        assert_eq!(
            session_cookie("passbolt_session=abc123; path=/; HttpOnly").as_deref(),
            Some("abc123")
        );
        assert_eq!(session_cookie("csrfToken=xyz; path=/"), None);
        assert_eq!(session_cookie("passbolt_session=; path=/"), None);
    }
}
