//! # Passbolt Client Tests
//!
//! Exercises the HTTP client against a mock Passbolt server: GPGAuth login, resource
//! retrieval, error mapping, cache refresh and the cache-only name lookups.

use async_trait::async_trait;
use passbolt_secret_controller::cache::{CacheError, Cacher, InMemoryCache};
use passbolt_secret_controller::observability::VaultMetrics;
use passbolt_secret_controller::provider::passbolt::{
    MessageCrypto, PassboltApi, PassboltHttpApi, Session, VaultClient,
};
use passbolt_secret_controller::provider::{SecretResolver, VaultError};
use passbolt_secret_controller::runtime::cache_refresh::refresh_with_retries;
use prometheus::Registry;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zeroize::Zeroizing;

const FINGERPRINT: &str = "03F60E958F4CB29723ACDF761353B5B15D9B054F";

/// "Encryption" is an `ENC:` prefix
#[derive(Debug)]
struct PrefixCrypto;

#[async_trait]
impl MessageCrypto for PrefixCrypto {
    fn fingerprint(&self) -> &str {
        FINGERPRINT
    }

    async fn decrypt(&self, armored: &str) -> Result<Zeroizing<String>, VaultError> {
        armored
            .strip_prefix("ENC:")
            .map(|plain| Zeroizing::new(plain.to_string()))
            .ok_or_else(|| VaultError::Crypto("not encrypted".to_string()))
    }
}

fn api(server: &MockServer) -> PassboltHttpApi<PrefixCrypto> {
    PassboltHttpApi::new(&server.uri(), PrefixCrypto, Duration::from_secs(5)).unwrap()
}

fn envelope(body: serde_json::Value) -> serde_json::Value {
    json!({ "header": { "status": "success" }, "body": body })
}

async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/auth/login.json"))
        .and(body_partial_json(json!({
            "gpg_auth": { "keyid": FINGERPRINT, "user_token_result": "gpgauthv1.3.0|36|token" }
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-GPGAuth-Authenticated", "true")
                .insert_header("Set-Cookie", "passbolt_session=abc123; path=/; HttpOnly"),
        )
        .with_priority(1)
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/login.json"))
        .and(body_partial_json(json!({ "gpg_auth": { "keyid": FINGERPRINT } })))
        .respond_with(
            ResponseTemplate::new(200).insert_header(
                "X-GPGAuth-User-Auth-Token",
                "ENC%3Agpgauthv1.3.0%7C36%7Ctoken",
            ),
        )
        .mount(server)
        .await;
}

async fn mount_resource(server: &MockServer, id: &str, name: &str, payload: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/resources/{id}.json")))
        .and(header("Cookie", "passbolt_session=abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!({
            "id": id,
            "name": name,
            "username": "guest",
            "uri": "localhost:5672",
            "description": "metadata description",
            "folder_parent_id": null
        }))))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/secrets/resource/{id}.json")))
        .and(header("Cookie", "passbolt_session=abc123"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(envelope(json!({ "data": format!("ENC:{payload}") }))),
        )
        .mount(server)
        .await;
}

fn vault_client(api: impl PassboltApi + 'static) -> (VaultClient, Arc<InMemoryCache>, VaultMetrics) {
    let cache = Arc::new(InMemoryCache::new());
    let metrics = VaultMetrics::new(&Registry::new()).unwrap();
    let client = VaultClient::new(
        Arc::new(api),
        Arc::clone(&cache) as Arc<dyn Cacher>,
        metrics.clone(),
    );
    (client, cache, metrics)
}

#[tokio::test]
async fn test_login_answers_challenge_and_keeps_cookie() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    let session = api(&server).login().await.unwrap();
    assert_eq!(session.cookie_header(), "passbolt_session=abc123");
}

#[tokio::test]
async fn test_rejected_challenge_is_an_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login.json"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let err = api(&server).login().await.unwrap_err();
    assert!(matches!(err, VaultError::Auth(_)));
    assert!(err.is_authentication());
}

#[tokio::test]
async fn test_rejected_initial_login_is_metered() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login.json"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;
    let (client, _, metrics) = vault_client(api(&server));

    assert!(client.authenticate().await.is_err());
    assert_eq!(metrics.login_attempts(), 1);
    assert_eq!(metrics.login_failures(), 1);
    assert_eq!(metrics.relogins(), 0);
}

#[tokio::test]
async fn test_get_resource_merges_metadata_and_secret() {
    let server = MockServer::start().await;
    mount_resource(&server, "id-1", "APP_AMQP", "guest").await;

    let record = api(&server)
        .get_resource(&Session::new("abc123"), "id-1")
        .await
        .unwrap();
    assert_eq!(record.id, "id-1");
    assert_eq!(record.name, "APP_AMQP");
    assert_eq!(record.username, "guest");
    assert_eq!(record.password.as_str(), "guest");
    assert_eq!(record.description, "metadata description");
}

#[tokio::test]
async fn test_encrypted_description_wins() {
    let server = MockServer::start().await;
    mount_resource(
        &server,
        "id-2",
        "APP_DB",
        r#"{"password":"s3cret","description":"encrypted description"}"#,
    )
    .await;

    let record = api(&server)
        .get_resource(&Session::new("abc123"), "id-2")
        .await
        .unwrap();
    assert_eq!(record.password.as_str(), "s3cret");
    assert_eq!(record.description, "encrypted description");
}

#[tokio::test]
async fn test_status_codes_are_mapped() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/resources/gone.json"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/resources/expired.json"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/resources/broken.json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let api = api(&server);
    let session = Session::new("abc123");
    assert!(matches!(
        api.get_resource(&session, "gone").await,
        Err(VaultError::NotFound(id)) if id == "gone"
    ));
    assert!(matches!(
        api.get_resource(&session, "expired").await,
        Err(VaultError::SessionExpired)
    ));
    assert!(matches!(
        api.get_resource(&session, "broken").await,
        Err(VaultError::Status { status: 500, .. })
    ));
}

#[tokio::test]
async fn test_resolve_without_session_fails_fast() {
    let server = MockServer::start().await;
    let (client, _, metrics) = vault_client(api(&server));

    let err = client.resolve("id-1").await.unwrap_err();
    assert!(err.is_session_expired());
    assert_eq!(metrics.secret_get_failures(), 1);
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_relogin_restores_resolution() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    mount_resource(&server, "id-1", "APP_AMQP", "guest").await;
    let (client, _, metrics) = vault_client(api(&server));

    client.re_authenticate().await.unwrap();
    let record = client.resolve("id-1").await.unwrap();
    assert_eq!(record.password.as_str(), "guest");
    assert_eq!(metrics.relogins(), 1);
    assert_eq!(metrics.login_attempts(), 1);
    assert_eq!(metrics.secret_get_attempts(), 1);
    assert_eq!(metrics.secret_get_failures(), 0);
}

#[tokio::test]
async fn test_name_lookups_never_reach_passbolt() {
    let server = MockServer::start().await;
    let (client, _, _) = vault_client(api(&server));

    assert!(matches!(
        client.identifier_for_name("APP_EXAMPLE").await,
        Err(CacheError::NotFound(_))
    ));
    assert!(matches!(
        client.name_for_identifier("id-1").await,
        Err(CacheError::NotFound(_))
    ));
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_refresh_populates_both_directions() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    Mock::given(method("GET"))
        .and(path("/resources.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!([
            { "id": "id-1", "name": "APP_AMQP" },
            { "id": "id-2", "name": "APP_DB" }
        ]))))
        .mount(&server)
        .await;
    let (client, cache, metrics) = vault_client(api(&server));
    client.authenticate().await.unwrap();

    assert_eq!(client.refresh_cache().await.unwrap(), 2);
    assert_eq!(client.identifier_for_name("APP_DB").await.unwrap(), "id-2");
    assert_eq!(client.name_for_identifier("id-1").await.unwrap(), "APP_AMQP");
    assert_eq!(cache.len(), 4);
    assert_eq!(metrics.cache_syncs(), 1);
}

#[tokio::test]
async fn test_refresh_retries_after_relogin() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    Mock::given(method("GET"))
        .and(path("/resources.json"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/resources.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(envelope(json!([{ "id": "id-1", "name": "APP_AMQP" }]))),
        )
        .mount(&server)
        .await;
    let (client, _, metrics) = vault_client(api(&server));
    client.authenticate().await.unwrap();

    let count = refresh_with_retries(&client, 2, Duration::ZERO).await.unwrap();
    assert_eq!(count, 1);
    assert_eq!(metrics.cache_syncs(), 2);
    assert_eq!(metrics.cache_sync_errors(), 1);
    assert_eq!(metrics.relogins(), 1);
}

#[tokio::test]
async fn test_refresh_gives_up_and_keeps_previous_mappings() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    Mock::given(method("GET"))
        .and(path("/resources.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(envelope(json!([{ "id": "id-1", "name": "APP_AMQP" }]))),
        )
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/resources.json"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    let (client, _, metrics) = vault_client(api(&server));
    client.authenticate().await.unwrap();
    client.refresh_cache().await.unwrap();

    let err = refresh_with_retries(&client, 2, Duration::ZERO).await.unwrap_err();
    assert!(matches!(err, VaultError::Status { status: 503, .. }));
    assert_eq!(metrics.cache_syncs(), 4);
    assert_eq!(metrics.cache_sync_errors(), 3);
    assert_eq!(client.identifier_for_name("APP_AMQP").await.unwrap(), "id-1");
}
