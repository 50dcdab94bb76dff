//! # Webhook Tests
//!
//! `AdmissionReview` and `ConversionReview` round trips through the HTTP router.

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use passbolt_secret_controller::cache::{Cacher, InMemoryCache};
use passbolt_secret_controller::controller::server::{router, ServerState};
use passbolt_secret_controller::conversion::CacheLookup;
use passbolt_secret_controller::observability::Metrics;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

async fn state() -> Arc<ServerState> {
    let cache = Arc::new(InMemoryCache::new());
    cache.set("APP_DB", "id-db", Duration::ZERO).await.unwrap();
    cache.set("id/id-db", "APP_DB", Duration::ZERO).await.unwrap();
    let metrics = Metrics::new().unwrap();
    Arc::new(ServerState::new(
        metrics.registry.clone(),
        Arc::new(CacheLookup::new(cache)),
        true,
    ))
}

async fn post(uri: &str, body: Value) -> (StatusCode, Value) {
    let response = router(state().await)
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn admission_review(operation: &str, object: Value) -> Value {
    json!({
        "apiVersion": "admission.k8s.io/v1",
        "kind": "AdmissionReview",
        "request": {
            "uid": "b4a1c9a2-0f3e-4d3b-9d6c-5a8a3c1d2e4f",
            "kind": { "group": "passbolt.tagesspiegel.de", "version": "v1", "kind": "PassboltSecret" },
            "resource": { "group": "passbolt.tagesspiegel.de", "version": "v1", "resource": "passboltsecrets" },
            "requestKind": { "group": "passbolt.tagesspiegel.de", "version": "v1", "kind": "PassboltSecret" },
            "requestResource": { "group": "passbolt.tagesspiegel.de", "version": "v1", "resource": "passboltsecrets" },
            "name": "app",
            "namespace": "apps",
            "operation": operation,
            "userInfo": { "username": "admin" },
            "object": object,
            "dryRun": false
        }
    })
}

fn v1_object(spec: Value) -> Value {
    json!({
        "apiVersion": "passbolt.tagesspiegel.de/v1",
        "kind": "PassboltSecret",
        "metadata": { "name": "app", "namespace": "apps" },
        "spec": spec
    })
}

#[tokio::test]
async fn test_valid_object_is_admitted() {
    let object = v1_object(json!({
        "passboltSecrets": { "PASSWORD": { "id": "id-db", "field": "password" } }
    }));
    let (status, review) = post("/validate", admission_review("CREATE", object)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(review["response"]["uid"], "b4a1c9a2-0f3e-4d3b-9d6c-5a8a3c1d2e4f");
    assert_eq!(review["response"]["allowed"], true);
}

#[tokio::test]
async fn test_invalid_object_is_denied_with_reason() {
    let object = v1_object(json!({
        "passboltSecrets": {
            "PASSWORD": { "id": "id-db", "field": "password", "value": "{{ Password }}" }
        }
    }));
    let (_, review) = post("/validate", admission_review("UPDATE", object)).await;
    assert_eq!(review["response"]["allowed"], false);
    let message = review["response"]["status"]["message"].as_str().unwrap();
    assert!(message.contains("field and value are not allowed"), "{message}");
}

#[tokio::test]
async fn test_docker_config_without_id_is_denied() {
    let object = v1_object(json!({ "secretType": "kubernetes.io/dockerconfigjson" }));
    let (_, review) = post("/validate", admission_review("CREATE", object)).await;
    assert_eq!(review["response"]["allowed"], false);
}

#[tokio::test]
async fn test_docker_config_with_plain_text_is_denied() {
    let object = v1_object(json!({
        "secretType": "kubernetes.io/dockerconfigjson",
        "passboltSecretID": "id-db",
        "plainTextFields": { "LOG_LEVEL": "debug" }
    }));
    let (_, review) = post("/validate", admission_review("CREATE", object)).await;
    assert_eq!(review["response"]["allowed"], false);
    let message = review["response"]["status"]["message"].as_str().unwrap();
    assert!(message.contains("plain text fields are not allowed"), "{message}");
}

#[tokio::test]
async fn test_conversion_endpoint_upgrades_v1alpha1() {
    let review = json!({
        "apiVersion": "apiextensions.k8s.io/v1",
        "kind": "ConversionReview",
        "request": {
            "uid": "c0nv-1",
            "desiredAPIVersion": "passbolt.tagesspiegel.de/v1",
            "objects": [{
                "apiVersion": "passbolt.tagesspiegel.de/v1alpha1",
                "kind": "PassboltSecret",
                "metadata": { "name": "app", "namespace": "apps" },
                "spec": {
                    "secrets": [
                        { "kubernetesSecretKey": "DB_PASSWORD", "passboltSecret": { "name": "APP_DB" } }
                    ]
                }
            }]
        }
    });
    let (status, review) = post("/convert", review).await;
    assert_eq!(status, StatusCode::OK);
    let converted = &review["response"]["convertedObjects"][0];
    assert_eq!(converted["apiVersion"], "passbolt.tagesspiegel.de/v1");
    assert_eq!(converted["spec"]["passboltSecrets"]["DB_PASSWORD"]["id"], "id-db");
    assert_eq!(converted["spec"]["passboltSecrets"]["DB_PASSWORD"]["field"], "password");
}
