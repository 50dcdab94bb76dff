//! # CRD Validation Tests
//!
//! Parses `PassboltSecret` manifests of every generation and checks the generated
//! multi-version CRD.

use passbolt_secret_controller::crd::{
    merged_crd, v1alpha1, v1alpha2, FieldName, PassboltSecret, SecretType, SyncStatus,
    ValidationError,
};

#[test]
fn test_merged_crd_serves_all_versions_and_stores_v1() {
    let crd = merged_crd().expect("versions should merge");
    assert_eq!(crd.spec.group, "passbolt.tagesspiegel.de");
    assert_eq!(crd.spec.names.kind, "PassboltSecret");
    assert_eq!(crd.spec.names.plural, "passboltsecrets");

    let versions: Vec<&str> = crd.spec.versions.iter().map(|v| v.name.as_str()).collect();
    for version in ["v1alpha1", "v1alpha2", "v1alpha3", "v1"] {
        assert!(versions.contains(&version), "missing {version}");
    }
    for version in &crd.spec.versions {
        assert!(version.served);
        assert_eq!(version.storage, version.name == "v1");
        let has_status = version
            .subresources
            .as_ref()
            .is_some_and(|s| s.status.is_some());
        assert!(has_status, "{} has no status subresource", version.name);
    }
}

#[test]
fn test_merged_crd_renders_as_yaml() {
    let yaml = serde_yaml::to_string(&merged_crd().unwrap()).unwrap();
    assert!(yaml.contains("kind: CustomResourceDefinition"));
    assert!(yaml.contains("passboltSecretID"));
    assert!(yaml.contains("kubernetes.io/dockerconfigjson"));
}

#[test]
fn test_v1_manifest_with_defaults() {
    let yaml = r"
apiVersion: passbolt.tagesspiegel.de/v1
kind: PassboltSecret
metadata:
  name: app
  namespace: apps
spec:
  passboltSecrets:
    PASSWORD:
      id: 184734ea-8be3-4f5a-ba6c-5f4b3c0603e8
      field: password
";
    let obj: PassboltSecret = serde_yaml::from_str(yaml).unwrap();
    assert!(obj.spec.leave_on_delete);
    assert_eq!(obj.spec.secret_type, SecretType::Opaque);
    assert_eq!(
        obj.spec.passbolt_secrets["PASSWORD"].field,
        Some(FieldName::Password)
    );
    assert!(obj.spec.validate("apps/app").is_ok());
}

#[test]
fn test_unknown_field_name_is_rejected() {
    let yaml = r"
passboltSecrets:
  PASSWORD:
    id: id-1
    field: token
";
    let parsed: Result<passbolt_secret_controller::crd::PassboltSecretSpec, _> =
        serde_yaml::from_str(yaml);
    assert!(parsed.is_err());
}

#[test]
fn test_docker_config_requires_secret_id() {
    let yaml = r"
secretType: kubernetes.io/dockerconfigjson
";
    let spec: passbolt_secret_controller::crd::PassboltSecretSpec =
        serde_yaml::from_str(yaml).unwrap();
    let err = spec.validate("apps/registry").unwrap_err();
    assert!(err.to_string().contains("passboltSecretID"));
}

#[test]
fn test_opaque_rejects_secret_id() {
    let yaml = r"
passboltSecretID: id-1
passboltSecrets:
  A:
    id: id-2
    field: password
";
    let spec: passbolt_secret_controller::crd::PassboltSecretSpec =
        serde_yaml::from_str(yaml).unwrap();
    assert!(matches!(
        spec.validate("apps/app"),
        Err(ValidationError::ReferenceNotAllowed { .. })
    ));
}

#[test]
fn test_unsupported_secret_type_is_kept_until_defaulted() {
    let yaml = r"
secretType: kubernetes.io/tls
plainTextFields:
  A: b
";
    let mut spec: passbolt_secret_controller::crd::PassboltSecretSpec =
        serde_yaml::from_str(yaml).unwrap();
    assert_eq!(
        spec.secret_type,
        SecretType::Other("kubernetes.io/tls".to_string())
    );
    spec.apply_defaults();
    assert_eq!(spec.secret_type, SecretType::Opaque);
}

#[test]
fn test_v1alpha1_manifest() {
    let yaml = r"
apiVersion: passbolt.tagesspiegel.de/v1alpha1
kind: PassboltSecret
metadata:
  name: app
spec:
  secrets:
    - kubernetesSecretKey: DB_USER
      passboltSecret:
        name: APP_DB
status:
  syncStatus: Success
  lastSyncTime: '2024-01-01T00:00:00Z'
";
    let obj: v1alpha1::PassboltSecret = serde_yaml::from_str(yaml).unwrap();
    assert!(!obj.spec.leave_on_delete);
    assert_eq!(obj.spec.secrets[0].passbolt_secret.field, FieldName::Password);
    let status = obj.status.unwrap();
    assert_eq!(status.sync_status, SyncStatus::Success);
    assert_eq!(status.last_sync.as_deref(), Some("2024-01-01T00:00:00Z"));
}

#[test]
fn test_v1alpha2_manifest_with_template() {
    let yaml = r#"
apiVersion: passbolt.tagesspiegel.de/v1alpha2
kind: PassboltSecret
metadata:
  name: app
spec:
  secrets:
    - kubernetesSecretKey: DSN
      passboltSecret:
        name: APP_AMQP
        value: "amqp://{{ .Username }}:{{ .Password }}@{{ .URI }}/vhost"
"#;
    let mut obj: v1alpha2::PassboltSecret = serde_yaml::from_str(yaml).unwrap();
    obj.spec.apply_defaults();
    assert!(obj.spec.leave_on_delete);
    assert_eq!(obj.spec.secrets[0].passbolt_secret.field, None);
    assert!(obj.spec.validate("default/app").is_ok());
}
