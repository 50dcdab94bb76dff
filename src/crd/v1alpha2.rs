//! # PassboltSecret v1alpha2
//!
//! Name-addressed list of references with a secret type discriminator and
//! template values.

use super::types::{default_true, FieldName, SecretType, SyncStatus};
use super::validation::{check_field_xor_value, check_reference_present, ValidationError};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(kube::CustomResource, Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "passbolt.tagesspiegel.de",
    version = "v1alpha2",
    kind = "PassboltSecret",
    namespaced,
    status = "PassboltSecretStatus",
    shortname = "pbs",
    printcolumn = r#"{"name":"Sync Status", "type":"string", "jsonPath":".status.syncStatus"}, {"name":"Last Sync", "type":"string", "jsonPath":".status.lastSync"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct PassboltSecretSpec {
    #[serde(default = "default_true")]
    pub leave_on_delete: bool,
    #[serde(default)]
    pub secret_type: SecretType,
    /// Passbolt resource name rendered as a docker config
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passbolt_secret_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub secrets: Vec<SecretSpec>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecretSpec {
    pub passbolt_secret: PassboltSpec,
    pub kubernetes_secret_key: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub struct PassboltSpec {
    /// Passbolt resource name
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<FieldName>,
    /// Static value or template (`{{ Username }}`, `{{ Password }}`, `{{ URI }}`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyncError {
    pub message: String,
    #[serde(default)]
    pub secret_name: String,
    #[serde(default)]
    pub secret_key: String,
    #[serde(default)]
    pub time: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PassboltSecretStatus {
    #[serde(default)]
    pub sync_status: SyncStatus,
    #[serde(default, alias = "lastSyncTime", skip_serializing_if = "Option::is_none")]
    pub last_sync: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sync_errors: Vec<SyncError>,
}

impl PassboltSecretSpec {
    pub fn apply_defaults(&mut self) {
        self.secret_type = std::mem::take(&mut self.secret_type).defaulted();
    }

    #[allow(clippy::missing_errors_doc, reason = "See ValidationError")]
    pub fn validate(&self, object: &str) -> Result<(), ValidationError> {
        let secret_type = self.secret_type.as_str();
        match self.secret_type {
            SecretType::Opaque => {
                if self.passbolt_secret_name.is_some() {
                    return Err(ValidationError::ReferenceNotAllowed {
                        object: object.to_string(),
                        field: "passboltSecretName",
                        secret_type: secret_type.to_string(),
                    });
                }
                if self.secrets.is_empty() {
                    return Err(ValidationError::SecretsRequired {
                        object: object.to_string(),
                        secret_type: secret_type.to_string(),
                    });
                }
                for secret in &self.secrets {
                    check_field_xor_value(
                        object,
                        &secret.kubernetes_secret_key,
                        secret.passbolt_secret.field.is_some(),
                        secret.passbolt_secret.value.is_some(),
                    )?;
                }
                Ok(())
            }
            SecretType::DockerConfigJson => {
                check_reference_present(
                    object,
                    "passboltSecretName",
                    secret_type,
                    self.passbolt_secret_name.as_deref(),
                )?;
                if !self.secrets.is_empty() {
                    return Err(ValidationError::SecretsNotAllowed {
                        object: object.to_string(),
                        secret_type: secret_type.to_string(),
                    });
                }
                Ok(())
            }
            SecretType::Other(_) => Err(ValidationError::InvalidSecretType {
                object: object.to_string(),
                secret_type: secret_type.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(field: Option<FieldName>, value: Option<&str>) -> SecretSpec {
        SecretSpec {
            passbolt_secret: PassboltSpec {
                name: "APP_EXAMPLE".to_string(),
                field,
                value: value.map(ToString::to_string),
            },
            kubernetes_secret_key: "dsn".to_string(),
        }
    }

    #[test]
    fn test_field_xor_template() {
        for (field, value, ok) in [
            (Some(FieldName::Username), None, true),
            (None, Some("{{ URI }}"), true),
            (Some(FieldName::Username), Some("{{ URI }}"), false),
            (None, None, false),
        ] {
            let spec = PassboltSecretSpec {
                secrets: vec![entry(field, value)],
                ..Default::default()
            };
            assert_eq!(spec.validate("a.b").is_ok(), ok, "{field:?} {value:?}");
        }
    }

    #[test]
    fn test_docker_requires_name() {
        let spec = PassboltSecretSpec {
            secret_type: SecretType::DockerConfigJson,
            ..Default::default()
        };
        let err = spec.validate("registry.apps").unwrap_err();
        assert!(err
            .to_string()
            .starts_with("passboltSecretName is required for secret type"));
    }

    #[test]
    fn test_defaulting_replaces_unsupported_type() {
        let mut spec = PassboltSecretSpec {
            secret_type: SecretType::Other(String::new()),
            ..Default::default()
        };
        spec.apply_defaults();
        assert_eq!(spec.secret_type, SecretType::Opaque);
    }
}
