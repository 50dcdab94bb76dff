//! # PassboltSecret v1
//!
//! Hub generation: the storage version, the version the controller watches,
//! and the target of every conversion.

use super::types::{default_true, FieldName, SecretType, SyncStatus};
use super::validation::{check_field_xor_value, check_reference_present, ValidationError};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// PassboltSecret Custom Resource Definition
///
/// # Example
///
/// ```yaml
/// apiVersion: passbolt.tagesspiegel.de/v1
/// kind: PassboltSecret
/// metadata:
///   name: rabbitmq
///   namespace: apps
/// spec:
///   leaveOnDelete: false
///   passboltSecrets:
///     AMQP_DSN:
///       id: 184734ea-8be3-4f5a-ba6c-5f4b3c0603e8
///       value: "amqp://{{ Username }}:{{ Password }}@{{ URI }}/vhost"
///     AMQP_PASSWORD:
///       id: 184734ea-8be3-4f5a-ba6c-5f4b3c0603e8
///       field: password
///   plainTextFields:
///     AMQP_VHOST: vhost
/// ```
#[derive(kube::CustomResource, Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "passbolt.tagesspiegel.de",
    version = "v1",
    kind = "PassboltSecret",
    namespaced,
    status = "PassboltSecretStatus",
    shortname = "pbs",
    printcolumn = r#"{"name":"Sync Status", "type":"string", "jsonPath":".status.syncStatus"}, {"name":"Last Sync", "type":"string", "jsonPath":".status.lastSync"}, {"name":"Failures", "type":"integer", "jsonPath":".status.failureCount"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct PassboltSecretSpec {
    /// Keep the Kubernetes Secret when the PassboltSecret is deleted.
    /// When false the Secret is owned by the PassboltSecret and garbage collected with it.
    #[serde(default = "default_true")]
    pub leave_on_delete: bool,
    /// Type of the rendered Secret (Opaque or kubernetes.io/dockerconfigjson)
    #[serde(default)]
    pub secret_type: SecretType,
    /// Passbolt resource ID rendered as a docker config (dockerconfigjson only)
    #[serde(
        default,
        rename = "passboltSecretID",
        skip_serializing_if = "Option::is_none"
    )]
    pub passbolt_secret_id: Option<String>,
    /// Secret key -> Passbolt reference (Opaque only)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub passbolt_secrets: BTreeMap<String, PassboltSecretRef>,
    /// Secret key -> static value copied verbatim (Opaque only)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub plain_text_fields: BTreeMap<String, String>,
}

/// Reference to one Passbolt resource
///
/// Exactly one of `field` and `value` must be set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub struct PassboltSecretRef {
    /// Passbolt resource ID
    pub id: String,
    /// Resource attribute copied into the Secret
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<FieldName>,
    /// Template rendered against the resource.
    /// Variables: `Username`, `Password`, `URI`, `Description`, `Name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// One failed reference of the last pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyncError {
    pub message: String,
    #[serde(default, rename = "passboltSecretID")]
    pub passbolt_secret_id: String,
    #[serde(default)]
    pub secret_key: String,
    /// RFC3339 timestamp
    #[serde(default)]
    pub time: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PassboltSecretStatus {
    #[serde(default)]
    pub sync_status: SyncStatus,
    /// Time of the last successful sync (RFC3339)
    #[serde(default, alias = "lastSyncTime", skip_serializing_if = "Option::is_none")]
    pub last_sync: Option<String>,
    /// Errors of the most recent pass only
    #[serde(default)]
    pub sync_errors: Vec<SyncError>,
    /// Consecutive failed passes, reset by a successful one
    #[serde(default)]
    pub failure_count: u32,
    /// `metadata.generation` the status describes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
    /// Earliest retry of a failed pass (RFC3339).
    /// Triggers for the same generation arriving earlier are deferred.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_reconcile_time: Option<String>,
}

impl PassboltSecretSpec {
    /// Apply the defaulting rules of the mutating webhook
    pub fn apply_defaults(&mut self) {
        self.secret_type = std::mem::take(&mut self.secret_type).defaulted();
    }

    /// Something to render: an ID, references or plain text
    #[must_use]
    pub fn has_sync_source(&self) -> bool {
        self.passbolt_secret_id.is_some()
            || !self.passbolt_secrets.is_empty()
            || !self.plain_text_fields.is_empty()
    }

    /// Admission-time validation
    ///
    /// Opaque requires at least one reference and forbids `passboltSecretID`;
    /// dockerconfigjson requires `passboltSecretID` and forbids references and
    /// plain text fields.
    #[allow(clippy::missing_errors_doc, reason = "See ValidationError")]
    pub fn validate(&self, object: &str) -> Result<(), ValidationError> {
        self.validate_inner(object, true)
    }

    /// Validation run at the start of every pass
    ///
    /// Same as [`Self::validate`] except that an Opaque spec carrying only plain
    /// text fields is accepted.
    #[allow(clippy::missing_errors_doc, reason = "See ValidationError")]
    pub fn validate_for_sync(&self, object: &str) -> Result<(), ValidationError> {
        if !self.has_sync_source() {
            return Err(ValidationError::NothingToSync {
                object: object.to_string(),
            });
        }
        self.validate_inner(object, false)
    }

    fn validate_inner(&self, object: &str, require_references: bool) -> Result<(), ValidationError> {
        let secret_type = self.secret_type.as_str();
        match self.secret_type {
            SecretType::Opaque => {
                if self.passbolt_secret_id.is_some() {
                    return Err(ValidationError::ReferenceNotAllowed {
                        object: object.to_string(),
                        field: "passboltSecretID",
                        secret_type: secret_type.to_string(),
                    });
                }
                let references_missing = self.passbolt_secrets.is_empty()
                    && (require_references || self.plain_text_fields.is_empty());
                if references_missing {
                    return Err(ValidationError::SecretsRequired {
                        object: object.to_string(),
                        secret_type: secret_type.to_string(),
                    });
                }
                for (key, reference) in &self.passbolt_secrets {
                    check_field_xor_value(
                        object,
                        key,
                        reference.field.is_some(),
                        reference.value.is_some(),
                    )?;
                }
                Ok(())
            }
            SecretType::DockerConfigJson => {
                check_reference_present(
                    object,
                    "passboltSecretID",
                    secret_type,
                    self.passbolt_secret_id.as_deref(),
                )?;
                if !self.passbolt_secrets.is_empty() {
                    return Err(ValidationError::SecretsNotAllowed {
                        object: object.to_string(),
                        secret_type: secret_type.to_string(),
                    });
                }
                if !self.plain_text_fields.is_empty() {
                    return Err(ValidationError::PlainTextNotAllowed {
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
