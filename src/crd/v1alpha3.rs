//! # PassboltSecret v1alpha3
//!
//! First generation addressing Passbolt resources by ID. References are keyed by
//! Secret key and plain text fields can be mixed in. The spec is identical to
//! [`super::v1`]; the status lacks `failureCount` and `observedGeneration`.

use super::types::{default_true, FieldName, SecretType, SyncStatus};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(kube::CustomResource, Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "passbolt.tagesspiegel.de",
    version = "v1alpha3",
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
    #[serde(
        default,
        rename = "passboltSecretID",
        skip_serializing_if = "Option::is_none"
    )]
    pub passbolt_secret_id: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub passbolt_secrets: BTreeMap<String, PassboltSecretRef>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub plain_text_fields: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
pub struct PassboltSecretRef {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<FieldName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SyncError {
    pub message: String,
    #[serde(default, rename = "passboltSecretID")]
    pub passbolt_secret_id: String,
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
