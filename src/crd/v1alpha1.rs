//! # PassboltSecret v1alpha1
//!
//! Oldest generation: a list of `{kubernetesSecretKey, passboltSecret{name, field}}` pairs.

use super::types::{FieldName, SyncStatus};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(kube::CustomResource, Debug, Clone, Default, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "passbolt.tagesspiegel.de",
    version = "v1alpha1",
    kind = "PassboltSecret",
    namespaced,
    status = "PassboltSecretStatus",
    shortname = "pbs",
    printcolumn = r#"{"name":"Sync Status", "type":"string", "jsonPath":".status.syncStatus"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct PassboltSecretSpec {
    #[serde(default)]
    pub leave_on_delete: bool,
    #[serde(default)]
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
    #[serde(default)]
    pub field: FieldName,
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
