//! # Shared CRD Types
//!
//! Enumerations shared by every `PassboltSecret` generation.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// API group of every `PassboltSecret` version
pub const GROUP: &str = "passbolt.tagesspiegel.de";

/// Kind served under [`GROUP`]
pub const KIND: &str = "PassboltSecret";

/// Kubernetes Secret type produced for a `PassboltSecret`
///
/// Anything other than `Opaque` or `kubernetes.io/dockerconfigjson` deserializes to
/// [`SecretType::Other`] so the reconciler can report it instead of failing the watch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SecretType {
    #[default]
    Opaque,
    DockerConfigJson,
    Other(String),
}

impl SecretType {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            SecretType::Opaque => "Opaque",
            SecretType::DockerConfigJson => "kubernetes.io/dockerconfigjson",
            SecretType::Other(other) => other,
        }
    }

    #[must_use]
    pub fn is_supported(&self) -> bool {
        !matches!(self, SecretType::Other(_))
    }

    /// Empty and unsupported values become `Opaque`
    #[must_use]
    pub fn defaulted(self) -> Self {
        if self.is_supported() {
            self
        } else {
            SecretType::Opaque
        }
    }
}

impl From<String> for SecretType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Opaque" => SecretType::Opaque,
            "kubernetes.io/dockerconfigjson" => SecretType::DockerConfigJson,
            _ => SecretType::Other(value),
        }
    }
}

impl From<SecretType> for String {
    fn from(value: SecretType) -> Self {
        match value {
            SecretType::Other(other) => other,
            supported => supported.as_str().to_string(),
        }
    }
}

impl fmt::Display for SecretType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl JsonSchema for SecretType {
    fn schema_name() -> Cow<'static, str> {
        "SecretType".into()
    }

    fn inline_schema() -> bool {
        true
    }

    fn json_schema(_: &mut schemars::SchemaGenerator) -> schemars::Schema {
        schemars::json_schema!({
            "type": "string",
            "enum": ["Opaque", "kubernetes.io/dockerconfigjson"],
            "default": "Opaque"
        })
    }
}

/// Attribute of a Passbolt resource selectable with `field`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum FieldName {
    Username,
    #[default]
    Password,
    Uri,
}

impl FieldName {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldName::Username => "username",
            FieldName::Password => "password",
            FieldName::Uri => "uri",
        }
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of the most recent sync pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub enum SyncStatus {
    Success,
    Error,
    #[default]
    Unknown,
}

pub fn default_true() -> bool {
    true
}
