//! # Spec Validation
//!
//! Type-specific invariants shared by the admission endpoint and the reconciler.
//! Messages start with stable sentinel phrases users can grep for.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid secret type {object}: {secret_type}")]
    InvalidSecretType { object: String, secret_type: String },

    #[error("{field} is required for secret type {secret_type} ({object})")]
    ReferenceRequired {
        object: String,
        field: &'static str,
        secret_type: String,
    },

    #[error("{field} is not allowed for secret {object} type {secret_type}")]
    ReferenceNotAllowed {
        object: String,
        field: &'static str,
        secret_type: String,
    },

    #[error("secrets are required for secret {object} type {secret_type}")]
    SecretsRequired { object: String, secret_type: String },

    #[error("secrets are not allowed for secret {object} type {secret_type}")]
    SecretsNotAllowed { object: String, secret_type: String },

    #[error("plain text fields are not allowed for secret {object} type {secret_type}")]
    PlainTextNotAllowed { object: String, secret_type: String },

    #[error("field and value are not allowed for secret {object} and key {key}")]
    FieldAndValue { object: String, key: String },

    #[error("field or value is required for secret {object} and key {key}")]
    FieldOrValueRequired { object: String, key: String },

    #[error(
        "no passbolt secret id, passbolt secret references or plain text fields defined for secret {object}"
    )]
    NothingToSync { object: String },
}

/// `name.namespace`, the object label used in validation messages
pub fn object_label(name: Option<&str>, namespace: Option<&str>) -> String {
    format!(
        "{}.{}",
        name.unwrap_or("unknown"),
        namespace.unwrap_or("default")
    )
}

/// Exactly one of `field` and `value` must be set
pub(crate) fn check_field_xor_value(
    object: &str,
    key: &str,
    has_field: bool,
    has_value: bool,
) -> Result<(), ValidationError> {
    match (has_field, has_value) {
        (true, true) => Err(ValidationError::FieldAndValue {
            object: object.to_string(),
            key: key.to_string(),
        }),
        (false, false) => Err(ValidationError::FieldOrValueRequired {
            object: object.to_string(),
            key: key.to_string(),
        }),
        _ => Ok(()),
    }
}

/// A single-entry reference must be present and non-empty
pub(crate) fn check_reference_present(
    object: &str,
    field: &'static str,
    secret_type: &str,
    reference: Option<&str>,
) -> Result<(), ValidationError> {
    match reference {
        Some(value) if !value.is_empty() => Ok(()),
        _ => Err(ValidationError::ReferenceRequired {
            object: object.to_string(),
            field,
            secret_type: secret_type.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_xor_value() {
        assert!(check_field_xor_value("a.b", "k", true, false).is_ok());
        assert!(check_field_xor_value("a.b", "k", false, true).is_ok());
        assert_eq!(
            check_field_xor_value("a.b", "k", true, true),
            Err(ValidationError::FieldAndValue {
                object: "a.b".to_string(),
                key: "k".to_string()
            })
        );
        assert!(matches!(
            check_field_xor_value("a.b", "k", false, false),
            Err(ValidationError::FieldOrValueRequired { .. })
        ));
    }

    #[test]
    fn test_sentinel_messages() {
        let err = ValidationError::ReferenceRequired {
            object: "registry.apps".to_string(),
            field: "passboltSecretID",
            secret_type: "kubernetes.io/dockerconfigjson".to_string(),
        };
        assert!(err
            .to_string()
            .starts_with("passboltSecretID is required for secret type"));
        assert_eq!(object_label(Some("x"), None), "x.default");
    }
}
