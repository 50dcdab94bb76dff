//! `v1alpha1 <-> v1alpha2`
//!
//! Both generations address resources by name, so no lookups are needed. `v1alpha1`
//! knows neither templates nor docker configs.

use super::{ConversionError, Generation};
use crate::constants::PLAIN_TEXT_KEYS_ANNOTATION;
use crate::crd::{object_label, v1alpha1 as old, v1alpha2 as new, SecretType};
use tracing::warn;

pub fn upgrade(src: old::PassboltSecret) -> new::PassboltSecret {
    let secrets = src
        .spec
        .secrets
        .into_iter()
        .map(|secret| new::SecretSpec {
            passbolt_secret: new::PassboltSpec {
                name: secret.passbolt_secret.name,
                field: Some(secret.passbolt_secret.field),
                value: None,
            },
            kubernetes_secret_key: secret.kubernetes_secret_key,
        })
        .collect();

    new::PassboltSecret {
        metadata: src.metadata,
        spec: new::PassboltSecretSpec {
            leave_on_delete: src.spec.leave_on_delete,
            secret_type: SecretType::Opaque,
            passbolt_secret_name: None,
            secrets,
        },
        status: src.status.map(|status| new::PassboltSecretStatus {
            sync_status: status.sync_status,
            last_sync: status.last_sync,
            sync_errors: status
                .sync_errors
                .into_iter()
                .map(|e| new::SyncError {
                    message: e.message,
                    secret_name: e.secret_name,
                    secret_key: e.secret_key,
                    time: e.time,
                })
                .collect(),
        }),
    }
}

/// Entries without a field selector are dropped
#[allow(clippy::missing_errors_doc, reason = "Docker configs have no v1alpha1 form")]
pub fn downgrade(src: new::PassboltSecret) -> Result<old::PassboltSecret, ConversionError> {
    let object = object_label(
        src.metadata.name.as_deref(),
        src.metadata.namespace.as_deref(),
    );
    if src.spec.secret_type != SecretType::Opaque {
        return Err(ConversionError::Unrepresentable {
            object,
            secret_type: src.spec.secret_type.to_string(),
            api_version: Generation::V1alpha1.api_version(),
        });
    }

    let mut secrets = Vec::with_capacity(src.spec.secrets.len());
    for secret in src.spec.secrets {
        match secret.passbolt_secret.field {
            Some(field) if secret.passbolt_secret.value.is_none() => {
                secrets.push(old::SecretSpec {
                    passbolt_secret: old::PassboltSpec {
                        name: secret.passbolt_secret.name,
                        field,
                    },
                    kubernetes_secret_key: secret.kubernetes_secret_key,
                });
            }
            _ => warn!(
                object = object.as_str(),
                key = secret.kubernetes_secret_key.as_str(),
                "dropping templated secret reference, v1alpha1 only supports field selection"
            ),
        }
    }

    // plain text fields do not exist here
    let mut metadata = src.metadata;
    if let Some(annotations) = metadata.annotations.as_mut() {
        annotations.remove(PLAIN_TEXT_KEYS_ANNOTATION);
        if annotations.is_empty() {
            metadata.annotations = None;
        }
    }

    Ok(old::PassboltSecret {
        metadata,
        spec: old::PassboltSecretSpec {
            leave_on_delete: src.spec.leave_on_delete,
            secrets,
        },
        status: src.status.map(|status| old::PassboltSecretStatus {
            sync_status: status.sync_status,
            last_sync: status.last_sync,
            sync_errors: status
                .sync_errors
                .into_iter()
                .map(|e| old::SyncError {
                    message: e.message,
                    secret_name: e.secret_name,
                    secret_key: e.secret_key,
                    time: e.time,
                })
                .collect(),
        }),
    })
}
