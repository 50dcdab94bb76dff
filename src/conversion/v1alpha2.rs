//! `v1alpha2 <-> v1alpha3`
//!
//! The name to ID boundary. `v1alpha2` lists references by Passbolt resource name,
//! `v1alpha3` maps Secret keys to resource IDs and carries plain text fields.
//!
//! Plain text fields travel down as value-only entries named after their own key and
//! are listed in the [`PLAIN_TEXT_KEYS_ANNOTATION`]. On the way up only the listed
//! entries become plain text fields again. Every other entry must resolve.

use super::{ConversionError, NameLookup, Position};
use crate::constants::PLAIN_TEXT_KEYS_ANNOTATION;
use crate::crd::{object_label, v1alpha2 as old, v1alpha3 as new, SecretType};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

#[allow(clippy::missing_errors_doc, reason = "Unresolvable names")]
pub async fn upgrade(
    mut src: old::PassboltSecret,
    lookup: &dyn NameLookup,
) -> Result<new::PassboltSecret, ConversionError> {
    let plain_text_keys = take_plain_text_keys(&mut src.metadata);
    let object = object_label(
        src.metadata.name.as_deref(),
        src.metadata.namespace.as_deref(),
    );
    let mut spec = new::PassboltSecretSpec {
        leave_on_delete: src.spec.leave_on_delete,
        secret_type: src.spec.secret_type.clone(),
        ..Default::default()
    };

    match src.spec.secret_type {
        SecretType::Opaque => {
            for (index, secret) in src.spec.secrets.into_iter().enumerate() {
                let old::SecretSpec {
                    passbolt_secret,
                    kubernetes_secret_key: key,
                } = secret;
                let plain_text = plain_text_keys.contains(&key)
                    && passbolt_secret.name == key
                    && passbolt_secret.field.is_none()
                    && passbolt_secret.value.is_some();
                if plain_text {
                    debug!(object = object.as_str(), key = key.as_str(), "restoring plain text field");
                    spec.plain_text_fields
                        .insert(key, passbolt_secret.value.unwrap_or_default());
                    continue;
                }

                let id = lookup
                    .identifier_for_name(&passbolt_secret.name)
                    .await
                    .map_err(|source| ConversionError::Lookup {
                        name: passbolt_secret.name.clone(),
                        position: Position::Index(index),
                        source,
                    })?;
                spec.passbolt_secrets.insert(
                    key,
                    new::PassboltSecretRef {
                        id,
                        field: passbolt_secret.field,
                        value: passbolt_secret.value,
                    },
                );
            }
        }
        SecretType::DockerConfigJson => {
            let name = src
                .spec
                .passbolt_secret_name
                .filter(|name| !name.is_empty())
                .ok_or_else(|| ConversionError::MissingReference {
                    object: object.clone(),
                    field: "passboltSecretName",
                    secret_type: SecretType::DockerConfigJson.to_string(),
                })?;
            let id = lookup
                .identifier_for_name(&name)
                .await
                .map_err(|source| ConversionError::Lookup {
                    name,
                    position: Position::Spec,
                    source,
                })?;
            spec.passbolt_secret_id = Some(id);
        }
        SecretType::Other(_) => {}
    }

    Ok(new::PassboltSecret {
        metadata: src.metadata,
        spec,
        status: src.status.map(|status| new::PassboltSecretStatus {
            sync_status: status.sync_status,
            last_sync: status.last_sync,
            sync_errors: status
                .sync_errors
                .into_iter()
                .map(|e| new::SyncError {
                    message: e.message,
                    passbolt_secret_id: e.secret_name,
                    secret_key: e.secret_key,
                    time: e.time,
                })
                .collect(),
        }),
    })
}

/// References come out in key order followed by the plain text fields
#[allow(clippy::missing_errors_doc, reason = "Unresolvable IDs")]
pub async fn downgrade(
    mut src: new::PassboltSecret,
    lookup: &dyn NameLookup,
) -> Result<old::PassboltSecret, ConversionError> {
    let plain_text_keys: Vec<&str> = src.spec.plain_text_fields.keys().map(String::as_str).collect();
    let plain_text_keys = plain_text_keys.join(",");
    let annotations = src.metadata.annotations.get_or_insert_with(BTreeMap::new);
    if plain_text_keys.is_empty() {
        annotations.remove(PLAIN_TEXT_KEYS_ANNOTATION);
    } else {
        annotations.insert(PLAIN_TEXT_KEYS_ANNOTATION.to_string(), plain_text_keys);
    }
    if annotations.is_empty() {
        src.metadata.annotations = None;
    }
    let object = object_label(
        src.metadata.name.as_deref(),
        src.metadata.namespace.as_deref(),
    );
    let mut spec = old::PassboltSecretSpec {
        leave_on_delete: src.spec.leave_on_delete,
        secret_type: src.spec.secret_type.clone(),
        ..Default::default()
    };

    match src.spec.secret_type {
        SecretType::Opaque => {
            spec.secrets = resolve_names(src.spec.passbolt_secrets, lookup).await?;
            spec.secrets
                .extend(src.spec.plain_text_fields.into_iter().map(|(key, value)| {
                    old::SecretSpec {
                        passbolt_secret: old::PassboltSpec {
                            name: key.clone(),
                            field: None,
                            value: Some(value),
                        },
                        kubernetes_secret_key: key,
                    }
                }));
        }
        SecretType::DockerConfigJson => {
            let id = src
                .spec
                .passbolt_secret_id
                .filter(|id| !id.is_empty())
                .ok_or_else(|| ConversionError::MissingReference {
                    object: object.clone(),
                    field: "passboltSecretID",
                    secret_type: SecretType::DockerConfigJson.to_string(),
                })?;
            let name = lookup
                .name_for_identifier(&id)
                .await
                .map_err(|source| ConversionError::Lookup {
                    name: id,
                    position: Position::Spec,
                    source,
                })?;
            spec.passbolt_secret_name = Some(name);
        }
        SecretType::Other(_) => {}
    }

    Ok(old::PassboltSecret {
        metadata: src.metadata,
        spec,
        status: src.status.map(|status| old::PassboltSecretStatus {
            sync_status: status.sync_status,
            last_sync: status.last_sync,
            sync_errors: status
                .sync_errors
                .into_iter()
                .map(|e| old::SyncError {
                    message: e.message,
                    secret_name: e.passbolt_secret_id,
                    secret_key: e.secret_key,
                    time: e.time,
                })
                .collect(),
        }),
    })
}

/// Remove the plain text key annotation and return its keys
fn take_plain_text_keys(metadata: &mut ObjectMeta) -> BTreeSet<String> {
    let Some(annotations) = metadata.annotations.as_mut() else {
        return BTreeSet::new();
    };
    let keys = annotations
        .remove(PLAIN_TEXT_KEYS_ANNOTATION)
        .map(|keys| {
            keys.split(',')
                .map(str::trim)
                .filter(|key| !key.is_empty())
                .map(ToString::to_string)
                .collect()
        })
        .unwrap_or_default();
    if annotations.is_empty() {
        metadata.annotations = None;
    }
    keys
}

async fn resolve_names(
    references: BTreeMap<String, new::PassboltSecretRef>,
    lookup: &dyn NameLookup,
) -> Result<Vec<old::SecretSpec>, ConversionError> {
    let mut secrets = Vec::with_capacity(references.len());
    for (key, reference) in references {
        let name = match lookup.name_for_identifier(&reference.id).await {
            Ok(name) => name,
            Err(source) => {
                return Err(ConversionError::Lookup {
                    name: reference.id,
                    position: Position::Key(key),
                    source,
                })
            }
        };
        secrets.push(old::SecretSpec {
            passbolt_secret: old::PassboltSpec {
                name,
                field: reference.field,
                value: reference.value,
            },
            kubernetes_secret_key: key,
        });
    }
    Ok(secrets)
}
