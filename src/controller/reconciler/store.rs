//! # Secret Store
//!
//! Writes rendered Secrets and `PassboltSecret` status to the Kubernetes API.
//!
//! The rendered Secret has the name and namespace of its `PassboltSecret` and carries
//! its labels and annotations. A Secret whose type changed is deleted and created
//! again, since the API server rejects type updates. When that create fails the
//! previous Secret is put back.

use crate::constants::FIELD_MANAGER;
use crate::controller::render::RenderedSecret;
use crate::crd::{PassboltSecret, PassboltSecretStatus};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use k8s_openapi::ByteString;
use kube::api::{Api, DeleteParams, Patch, PatchParams, PostParams};
use kube::{Client, Resource};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, error, info};

const OPAQUE: &str = "Opaque";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("object has no metadata.{0}")]
    MissingMetadata(&'static str),
    #[error("secret {0} is already controlled by {1}")]
    AlreadyOwned(String, String),
    #[error(
        "secret {secret} was deleted to change its type but could not be created again \
         (previous secret restored: {restored}): {source}"
    )]
    Recreate {
        secret: String,
        restored: bool,
        #[source]
        source: kube::Error,
    },
    #[error(transparent)]
    Kube(#[from] kube::Error),
}

/// What [`SecretStore::apply_secret`] did to the Secret
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Created,
    Updated,
    Unchanged,
}

impl WriteOutcome {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            WriteOutcome::Created => "created",
            WriteOutcome::Updated => "updated",
            WriteOutcome::Unchanged => "unchanged",
        }
    }
}

/// Object store the reconciler writes to
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Create or update the Secret rendered for `owner`
    async fn apply_secret(
        &self,
        owner: &PassboltSecret,
        rendered: &RenderedSecret,
    ) -> Result<WriteOutcome, StoreError>;

    /// Replace the status sub-object of `owner`
    async fn patch_status(
        &self,
        owner: &PassboltSecret,
        status: &PassboltSecretStatus,
    ) -> Result<(), StoreError>;
}

#[derive(Clone)]
pub struct KubeSecretStore {
    client: Client,
}

impl std::fmt::Debug for KubeSecretStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeSecretStore").finish_non_exhaustive()
    }
}

impl KubeSecretStore {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

fn name_and_namespace(owner: &PassboltSecret) -> Result<(&str, &str), StoreError> {
    let name = owner
        .metadata
        .name
        .as_deref()
        .ok_or(StoreError::MissingMetadata("name"))?;
    let namespace = owner
        .metadata
        .namespace
        .as_deref()
        .ok_or(StoreError::MissingMetadata("namespace"))?;
    Ok((name, namespace))
}

#[async_trait]
impl SecretStore for KubeSecretStore {
    async fn apply_secret(
        &self,
        owner: &PassboltSecret,
        rendered: &RenderedSecret,
    ) -> Result<WriteOutcome, StoreError> {
        let (name, namespace) = name_and_namespace(owner)?;
        let api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        let post = PostParams {
            field_manager: Some(FIELD_MANAGER.to_string()),
            ..Default::default()
        };

        match api.get_opt(name).await? {
            None => {
                api.create(&post, &desired_secret(owner, rendered, None)?)
                    .await?;
                info!("Created secret {}/{}", namespace, name);
                Ok(WriteOutcome::Created)
            }
            Some(existing) if secret_type(&existing) != rendered.secret_type.as_str() => {
                info!(
                    "Secret {}/{} changes type from {} to {}, recreating",
                    namespace,
                    name,
                    secret_type(&existing),
                    rendered.secret_type
                );
                let desired = fresh(desired_secret(owner, rendered, Some(&existing))?);
                api.delete(name, &DeleteParams::default()).await?;
                if let Err(source) = api.create(&post, &desired).await {
                    let restored = match api.create(&post, &fresh(existing)).await {
                        Ok(_) => true,
                        Err(e) => {
                            error!("Failed to restore secret {}/{}: {}", namespace, name, e);
                            false
                        }
                    };
                    return Err(StoreError::Recreate {
                        secret: format!("{namespace}/{name}"),
                        restored,
                        source,
                    });
                }
                Ok(WriteOutcome::Updated)
            }
            Some(existing) => {
                let desired = desired_secret(owner, rendered, Some(&existing))?;
                if is_unchanged(&existing, &desired) {
                    debug!("Secret {}/{} is up to date", namespace, name);
                    return Ok(WriteOutcome::Unchanged);
                }
                api.replace(name, &post, &desired).await?;
                info!("Updated secret {}/{}", namespace, name);
                Ok(WriteOutcome::Updated)
            }
        }
    }

    async fn patch_status(
        &self,
        owner: &PassboltSecret,
        status: &PassboltSecretStatus,
    ) -> Result<(), StoreError> {
        let (name, namespace) = name_and_namespace(owner)?;
        let api: Api<PassboltSecret> = Api::namespaced(self.client.clone(), namespace);
        let mut patch = serde_json::json!({ "status": status });
        // merge patches keep fields that are left out
        if status.next_reconcile_time.is_none() {
            patch["status"]["nextReconcileTime"] = serde_json::Value::Null;
        }
        api.patch_status(name, &PatchParams::apply(FIELD_MANAGER), &Patch::Merge(patch))
            .await?;
        Ok(())
    }
}

fn secret_type(secret: &Secret) -> &str {
    secret.type_.as_deref().unwrap_or(OPAQUE)
}

/// The Secret `owner` should produce, layered over the live one when there is one
///
/// # Errors
///
/// Missing owner metadata, or a Secret controlled by another object.
pub fn desired_secret(
    owner: &PassboltSecret,
    rendered: &RenderedSecret,
    existing: Option<&Secret>,
) -> Result<Secret, StoreError> {
    let (name, namespace) = name_and_namespace(owner)?;

    let mut metadata = existing.map(|s| s.metadata.clone()).unwrap_or_default();
    metadata.name = Some(name.to_string());
    metadata.namespace = Some(namespace.to_string());
    metadata.labels = merged(metadata.labels.take(), owner.metadata.labels.as_ref());
    metadata.annotations = merged(
        metadata.annotations.take(),
        owner.metadata.annotations.as_ref(),
    );
    metadata.owner_references = owner_references(owner, &metadata, rendered.owner_link_required)?;

    Ok(Secret {
        metadata,
        type_: Some(rendered.secret_type.as_str().to_string()),
        data: Some(
            rendered
                .data
                .iter()
                .map(|(key, value)| (key.clone(), ByteString(value.clone())))
                .collect(),
        ),
        immutable: existing.and_then(|s| s.immutable),
        ..Default::default()
    })
}

/// Drop the server-assigned metadata so the Secret can be created again
fn fresh(mut secret: Secret) -> Secret {
    let metadata = &mut secret.metadata;
    metadata.resource_version = None;
    metadata.uid = None;
    metadata.creation_timestamp = None;
    metadata.deletion_timestamp = None;
    metadata.deletion_grace_period_seconds = None;
    metadata.generation = None;
    metadata.managed_fields = None;
    metadata.self_link = None;
    secret
}

fn merged(
    current: Option<BTreeMap<String, String>>,
    from_owner: Option<&BTreeMap<String, String>>,
) -> Option<BTreeMap<String, String>> {
    let mut map = current.unwrap_or_default();
    if let Some(from_owner) = from_owner {
        map.extend(from_owner.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    (!map.is_empty()).then_some(map)
}

/// Add or remove the controller reference to `owner`, keeping all others
fn owner_references(
    owner: &PassboltSecret,
    metadata: &ObjectMeta,
    link_required: bool,
) -> Result<Option<Vec<OwnerReference>>, StoreError> {
    let owner_uid = owner.metadata.uid.as_deref();
    let mut references: Vec<OwnerReference> = metadata
        .owner_references
        .iter()
        .flatten()
        .filter(|r| Some(r.uid.as_str()) != owner_uid)
        .cloned()
        .collect();

    if link_required {
        if let Some(other) = references.iter().find(|r| r.controller == Some(true)) {
            return Err(StoreError::AlreadyOwned(
                metadata.name.clone().unwrap_or_default(),
                format!("{}/{}", other.kind, other.name),
            ));
        }
        let reference = owner
            .controller_owner_ref(&())
            .ok_or(StoreError::MissingMetadata("uid"))?;
        references.push(reference);
    }

    Ok((!references.is_empty()).then_some(references))
}

fn is_unchanged(existing: &Secret, desired: &Secret) -> bool {
    existing.metadata.labels == desired.metadata.labels
        && existing.metadata.annotations == desired.metadata.annotations
        && existing.metadata.owner_references == desired.metadata.owner_references
        && secret_type(existing) == secret_type(desired)
        && existing.data.clone().unwrap_or_default() == desired.data.clone().unwrap_or_default()
}
