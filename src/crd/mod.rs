//! # Custom Resource Definitions
//!
//! Every served generation of the `PassboltSecret` custom resource.
//!
//! ## Module Structure
//!
//! - `types.rs` - Enumerations shared by all generations
//! - `validation.rs` - Admission and pre-sync invariants
//! - `v1alpha1.rs` - Name-addressed list with field selection
//! - `v1alpha2.rs` - Adds secret type, templates and `passboltSecretName`
//! - `v1alpha3.rs` - ID-addressed map with plain text fields
//! - `v1.rs` - Hub and storage version, adds failure tracking to the status

mod types;
mod validation;

pub mod v1;
pub mod v1alpha1;
pub mod v1alpha2;
pub mod v1alpha3;

pub use types::{default_true, FieldName, SecretType, SyncStatus, GROUP, KIND};
pub use v1::{
    PassboltSecret, PassboltSecretRef, PassboltSecretSpec, PassboltSecretStatus, SyncError,
};
pub use validation::{object_label, ValidationError};

use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::core::crd::{merge_crds, MergeError};
use kube::CustomResourceExt;

/// One CRD serving every generation, with `v1` as the storage version
#[allow(clippy::missing_errors_doc, reason = "Generations disagree on group or kind")]
pub fn merged_crd() -> Result<CustomResourceDefinition, MergeError> {
    merge_crds(
        vec![
            v1alpha1::PassboltSecret::crd(),
            v1alpha2::PassboltSecret::crd(),
            v1alpha3::PassboltSecret::crd(),
            v1::PassboltSecret::crd(),
        ],
        "v1",
    )
}
