//! # Admission
//!
//! Validating admission for `PassboltSecret` objects of every served generation.
//!
//! Objects are defaulted first (an empty or unsupported `secretType` becomes `Opaque`)
//! and then checked against the rules of their generation. `v1alpha3` shares the
//! rules of `v1`; `v1alpha1` has nothing to check beyond its schema.

use crate::conversion::{self, AnyPassboltSecret};
use crate::crd::{object_label, ValidationError};
use kube::core::admission::{AdmissionRequest, AdmissionResponse, AdmissionReview, Operation};
use kube::core::DynamicObject;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum AdmissionError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("unreadable object: {0}")]
    Unreadable(String),
}

/// Validate one object after defaulting it
#[allow(clippy::missing_errors_doc, reason = "See ValidationError")]
pub fn validate(object: AnyPassboltSecret) -> Result<(), ValidationError> {
    match object {
        AnyPassboltSecret::V1alpha1(_) => Ok(()),
        AnyPassboltSecret::V1alpha2(mut o) => {
            let label = object_label(o.metadata.name.as_deref(), o.metadata.namespace.as_deref());
            o.spec.apply_defaults();
            o.spec.validate(&label)
        }
        AnyPassboltSecret::V1alpha3(o) => validate_hub(conversion::v1alpha3::upgrade(*o)),
        AnyPassboltSecret::V1(o) => validate_hub(*o),
    }
}

fn validate_hub(mut hub: crate::crd::PassboltSecret) -> Result<(), ValidationError> {
    let label = object_label(
        hub.metadata.name.as_deref(),
        hub.metadata.namespace.as_deref(),
    );
    hub.spec.apply_defaults();
    hub.spec.validate(&label)
}

/// Validate the object of an admission request
///
/// Deletes and requests without an object are allowed.
#[allow(clippy::missing_errors_doc, reason = "See AdmissionError")]
pub fn validate_request(request: &AdmissionRequest<DynamicObject>) -> Result<(), AdmissionError> {
    if request.operation == Operation::Delete {
        return Ok(());
    }
    let Some(object) = &request.object else {
        return Ok(());
    };
    let value =
        serde_json::to_value(object).map_err(|e| AdmissionError::Unreadable(e.to_string()))?;
    let object =
        AnyPassboltSecret::from_value(value).map_err(|e| AdmissionError::Unreadable(e.to_string()))?;
    validate(object).map_err(AdmissionError::from)
}

/// Answer an `AdmissionReview`
#[must_use]
pub fn review(review: AdmissionReview<DynamicObject>) -> AdmissionReview<DynamicObject> {
    let request: AdmissionRequest<DynamicObject> = match review.try_into() {
        Ok(request) => request,
        Err(e) => {
            warn!("Rejecting malformed AdmissionReview: {}", e);
            return AdmissionResponse::invalid(e.to_string()).into_review();
        }
    };

    let response = AdmissionResponse::from(&request);
    match validate_request(&request) {
        Ok(()) => {
            debug!(
                name = request.name.as_str(),
                operation = ?request.operation,
                "admitted"
            );
            response.into_review()
        }
        Err(e) => {
            info!(name = request.name.as_str(), "denied: {}", e);
            response.deny(e.to_string()).into_review()
        }
    }
}
