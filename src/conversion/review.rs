//! `ConversionReview` handling for the CRD conversion webhook.

use super::{convert, AnyPassboltSecret, ConversionError, Generation, NameLookup};
use kube::core::conversion::{ConversionRequest, ConversionResponse, ConversionReview};
use kube::core::Status;
use tracing::{debug, warn};

/// Convert every object of a review to the desired version
///
/// The first failing object fails the whole review.
pub async fn convert_review(review: ConversionReview, lookup: &dyn NameLookup) -> ConversionReview {
    let mut request = match ConversionRequest::from_review(review) {
        Ok(request) => request,
        Err(e) => {
            warn!("Rejecting malformed ConversionReview: {}", e);
            return ConversionResponse::invalid(Status::failure(&e.to_string(), "InvalidRequest"))
                .into_review();
        }
    };
    let objects = std::mem::take(&mut request.objects);
    let desired = request.desired_api_version.clone();
    let response = ConversionResponse::for_request(request);

    match convert_objects(objects, &desired, lookup).await {
        Ok(converted) => {
            debug!(desired = desired.as_str(), count = converted.len(), "converted objects");
            response.success(converted).into_review()
        }
        Err(e) => {
            warn!(desired = desired.as_str(), "conversion failed: {}", e);
            response
                .failure(Status::failure(&e.to_string(), "ConversionFailed"))
                .into_review()
        }
    }
}

async fn convert_objects(
    objects: Vec<serde_json::Value>,
    desired: &str,
    lookup: &dyn NameLookup,
) -> Result<Vec<serde_json::Value>, ConversionError> {
    let target = Generation::from_api_version(desired)?;
    let mut converted = Vec::with_capacity(objects.len());
    for object in objects {
        let object = AnyPassboltSecret::from_value(object)?;
        converted.push(convert(object, target, lookup).await?.into_value()?);
    }
    Ok(converted)
}
