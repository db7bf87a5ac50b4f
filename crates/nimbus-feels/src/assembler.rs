//! Named features to the model's input vector.

use nimbus_core::MissingFeaturePolicy;

use crate::error::FeelsLikeError;
use crate::extractor::FeatureMap;
use crate::schema::FeatureSchema;

/// Dense model input; index `i` holds `schema.names()[i]`.
pub type FeatureVector = Vec<f32>;

/// Order `features` by `schema`, always producing `schema.len()` entries
/// on success.
///
/// Names the extractor did not produce are zero-filled and logged under
/// [`MissingFeaturePolicy::ZeroFill`], or fail the call under
/// [`MissingFeaturePolicy::Reject`].
pub fn assemble(
    features: &FeatureMap,
    schema: &FeatureSchema,
    policy: MissingFeaturePolicy,
) -> Result<FeatureVector, FeelsLikeError> {
    let mut vector = Vec::with_capacity(schema.len());
    let mut missing = Vec::new();

    for name in schema.names() {
        match features.get(name) {
            Some(value) => vector.push(*value as f32),
            None => {
                missing.push(name.clone());
                vector.push(0.0);
            }
        }
    }

    if !missing.is_empty() {
        match policy {
            MissingFeaturePolicy::ZeroFill => {
                for name in &missing {
                    tracing::error!("Feature '{}' missing from extraction, using 0.0", name);
                }
            }
            MissingFeaturePolicy::Reject => return Err(FeelsLikeError::MissingFeatures(missing)),
        }
    }

    Ok(vector)
}
