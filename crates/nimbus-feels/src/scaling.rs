//! Standardization coefficients fixed at training time.

use crate::error::FeelsLikeError;

/// Continuous feature identifiers, index-aligned with `means` and `scales`.
pub const CONTINUOUS_FEATURES: [&str; 5] = [
    "Temperature (C)",
    "Humidity",
    "Wind Speed (km/h)",
    "Visibility (km)",
    "Pressure (millibars)",
];

/// Means and scales of the model's continuous inputs and of its output.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalingParameters {
    pub means: Vec<f64>,
    pub scales: Vec<f64>,
    pub output_mean: f64,
    pub output_scale: f64,
}

impl Default for ScalingParameters {
    /// Statistics of the bundled model's training set.
    fn default() -> Self {
        Self {
            means: vec![11.932678, 0.734899, 10.810640, 10.347325, 1003.235956],
            scales: vec![9.551546, 0.195473, 6.913571, 4.192123, 116.969906],
            output_mean: 10.870106,
            output_scale: 10.6818,
        }
    }
}

/// A zero or NaN scale would divide by zero; treat it as a no-op.
fn effective_scale(scale: f64) -> f64 {
    if scale == 0.0 || scale.is_nan() {
        1.0
    } else {
        scale
    }
}

impl ScalingParameters {
    /// Both arrays must cover every continuous feature.
    pub fn validate(&self) -> Result<(), FeelsLikeError> {
        let expected = CONTINUOUS_FEATURES.len();
        if self.means.len() != expected || self.scales.len() != expected {
            return Err(FeelsLikeError::SchemaMismatch(format!(
                "scaling parameters have {} means and {} scales, expected {}",
                self.means.len(),
                self.scales.len(),
                expected
            )));
        }
        Ok(())
    }

    /// `(raw - mean[index]) / scale[index]`.
    ///
    /// Callers hold parameters that passed [`validate`](Self::validate); an
    /// index outside them passes `raw` through unchanged.
    pub fn standardize(&self, index: usize, raw: f64) -> f64 {
        match (self.means.get(index), self.scales.get(index)) {
            (Some(mean), Some(scale)) => (raw - mean) / effective_scale(*scale),
            _ => {
                tracing::debug!(
                    "No scaling coefficients for continuous feature {}, using raw value",
                    index
                );
                raw
            }
        }
    }

    /// Map a scaled model output back to degrees Celsius.
    pub fn destandardize(&self, scaled: f64) -> f64 {
        scaled * effective_scale(self.output_scale) + self.output_mean
    }
}
