//! Feels-like pipeline error types.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeelsLikeError {
    /// Model artifact or feature-name list missing or unreadable.
    #[error("Asset load failed for {asset}: {reason}")]
    AssetLoad { asset: String, reason: String },

    /// Loaded configuration disagrees with what the model expects.
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("Inference engine not initialized")]
    NotInitialized,

    #[error("Feature vector has {actual} entries, model expects {expected}")]
    ShapeMismatch { expected: usize, actual: usize },

    #[error("Inference failed: {0}")]
    RuntimeInference(#[from] RuntimeError),

    #[error("Features missing from extraction: {}", .0.join(", "))]
    MissingFeatures(Vec<String>),
}

impl FeelsLikeError {
    pub(crate) fn asset(asset: impl Into<String>, reason: impl ToString) -> Self {
        Self::AssetLoad {
            asset: asset.into(),
            reason: reason.to_string(),
        }
    }

    /// User-friendly error message for UI display.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::AssetLoad { .. } | Self::SchemaMismatch(_) => {
                "The feels-like model could not be loaded."
            }
            Self::NotInitialized => "The feels-like model is not ready yet.",
            Self::ShapeMismatch { .. } | Self::MissingFeatures(_) => {
                "The feels-like model does not match this weather data."
            }
            Self::RuntimeInference(_) => "The feels-like estimate failed. Please try again.",
        }
    }

    /// Whether calling `initialize()` again could help.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::AssetLoad { .. } | Self::NotInitialized)
    }
}

/// Failures raised by an inference runtime.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Invalid model artifact: {0}")]
    InvalidModel(String),

    #[error("Input has {actual} values, network expects {expected}")]
    InputShape { expected: usize, actual: usize },

    #[error("Non-finite output from model")]
    NonFinite,

    #[error("Runtime error: {0}")]
    Other(String),
}
