//! On-device "feels like" temperature estimate.
//!
//! Pipeline: [`FeatureExtractor`] turns a [`WeatherSnapshot`] into named
//! features, [`assemble`] orders them into the vector the model was trained
//! on, and [`InferenceEngine`] runs the loaded model and de-standardizes the
//! output. [`FeelsLikePredictor`] wires the three together.
//!
//! [`WeatherSnapshot`]: nimbus_weather::WeatherSnapshot

pub mod assembler;
pub mod assets;
pub mod engine;
pub mod error;
pub mod extractor;
pub mod predictor;
pub mod runtime;
pub mod scaling;
pub mod schema;

pub use assembler::{assemble, FeatureVector};
pub use assets::{AssetSource, DirAssets};
pub use engine::InferenceEngine;
pub use error::{FeelsLikeError, RuntimeError};
pub use extractor::{FeatureExtractor, FeatureMap};
pub use nimbus_core::MissingFeaturePolicy;
pub use predictor::FeelsLikePredictor;
pub use runtime::{
    Activation, InferenceRuntime, ModelLoader, SafetensorsModelLoader, TensorNetwork,
};
pub use scaling::ScalingParameters;
pub use schema::FeatureSchema;
