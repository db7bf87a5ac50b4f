//! Model lifecycle: load once, predict many times, release on close.
//!
//! State lives behind a single mutex, so `initialize`, `predict` and
//! `close` never overlap and the runtime handle is never used concurrently.

use std::sync::Arc;

use nimbus_core::FeelsLikeConfig;
use parking_lot::Mutex;

use crate::assets::AssetSource;
use crate::error::{FeelsLikeError, RuntimeError};
use crate::runtime::{InferenceRuntime, ModelLoader};
use crate::scaling::{ScalingParameters, CONTINUOUS_FEATURES};
use crate::schema::FeatureSchema;

struct LoadedModel {
    runtime: Box<dyn InferenceRuntime>,
    schema: Arc<FeatureSchema>,
}

enum EngineState {
    Uninitialized,
    Ready(LoadedModel),
}

pub struct InferenceEngine {
    assets: Arc<dyn AssetSource>,
    loader: Arc<dyn ModelLoader>,
    scaling: ScalingParameters,
    model_file: String,
    feature_names_file: String,
    strict_schema: bool,
    state: Mutex<EngineState>,
}

impl InferenceEngine {
    /// Create an uninitialized engine using the default asset file names.
    pub fn new(
        assets: Arc<dyn AssetSource>,
        loader: Arc<dyn ModelLoader>,
        scaling: ScalingParameters,
    ) -> Self {
        let defaults = FeelsLikeConfig::default();
        Self {
            assets,
            loader,
            scaling,
            model_file: defaults.model_file,
            feature_names_file: defaults.feature_names_file,
            strict_schema: defaults.strict_schema,
            state: Mutex::new(EngineState::Uninitialized),
        }
    }

    pub fn with_files(mut self, model_file: impl Into<String>, feature_names_file: impl Into<String>) -> Self {
        self.model_file = model_file.into();
        self.feature_names_file = feature_names_file.into();
        self
    }

    /// Fail initialization when a continuous input has no schema entry,
    /// instead of only logging it.
    pub fn with_strict_schema(mut self, strict: bool) -> Self {
        self.strict_schema = strict;
        self
    }

    pub fn scaling(&self) -> &ScalingParameters {
        &self.scaling
    }

    pub fn is_ready(&self) -> bool {
        matches!(*self.state.lock(), EngineState::Ready(_))
    }

    /// Load the model and feature names.
    ///
    /// A no-op when already ready. On failure the engine stays uninitialized
    /// and the caller may retry.
    pub fn initialize(&self) -> Result<(), FeelsLikeError> {
        let mut state = self.state.lock();
        if let EngineState::Ready(model) = &*state {
            tracing::debug!(
                "Inference engine already initialized ({} features)",
                model.schema.len()
            );
            return Ok(());
        }

        match self.load() {
            Ok(model) => {
                tracing::info!(
                    "Inference engine ready: {} features from {}",
                    model.schema.len(),
                    self.feature_names_file
                );
                *state = EngineState::Ready(model);
                Ok(())
            }
            Err(e) => {
                tracing::error!("Inference engine initialization failed: {}", e);
                Err(e)
            }
        }
    }

    /// Schema of the loaded model, initializing once if needed.
    pub fn schema(&self) -> Result<Arc<FeatureSchema>, FeelsLikeError> {
        let mut state = self.state.lock();
        let model = self.ensure_loaded(&mut state)?;
        Ok(Arc::clone(&model.schema))
    }

    /// Run the model on an assembled vector and return degrees Celsius.
    pub fn try_predict(&self, vector: &[f32]) -> Result<f64, FeelsLikeError> {
        let mut state = self.state.lock();
        let model = self.ensure_loaded(&mut state)?;
        self.run_model(model, vector)
    }

    /// Build the input from the loaded schema and run it without releasing
    /// the lock, so the vector and the runtime come from the same load.
    pub fn predict_with<F>(&self, build: F) -> Result<f64, FeelsLikeError>
    where
        F: FnOnce(&FeatureSchema) -> Result<Vec<f32>, FeelsLikeError>,
    {
        let mut state = self.state.lock();
        let model = self.ensure_loaded(&mut state)?;
        let vector = build(model.schema.as_ref())?;
        self.run_model(model, &vector)
    }

    /// [`try_predict`](Self::try_predict) with failures logged and absorbed.
    pub fn predict(&self, vector: &[f32]) -> Option<f64> {
        match self.try_predict(vector) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Feels-like prediction unavailable: {}", e);
                None
            }
        }
    }

    /// Release the model. Safe to call repeatedly.
    pub fn close(&self) {
        let mut state = self.state.lock();
        if matches!(*state, EngineState::Ready(_)) {
            tracing::info!("Inference engine closed");
        }
        *state = EngineState::Uninitialized;
    }

    fn run_model(&self, model: &mut LoadedModel, vector: &[f32]) -> Result<f64, FeelsLikeError> {
        let expected = model.schema.len();
        if vector.len() != expected {
            return Err(FeelsLikeError::ShapeMismatch {
                expected,
                actual: vector.len(),
            });
        }

        let output = model.runtime.run(vector)?;
        let [scaled] = output.as_slice() else {
            return Err(RuntimeError::Other(format!(
                "model returned {} values, expected 1",
                output.len()
            ))
            .into());
        };

        Ok(self.scaling.destandardize(f64::from(*scaled)))
    }

    /// One lazy initialization attempt; a failure surfaces as `NotInitialized`.
    fn ensure_loaded<'a>(
        &self,
        state: &'a mut EngineState,
    ) -> Result<&'a mut LoadedModel, FeelsLikeError> {
        if let EngineState::Uninitialized = *state {
            tracing::debug!("Inference engine not initialized, loading lazily");
            let model = self.load().map_err(|e| {
                tracing::error!("Lazy initialization failed: {}", e);
                FeelsLikeError::NotInitialized
            })?;
            *state = EngineState::Ready(model);
        }

        match state {
            EngineState::Ready(model) => Ok(model),
            EngineState::Uninitialized => Err(FeelsLikeError::NotInitialized),
        }
    }

    fn load(&self) -> Result<LoadedModel, FeelsLikeError> {
        self.scaling.validate()?;

        let names = self
            .assets
            .read(&self.feature_names_file)
            .map_err(|e| FeelsLikeError::asset(&self.feature_names_file, e))?;
        let names = String::from_utf8(names)
            .map_err(|e| FeelsLikeError::asset(&self.feature_names_file, e))?;
        let schema = FeatureSchema::from_text(&names)?;

        let unresolved = schema.unresolved(&CONTINUOUS_FEATURES);
        if !unresolved.is_empty() {
            tracing::error!(
                "Feature schema is missing continuous inputs {:?}; predictions will be degraded",
                unresolved
            );
            if self.strict_schema {
                return Err(FeelsLikeError::SchemaMismatch(format!(
                    "no schema entry for {}",
                    unresolved.join(", ")
                )));
            }
        }

        let bytes = self
            .assets
            .read(&self.model_file)
            .map_err(|e| FeelsLikeError::asset(&self.model_file, e))?;
        let runtime = self
            .loader
            .load(&bytes)
            .map_err(|e| FeelsLikeError::asset(&self.model_file, e))?;

        if let Some(input_len) = runtime.input_len() {
            if input_len != schema.len() {
                return Err(FeelsLikeError::SchemaMismatch(format!(
                    "model takes {} inputs but {} lists {} features",
                    input_len,
                    self.feature_names_file,
                    schema.len()
                )));
            }
        }

        Ok(LoadedModel {
            runtime,
            schema: Arc::new(schema),
        })
    }
}

impl std::fmt::Debug for InferenceEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InferenceEngine")
            .field("model_file", &self.model_file)
            .field("feature_names_file", &self.feature_names_file)
            .field("strict_schema", &self.strict_schema)
            .field(
                "ready",
                &self
                    .state
                    .try_lock()
                    .map(|state| matches!(*state, EngineState::Ready(_))),
            )
            .finish()
    }
}
