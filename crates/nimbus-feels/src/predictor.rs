//! Snapshot in, optional feels-like temperature out.

use std::sync::Arc;

use nimbus_core::{FeelsLikeConfig, MissingFeaturePolicy};
use nimbus_weather::{WeatherReport, WeatherSnapshot};

use crate::assembler::assemble;
use crate::assets::DirAssets;
use crate::engine::InferenceEngine;
use crate::error::FeelsLikeError;
use crate::extractor::FeatureExtractor;
use crate::runtime::SafetensorsModelLoader;
use crate::scaling::ScalingParameters;

/// Extractor, assembler and engine composed into one call.
///
/// `Send + Sync`; share it behind an `Arc`.
#[derive(Debug)]
pub struct FeelsLikePredictor {
    engine: InferenceEngine,
    extractor: FeatureExtractor,
    policy: MissingFeaturePolicy,
}

impl FeelsLikePredictor {
    pub fn new(engine: InferenceEngine, policy: MissingFeaturePolicy) -> Self {
        let extractor = FeatureExtractor::new(engine.scaling().clone());
        Self {
            engine,
            extractor,
            policy,
        }
    }

    /// Predictor over the bundled safetensors model in `config.assets_dir`.
    pub fn from_config(config: &FeelsLikeConfig) -> Self {
        let engine = InferenceEngine::new(
            Arc::new(DirAssets::new(&config.assets_dir)),
            Arc::new(SafetensorsModelLoader),
            ScalingParameters::default(),
        )
        .with_files(&config.model_file, &config.feature_names_file)
        .with_strict_schema(config.strict_schema);

        Self::new(engine, config.missing_feature_policy)
    }

    pub fn engine(&self) -> &InferenceEngine {
        &self.engine
    }

    pub fn try_predict(&self, snapshot: &WeatherSnapshot) -> Result<f64, FeelsLikeError> {
        self.engine.predict_with(|schema| {
            let features = self.extractor.extract(snapshot, schema);
            assemble(&features, schema, self.policy)
        })
    }

    /// Feels-like temperature in Celsius, or `None` when unavailable.
    pub fn predict(&self, snapshot: &WeatherSnapshot) -> Option<f64> {
        match self.try_predict(snapshot) {
            Ok(value) => {
                tracing::debug!(
                    "Feels like {:.2}°C (reported {:.2}°C)",
                    value,
                    snapshot.temperature_c
                );
                Some(value)
            }
            Err(e) => {
                tracing::warn!("Feels-like prediction unavailable: {}", e);
                None
            }
        }
    }

    /// Attach the estimate to the snapshot for display.
    pub fn report(&self, snapshot: WeatherSnapshot) -> WeatherReport {
        let feels_like_ml_c = self.predict(&snapshot);
        WeatherReport {
            snapshot,
            feels_like_ml_c,
        }
    }

    /// [`predict`](Self::predict) on the blocking thread pool.
    pub async fn predict_async(self: Arc<Self>, snapshot: WeatherSnapshot) -> Option<f64> {
        match tokio::task::spawn_blocking(move || self.predict(&snapshot)).await {
            Ok(value) => value,
            Err(e) => {
                tracing::error!("Feels-like prediction task failed: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::AssetSource;
    use crate::error::RuntimeError;
    use crate::runtime::{InferenceRuntime, ModelLoader};
    use std::sync::Mutex;

    const NAMES: &str = "num__Temperature (C)\nnum__Humidity\nnum__Wind Speed (km/h)\n\
                         num__Visibility (km)\nnum__Pressure (millibars)\n\
                         cat__Precip Type_rain\ncat__Precip Type_snow\n\
                         remainder__WindBearingSin\nremainder__WindBearingCos\n\
                         remainder__HourSin\nremainder__HourCos\n\
                         remainder__MonthSin\nremainder__MonthCos\n\
                         remainder__DayOfYearSin\nremainder__DayOfYearCos\n";

    struct StaticAssets(&'static str);

    impl AssetSource for StaticAssets {
        fn read(&self, name: &str) -> std::io::Result<Vec<u8>> {
            if name.ends_with(".txt") {
                Ok(self.0.as_bytes().to_vec())
            } else {
                Ok(b"stub".to_vec())
            }
        }
    }

    /// Records the last input and returns a fixed scaled output.
    struct StubRuntime {
        raw: f32,
        seen: Arc<Mutex<Vec<f32>>>,
    }

    impl InferenceRuntime for StubRuntime {
        fn input_len(&self) -> Option<usize> {
            None
        }

        fn run(&mut self, input: &[f32]) -> Result<Vec<f32>, RuntimeError> {
            if let Ok(mut seen) = self.seen.lock() {
                *seen = input.to_vec();
            }
            Ok(vec![self.raw])
        }
    }

    struct StubLoader {
        raw: f32,
        seen: Arc<Mutex<Vec<f32>>>,
    }

    impl ModelLoader for StubLoader {
        fn load(&self, _bytes: &[u8]) -> Result<Box<dyn InferenceRuntime>, RuntimeError> {
            Ok(Box::new(StubRuntime {
                raw: self.raw,
                seen: Arc::clone(&self.seen),
            }))
        }
    }

    fn predictor(names: &'static str, policy: MissingFeaturePolicy) -> (FeelsLikePredictor, Arc<Mutex<Vec<f32>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let engine = InferenceEngine::new(
            Arc::new(StaticAssets(names)),
            Arc::new(StubLoader {
                raw: 0.5,
                seen: Arc::clone(&seen),
            }),
            ScalingParameters::default(),
        );
        (FeelsLikePredictor::new(engine, policy), seen)
    }

    fn clear_noon() -> WeatherSnapshot {
        WeatherSnapshot {
            timestamp_utc_millis: 1_718_452_800_000, // 2024-06-15T12:00:00Z
            timezone_offset_seconds: 0,
            temperature_c: 20.0,
            humidity_percent: 50.0,
            wind_speed_mps: 5.0,
            wind_direction_degrees: 180,
            visibility_meters: 10_000.0,
            pressure_hpa: 1013.0,
            condition_text: "Clear".to_string(),
        }
    }

    #[test]
    fn test_end_to_end_with_stub_runtime() {
        let (p, seen) = predictor(NAMES, MissingFeaturePolicy::ZeroFill);
        let value = p.predict(&clear_noon()).unwrap();
        assert!((value - 16.21).abs() < 0.005, "got {value}");

        let input = seen.lock().unwrap().clone();
        assert_eq!(input.len(), 15);
        // Clear: both precipitation flags off
        assert_eq!(input[5], 0.0);
        assert_eq!(input[6], 0.0);
        // Noon: HourCos = cos(pi) = -1
        assert!((input[10] + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_vector_length_follows_schema() {
        let (p, seen) = predictor("num__Humidity\nremainder__HourSin\nextra__Unknown\n", MissingFeaturePolicy::ZeroFill);
        assert!(p.predict(&clear_noon()).is_some());
        let input = seen.lock().unwrap().clone();
        assert_eq!(input.len(), 3);
        assert_eq!(input[2], 0.0);
    }

    #[test]
    fn test_reject_policy_returns_none() {
        let (p, seen) = predictor("num__Humidity\nextra__Unknown\n", MissingFeaturePolicy::Reject);
        assert!(matches!(
            p.try_predict(&clear_noon()),
            Err(FeelsLikeError::MissingFeatures(_))
        ));
        assert_eq!(p.predict(&clear_noon()), None);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_report_attaches_estimate() {
        let (p, _) = predictor(NAMES, MissingFeaturePolicy::ZeroFill);
        let report = p.report(clear_noon());
        assert_eq!(report.snapshot.temperature_c, 20.0);
        assert!(report.feels_like_ml_c.is_some());
    }

    #[test]
    fn test_report_without_model_leaves_primary_data() {
        let p = FeelsLikePredictor::from_config(&FeelsLikeConfig {
            assets_dir: "/nonexistent/nimbus/assets".into(),
            ..FeelsLikeConfig::default()
        });
        let report = p.report(clear_noon());
        assert_eq!(report.feels_like_ml_c, None);
        assert_eq!(report.snapshot, clear_noon());
    }

    #[tokio::test]
    async fn test_predict_async() {
        let (p, _) = predictor(NAMES, MissingFeaturePolicy::ZeroFill);
        let value = Arc::new(p).predict_async(clear_noon()).await;
        assert!(value.is_some());
    }
}
