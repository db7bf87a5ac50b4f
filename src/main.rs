use std::io::Read;
use std::sync::Arc;

use anyhow::Result;
use nimbus_core::{AppError, Config, ConfigError};
use nimbus_feels::FeelsLikePredictor;
use nimbus_weather::{WeatherReport, WeatherSnapshot};

/// Read a snapshot from the file named on the command line, or stdin.
fn read_snapshot() -> Result<WeatherSnapshot, AppError> {
    let json = match std::env::args().nth(1) {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    WeatherSnapshot::from_json(&json).map_err(|e| AppError::InvalidInput(e.to_string()))
}

fn load_config() -> Result<Config, AppError> {
    let config = Config::load().map_err(|e| ConfigError::ParseError(format!("{:#}", e)))?;

    let validation = config.validate();
    for warning in &validation.warnings {
        tracing::warn!("Config warning: {}", warning);
    }
    if !validation.is_valid() {
        return Err(ConfigError::Invalid(validation.error_summary()).into());
    }
    Ok(config)
}

async fn run(config: &Config) -> Result<(), AppError> {
    let snapshot = read_snapshot()?;

    let report = if config.feels_like.enabled {
        let predictor = Arc::new(FeelsLikePredictor::from_config(&config.feels_like));
        if let Err(e) = predictor.engine().initialize() {
            let err = AppError::Prediction(e.to_string());
            tracing::warn!("{} ({})", err.user_message(), err);
        }
        let feels_like_ml_c = Arc::clone(&predictor).predict_async(snapshot.clone()).await;
        predictor.engine().close();
        WeatherReport {
            snapshot,
            feels_like_ml_c,
        }
    } else {
        WeatherReport {
            snapshot,
            feels_like_ml_c: None,
        }
    };

    for line in report.display_lines(config.weather.temperature_unit) {
        println!("{}", line);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize core
    nimbus_core::init()?;

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e.user_message());
            return Err(e.into());
        }
    };

    tracing::info!("Nimbus started");
    tracing::debug!("Config directory: {}", config.config_dir.display());

    if let Err(e) = run(&config).await {
        tracing::error!("{}", e);
        eprintln!("{}", e.user_message());
        return Err(e.into());
    }

    Ok(())
}
