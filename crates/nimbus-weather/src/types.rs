use chrono::{DateTime, Utc};
use nimbus_core::TemperatureUnit;
use serde::{Deserialize, Serialize};

/// Weather condition categories mapped from WMO codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    #[default]
    Clear,
    PartlyCloudy,
    Cloudy,
    Fog,
    Drizzle,
    Rain,
    HeavyRain,
    Snow,
    FreezingRain,
    Thunderstorm,
}

impl WeatherCondition {
    /// Convert WMO weather code to WeatherCondition
    /// See: https://open-meteo.com/en/docs#weathervariables
    pub fn from_wmo_code(code: i32) -> Self {
        match code {
            0 => Self::Clear,
            1..=2 => Self::PartlyCloudy,
            3 => Self::Cloudy,
            45 | 48 => Self::Fog,
            51 | 53 | 55 => Self::Drizzle,
            61 | 63 | 80 => Self::Rain,
            65 | 81 | 82 => Self::HeavyRain,
            56 | 57 | 66 | 67 => Self::FreezingRain, // Freezing drizzle and rain
            71 | 73 | 75 | 77 | 85 | 86 => Self::Snow,
            95 | 96 | 99 => Self::Thunderstorm,
            _ => Self::Clear, // Unknown codes default to clear
        }
    }

    /// Human-readable label, also used as the snapshot's condition text.
    ///
    /// Every liquid precipitation label contains "Rain" and every frozen one
    /// "Snow"; the feels-like model keys its precipitation inputs on them.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Clear => "Clear",
            Self::PartlyCloudy => "Partly Cloudy",
            Self::Cloudy => "Cloudy",
            Self::Fog => "Fog",
            Self::Drizzle => "Light Rain",
            Self::Rain => "Rain",
            Self::HeavyRain => "Heavy Rain",
            Self::Snow => "Snow",
            Self::FreezingRain => "Freezing Rain",
            Self::Thunderstorm => "Thunderstorm",
        }
    }
}

/// Current conditions at one location, as delivered by the weather fetch.
///
/// Immutable input to the feels-like pipeline; one snapshot per prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    /// Observation time in milliseconds since the Unix epoch (UTC)
    pub timestamp_utc_millis: i64,
    /// Signed offset from UTC to the location's wall clock
    pub timezone_offset_seconds: i32,
    pub temperature_c: f64,
    /// 0-100
    pub humidity_percent: f64,
    pub wind_speed_mps: f64,
    /// 0-359
    pub wind_direction_degrees: u16,
    pub visibility_meters: f64,
    pub pressure_hpa: f64,
    /// Free-text condition label, e.g. "Light Rain"
    #[serde(default)]
    pub condition_text: String,
}

/// Snapshot JSON as delivered, which may carry a WMO code instead of a label.
#[derive(Deserialize)]
struct SnapshotInput {
    #[serde(flatten)]
    snapshot: WeatherSnapshot,
    #[serde(default)]
    weather_code: Option<i32>,
}

impl WeatherSnapshot {
    /// Parse a snapshot from JSON and check its ranges.
    ///
    /// A blank `condition_text` is filled from `weather_code` when present.
    pub fn from_json(json: &str) -> Result<Self, WeatherError> {
        let input: SnapshotInput =
            serde_json::from_str(json).map_err(|e| WeatherError::Parse(e.to_string()))?;

        let snapshot = match input.weather_code {
            Some(code) if input.snapshot.condition_text.trim().is_empty() => input
                .snapshot
                .with_condition(WeatherCondition::from_wmo_code(code)),
            _ => input.snapshot,
        };
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// Replace the condition text with the label of a WMO-mapped condition.
    pub fn with_condition(mut self, condition: WeatherCondition) -> Self {
        self.condition_text = condition.description().to_string();
        self
    }

    /// Observation time as a UTC datetime, if representable.
    pub fn observed_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp_utc_millis)
    }

    /// Reject values outside the ranges the upstream fetch guarantees.
    pub fn validate(&self) -> Result<(), WeatherError> {
        let continuous = [
            ("temperature_c", self.temperature_c),
            ("humidity_percent", self.humidity_percent),
            ("wind_speed_mps", self.wind_speed_mps),
            ("visibility_meters", self.visibility_meters),
            ("pressure_hpa", self.pressure_hpa),
        ];
        if let Some((field, _)) = continuous.iter().find(|(_, v)| !v.is_finite()) {
            return Err(WeatherError::Invalid(format!("{} is not a finite number", field)));
        }
        if !(0.0..=100.0).contains(&self.humidity_percent) {
            return Err(WeatherError::Invalid(format!(
                "humidity_percent {} outside 0-100",
                self.humidity_percent
            )));
        }
        if self.wind_direction_degrees >= 360 {
            return Err(WeatherError::Invalid(format!(
                "wind_direction_degrees {} outside 0-359",
                self.wind_direction_degrees
            )));
        }
        if self.wind_speed_mps < 0.0 || self.visibility_meters < 0.0 {
            return Err(WeatherError::Invalid(
                "wind speed and visibility must be non-negative".to_string(),
            ));
        }
        if self.observed_at().is_none() {
            return Err(WeatherError::Invalid(format!(
                "timestamp {} out of range",
                self.timestamp_utc_millis
            )));
        }
        Ok(())
    }
}

/// Format a Celsius value in the preferred unit
pub fn format_temperature(celsius: f64, unit: TemperatureUnit) -> String {
    match unit {
        TemperatureUnit::Fahrenheit => format!("{:.1}°F", celsius * 9.0 / 5.0 + 32.0),
        TemperatureUnit::Celsius | TemperatureUnit::Auto => format!("{:.1}°C", celsius),
    }
}

/// A snapshot with the optional on-device estimate attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherReport {
    pub snapshot: WeatherSnapshot,
    /// ML feels-like estimate; `None` when the model is unavailable
    pub feels_like_ml_c: Option<f64>,
}

impl WeatherReport {
    /// Display lines; the ML line is omitted when there is no estimate.
    pub fn display_lines(&self, unit: TemperatureUnit) -> Vec<String> {
        let mut lines = vec![
            format!(
                "{}  {}",
                format_temperature(self.snapshot.temperature_c, unit),
                self.snapshot.condition_text
            ),
            format!(
                "Humidity {:.0}%  Wind {:.1} m/s @ {}°  Pressure {:.0} hPa",
                self.snapshot.humidity_percent,
                self.snapshot.wind_speed_mps,
                self.snapshot.wind_direction_degrees,
                self.snapshot.pressure_hpa
            ),
        ];
        if let Some(feels) = self.feels_like_ml_c {
            lines.push(format!("Feels like (ML): {}", format_temperature(feels, unit)));
        }
        lines
    }
}

/// Weather input errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Invalid snapshot: {0}")]
    Invalid(String),
}
