//! Snapshot to named model features.
//!
//! Continuous inputs are converted to the training units and z-scored,
//! periodic inputs become sine/cosine pairs, and the condition label is
//! one-hot encoded into rain/snow indicators.

use std::collections::HashMap;
use std::f64::consts::PI;

use chrono::{DateTime, Datelike, Duration, Timelike, Utc};
use nimbus_weather::WeatherSnapshot;

use crate::scaling::{ScalingParameters, CONTINUOUS_FEATURES};
use crate::schema::FeatureSchema;

pub const HOUR_SIN: &str = "HourSin";
pub const HOUR_COS: &str = "HourCos";
pub const MONTH_SIN: &str = "MonthSin";
pub const MONTH_COS: &str = "MonthCos";
pub const DAY_OF_YEAR_SIN: &str = "DayOfYearSin";
pub const DAY_OF_YEAR_COS: &str = "DayOfYearCos";
pub const WIND_BEARING_SIN: &str = "WindBearingSin";
pub const WIND_BEARING_COS: &str = "WindBearingCos";
pub const PRECIP_RAIN: &str = "Precip Type_rain";
pub const PRECIP_SNOW: &str = "Precip Type_snow";

const HOURS_PER_DAY: f64 = 24.0;
const MONTHS_PER_YEAR: f64 = 12.0;
const DAYS_PER_YEAR: f64 = 365.0;

/// Full schema name to standardized or encoded value, for one call.
pub type FeatureMap = HashMap<String, f64>;

/// Wall-clock calendar fields at the observation's location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalCalendar {
    /// 0-23
    pub hour: u32,
    /// 1-12
    pub month: u32,
    /// 1-366
    pub day_of_year: u32,
}

impl LocalCalendar {
    pub fn from_snapshot(snapshot: &WeatherSnapshot) -> Self {
        let utc = snapshot.observed_at().unwrap_or_else(|| {
            tracing::warn!(
                "Timestamp {} out of range, using Unix epoch",
                snapshot.timestamp_utc_millis
            );
            DateTime::<Utc>::default()
        });
        let offset = Duration::seconds(i64::from(snapshot.timezone_offset_seconds));
        let local = utc.checked_add_signed(offset).unwrap_or(utc);

        Self {
            hour: local.hour(),
            month: local.month(),
            day_of_year: local.ordinal(),
        }
    }
}

/// `(sin, cos)` of `value` on a circle of circumference `period`.
pub fn cyclical(value: f64, period: f64) -> (f64, f64) {
    let angle = 2.0 * PI * value / period;
    (angle.sin(), angle.cos())
}

/// Continuous inputs in training units, ordered like [`CONTINUOUS_FEATURES`].
pub fn raw_continuous(snapshot: &WeatherSnapshot) -> [f64; 5] {
    [
        snapshot.temperature_c,
        // Trained on a 0-1 fraction
        snapshot.humidity_percent / 100.0,
        snapshot.wind_speed_mps * 3.6,
        snapshot.visibility_meters / 1000.0,
        snapshot.pressure_hpa,
    ]
}

/// Rain and snow indicators from a free-text condition label.
///
/// Substring containment, so "rain and snow" sets both.
pub fn precipitation_flags(condition_text: &str) -> (f64, f64) {
    let text = condition_text.to_lowercase();
    let flag = |needle: &str| if text.contains(needle) { 1.0 } else { 0.0 };
    (flag("rain"), flag("snow"))
}

#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    scaling: ScalingParameters,
}

impl FeatureExtractor {
    pub fn new(scaling: ScalingParameters) -> Self {
        Self { scaling }
    }

    pub fn scaling(&self) -> &ScalingParameters {
        &self.scaling
    }

    /// Build the feature map for one snapshot, keyed by full schema names.
    pub fn extract(&self, snapshot: &WeatherSnapshot, schema: &FeatureSchema) -> FeatureMap {
        let mut features = FeatureMap::with_capacity(schema.len());

        for (index, (short, raw)) in CONTINUOUS_FEATURES
            .iter()
            .zip(raw_continuous(snapshot))
            .enumerate()
        {
            match schema.resolve(short) {
                Some(full) => {
                    features.insert(full.to_string(), self.scaling.standardize(index, raw));
                }
                None => tracing::warn!("No schema entry for continuous feature '{}'", short),
            }
        }

        let calendar = LocalCalendar::from_snapshot(snapshot);
        let (hour_sin, hour_cos) = cyclical(f64::from(calendar.hour), HOURS_PER_DAY);
        let (month_sin, month_cos) = cyclical(f64::from(calendar.month), MONTHS_PER_YEAR);
        let (day_sin, day_cos) = cyclical(f64::from(calendar.day_of_year), DAYS_PER_YEAR);

        let bearing = f64::from(snapshot.wind_direction_degrees).to_radians();
        let (rain, snow) = precipitation_flags(&snapshot.condition_text);

        let encoded = [
            (HOUR_SIN, hour_sin),
            (HOUR_COS, hour_cos),
            (MONTH_SIN, month_sin),
            (MONTH_COS, month_cos),
            (DAY_OF_YEAR_SIN, day_sin),
            (DAY_OF_YEAR_COS, day_cos),
            (WIND_BEARING_SIN, bearing.sin()),
            (WIND_BEARING_COS, bearing.cos()),
            (PRECIP_RAIN, rain),
            (PRECIP_SNOW, snow),
        ];
        for (short, value) in encoded {
            match schema.resolve(short) {
                Some(full) => {
                    features.insert(full.to_string(), value);
                }
                None => tracing::debug!("Schema has no '{}' feature, skipping", short),
            }
        }

        tracing::trace!("Extracted {} features", features.len());
        features
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOON_2024_06_15_UTC: i64 = 1_718_452_800_000;

    fn snapshot() -> WeatherSnapshot {
        WeatherSnapshot {
            timestamp_utc_millis: NOON_2024_06_15_UTC,
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

    fn full_schema() -> FeatureSchema {
        FeatureSchema::from_text(
            "num__Temperature (C)\nnum__Humidity\nnum__Wind Speed (km/h)\n\
             num__Visibility (km)\nnum__Pressure (millibars)\n\
             cat__Precip Type_rain\ncat__Precip Type_snow\n\
             remainder__WindBearingSin\nremainder__WindBearingCos\n\
             remainder__HourSin\nremainder__HourCos\n\
             remainder__MonthSin\nremainder__MonthCos\n\
             remainder__DayOfYearSin\nremainder__DayOfYearCos\n",
        )
        .unwrap()
    }

    fn identity_scaling() -> ScalingParameters {
        ScalingParameters {
            means: vec![0.0; 5],
            scales: vec![1.0; 5],
            output_mean: 0.0,
            output_scale: 1.0,
        }
    }

    #[test]
    fn test_humidity_fraction_bounds() {
        let mut s = snapshot();
        s.humidity_percent = 100.0;
        assert_eq!(raw_continuous(&s)[1], 1.0);
        s.humidity_percent = 0.0;
        assert_eq!(raw_continuous(&s)[1], 0.0);
    }

    #[test]
    fn test_unit_conversions() {
        let raw = raw_continuous(&snapshot());
        assert_eq!(raw[0], 20.0);
        assert!((raw[2] - 18.0).abs() < 1e-12);
        assert_eq!(raw[3], 10.0);
        assert_eq!(raw[4], 1013.0);
    }

    #[test]
    fn test_local_hour_with_positive_offset() {
        let mut s = snapshot();
        s.timestamp_utc_millis = 1_718_409_600_000; // 2024-06-15T00:00:00Z
        s.timezone_offset_seconds = 3600;
        assert_eq!(LocalCalendar::from_snapshot(&s).hour, 1);
    }

    #[test]
    fn test_negative_offset_crosses_year_boundary() {
        let mut s = snapshot();
        s.timestamp_utc_millis = 1_704_067_200_000; // 2024-01-01T00:00:00Z
        s.timezone_offset_seconds = -5 * 3600;
        let cal = LocalCalendar::from_snapshot(&s);
        assert_eq!(cal.hour, 19);
        assert_eq!(cal.month, 12);
        assert_eq!(cal.day_of_year, 365);
    }

    #[test]
    fn test_calendar_fields_at_noon() {
        let cal = LocalCalendar::from_snapshot(&snapshot());
        assert_eq!(cal.hour, 12);
        assert_eq!(cal.month, 6);
        assert_eq!(cal.day_of_year, 167);
    }

    #[test]
    fn test_cyclical_pairs_lie_on_unit_circle() {
        let extractor = FeatureExtractor::new(identity_scaling());
        let schema = full_schema();
        for hour in 0..24i64 {
            let mut s = snapshot();
            s.timestamp_utc_millis = NOON_2024_06_15_UTC + hour * 3_600_000 * 7;
            s.wind_direction_degrees = (hour * 15) as u16;
            let map = extractor.extract(&s, &schema);
            for (sin, cos) in [
                ("remainder__HourSin", "remainder__HourCos"),
                ("remainder__MonthSin", "remainder__MonthCos"),
                ("remainder__DayOfYearSin", "remainder__DayOfYearCos"),
                ("remainder__WindBearingSin", "remainder__WindBearingCos"),
            ] {
                let norm = map[sin].powi(2) + map[cos].powi(2);
                assert!((norm - 1.0).abs() < 1e-9, "{sin}/{cos} norm {norm}");
            }
        }
    }

    #[test]
    fn test_wind_bearing_south() {
        let map = FeatureExtractor::new(identity_scaling()).extract(&snapshot(), &full_schema());
        assert!(map["remainder__WindBearingSin"].abs() < 1e-12);
        assert!((map["remainder__WindBearingCos"] + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_precipitation_one_hot() {
        assert_eq!(precipitation_flags("light rain"), (1.0, 0.0));
        assert_eq!(precipitation_flags("heavy snow"), (0.0, 1.0));
        assert_eq!(precipitation_flags("clear"), (0.0, 0.0));
        assert_eq!(precipitation_flags("Heavy RAIN"), (1.0, 0.0));
        assert_eq!(precipitation_flags("Rain and Snow"), (1.0, 1.0));
    }

    #[test]
    fn test_extract_populates_every_schema_entry() {
        let schema = full_schema();
        let map = FeatureExtractor::new(ScalingParameters::default()).extract(&snapshot(), &schema);
        assert_eq!(map.len(), schema.len());
        for name in schema.names() {
            assert!(map.contains_key(name), "missing {name}");
        }
    }

    #[test]
    fn test_continuous_values_are_standardized() {
        let scaling = ScalingParameters {
            means: vec![10.0, 0.5, 0.0, 0.0, 0.0],
            scales: vec![5.0, 0.25, 1.0, 1.0, 1.0],
            output_mean: 0.0,
            output_scale: 1.0,
        };
        let map = FeatureExtractor::new(scaling).extract(&snapshot(), &full_schema());
        assert!((map["num__Temperature (C)"] - 2.0).abs() < 1e-12);
        assert!(map["num__Humidity"].abs() < 1e-12);
        assert!((map["num__Wind Speed (km/h)"] - 18.0).abs() < 1e-12);
    }

    #[test]
    fn test_unresolved_continuous_feature_is_skipped() {
        let schema = FeatureSchema::from_text("num__Humidity\nremainder__HourSin").unwrap();
        let map = FeatureExtractor::new(identity_scaling()).extract(&snapshot(), &schema);
        assert_eq!(map.len(), 2);
        assert!(map.contains_key("num__Humidity"));
        assert!(map.contains_key("remainder__HourSin"));
    }
}
