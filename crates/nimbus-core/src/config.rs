use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Add an error
    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Add a warning
    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        if self.errors.is_empty() {
            return String::new();
        }
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application configuration directory
    pub config_dir: PathBuf,

    /// Weather display settings
    #[serde(default)]
    pub weather: WeatherConfig,

    /// On-device "feels like" model settings
    #[serde(default)]
    pub feels_like: FeelsLikeConfig,
}

/// Temperature unit preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Auto,
    Celsius,
    Fahrenheit,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Temperature unit preference
    #[serde(default)]
    pub temperature_unit: TemperatureUnit,
}

/// What the assembler does when the schema names a feature the extractor
/// did not produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MissingFeaturePolicy {
    /// Substitute 0.0 and log an error.
    #[default]
    ZeroFill,
    /// Fail the prediction.
    Reject,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeelsLikeConfig {
    /// Run the model at all
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Directory holding the bundled model assets
    #[serde(default = "default_assets_dir")]
    pub assets_dir: PathBuf,

    /// Serialized model artifact, relative to `assets_dir`
    #[serde(default = "default_model_file")]
    pub model_file: String,

    /// Newline-delimited feature names in trained order, relative to `assets_dir`
    #[serde(default = "default_feature_names_file")]
    pub feature_names_file: String,

    #[serde(default)]
    pub missing_feature_policy: MissingFeaturePolicy,

    /// Abort initialization when a continuous input has no schema entry
    #[serde(default)]
    pub strict_schema: bool,
}

fn default_enabled() -> bool {
    true
}

fn default_assets_dir() -> PathBuf {
    PathBuf::from("assets")
}

fn default_model_file() -> String {
    "feels_like_model.safetensors".to_string()
}

fn default_feature_names_file() -> String {
    "feature_names.txt".to_string()
}

impl Default for FeelsLikeConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            assets_dir: default_assets_dir(),
            model_file: default_model_file(),
            feature_names_file: default_feature_names_file(),
            missing_feature_policy: MissingFeaturePolicy::default(),
            strict_schema: false,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("nimbus");

        Self {
            config_dir,
            weather: WeatherConfig::default(),
            feels_like: FeelsLikeConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file, creating default if it doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path, writing defaults there if missing
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            let config = Self::default();
            config.save_to(config_path)?;
            return Ok(config);
        }

        let contents = std::fs::read_to_string(config_path)
            .context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents)
            .context("Failed to parse config file")?;

        Ok(config)
    }

    /// Validate the configuration
    ///
    /// Returns a ValidationResult containing any errors or warnings.
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        let feels = &self.feels_like;
        if feels.model_file.trim().is_empty() {
            result.add_error("feels_like.model_file", "Model file name must not be empty");
        }
        if feels.feature_names_file.trim().is_empty() {
            result.add_error(
                "feels_like.feature_names_file",
                "Feature names file name must not be empty",
            );
        }

        if !feels.enabled {
            result.add_warning("feels_like.enabled", "ML feels-like estimate disabled");
        } else if !feels.assets_dir.exists() {
            result.add_warning(
                "feels_like.assets_dir",
                format!("Path does not exist: {}", feels.assets_dir.display()),
            );
        } else if !feels.assets_dir.is_dir() {
            result.add_error(
                "feels_like.assets_dir",
                format!("Path is not a directory: {}", feels.assets_dir.display()),
            );
        }

        result
    }

    /// Save configuration to an explicit path
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        // Ensure config directory exists
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;

        std::fs::write(config_path, contents)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Get the path to the configuration file
    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("nimbus");

        Ok(config_dir.join("config.toml"))
    }
}
