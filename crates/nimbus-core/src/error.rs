//! Centralized error types for the Nimbus application.
//!
//! Crate-level errors (prediction, weather input) are folded into `AppError`
//! at the binary edge so every failure has a message fit for display.

use thiserror::Error;

/// Top-level application error type.
///
/// Use `user_message()` to get a UI-appropriate message.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid weather input handed to the application.
    #[error("Invalid weather data: {0}")]
    InvalidInput(String),

    /// Prediction subsystem errors, mapped from the feels-like crate.
    #[error("Prediction error: {0}")]
    Prediction(String),
}

impl AppError {
    /// Returns a user-friendly message suitable for display in the UI.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Config(e) => e.user_message(),
            AppError::Io(_) => "A file operation failed. Please try again.",
            AppError::InvalidInput(_) => "The weather data could not be read.",
            AppError::Prediction(_) => "The ML feels-like estimate is unavailable.",
        }
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Configuration parse error: {0}")]
    ParseError(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::Invalid(_) => "Invalid configuration. Check your settings.",
            ConfigError::ParseError(_) => "Configuration file is malformed. Check your settings.",
        }
    }
}
