//! Forecaster configuration.
//!
//! The default configuration is `forecast.toml`, embedded at compile time
//! via [`include_str!`]. A user-supplied file replaces it wholesale; any
//! section or key it omits falls back to the built-in default value.

use std::collections::BTreeMap;
use std::path::Path;

use bd_climate_indicator_models::{DEFAULT_MEASURED_THROUGH, Indicator, MAX_YEAR, MIN_YEAR};
use serde::{Deserialize, Serialize};

use crate::{InvalidModelError, ModelSpec};

/// Default configuration embedded at compile time.
const DEFAULT_CONFIG: &str = include_str!("../forecast.toml");

const DEFAULT_HORIZON: u32 = 5;

/// Errors raised while reading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Unknown indicator '{0}' in [forecast.models]")]
    UnknownIndicator(String),

    #[error("Invalid model: {0}")]
    InvalidModel(#[from] InvalidModelError),

    #[error("Delimiter must be a single ASCII character, got '{0}'")]
    InvalidDelimiter(String),

    #[error(
        "measured_through must be between {min} and {max}, got {0}",
        min = MIN_YEAR,
        max = MAX_YEAR
    )]
    InvalidMeasuredThrough(i32),

    #[error("Forecast horizon must be at least 1")]
    InvalidHorizon,
}

/// How the input file is interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetSettings {
    /// Last measured year when the file has no `Provenance` column.
    pub measured_through: i32,
    /// Field delimiter, a single ASCII character.
    pub delimiter: String,
}

impl Default for DatasetSettings {
    fn default() -> Self {
        Self {
            measured_through: DEFAULT_MEASURED_THROUGH,
            delimiter: ",".to_string(),
        }
    }
}

impl DatasetSettings {
    /// The delimiter as a byte.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidDelimiter`] unless the setting is
    /// exactly one ASCII character.
    pub fn delimiter_byte(&self) -> Result<u8, ConfigError> {
        match self.delimiter.as_bytes() {
            [byte] if byte.is_ascii() => Ok(*byte),
            _ => Err(ConfigError::InvalidDelimiter(self.delimiter.clone())),
        }
    }
}

/// Model selection and horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastSettings {
    /// Years forecast past the last measured year when no targets are given.
    pub horizon: u32,
    /// Model for indicators not listed in `models`.
    pub default_model: ModelSpec,
    /// Per-indicator model, keyed by column name.
    pub models: BTreeMap<String, ModelSpec>,
}

impl Default for ForecastSettings {
    fn default() -> Self {
        Self {
            horizon: DEFAULT_HORIZON,
            default_model: ModelSpec::Linear,
            models: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub dataset: DatasetSettings,
    pub forecast: ForecastSettings,
}

impl Config {
    /// Returns the embedded default configuration.
    ///
    /// # Panics
    ///
    /// Panics if the embedded `forecast.toml` is malformed, which the tests
    /// in this crate guard against.
    #[must_use]
    pub fn embedded() -> Self {
        Self::from_toml_str(DEFAULT_CONFIG)
            .unwrap_or_else(|e| panic!("Failed to parse embedded forecast.toml: {e}"))
    }

    /// Parses and validates a configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the TOML is malformed or any value fails
    /// [`Config::validate`].
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or any error
    /// from [`Config::from_toml_str`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        log::debug!("Reading config from {}", path.display());
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Checks every setting.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.dataset.delimiter_byte()?;
        if !(MIN_YEAR..=MAX_YEAR).contains(&self.dataset.measured_through) {
            return Err(ConfigError::InvalidMeasuredThrough(
                self.dataset.measured_through,
            ));
        }
        if self.forecast.horizon == 0 {
            return Err(ConfigError::InvalidHorizon);
        }
        self.forecast.default_model.validate()?;
        for (key, spec) in &self.forecast.models {
            key.parse::<Indicator>()
                .map_err(|_| ConfigError::UnknownIndicator(key.clone()))?;
            spec.validate()?;
        }
        Ok(())
    }

    /// The model configured for an indicator.
    #[must_use]
    pub fn model_for(&self, indicator: Indicator) -> ModelSpec {
        self.forecast
            .models
            .iter()
            .find(|(key, _)| key.parse::<Indicator>().ok() == Some(indicator))
            .map_or(self.forecast.default_model, |(_, spec)| *spec)
    }
}
