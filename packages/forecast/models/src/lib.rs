#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Forecast configuration and result types.
//!
//! The model family used for each indicator is fixed by configuration
//! ([`Config`]) rather than chosen per call. The result types here are what
//! the forecaster returns and what the CLI prints or serializes.

pub mod config;

use bd_climate_indicator_models::Indicator;
use serde::{Deserialize, Serialize};

pub use config::{Config, ConfigError, DatasetSettings, ForecastSettings};

/// Lowest supported polynomial degree.
pub const MIN_POLYNOMIAL_DEGREE: u8 = 2;
/// Highest supported polynomial degree.
pub const MAX_POLYNOMIAL_DEGREE: u8 = 3;

/// A model family with its parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModelSpec {
    /// Ordinary least-squares straight line over the year axis.
    #[default]
    Linear,
    /// Least-squares polynomial trend.
    Polynomial {
        /// Polynomial degree, 2 or 3.
        degree: u8,
    },
    /// Holt linear (double) exponential smoothing.
    Holt {
        /// Level smoothing factor, in (0, 1).
        alpha: f64,
        /// Trend smoothing factor, in (0, 1).
        beta: f64,
    },
}

/// Error returned for out-of-range model parameters.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidModelError {
    #[error(
        "polynomial degree must be between {min} and {max}, got {0}",
        min = MIN_POLYNOMIAL_DEGREE,
        max = MAX_POLYNOMIAL_DEGREE
    )]
    Degree(u8),

    #[error("smoothing factor {name} must be strictly between 0 and 1, got {value}")]
    Smoothing { name: &'static str, value: f64 },
}

impl ModelSpec {
    /// Checks the parameters.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidModelError`] if a polynomial degree is outside
    /// 2..=3 or a smoothing factor is outside (0, 1).
    pub fn validate(&self) -> Result<(), InvalidModelError> {
        match *self {
            Self::Linear => Ok(()),
            Self::Polynomial { degree } => {
                if (MIN_POLYNOMIAL_DEGREE..=MAX_POLYNOMIAL_DEGREE).contains(&degree) {
                    Ok(())
                } else {
                    Err(InvalidModelError::Degree(degree))
                }
            }
            Self::Holt { alpha, beta } => {
                for (name, value) in [("alpha", alpha), ("beta", beta)] {
                    if !(value > 0.0 && value < 1.0) {
                        return Err(InvalidModelError::Smoothing { name, value });
                    }
                }
                Ok(())
            }
        }
    }

    /// Distinct years with valid values needed to fit this model.
    #[must_use]
    pub const fn min_points(&self) -> usize {
        match self {
            Self::Linear | Self::Holt { .. } => 2,
            Self::Polynomial { degree } => *degree as usize + 1,
        }
    }

    /// Short family name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Polynomial { .. } => "polynomial",
            Self::Holt { .. } => "holt",
        }
    }

    /// Whether the model is a regression, and so reports R².
    #[must_use]
    pub const fn is_regression(&self) -> bool {
        !matches!(self, Self::Holt { .. })
    }
}

impl std::fmt::Display for ModelSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Linear => write!(f, "linear"),
            Self::Polynomial { degree } => write!(f, "polynomial (degree {degree})"),
            Self::Holt { alpha, beta } => write!(f, "holt (alpha {alpha}, beta {beta})"),
        }
    }
}

/// One forecast value with its 95% band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub year: i32,
    pub value: f64,
    pub lower: f64,
    pub upper: f64,
}

/// How well the model reproduces the historical points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FitMetrics {
    /// Distinct years used for fitting.
    pub n_points: usize,
    /// Coefficient of determination, for regression models only.
    pub r_squared: Option<f64>,
    /// Root-mean-square error of the in-sample fitted values.
    pub rmse: f64,
}

/// A historical point next to the model's in-sample value for it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FittedPoint {
    pub year: i32,
    pub actual: f64,
    pub fitted: f64,
}

/// Result of forecasting one series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Forecast {
    pub model: ModelSpec,
    pub fit: FitMetrics,
    /// Last year with a valid historical value.
    pub last_observed_year: i32,
    /// One entry per requested target year, in request order.
    pub predictions: Vec<Prediction>,
    pub fitted: Vec<FittedPoint>,
}

impl Forecast {
    /// Looks up the prediction for a target year.
    #[must_use]
    pub fn prediction(&self, year: i32) -> Option<&Prediction> {
        self.predictions.iter().find(|p| p.year == year)
    }
}

/// A forecast labelled with what it was computed for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScopedForecast {
    pub indicator: Indicator,
    /// Display name of the district, region or country.
    pub scope: String,
    pub forecast: Forecast,
}

/// A series a batch run could not forecast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastFailure {
    pub indicator: Indicator,
    pub scope: String,
    pub error: String,
}

/// Outcome of forecasting many series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchForecast {
    pub results: Vec<ScopedForecast>,
    pub failures: Vec<ForecastFailure>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_parameters() {
        assert!(ModelSpec::Linear.validate().is_ok());
        assert!(ModelSpec::Polynomial { degree: 3 }.validate().is_ok());
        assert_eq!(
            ModelSpec::Polynomial { degree: 1 }.validate(),
            Err(InvalidModelError::Degree(1))
        );
        assert!(
            ModelSpec::Holt {
                alpha: 0.5,
                beta: 1.0
            }
            .validate()
            .is_err()
        );
        assert!(
            ModelSpec::Holt {
                alpha: f64::NAN,
                beta: 0.5
            }
            .validate()
            .is_err()
        );
    }

    #[test]
    fn min_points_per_family() {
        assert_eq!(ModelSpec::Linear.min_points(), 2);
        assert_eq!(ModelSpec::Polynomial { degree: 3 }.min_points(), 4);
        assert_eq!(
            ModelSpec::Holt {
                alpha: 0.5,
                beta: 0.5
            }
            .min_points(),
            2
        );
    }

    #[test]
    fn model_spec_serializes_tagged() {
        let spec: ModelSpec = toml::from_str("type = \"polynomial\"\ndegree = 2").unwrap();
        assert_eq!(spec, ModelSpec::Polynomial { degree: 2 });
        assert_eq!(spec.to_string(), "polynomial (degree 2)");
    }
}
