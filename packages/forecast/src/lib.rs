#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Indicator forecaster.
//!
//! [`forecast`] fits one model family to a yearly series and projects it to
//! the requested target years. It is a pure function: the same input always
//! gives the same output, nothing is cached, and missing or non-finite
//! values are dropped from the fit rather than imputed.
//!
//! [`forecast_scope`] and [`batch::forecast_all`] pull the series out of a
//! [`Dataset`] and pick the model from [`Config`].

pub mod batch;
pub mod holt;
pub mod linear;
pub mod polynomial;
pub mod progress;

use std::collections::BTreeMap;

use bd_climate_dataset::{Dataset, DatasetError};
use bd_climate_forecast_models::{
    Config, FitMetrics, FittedPoint, Forecast, InvalidModelError, ModelSpec, Prediction,
    ScopedForecast,
};
use bd_climate_indicator_models::{Indicator, Scope};

pub use batch::{BatchRequest, forecast_all};
pub use holt::HoltTrend;
pub use linear::LinearTrend;
pub use polynomial::PolynomialTrend;
pub use progress::{NullProgress, ProgressCallback};

/// Two-sided 95% normal quantile used for prediction bands.
pub const CONFIDENCE_Z: f64 = 1.96;

#[derive(Debug, thiserror::Error)]
pub enum ForecastError {
    #[error(
        "Insufficient data: need at least {required} distinct years with valid values, got {actual}"
    )]
    InsufficientData { required: usize, actual: usize },

    #[error("Target year {year} is not after the last observed year {last_observed}")]
    InvalidTarget { year: i32, last_observed: i32 },

    #[error("Invalid model parameter: {0}")]
    InvalidParameter(#[from] InvalidModelError),

    #[error("Numerical error: {0}")]
    Numerical(String),

    #[error(transparent)]
    Dataset(#[from] DatasetError),
}

/// A fitted model.
pub trait Trend {
    /// In-sample value for each fitting point, in point order.
    fn in_sample(&self) -> &[f64];

    /// Value for a year after the last fitting point.
    fn project(&self, year: i32) -> f64;
}

/// Forecasts one series.
///
/// Points with a missing or non-finite value are dropped. Several points for
/// the same year are merged into their mean. An empty `targets` list gives
/// an empty prediction list.
///
/// # Errors
///
/// * [`ForecastError::InvalidParameter`] if `model` is out of range
/// * [`ForecastError::InsufficientData`] with fewer distinct valid years
///   than the model needs (two for linear and Holt)
/// * [`ForecastError::InvalidTarget`] if a target is not after the last
///   valid year
/// * [`ForecastError::Numerical`] if the fit is singular
pub fn forecast(
    points: &[(i32, Option<f64>)],
    targets: &[i32],
    model: &ModelSpec,
) -> Result<Forecast, ForecastError> {
    model.validate()?;

    let history = valid_history(points);
    let required = model.min_points();
    if history.len() < required {
        return Err(ForecastError::InsufficientData {
            required,
            actual: history.len(),
        });
    }

    let last_observed = history.last().map_or(i32::MIN, |&(t, _)| t);
    if let Some(&year) = targets.iter().find(|&&year| year <= last_observed) {
        return Err(ForecastError::InvalidTarget {
            year,
            last_observed,
        });
    }

    let trend: Box<dyn Trend> = match *model {
        ModelSpec::Linear => Box::new(LinearTrend::fit(&history)?),
        ModelSpec::Polynomial { degree } => Box::new(PolynomialTrend::fit(&history, degree)?),
        ModelSpec::Holt { alpha, beta } => Box::new(HoltTrend::fit(&history, alpha, beta)?),
    };

    let fitted: Vec<FittedPoint> = history
        .iter()
        .zip(trend.in_sample())
        .map(|(&(year, actual), &fitted)| FittedPoint {
            year,
            actual,
            fitted,
        })
        .collect();

    let fit = FitMetrics {
        n_points: history.len(),
        r_squared: model.is_regression().then(|| r_squared(&fitted)),
        rmse: rmse(&fitted),
    };

    let margin = CONFIDENCE_Z * fit.rmse;
    let predictions = targets
        .iter()
        .map(|&year| {
            let value = trend.project(year);
            Prediction {
                year,
                value,
                lower: value - margin,
                upper: value + margin,
            }
        })
        .collect::<Vec<_>>();

    if predictions.iter().any(|p| !p.value.is_finite()) {
        return Err(ForecastError::Numerical(
            "model produced a non-finite prediction".to_string(),
        ));
    }

    log::trace!(
        "{model} fit over {} points: rmse={:.4}, r2={:?}",
        fit.n_points,
        fit.rmse,
        fit.r_squared
    );

    Ok(Forecast {
        model: *model,
        fit,
        last_observed_year: last_observed,
        predictions,
        fitted,
    })
}

/// Last year of `points` holding a finite value.
#[must_use]
pub fn last_valid_year(points: &[(i32, Option<f64>)]) -> Option<i32> {
    points
        .iter()
        .filter(|(_, v)| v.is_some_and(f64::is_finite))
        .map(|&(year, _)| year)
        .max()
}

/// The `horizon` years following `last_year`.
#[must_use]
pub fn default_targets(last_year: i32, horizon: u32) -> Vec<i32> {
    (1..=horizon)
        .map_while(|h| i32::try_from(h).ok().and_then(|h| last_year.checked_add(h)))
        .collect()
}

/// Which rows feed a scope forecast and which years it targets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForecastOptions {
    /// Target years; `None` means the configured horizon after the last
    /// valid year.
    pub targets: Option<Vec<i32>>,
    /// Also fit on rows marked as forecast in the source file.
    pub include_forecast_rows: bool,
}

/// Forecasts one indicator over a district, region or the whole country,
/// using the model configured for the indicator.
///
/// # Errors
///
/// * [`ForecastError::Dataset`] if the scope cannot be resolved
/// * any error from [`forecast`]
pub fn forecast_scope(
    dataset: &Dataset,
    scope: &Scope,
    indicator: Indicator,
    config: &Config,
    options: &ForecastOptions,
) -> Result<ScopedForecast, ForecastError> {
    let series = dataset.scope_series(scope, indicator)?;
    let series = if options.include_forecast_rows {
        series
    } else {
        series.measured()
    };
    let points = series.pairs();

    let targets = options.targets.clone().unwrap_or_else(|| {
        last_valid_year(&points)
            .map(|last| default_targets(last, config.forecast.horizon))
            .unwrap_or_default()
    });

    let model = config.model_for(indicator);
    log::debug!(
        "Forecasting {indicator} for {} with {model} to {targets:?}",
        series.scope
    );

    Ok(ScopedForecast {
        indicator,
        scope: series.scope,
        forecast: forecast(&points, &targets, &model)?,
    })
}

/// Finite points, one per year (duplicates averaged), sorted by year.
#[allow(clippy::cast_precision_loss)]
fn valid_history(points: &[(i32, Option<f64>)]) -> Vec<(i32, f64)> {
    let mut by_year: BTreeMap<i32, (f64, usize)> = BTreeMap::new();
    for &(year, value) in points {
        if let Some(value) = value.filter(|v| v.is_finite()) {
            let entry = by_year.entry(year).or_insert((0.0, 0));
            entry.0 += value;
            entry.1 += 1;
        }
    }
    by_year
        .into_iter()
        .map(|(year, (sum, count))| (year, sum / count as f64))
        .collect()
}

/// Coefficient of determination; 1.0 when the actual values have no
/// variance.
#[allow(clippy::cast_precision_loss)]
fn r_squared(points: &[FittedPoint]) -> f64 {
    let mean = points.iter().map(|p| p.actual).sum::<f64>() / points.len() as f64;
    let ss_tot: f64 = points.iter().map(|p| (p.actual - mean).powi(2)).sum();
    let ss_res: f64 = points.iter().map(|p| (p.actual - p.fitted).powi(2)).sum();
    if ss_tot.abs() < f64::EPSILON {
        1.0
    } else {
        1.0 - ss_res / ss_tot
    }
}

#[allow(clippy::cast_precision_loss)]
fn rmse(points: &[FittedPoint]) -> f64 {
    let sum_sq: f64 = points.iter().map(|p| (p.actual - p.fitted).powi(2)).sum();
    (sum_sq / points.len() as f64).sqrt()
}
