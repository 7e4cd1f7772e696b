//! Forecasting many (district, indicator) series in one run.
//!
//! A series that cannot be forecast (too few points, a target inside the
//! history) is recorded as a failure and the run continues.

use bd_climate_dataset::Dataset;
use bd_climate_forecast_models::{BatchForecast, Config, ForecastFailure};
use bd_climate_indicator_models::{District, Indicator, Scope};

use crate::{ForecastError, ForecastOptions, ProgressCallback, forecast_scope};

/// Which series a batch run covers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchRequest {
    /// Indicators to forecast; empty means all thirteen.
    pub indicators: Vec<Indicator>,
    /// Districts to forecast, any accepted spelling; empty means every
    /// district in the dataset.
    pub districts: Vec<String>,
    pub options: ForecastOptions,
}

/// Forecasts every requested (district, indicator) pair.
///
/// # Errors
///
/// Returns [`ForecastError::Dataset`] if a requested district is unknown.
/// Errors for individual series are collected in
/// [`BatchForecast::failures`] instead.
pub fn forecast_all(
    dataset: &Dataset,
    config: &Config,
    request: &BatchRequest,
    progress: &dyn ProgressCallback,
) -> Result<BatchForecast, ForecastError> {
    let districts: Vec<&District> = if request.districts.is_empty() {
        dataset.districts()
    } else {
        request
            .districts
            .iter()
            .map(|name| dataset.resolve_district(name))
            .collect::<Result<_, _>>()?
    };
    let indicators: &[Indicator] = if request.indicators.is_empty() {
        Indicator::all()
    } else {
        &request.indicators
    };

    let total = districts.len() * indicators.len();
    progress.set_total(total as u64);
    log::info!(
        "Forecasting {} indicators for {} districts",
        indicators.len(),
        districts.len()
    );

    let mut batch = BatchForecast::default();
    for district in districts {
        progress.set_message(district.name().to_string());
        let scope = Scope::District(district.name().to_string());

        for &indicator in indicators {
            match forecast_scope(dataset, &scope, indicator, config, &request.options) {
                Ok(result) => batch.results.push(result),
                Err(e) => {
                    log::warn!("Skipping {indicator} for {district}: {e}");
                    batch.failures.push(ForecastFailure {
                        indicator,
                        scope: district.name().to_string(),
                        error: e.to_string(),
                    });
                }
            }
            progress.inc(1);
        }
    }

    progress.finish(format!(
        "{} forecasts, {} failed",
        batch.results.len(),
        batch.failures.len()
    ));
    Ok(batch)
}
