//! Derived per-row features and the processed-data export.

use std::io::Write;
use std::path::Path;

use bd_climate_indicator_models::reading::format_value;
use bd_climate_indicator_models::{Indicator, Observation};
use serde::Serialize;

use crate::{Dataset, DatasetError, write};

pub const DECADE_COLUMN: &str = "Decade";
pub const CLIMATE_RISK_COLUMN: &str = "Climate_Risk_Score";
pub const ENVIRONMENTAL_HEALTH_COLUMN: &str = "Environmental_Health_Index";

/// Composite values computed from one observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DerivedFeatures {
    pub decade: i32,
    pub climate_risk_score: Option<f64>,
    pub environmental_health_index: Option<f64>,
}

impl DerivedFeatures {
    #[must_use]
    pub fn for_observation(obs: &Observation) -> Self {
        Self {
            decade: decade(obs.year),
            climate_risk_score: climate_risk_score(obs),
            environmental_health_index: environmental_health_index(obs),
        }
    }
}

/// Start year of the decade `year` falls in.
#[must_use]
pub const fn decade(year: i32) -> i32 {
    year.div_euclid(10) * 10
}

/// `0.3 * flood impact + 0.3 * drought severity + 0.4 * cyclone count`.
#[must_use]
pub fn climate_risk_score(obs: &Observation) -> Option<f64> {
    let flood = obs.value(Indicator::FloodImpactScore)?;
    let drought = obs.value(Indicator::DroughtSeverity)?;
    let cyclones = obs.value(Indicator::CycloneCount)?;
    Some(0.4f64.mul_add(cyclones, 0.3f64.mul_add(flood, 0.3 * drought)))
}

/// `(0.4 * forest cover + 0.3 * (100 - AQI) + 0.3 * renewable share) / 100`.
#[must_use]
pub fn environmental_health_index(obs: &Observation) -> Option<f64> {
    let forest = obs.value(Indicator::ForestCover)?;
    let aqi = obs.value(Indicator::AirQualityIndex)?;
    let renewable = obs.value(Indicator::RenewableEnergyUsage)?;
    Some(0.4f64.mul_add(forest, 0.3f64.mul_add(100.0 - aqi, 0.3 * renewable)) / 100.0)
}

/// Writes the dataset followed by the `Decade`, `Climate_Risk_Score` and
/// `Environmental_Health_Index` columns. Missing features are empty cells.
///
/// # Errors
///
/// * [`DatasetError::Csv`] or [`DatasetError::Io`] if writing fails
pub fn write_processed_csv<W: Write>(dataset: &Dataset, writer: W) -> Result<(), DatasetError> {
    write::write_with_extra(
        dataset,
        writer,
        &[
            DECADE_COLUMN,
            CLIMATE_RISK_COLUMN,
            ENVIRONMENTAL_HEALTH_COLUMN,
        ],
        |obs| {
            let features = DerivedFeatures::for_observation(obs);
            let cell = |value: Option<f64>| value.map(format_value).unwrap_or_default();
            vec![
                features.decade.to_string(),
                cell(features.climate_risk_score),
                cell(features.environmental_health_index),
            ]
        },
    )
}

/// Writes the processed export to a file.
///
/// # Errors
///
/// * [`DatasetError::Io`] if the file cannot be created
/// * any error from [`write_processed_csv`]
pub fn write_processed_path(dataset: &Dataset, path: &Path) -> Result<(), DatasetError> {
    let file = std::fs::File::create(path)?;
    write_processed_csv(dataset, std::io::BufWriter::new(file))?;
    log::info!("Processed data saved to {}", path.display());
    Ok(())
}
