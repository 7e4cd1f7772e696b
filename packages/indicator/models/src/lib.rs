#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Climate indicator, district and observation types.
//!
//! This crate defines the typed record that every row of the Bangladesh
//! environmental dataset is validated into, along with the fixed set of
//! measured indicators and the district registry that rows are keyed on.
//! Everything downstream (loading, analysis, forecasting) works with these
//! types rather than re-checking loosely typed columns.

pub mod district;
pub mod reading;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

pub use district::{
    District, DistrictEntry, DistrictRegistry, Region, RegistryError, UnknownDistrictError,
};
pub use reading::{InvalidReadingError, Reading};

/// Earliest year a valid observation may carry.
pub const MIN_YEAR: i32 = 1990;

/// Latest year a valid observation may carry (forecast rows included).
pub const MAX_YEAR: i32 = 2025;

/// Last year of measured data in the published dataset. Rows after this
/// year are model-generated forecasts.
pub const DEFAULT_MEASURED_THROUGH: i32 = 2023;

/// Number of numeric indicator columns in an [`Observation`].
pub const INDICATOR_COUNT: usize = 13;

/// CSV column holding the observation year.
pub const YEAR_COLUMN: &str = "Year";

/// CSV column holding the district label.
pub const DISTRICT_COLUMN: &str = "District";

/// Optional CSV column marking whether a row is measured or forecast.
pub const PROVENANCE_COLUMN: &str = "Provenance";

/// A numeric quantity measured per district and year.
///
/// The string form of each variant is the exact CSV column name used by the
/// published dataset. Parsing is case-insensitive and also accepts a short
/// alias (e.g. `temperature`, `rainfall`).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum Indicator {
    /// Mean annual air temperature in degrees Celsius.
    #[serde(rename = "Avg_Temperature_C")]
    #[strum(to_string = "Avg_Temperature_C", serialize = "temperature")]
    AvgTemperature,
    /// Total annual rainfall in millimetres.
    #[serde(rename = "Annual_Rainfall_mm")]
    #[strum(to_string = "Annual_Rainfall_mm", serialize = "rainfall")]
    AnnualRainfall,
    /// Air quality index.
    #[serde(rename = "AQI")]
    #[strum(to_string = "AQI", serialize = "air_quality")]
    AirQualityIndex,
    /// Share of land under forest cover, in percent.
    #[serde(rename = "Forest_Cover_Percent")]
    #[strum(to_string = "Forest_Cover_Percent", serialize = "forest_cover")]
    ForestCover,
    /// River water level in metres.
    #[serde(rename = "River_Water_Level_m")]
    #[strum(to_string = "River_Water_Level_m", serialize = "river_level")]
    RiverWaterLevel,
    /// Number of cyclones in the year.
    #[serde(rename = "Cyclone_Count")]
    #[strum(to_string = "Cyclone_Count", serialize = "cyclones")]
    CycloneCount,
    /// Flood impact score.
    #[serde(rename = "Flood_Impact_Score")]
    #[strum(to_string = "Flood_Impact_Score", serialize = "flood")]
    FloodImpactScore,
    /// Drought severity score.
    #[serde(rename = "Drought_Severity")]
    #[strum(to_string = "Drought_Severity", serialize = "drought")]
    DroughtSeverity,
    /// Agricultural yield in tonnes per hectare.
    #[serde(rename = "Agricultural_Yield_ton_per_hectare")]
    #[strum(
        to_string = "Agricultural_Yield_ton_per_hectare",
        serialize = "agricultural_yield"
    )]
    AgriculturalYield,
    /// Coastal erosion in metres per year.
    #[serde(rename = "Coastal_Erosion_m_per_year")]
    #[strum(to_string = "Coastal_Erosion_m_per_year", serialize = "coastal_erosion")]
    CoastalErosion,
    /// Urbanization rate in percent.
    #[serde(rename = "Urbanization_Rate_Percent")]
    #[strum(to_string = "Urbanization_Rate_Percent", serialize = "urbanization")]
    UrbanizationRate,
    /// Carbon emissions in metric tons per capita.
    #[serde(rename = "Carbon_Emission_Metric_Tons_per_Capita")]
    #[strum(
        to_string = "Carbon_Emission_Metric_Tons_per_Capita",
        serialize = "carbon_emission"
    )]
    CarbonEmissionPerCapita,
    /// Share of energy from renewable sources, in percent.
    #[serde(rename = "Renewable_Energy_Usage_Percent")]
    #[strum(to_string = "Renewable_Energy_Usage_Percent", serialize = "renewable_energy")]
    RenewableEnergyUsage,
}

impl Indicator {
    /// Returns the exact CSV column name for this indicator.
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::AvgTemperature => "Avg_Temperature_C",
            Self::AnnualRainfall => "Annual_Rainfall_mm",
            Self::AirQualityIndex => "AQI",
            Self::ForestCover => "Forest_Cover_Percent",
            Self::RiverWaterLevel => "River_Water_Level_m",
            Self::CycloneCount => "Cyclone_Count",
            Self::FloodImpactScore => "Flood_Impact_Score",
            Self::DroughtSeverity => "Drought_Severity",
            Self::AgriculturalYield => "Agricultural_Yield_ton_per_hectare",
            Self::CoastalErosion => "Coastal_Erosion_m_per_year",
            Self::UrbanizationRate => "Urbanization_Rate_Percent",
            Self::CarbonEmissionPerCapita => "Carbon_Emission_Metric_Tons_per_Capita",
            Self::RenewableEnergyUsage => "Renewable_Energy_Usage_Percent",
        }
    }

    /// Returns a human-readable label for tables and prompts.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::AvgTemperature => "Average temperature",
            Self::AnnualRainfall => "Annual rainfall",
            Self::AirQualityIndex => "Air quality index",
            Self::ForestCover => "Forest cover",
            Self::RiverWaterLevel => "River water level",
            Self::CycloneCount => "Cyclone count",
            Self::FloodImpactScore => "Flood impact score",
            Self::DroughtSeverity => "Drought severity",
            Self::AgriculturalYield => "Agricultural yield",
            Self::CoastalErosion => "Coastal erosion",
            Self::UrbanizationRate => "Urbanization rate",
            Self::CarbonEmissionPerCapita => "Carbon emission per capita",
            Self::RenewableEnergyUsage => "Renewable energy usage",
        }
    }

    /// Returns the unit of measurement, or an empty string for unitless
    /// scores and counts.
    #[must_use]
    pub const fn unit(self) -> &'static str {
        match self {
            Self::AvgTemperature => "°C",
            Self::AnnualRainfall => "mm",
            Self::ForestCover
            | Self::UrbanizationRate
            | Self::RenewableEnergyUsage => "%",
            Self::RiverWaterLevel => "m",
            Self::AgriculturalYield => "t/ha",
            Self::CoastalErosion => "m/yr",
            Self::CarbonEmissionPerCapita => "t CO2/capita",
            Self::AirQualityIndex
            | Self::CycloneCount
            | Self::FloodImpactScore
            | Self::DroughtSeverity => "",
        }
    }

    /// Position of this indicator in an [`Observation`]'s reading array.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Returns all variants of this enum, in dataset column order.
    #[must_use]
    pub const fn all() -> &'static [Self; INDICATOR_COUNT] {
        &[
            Self::AvgTemperature,
            Self::AnnualRainfall,
            Self::AirQualityIndex,
            Self::ForestCover,
            Self::RiverWaterLevel,
            Self::CycloneCount,
            Self::FloodImpactScore,
            Self::DroughtSeverity,
            Self::AgriculturalYield,
            Self::CoastalErosion,
            Self::UrbanizationRate,
            Self::CarbonEmissionPerCapita,
            Self::RenewableEnergyUsage,
        ]
    }
}

/// Whether a row holds measured data or a model-generated forecast.
///
/// The published dataset does not carry this flag; when the column is
/// absent it is assigned from the configured last measured year at load
/// time and never inferred again afterwards.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Provenance {
    /// Observed measurement.
    Measured,
    /// Value produced by a forecasting model.
    Forecast,
}

impl Provenance {
    /// Assigns provenance from the year alone, given the last measured year.
    #[must_use]
    pub const fn for_year(year: i32, measured_through: i32) -> Self {
        if year <= measured_through {
            Self::Measured
        } else {
            Self::Forecast
        }
    }
}

/// Cell text of a row as it appeared in a file, for the cells whose typed
/// value does not keep its spelling.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowText {
    /// The `Year` cell, untrimmed.
    pub year: String,
    /// The `Provenance` cell, `None` when the file has no such column.
    pub provenance: Option<String>,
    /// Cells of columns outside the data model, in file order.
    pub extra: Vec<String>,
}

/// One row of the dataset: a single district's indicators for one year.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    /// Calendar year, within [`MIN_YEAR`]..=[`MAX_YEAR`].
    pub year: i32,
    /// District this row belongs to.
    pub district: District,
    /// Measured or forecast.
    pub provenance: Provenance,
    readings: [Reading; INDICATOR_COUNT],
    text: Option<RowText>,
}

impl Observation {
    /// Creates an observation from its readings, indexed by
    /// [`Indicator::index`].
    #[must_use]
    pub const fn new(
        year: i32,
        district: District,
        provenance: Provenance,
        readings: [Reading; INDICATOR_COUNT],
    ) -> Self {
        Self {
            year,
            district,
            provenance,
            readings,
            text: None,
        }
    }

    /// Attaches the source text of the row.
    #[must_use]
    pub fn with_text(mut self, text: RowText) -> Self {
        self.text = Some(text);
        self
    }

    /// Source text of the row, `None` for rows not read from a file.
    #[must_use]
    pub const fn text(&self) -> Option<&RowText> {
        self.text.as_ref()
    }

    /// Returns the reading for an indicator.
    #[must_use]
    pub const fn reading(&self, indicator: Indicator) -> &Reading {
        &self.readings[indicator.index()]
    }

    /// Returns the numeric value for an indicator, `None` when missing.
    #[must_use]
    pub const fn value(&self, indicator: Indicator) -> Option<f64> {
        self.readings[indicator.index()].value()
    }

    /// Iterates over every indicator with its reading.
    pub fn readings(&self) -> impl Iterator<Item = (Indicator, &Reading)> {
        Indicator::all().iter().map(|&i| (i, self.reading(i)))
    }

    /// Returns a copy of this observation with one reading replaced.
    #[must_use]
    pub fn with_reading(mut self, indicator: Indicator, reading: Reading) -> Self {
        self.readings[indicator.index()] = reading;
        self
    }

    /// Returns `true` if this row holds measured data.
    #[must_use]
    pub fn is_measured(&self) -> bool {
        self.provenance == Provenance::Measured
    }
}

/// The geographic extent a series or forecast is computed over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "name", rename_all = "snake_case")]
pub enum Scope {
    /// Mean over every district in the dataset.
    National,
    /// Mean over the districts of one region.
    Region(Region),
    /// A single district, by name (any accepted spelling).
    District(String),
}

impl std::str::FromStr for Scope {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let lower = trimmed.to_ascii_lowercase();
        if matches!(lower.as_str(), "national" | "bangladesh" | "all") {
            return Ok(Self::National);
        }
        let region_name = lower.strip_prefix("region:").unwrap_or(&lower);
        if let Ok(region) = region_name.parse::<Region>() {
            return Ok(Self::Region(region));
        }
        Ok(Self::District(trimmed.to_string()))
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::National => write!(f, "Bangladesh"),
            Self::Region(region) => write!(f, "{} region", region.label()),
            Self::District(name) => write!(f, "{name}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indicator_column_matches_display() {
        for indicator in Indicator::all() {
            assert_eq!(indicator.to_string(), indicator.column());
            assert_eq!(indicator.as_ref(), indicator.column());
        }
    }

    #[test]
    fn indicator_parses_column_and_alias() {
        assert_eq!(
            "Avg_Temperature_C".parse::<Indicator>().unwrap(),
            Indicator::AvgTemperature
        );
        assert_eq!(
            "avg_temperature_c".parse::<Indicator>().unwrap(),
            Indicator::AvgTemperature
        );
        assert_eq!(
            "rainfall".parse::<Indicator>().unwrap(),
            Indicator::AnnualRainfall
        );
        assert!("humidity".parse::<Indicator>().is_err());
    }

    #[test]
    fn indicator_index_matches_order() {
        for (i, indicator) in Indicator::all().iter().enumerate() {
            assert_eq!(indicator.index(), i);
        }
    }

    #[test]
    fn provenance_from_cutoff() {
        assert_eq!(Provenance::for_year(2023, 2023), Provenance::Measured);
        assert_eq!(Provenance::for_year(2024, 2023), Provenance::Forecast);
        assert_eq!("Forecast".parse::<Provenance>().unwrap(), Provenance::Forecast);
    }

    #[test]
    fn scope_parsing() {
        assert_eq!("national".parse::<Scope>().unwrap(), Scope::National);
        assert_eq!(
            "region:coastal".parse::<Scope>().unwrap(),
            Scope::Region(Region::Coastal)
        );
        assert_eq!(
            "Northern".parse::<Scope>().unwrap(),
            Scope::Region(Region::Northern)
        );
        assert_eq!(
            " Dhaka ".parse::<Scope>().unwrap(),
            Scope::District("Dhaka".to_string())
        );
    }

    #[test]
    fn with_reading_leaves_original_untouched() {
        let district = District::parse("Dhaka").unwrap();
        let readings: [Reading; INDICATOR_COUNT] =
            std::array::from_fn(|_| Reading::parse("1.5").unwrap());
        let obs = Observation::new(2000, district, Provenance::Measured, readings);
        let changed = obs.clone().with_reading(Indicator::AnnualRainfall, Reading::from_value(2.0));

        assert_eq!(obs.value(Indicator::AnnualRainfall), Some(1.5));
        assert_eq!(changed.value(Indicator::AnnualRainfall), Some(2.0));
        assert_eq!(changed.value(Indicator::AvgTemperature), Some(1.5));
    }
}
