#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Parameter and result types for the exploratory analyses.
//!
//! Each analysis takes a `*Params` value and returns a `*Result` carrying a
//! human-readable `description` alongside the numbers, so the CLI can print
//! a table or serialize the whole result as JSON.

use bd_climate_indicator_models::{Indicator, Provenance, Region, Scope};
use serde::{Deserialize, Serialize};

/// Inclusive year bounds; `None` leaves that side open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearFilter {
    pub from: Option<i32>,
    pub to: Option<i32>,
}

/// Missing cells in one indicator column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingCount {
    pub indicator: Indicator,
    pub missing: usize,
}

/// Descriptive statistics of one indicator column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorStats {
    pub indicator: Indicator,
    /// Non-missing cells.
    pub count: usize,
    pub mean: Option<f64>,
    pub std_dev: Option<f64>,
    pub min: Option<f64>,
    pub median: Option<f64>,
    pub max: Option<f64>,
}

/// Overview of a loaded dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResult {
    pub rows: usize,
    pub columns: usize,
    pub first_year: Option<i32>,
    pub last_year: Option<i32>,
    pub districts: usize,
    pub measured_rows: usize,
    pub forecast_rows: usize,
    pub missing: Vec<MissingCount>,
    pub indicators: Vec<IndicatorStats>,
}

/// Parameters for a yearly trend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendParams {
    pub indicator: Indicator,
    pub scope: Scope,
    #[serde(default)]
    pub years: YearFilter,
    /// Also include rows marked as forecast in the source file.
    #[serde(default)]
    pub include_forecast_rows: bool,
}

/// One year of a trend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    pub year: i32,
    pub value: Option<f64>,
    /// Value of the fitted trend line at this year.
    pub trend: Option<f64>,
    pub provenance: Provenance,
}

/// Yearly values with their linear trend line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendResult {
    pub description: String,
    pub indicator: Indicator,
    pub scope: String,
    pub data: Vec<TrendPoint>,
    /// `None` with fewer than two valid years.
    pub slope_per_year: Option<f64>,
}

/// Parameters for ranking districts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankParams {
    pub indicator: Indicator,
    #[serde(default)]
    pub years: YearFilter,
    /// Keep only the top `limit` districts.
    pub limit: Option<usize>,
    /// Rank ascending instead of descending.
    #[serde(default)]
    pub ascending: bool,
}

/// Mean of one indicator for one district.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistrictValue {
    pub rank: usize,
    pub district: String,
    pub region: Region,
    pub mean: f64,
    /// Years contributing to the mean.
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankResult {
    pub description: String,
    pub indicator: Indicator,
    pub data: Vec<DistrictValue>,
}

/// Correlation of one pair of indicators.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationPair {
    pub a: Indicator,
    pub b: Indicator,
    pub r: f64,
    /// Rows where both indicators are present.
    pub n: usize,
}

/// Pearson correlation between every pair of indicators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationResult {
    pub indicators: Vec<Indicator>,
    /// `matrix[i][j]` correlates `indicators[i]` with `indicators[j]`;
    /// `None` where fewer than two rows have both or one side is constant.
    pub matrix: Vec<Vec<Option<f64>>>,
    /// Off-diagonal pairs ordered by descending `|r|`.
    pub strongest: Vec<CorrelationPair>,
}

impl CorrelationResult {
    /// Looks up the coefficient for a pair.
    #[must_use]
    pub fn get(&self, a: Indicator, b: Indicator) -> Option<f64> {
        let i = self.indicators.iter().position(|&x| x == a)?;
        let j = self.indicators.iter().position(|&x| x == b)?;
        self.matrix[i][j]
    }
}

/// How one indicator changed over a district's history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorChange {
    pub indicator: Indicator,
    pub first_year: Option<i32>,
    pub first: Option<f64>,
    pub last_year: Option<i32>,
    pub last: Option<f64>,
    pub change: Option<f64>,
    pub mean: Option<f64>,
    pub slope_per_year: Option<f64>,
}

/// Every indicator's history for one district.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResult {
    pub description: String,
    pub district: String,
    pub division: String,
    pub region: Region,
    pub years: usize,
    pub indicators: Vec<IndicatorChange>,
}

/// Rows and districts of one region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionSplit {
    pub region: Region,
    pub rows: usize,
    pub districts: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionsResult {
    pub regions: Vec<RegionSplit>,
}
