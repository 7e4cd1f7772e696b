#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Validated, immutable in-memory climate dataset.
//!
//! A [`Dataset`] is built once from a delimited file (see [`load`]) and is
//! never mutated afterwards. Every function that needs the data receives it
//! as `&Dataset`; transformations such as [`clean::clean`] return a new
//! dataset instead of changing the one they were given.

pub mod clean;
pub mod features;
pub mod load;
pub mod stats;
pub mod write;

use std::collections::{BTreeMap, BTreeSet};
use std::ops::RangeInclusive;

use bd_climate_indicator_models::{
    DISTRICT_COLUMN, District, DistrictRegistry, Indicator, InvalidReadingError, MAX_YEAR,
    MIN_YEAR, Observation, PROVENANCE_COLUMN, Provenance, Region, Scope, UnknownDistrictError,
    YEAR_COLUMN,
};
use serde::Serialize;

pub use load::{LoadOptions, LoadReport, RejectedRow, load_path, load_reader};
pub use write::{write_csv, write_path};

/// What kind of key a failed lookup was for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    District,
    Region,
    Indicator,
}

impl std::fmt::Display for KeyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::District => "district",
            Self::Region => "region",
            Self::Indicator => "indicator",
        })
    }
}

/// Errors raised while loading, querying or writing a dataset.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Required column '{column}' not found in header")]
    MissingColumn { column: String },

    #[error("Line {line}: {source}")]
    InvalidRow {
        line: u64,
        #[source]
        source: RowError,
    },

    #[error("Duplicate observation for {district} in {year}")]
    DuplicateObservation { year: i32, district: String },

    #[error("Unknown {kind} '{name}'")]
    UnknownKey { kind: KeyKind, name: String },
}

/// Why a single row was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RowError {
    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },

    #[error("missing value for required column '{column}'")]
    MissingField { column: &'static str },

    #[error("invalid year '{value}'")]
    InvalidYear { value: String },

    #[error("year {year} outside {min}-{max}", min = MIN_YEAR, max = MAX_YEAR)]
    YearOutOfRange { year: i32 },

    #[error(transparent)]
    UnknownDistrict(#[from] UnknownDistrictError),

    #[error("column '{column}': {source}")]
    InvalidNumber {
        column: &'static str,
        source: InvalidReadingError,
    },

    #[error("invalid provenance '{value}' (expected 'measured' or 'forecast')")]
    InvalidProvenance { value: String },

    #[error("duplicate observation for {district} in {year}")]
    Duplicate { year: i32, district: String },
}

/// One column of the source file, in file order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Year,
    District,
    Provenance,
    Indicator(Indicator),
    /// A column outside the data model, carried through as text. The index
    /// points into [`bd_climate_indicator_models::RowText::extra`].
    Extra(usize),
}

/// Header order of the file a dataset was loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLayout {
    columns: Vec<Column>,
    /// Header cell of each column as it appeared in the file.
    headers: Vec<String>,
}

impl ColumnLayout {
    /// `Year`, `District`, then every indicator in declaration order.
    #[must_use]
    pub fn canonical() -> Self {
        let columns: Vec<Column> = [Column::Year, Column::District]
            .into_iter()
            .chain(Indicator::all().iter().copied().map(Column::Indicator))
            .collect();
        let headers = columns
            .iter()
            .map(|&c| canonical_header(c).to_string())
            .collect();
        Self { columns, headers }
    }

    pub(crate) const fn new(columns: Vec<Column>, headers: Vec<String>) -> Self {
        Self { columns, headers }
    }

    #[must_use]
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Header cells in file order.
    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Header text of a column.
    #[must_use]
    pub fn header(&self, column: Column) -> &str {
        self.columns
            .iter()
            .position(|&c| c == column)
            .and_then(|idx| self.headers.get(idx))
            .map_or_else(|| canonical_header(column), String::as_str)
    }

    #[must_use]
    pub fn has_provenance(&self) -> bool {
        self.columns.contains(&Column::Provenance)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

const fn canonical_header(column: Column) -> &'static str {
    match column {
        Column::Year => YEAR_COLUMN,
        Column::District => DISTRICT_COLUMN,
        Column::Provenance => PROVENANCE_COLUMN,
        Column::Indicator(indicator) => indicator.column(),
        Column::Extra(_) => "",
    }
}

/// One point of a yearly series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesPoint {
    pub year: i32,
    pub value: Option<f64>,
    pub provenance: Provenance,
}

/// A year-ordered series of one indicator over one scope.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Series {
    pub indicator: Indicator,
    /// Display name of the scope the series covers.
    pub scope: String,
    pub points: Vec<SeriesPoint>,
}

impl Series {
    /// Keeps only measured points.
    #[must_use]
    pub fn measured(&self) -> Self {
        Self {
            indicator: self.indicator,
            scope: self.scope.clone(),
            points: self
                .points
                .iter()
                .filter(|p| p.provenance == Provenance::Measured)
                .copied()
                .collect(),
        }
    }

    /// `(year, value)` pairs, missing values included.
    #[must_use]
    pub fn pairs(&self) -> Vec<(i32, Option<f64>)> {
        self.points.iter().map(|p| (p.year, p.value)).collect()
    }

    /// Points that carry a finite value.
    pub fn valid(&self) -> impl Iterator<Item = (i32, f64)> + '_ {
        self.points
            .iter()
            .filter_map(|p| p.value.filter(|v| v.is_finite()).map(|v| (p.year, v)))
    }

    #[must_use]
    pub fn last_valid_year(&self) -> Option<i32> {
        self.valid().map(|(year, _)| year).max()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

type ObservationKey = (&'static str, i32);

/// Delimited-text conventions of a file, reproduced when writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextFormat {
    pub delimiter: u8,
    /// Records end in `\r\n` rather than `\n`.
    pub crlf: bool,
    /// The file starts with a UTF-8 byte order mark.
    pub bom: bool,
}

impl Default for TextFormat {
    fn default() -> Self {
        Self {
            delimiter: b',',
            crlf: false,
            bom: false,
        }
    }
}

/// Immutable, validated collection of observations.
#[derive(Debug, Clone)]
pub struct Dataset {
    observations: Vec<Observation>,
    index: BTreeMap<ObservationKey, usize>,
    layout: ColumnLayout,
    format: TextFormat,
}

impl Dataset {
    /// Builds a dataset with the canonical column layout and a comma
    /// delimiter, `\n` line endings and no byte order mark.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::DuplicateObservation`] if two observations
    /// share a (year, district) pair.
    pub fn from_observations(observations: Vec<Observation>) -> Result<Self, DatasetError> {
        Self::from_parts(observations, ColumnLayout::canonical(), TextFormat::default())
    }

    pub(crate) fn from_parts(
        observations: Vec<Observation>,
        layout: ColumnLayout,
        format: TextFormat,
    ) -> Result<Self, DatasetError> {
        let mut index = BTreeMap::new();
        for (idx, obs) in observations.iter().enumerate() {
            if index.insert((obs.district.name(), obs.year), idx).is_some() {
                return Err(DatasetError::DuplicateObservation {
                    year: obs.year,
                    district: obs.district.name().to_string(),
                });
            }
        }
        Ok(Self {
            observations,
            index,
            layout,
            format,
        })
    }

    /// Same layout and text format, different rows. Rows must keep the keys
    /// of `self`, in the same order.
    pub(crate) fn with_observations(&self, observations: Vec<Observation>) -> Self {
        Self {
            observations,
            index: self.index.clone(),
            layout: self.layout.clone(),
            format: self.format,
        }
    }

    /// Rows in file order.
    #[must_use]
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    #[must_use]
    pub const fn layout(&self) -> &ColumnLayout {
        &self.layout
    }

    #[must_use]
    pub const fn delimiter(&self) -> u8 {
        self.format.delimiter
    }

    /// Delimiter, line ending and byte order mark of the source file.
    #[must_use]
    pub const fn format(&self) -> TextFormat {
        self.format
    }

    /// Looks up the row for a district (any accepted spelling) and year.
    #[must_use]
    pub fn observation(&self, year: i32, district: &str) -> Option<&Observation> {
        let entry = DistrictRegistry::global().resolve(district)?;
        self.index
            .get(&(entry.name.as_str(), year))
            .map(|&idx| &self.observations[idx])
    }

    /// Distinct districts present, ordered by canonical name. Each is the
    /// first occurrence in the file, so its label is the one used there.
    #[must_use]
    pub fn districts(&self) -> Vec<&District> {
        let mut seen = BTreeMap::new();
        for obs in &self.observations {
            seen.entry(obs.district.name()).or_insert(&obs.district);
        }
        seen.into_values().collect()
    }

    /// Distinct years present, ascending.
    #[must_use]
    pub fn years(&self) -> Vec<i32> {
        self.observations
            .iter()
            .map(|o| o.year)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// First and last year present.
    #[must_use]
    pub fn year_span(&self) -> Option<(i32, i32)> {
        let years = self.observations.iter().map(|o| o.year);
        Some((years.clone().min()?, years.max()?))
    }

    /// Number of measured and forecast rows, in that order.
    #[must_use]
    pub fn provenance_counts(&self) -> (usize, usize) {
        let measured = self.observations.iter().filter(|o| o.is_measured()).count();
        (measured, self.observations.len() - measured)
    }

    /// Resolves a district name against the rows of this dataset.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::UnknownKey`] if the name is not a known
    /// district or the district has no rows here.
    pub fn resolve_district(&self, name: &str) -> Result<&District, DatasetError> {
        let unknown = || DatasetError::UnknownKey {
            kind: KeyKind::District,
            name: name.to_string(),
        };
        let entry = DistrictRegistry::global().resolve(name).ok_or_else(unknown)?;
        self.observations
            .iter()
            .map(|o| &o.district)
            .find(|d| d.name() == entry.name)
            .ok_or_else(unknown)
    }

    /// Districts of a region that have rows in this dataset.
    #[must_use]
    pub fn region_members(&self, region: Region) -> Vec<&District> {
        self.districts()
            .into_iter()
            .filter(|d| d.region() == region)
            .collect()
    }

    /// Yearly series of one indicator for one district, sorted by year.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::UnknownKey`] if the district cannot be
    /// resolved.
    pub fn series(&self, district: &str, indicator: Indicator) -> Result<Series, DatasetError> {
        let district = self.resolve_district(district)?;
        let mut points: Vec<SeriesPoint> = self
            .observations
            .iter()
            .filter(|o| &o.district == district)
            .map(|o| SeriesPoint {
                year: o.year,
                value: o.value(indicator),
                provenance: o.provenance,
            })
            .collect();
        points.sort_by_key(|p| p.year);

        Ok(Series {
            indicator,
            scope: district.name().to_string(),
            points,
        })
    }

    /// Yearly series over a scope. District scopes return that district's
    /// values; region and national scopes return the per-year mean of the
    /// valid values of every member district. A year whose members are all
    /// missing keeps a missing value. A year counts as measured only when
    /// every contributing row is measured.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::UnknownKey`] for an unknown district or a
    /// region with no rows in this dataset.
    pub fn scope_series(&self, scope: &Scope, indicator: Indicator) -> Result<Series, DatasetError> {
        match scope {
            Scope::District(name) => self.series(name, indicator),
            Scope::National => Ok(self.yearly_mean(indicator, scope.to_string(), |_| true)),
            Scope::Region(region) => {
                if !self.observations.iter().any(|o| o.district.region() == *region) {
                    return Err(DatasetError::UnknownKey {
                        kind: KeyKind::Region,
                        name: region.to_string(),
                    });
                }
                Ok(self.yearly_mean(indicator, scope.to_string(), |o| {
                    o.district.region() == *region
                }))
            }
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn yearly_mean(
        &self,
        indicator: Indicator,
        scope: String,
        include: impl Fn(&Observation) -> bool,
    ) -> Series {
        struct Acc {
            sum: f64,
            count: usize,
            measured: bool,
        }

        let mut by_year: BTreeMap<i32, Acc> = BTreeMap::new();
        for obs in self.observations.iter().filter(|o| include(o)) {
            let acc = by_year.entry(obs.year).or_insert(Acc {
                sum: 0.0,
                count: 0,
                measured: true,
            });
            acc.measured &= obs.is_measured();
            if let Some(value) = obs.value(indicator).filter(|v| v.is_finite()) {
                acc.sum += value;
                acc.count += 1;
            }
        }

        let points = by_year
            .into_iter()
            .map(|(year, acc)| SeriesPoint {
                year,
                value: (acc.count > 0).then(|| acc.sum / acc.count as f64),
                provenance: if acc.measured {
                    Provenance::Measured
                } else {
                    Provenance::Forecast
                },
            })
            .collect();

        Series {
            indicator,
            scope,
            points,
        }
    }

    /// Rows whose year falls in `years`, as a new dataset.
    #[must_use]
    pub fn filter_years(&self, years: &RangeInclusive<i32>) -> Self {
        let observations: Vec<Observation> = self
            .observations
            .iter()
            .filter(|o| years.contains(&o.year))
            .cloned()
            .collect();
        let index = observations
            .iter()
            .enumerate()
            .map(|(idx, o)| ((o.district.name(), o.year), idx))
            .collect();
        Self {
            observations,
            index,
            layout: self.layout.clone(),
            format: self.format,
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::{Dataset, LoadOptions, load_reader};

    pub const HEADER: &str = "Year,District,Avg_Temperature_C,Annual_Rainfall_mm,AQI,Forest_Cover_Percent,River_Water_Level_m,Cyclone_Count,Flood_Impact_Score,Drought_Severity,Agricultural_Yield_ton_per_hectare,Coastal_Erosion_m_per_year,Urbanization_Rate_Percent,Carbon_Emission_Metric_Tons_per_Capita,Renewable_Energy_Usage_Percent";

    pub const ROWS: &str = "\
1990,Dhaka,25.10,2100,120,12.5,4.2,1,5.5,3.1,3.2,0.0,20.5,0.3,2.0
2000,Dhaka,25.90,2000,140,11.0,4.0,2,6.0,3.5,3.4,0.0,30.1,0.4,4.5
2024,Dhaka,26.80,1900,160,10.0,3.9,2,6.5,3.9,3.6,0.0,40.0,0.6,9.0
1990,Chittagong,26.00,2900,90,30.0,5.1,3,7.1,2.0,2.9,1.2,15.0,0.2,1.0
2000,Chittagong,26.40,NA,95,28.5,5.3,4,7.4,2.2,3.0,1.5,18.0,0.3,3.0
1990,Rajshahi,24.50,1400,100,5.0,3.0,0,4.0,6.5,3.8,0.0,12.0,0.2,1.5
";

    pub fn csv_text() -> String {
        format!("{HEADER}\n{ROWS}")
    }

    pub fn dataset() -> Dataset {
        load_reader(csv_text().as_bytes(), &LoadOptions::default())
            .unwrap()
            .0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn districts_and_years_are_distinct_and_sorted() {
        let dataset = fixtures::dataset();
        let names: Vec<&str> = dataset.districts().iter().map(|d| d.name()).collect();
        assert_eq!(names, ["Chattogram", "Dhaka", "Rajshahi"]);
        assert_eq!(dataset.districts()[0].label(), "Chittagong");
        assert_eq!(dataset.years(), [1990, 2000, 2024]);
        assert_eq!(dataset.year_span(), Some((1990, 2024)));
        assert_eq!(dataset.provenance_counts(), (5, 1));
    }

    #[test]
    fn series_resolves_alternate_spelling() {
        let dataset = fixtures::dataset();
        let series = dataset
            .series("chattogram", Indicator::AnnualRainfall)
            .unwrap();
        assert_eq!(series.pairs(), [(1990, Some(2900.0)), (2000, None)]);
        assert_eq!(series.last_valid_year(), Some(1990));
    }

    #[test]
    fn unknown_district_leaves_dataset_unchanged() {
        let dataset = fixtures::dataset();
        let before = dataset.len();
        let err = dataset
            .series("Atlantis", Indicator::AvgTemperature)
            .unwrap_err();
        assert!(matches!(
            err,
            DatasetError::UnknownKey {
                kind: KeyKind::District,
                ..
            }
        ));
        assert_eq!(dataset.len(), before);

        // Known district with no rows in this file.
        assert!(dataset.series("Sylhet", Indicator::AvgTemperature).is_err());
    }

    #[test]
    fn national_series_averages_valid_values() {
        let dataset = fixtures::dataset();
        let series = dataset
            .scope_series(&Scope::National, Indicator::AnnualRainfall)
            .unwrap();
        assert_eq!(series.scope, "Bangladesh");
        assert_eq!(series.points[0].year, 1990);
        assert!((series.points[0].value.unwrap() - 2133.333_333).abs() < 1e-3);
        // Chittagong is missing in 2000, so only Dhaka contributes.
        assert_eq!(series.points[1].value, Some(2000.0));
        assert_eq!(series.points[2].provenance, Provenance::Forecast);
        assert_eq!(series.measured().points.len(), 2);
    }

    #[test]
    fn region_series_uses_members_only() {
        let dataset = fixtures::dataset();
        let series = dataset
            .scope_series(&Scope::Region(Region::Northern), Indicator::AvgTemperature)
            .unwrap();
        assert_eq!(series.pairs(), [(1990, Some(24.5))]);
        assert_eq!(
            dataset
                .region_members(Region::Coastal)
                .iter()
                .map(|d| d.name())
                .collect::<Vec<_>>(),
            ["Chattogram"]
        );
        assert!(matches!(
            dataset.scope_series(&Scope::Region(Region::Other), Indicator::AvgTemperature),
            Err(DatasetError::UnknownKey {
                kind: KeyKind::Region,
                ..
            })
        ));
    }

    #[test]
    fn observation_lookup_and_year_filter() {
        let dataset = fixtures::dataset();
        let obs = dataset.observation(2000, "Dacca").unwrap();
        assert_eq!(obs.value(Indicator::AirQualityIndex), Some(140.0));
        assert!(dataset.observation(1995, "Dhaka").is_none());

        let nineties = dataset.filter_years(&(1990..=1999));
        assert_eq!(nineties.len(), 3);
        assert!(nineties.observation(1990, "Rajshahi").is_some());
        assert!(nineties.observation(2000, "Dhaka").is_none());
    }

    #[test]
    fn duplicate_observations_are_rejected() {
        let dataset = fixtures::dataset();
        let mut rows = dataset.observations().to_vec();
        rows.push(rows[0].clone());
        assert!(matches!(
            Dataset::from_observations(rows),
            Err(DatasetError::DuplicateObservation { year: 1990, .. })
        ));
    }
}
