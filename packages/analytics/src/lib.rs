#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Exploratory analyses over a loaded climate dataset.
//!
//! Each public function in [`tools`] computes the numbers behind one view of
//! the data (a trend line, a district ranking, a correlation heatmap) from a
//! borrowed [`bd_climate_dataset::Dataset`] and returns a typed result.

pub mod tools;

use thiserror::Error;

/// Errors that can occur during analytics operations.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// Lookup or query against the dataset failed.
    #[error(transparent)]
    Dataset(#[from] bd_climate_dataset::DatasetError),

    /// Year bounds are reversed.
    #[error("Invalid year range: {from} is after {to}")]
    InvalidYearRange {
        /// Lower bound given.
        from: i32,
        /// Upper bound given.
        to: i32,
    },
}
