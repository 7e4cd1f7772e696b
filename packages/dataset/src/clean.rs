//! Missing-value imputation and outlier clipping.
//!
//! [`clean`] fills each indicator's missing cells with that column's median
//! and then clips every value to the column's IQR fences,
//! `[Q1 - 1.5 * IQR, Q3 + 1.5 * IQR]`. The input dataset is left untouched;
//! a new one is returned along with a per-column [`CleaningReport`].
//!
//! Forecasting never runs on cleaned data unless a caller asks for it.

use bd_climate_indicator_models::{Indicator, Observation, Reading};
use serde::Serialize;

use crate::{Dataset, stats};

const IQR_FACTOR: f64 = 1.5;

/// What cleaning did to one indicator column.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnCleaning {
    pub indicator: Indicator,
    pub missing_before: usize,
    pub filled: usize,
    pub clipped: usize,
    pub median: Option<f64>,
    pub lower_fence: Option<f64>,
    pub upper_fence: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleaningReport {
    pub columns: Vec<ColumnCleaning>,
}

impl CleaningReport {
    #[must_use]
    pub fn total_filled(&self) -> usize {
        self.columns.iter().map(|c| c.filled).sum()
    }

    #[must_use]
    pub fn total_clipped(&self) -> usize {
        self.columns.iter().map(|c| c.clipped).sum()
    }
}

/// Missing cells per indicator, in indicator order.
#[must_use]
pub fn missing_counts(dataset: &Dataset) -> Vec<(Indicator, usize)> {
    Indicator::all()
        .iter()
        .map(|&indicator| {
            let missing = dataset
                .observations()
                .iter()
                .filter(|o| o.value(indicator).is_none())
                .count();
            (indicator, missing)
        })
        .collect()
}

/// Returns a cleaned copy of `dataset`.
///
/// A column with no values at all is left missing. Cells that cleaning does
/// not change keep their original text.
#[must_use]
pub fn clean(dataset: &Dataset) -> (Dataset, CleaningReport) {
    let mut observations: Vec<Observation> = dataset.observations().to_vec();
    let mut report = CleaningReport::default();

    for &indicator in Indicator::all() {
        let column: Vec<Option<f64>> = observations.iter().map(|o| o.value(indicator)).collect();
        let (cleaned, summary) = clean_column(indicator, &column);

        for (obs, (before, after)) in observations.iter_mut().zip(column.iter().zip(cleaned)) {
            if *before != after {
                let reading = after.map_or_else(Reading::missing, Reading::from_value);
                *obs = obs.clone().with_reading(indicator, reading);
            }
        }

        log::debug!(
            "{indicator}: filled {} missing, clipped {} outliers",
            summary.filled,
            summary.clipped
        );
        report.columns.push(summary);
    }

    log::info!(
        "Cleaning filled {} missing values and clipped {} outliers",
        report.total_filled(),
        report.total_clipped()
    );

    (dataset.with_observations(observations), report)
}

fn clean_column(
    indicator: Indicator,
    column: &[Option<f64>],
) -> (Vec<Option<f64>>, ColumnCleaning) {
    let present: Vec<f64> = column.iter().flatten().copied().collect();
    let median = stats::median(&present);
    let missing_before = column.len() - present.len();

    let filled: Vec<Option<f64>> = column.iter().map(|v| v.or(median)).collect();
    let filled_values: Vec<f64> = filled.iter().flatten().copied().collect();

    let fences = stats::quantile(&filled_values, 0.25)
        .zip(stats::quantile(&filled_values, 0.75))
        .map(|(q1, q3)| {
            let iqr = q3 - q1;
            (IQR_FACTOR.mul_add(-iqr, q1), IQR_FACTOR.mul_add(iqr, q3))
        });

    let mut clipped = 0;
    let cleaned = filled
        .into_iter()
        .map(|value| match (value, fences) {
            (Some(v), Some((lower, upper))) if v < lower || v > upper => {
                clipped += 1;
                Some(v.clamp(lower, upper))
            }
            (value, _) => value,
        })
        .collect();

    let summary = ColumnCleaning {
        indicator,
        missing_before,
        filled: if median.is_some() { missing_before } else { 0 },
        clipped,
        median,
        lower_fence: fences.map(|f| f.0),
        upper_fence: fences.map(|f| f.1),
    };
    (cleaned, summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{self, HEADER};
    use crate::{LoadOptions, load_reader};

    #[test]
    fn counts_missing_per_indicator() {
        let counts = missing_counts(&fixtures::dataset());
        assert_eq!(counts.len(), 13);
        assert_eq!(counts[1], (Indicator::AnnualRainfall, 1));
        assert!(
            counts
                .iter()
                .filter(|c| c.0 != Indicator::AnnualRainfall)
                .all(|c| c.1 == 0)
        );
    }

    #[test]
    fn fills_missing_with_median() {
        let dataset = fixtures::dataset();
        let (cleaned, report) = clean(&dataset);

        // Rainfall values 2100, 2000, 1900, 2900, 1400 -> median 2000.
        let obs = cleaned.observation(2000, "Chattogram").unwrap();
        assert_eq!(obs.value(Indicator::AnnualRainfall), Some(2000.0));
        assert_eq!(obs.reading(Indicator::AnnualRainfall).text(), "2000");
        assert_eq!(report.columns[1].filled, 1);
        assert_eq!(report.columns[1].median, Some(2000.0));

        // The source dataset is untouched.
        let original = dataset.observation(2000, "Chattogram").unwrap();
        assert_eq!(original.value(Indicator::AnnualRainfall), None);
    }

    #[test]
    fn clips_outliers_to_fences() {
        let rows: String = (0..8)
            .map(|i| {
                let aqi = if i == 7 { 900 } else { 100 + i };
                format!("{},Dhaka,25,2000,{aqi},10,4,1,5,3,3,0,30,0.4,5\n", 1990 + i)
            })
            .collect();
        let text = format!("{HEADER}\n{rows}");
        let (dataset, _) = load_reader(text.as_bytes(), &LoadOptions::default()).unwrap();
        let (cleaned, report) = clean(&dataset);

        // AQI 100..=106 and 900: Q1 = 101.75, Q3 = 105.25, upper = 110.5.
        let aqi = &report.columns[Indicator::AirQualityIndex.index()];
        assert_eq!(aqi.clipped, 1);
        assert!((aqi.upper_fence.unwrap() - 110.5).abs() < 1e-9);
        let clipped = cleaned.observation(1997, "Dhaka").unwrap();
        assert!((clipped.value(Indicator::AirQualityIndex).unwrap() - 110.5).abs() < 1e-9);

        // Unchanged cells keep their text.
        let kept = cleaned.observation(1990, "Dhaka").unwrap();
        assert_eq!(kept.reading(Indicator::AvgTemperature).text(), "25");
        assert_eq!(report.total_clipped(), 1);
    }
}
