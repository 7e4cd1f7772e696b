//! Analysis functions.
//!
//! Each function reads a borrowed [`Dataset`] and returns the numbers behind
//! one exploratory view. Missing cells are skipped, never imputed; callers
//! wanting imputed data pass a dataset from
//! [`bd_climate_dataset::clean::clean`].

use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use bd_climate_analytics_models::{
    CorrelationPair, CorrelationResult, DashboardResult, DistrictValue, IndicatorChange,
    IndicatorStats, MissingCount, RankParams, RankResult, RegionSplit, RegionsResult,
    SummaryResult, TrendParams, TrendPoint, TrendResult, YearFilter,
};
use bd_climate_dataset::{Dataset, clean, stats};
use bd_climate_indicator_models::{Indicator, MAX_YEAR, MIN_YEAR, Region};

use crate::AnalyticsError;

fn year_range(filter: &YearFilter) -> Result<RangeInclusive<i32>, AnalyticsError> {
    let from = filter.from.unwrap_or(MIN_YEAR);
    let to = filter.to.unwrap_or(MAX_YEAR);
    if from > to {
        return Err(AnalyticsError::InvalidYearRange { from, to });
    }
    Ok(from..=to)
}

fn describe_year_range(filter: &YearFilter) -> String {
    match (filter.from, filter.to) {
        (Some(f), Some(t)) => format!("{f} to {t}"),
        (Some(f), None) => format!("since {f}"),
        (None, Some(t)) => format!("through {t}"),
        (None, None) => "all years".to_string(),
    }
}

fn slope_per_year(points: &[(i32, f64)]) -> Option<f64> {
    let xy: Vec<(f64, f64)> = points.iter().map(|&(t, y)| (f64::from(t), y)).collect();
    stats::linear_fit(&xy).map(|(slope, _)| slope)
}

/// Row counts, year span, missing cells and per-indicator statistics.
#[must_use]
pub fn summary(dataset: &Dataset) -> SummaryResult {
    let (measured_rows, forecast_rows) = dataset.provenance_counts();
    let span = dataset.year_span();

    let missing = clean::missing_counts(dataset)
        .into_iter()
        .map(|(indicator, missing)| MissingCount { indicator, missing })
        .collect();

    let indicators = Indicator::all()
        .iter()
        .map(|&indicator| {
            let values: Vec<f64> = dataset
                .observations()
                .iter()
                .filter_map(|o| o.value(indicator))
                .collect();
            IndicatorStats {
                indicator,
                count: values.len(),
                mean: stats::mean(&values),
                std_dev: stats::std_dev(&values),
                min: stats::quantile(&values, 0.0),
                median: stats::median(&values),
                max: stats::quantile(&values, 1.0),
            }
        })
        .collect();

    SummaryResult {
        rows: dataset.len(),
        columns: dataset.layout().len(),
        first_year: span.map(|s| s.0),
        last_year: span.map(|s| s.1),
        districts: dataset.districts().len(),
        measured_rows,
        forecast_rows,
        missing,
        indicators,
    }
}

/// Yearly values of an indicator over a scope, with a least-squares trend
/// line fitted to the valid years shown.
///
/// # Errors
///
/// * [`AnalyticsError::InvalidYearRange`] if the bounds are reversed
/// * [`AnalyticsError::Dataset`] if the scope cannot be resolved
pub fn trend(dataset: &Dataset, params: &TrendParams) -> Result<TrendResult, AnalyticsError> {
    let range = year_range(&params.years)?;
    let series = dataset.scope_series(&params.scope, params.indicator)?;
    let series = if params.include_forecast_rows {
        series
    } else {
        series.measured()
    };

    let points: Vec<_> = series
        .points
        .iter()
        .filter(|p| range.contains(&p.year))
        .collect();
    let valid: Vec<(i32, f64)> = points
        .iter()
        .filter_map(|p| p.value.map(|v| (p.year, v)))
        .collect();
    let xy: Vec<(f64, f64)> = valid.iter().map(|&(t, y)| (f64::from(t), y)).collect();
    let line = stats::linear_fit(&xy);

    let data = points
        .iter()
        .map(|p| TrendPoint {
            year: p.year,
            value: p.value,
            trend: line.map(|(slope, intercept)| slope.mul_add(f64::from(p.year), intercept)),
            provenance: p.provenance,
        })
        .collect();

    log::debug!(
        "Trend for {} over {}: {} points",
        params.indicator,
        series.scope,
        valid.len()
    );

    Ok(TrendResult {
        description: format!(
            "{} trend for {}, {}",
            params.indicator.label(),
            series.scope,
            describe_year_range(&params.years)
        ),
        indicator: params.indicator,
        scope: series.scope,
        data,
        slope_per_year: line.map(|(slope, _)| slope),
    })
}

/// Ranks districts by their mean value of an indicator over a year range.
/// Districts with no valid value in the range are left out.
///
/// # Errors
///
/// * [`AnalyticsError::InvalidYearRange`] if the bounds are reversed
#[allow(clippy::cast_precision_loss)]
pub fn rank_districts(dataset: &Dataset, params: &RankParams) -> Result<RankResult, AnalyticsError> {
    let range = year_range(&params.years)?;

    let mut sums: BTreeMap<&str, (Region, f64, usize)> = BTreeMap::new();
    for obs in dataset.observations() {
        if !range.contains(&obs.year) {
            continue;
        }
        if let Some(value) = obs.value(params.indicator) {
            let entry = sums
                .entry(obs.district.name())
                .or_insert((obs.district.region(), 0.0, 0));
            entry.1 += value;
            entry.2 += 1;
        }
    }

    let mut data: Vec<DistrictValue> = sums
        .into_iter()
        .map(|(name, (region, sum, count))| DistrictValue {
            rank: 0,
            district: name.to_string(),
            region,
            mean: sum / count as f64,
            count,
        })
        .collect();

    data.sort_by(|a, b| {
        let order = if params.ascending {
            a.mean.total_cmp(&b.mean)
        } else {
            b.mean.total_cmp(&a.mean)
        };
        order.then_with(|| a.district.cmp(&b.district))
    });
    if let Some(limit) = params.limit {
        data.truncate(limit);
    }
    for (idx, entry) in data.iter_mut().enumerate() {
        entry.rank = idx + 1;
    }

    Ok(RankResult {
        description: format!(
            "Districts by mean {}, {}",
            params.indicator.label(),
            describe_year_range(&params.years)
        ),
        indicator: params.indicator,
        data,
    })
}

/// Pearson correlation between every pair of indicators, each pair using
/// the rows where both are present.
#[must_use]
pub fn correlation_matrix(dataset: &Dataset) -> CorrelationResult {
    let indicators: Vec<Indicator> = Indicator::all().to_vec();
    let n = indicators.len();
    let mut matrix = vec![vec![None; n]; n];
    let mut strongest = Vec::new();

    for i in 0..n {
        for j in i..n {
            let pairs: Vec<(f64, f64)> = dataset
                .observations()
                .iter()
                .filter_map(|o| Some((o.value(indicators[i])?, o.value(indicators[j])?)))
                .collect();
            let r = if i == j {
                (pairs.len() >= 2).then_some(1.0)
            } else {
                stats::pearson(&pairs)
            };
            matrix[i][j] = r;
            matrix[j][i] = r;

            if let Some(r) = r.filter(|_| i != j) {
                strongest.push(CorrelationPair {
                    a: indicators[i],
                    b: indicators[j],
                    r,
                    n: pairs.len(),
                });
            }
        }
    }

    strongest.sort_by(|x, y| y.r.abs().total_cmp(&x.r.abs()));

    CorrelationResult {
        indicators,
        matrix,
        strongest,
    }
}

/// First and last value, change, mean and slope of every indicator for one
/// district, over all of its rows.
///
/// # Errors
///
/// * [`AnalyticsError::Dataset`] if the district cannot be resolved
pub fn district_dashboard(
    dataset: &Dataset,
    district: &str,
) -> Result<DashboardResult, AnalyticsError> {
    let resolved = dataset.resolve_district(district)?;
    let mut years = 0;

    let indicators = Indicator::all()
        .iter()
        .map(|&indicator| -> Result<IndicatorChange, AnalyticsError> {
            let series = dataset.series(district, indicator)?;
            years = years.max(series.points.len());
            let valid: Vec<(i32, f64)> = series.valid().collect();
            let values: Vec<f64> = valid.iter().map(|&(_, v)| v).collect();
            let first = valid.first().copied();
            let last = valid.last().copied();

            Ok(IndicatorChange {
                indicator,
                first_year: first.map(|f| f.0),
                first: first.map(|f| f.1),
                last_year: last.map(|l| l.0),
                last: last.map(|l| l.1),
                change: first.zip(last).map(|(f, l)| l.1 - f.1),
                mean: stats::mean(&values),
                slope_per_year: slope_per_year(&valid),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(DashboardResult {
        description: format!(
            "Climate dashboard for {} ({} division, {} region)",
            resolved.name(),
            resolved.division(),
            resolved.region().label()
        ),
        district: resolved.name().to_string(),
        division: resolved.division().to_string(),
        region: resolved.region(),
        years,
        indicators,
    })
}

/// Row counts and member districts of each region.
#[must_use]
pub fn split_by_region(dataset: &Dataset) -> RegionsResult {
    let regions = Region::all()
        .iter()
        .map(|&region| RegionSplit {
            region,
            rows: dataset
                .observations()
                .iter()
                .filter(|o| o.district.region() == region)
                .count(),
            districts: dataset
                .region_members(region)
                .iter()
                .map(|d| d.name().to_string())
                .collect(),
        })
        .collect();

    RegionsResult { regions }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bd_climate_dataset::{DatasetError, LoadOptions, load_reader};
    use bd_climate_indicator_models::Scope;

    const HEADER: &str = "Year,District,Avg_Temperature_C,Annual_Rainfall_mm,AQI,Forest_Cover_Percent,River_Water_Level_m,Cyclone_Count,Flood_Impact_Score,Drought_Severity,Agricultural_Yield_ton_per_hectare,Coastal_Erosion_m_per_year,Urbanization_Rate_Percent,Carbon_Emission_Metric_Tons_per_Capita,Renewable_Energy_Usage_Percent";

    fn dataset() -> Dataset {
        let text = format!(
            "{HEADER}\n\
             1990,Dhaka,25.0,2000,100,12,4.0,1,5,3,3.0,0,20,0.3,2\n\
             2000,Dhaka,25.5,1900,120,11,3.9,1,5,3,3.2,0,30,0.4,4\n\
             2010,Dhaka,26.0,1800,140,10,3.8,2,6,4,3.4,0,40,0.5,6\n\
             2024,Dhaka,26.6,1700,160,9,3.7,2,6,4,3.6,0,50,0.6,8\n\
             1990,Khulna,26.0,2600,80,25,5.0,3,7,2,2.8,1.0,15,0.2,1\n\
             2000,Khulna,26.3,,85,24,5.2,4,7,2,2.9,1.2,18,0.2,2\n\
             2010,Khulna,26.6,2400,90,23,5.4,4,8,3,3.0,1.4,21,0.3,3\n\
             2000,Sylhet,24.0,4000,60,30,6.0,0,6,1,3.1,0,12,0.1,3\n"
        );
        load_reader(text.as_bytes(), &LoadOptions::default())
            .unwrap()
            .0
    }

    #[test]
    fn summary_counts_rows_and_missing() {
        let result = summary(&dataset());
        assert_eq!(result.rows, 8);
        assert_eq!(result.columns, 15);
        assert_eq!((result.first_year, result.last_year), (Some(1990), Some(2024)));
        assert_eq!(result.districts, 3);
        assert_eq!((result.measured_rows, result.forecast_rows), (7, 1));
        assert_eq!(result.missing[1].missing, 1);

        let rain = &result.indicators[Indicator::AnnualRainfall.index()];
        assert_eq!(rain.count, 7);
        assert_eq!(rain.min, Some(1700.0));
        assert_eq!(rain.max, Some(4000.0));
    }

    #[test]
    fn trend_fits_line_over_measured_years() {
        let params = TrendParams {
            indicator: Indicator::AvgTemperature,
            scope: Scope::District("Dhaka".to_string()),
            years: YearFilter::default(),
            include_forecast_rows: false,
        };
        let result = trend(&dataset(), &params).unwrap();
        assert_eq!(result.data.len(), 3);
        assert!((result.slope_per_year.unwrap() - 0.05).abs() < 1e-9);
        assert!((result.data[0].trend.unwrap() - 25.0).abs() < 1e-6);
        assert!(result.description.contains("Dhaka"));
    }

    #[test]
    fn trend_respects_year_filter_and_forecast_rows() {
        let params = TrendParams {
            indicator: Indicator::AvgTemperature,
            scope: Scope::National,
            years: YearFilter {
                from: Some(2000),
                to: None,
            },
            include_forecast_rows: true,
        };
        let result = trend(&dataset(), &params).unwrap();
        let years: Vec<i32> = result.data.iter().map(|p| p.year).collect();
        assert_eq!(years, [2000, 2010, 2024]);
        assert!(result.description.ends_with("since 2000"));

        let reversed = TrendParams {
            years: YearFilter {
                from: Some(2010),
                to: Some(2000),
            },
            ..params
        };
        assert!(matches!(
            trend(&dataset(), &reversed),
            Err(AnalyticsError::InvalidYearRange { .. })
        ));
    }

    #[test]
    fn rank_orders_by_mean() {
        let params = RankParams {
            indicator: Indicator::AnnualRainfall,
            years: YearFilter::default(),
            limit: None,
            ascending: false,
        };
        let result = rank_districts(&dataset(), &params).unwrap();
        let order: Vec<&str> = result.data.iter().map(|d| d.district.as_str()).collect();
        assert_eq!(order, ["Sylhet", "Khulna", "Dhaka"]);
        assert_eq!(result.data[1].count, 2);
        assert!((result.data[1].mean - 2500.0).abs() < 1e-9);
        assert_eq!(result.data[2].rank, 3);

        let top = rank_districts(
            &dataset(),
            &RankParams {
                limit: Some(1),
                ascending: true,
                ..params
            },
        )
        .unwrap();
        assert_eq!(top.data.len(), 1);
        assert_eq!(top.data[0].district, "Dhaka");
    }

    #[test]
    fn correlation_matrix_is_symmetric() {
        let result = correlation_matrix(&dataset());
        assert_eq!(result.matrix.len(), 13);
        let r = result
            .get(Indicator::AvgTemperature, Indicator::AirQualityIndex)
            .unwrap();
        assert_eq!(
            result.get(Indicator::AirQualityIndex, Indicator::AvgTemperature),
            Some(r)
        );
        assert_eq!(
            result.get(Indicator::AvgTemperature, Indicator::AvgTemperature),
            Some(1.0)
        );
        // Forest cover falls as urbanization rises.
        assert!(
            result
                .get(Indicator::ForestCover, Indicator::UrbanizationRate)
                .unwrap()
                < 0.0
        );
        let first = result.strongest[0].r.abs();
        assert!(result.strongest.iter().all(|p| p.r.abs() <= first));
    }

    #[test]
    fn dashboard_reports_change_per_indicator() {
        let result = district_dashboard(&dataset(), "khulna").unwrap();
        assert_eq!(result.district, "Khulna");
        assert_eq!(result.region, Region::Coastal);
        assert_eq!(result.years, 3);

        let rain = &result.indicators[Indicator::AnnualRainfall.index()];
        assert_eq!((rain.first_year, rain.last_year), (Some(1990), Some(2010)));
        assert_eq!(rain.change, Some(-200.0));
        assert!((rain.slope_per_year.unwrap() - -10.0).abs() < 1e-9);

        assert!(matches!(
            district_dashboard(&dataset(), "Atlantis"),
            Err(AnalyticsError::Dataset(DatasetError::UnknownKey { .. }))
        ));
    }

    #[test]
    fn regions_split_rows_and_members() {
        let result = split_by_region(&dataset());
        let by_region: BTreeMap<Region, &RegionSplit> =
            result.regions.iter().map(|r| (r.region, r)).collect();
        assert_eq!(by_region[&Region::Central].rows, 4);
        assert_eq!(by_region[&Region::Coastal].districts, ["Khulna"]);
        assert_eq!(by_region[&Region::Other].districts, ["Sylhet"]);
        assert_eq!(by_region[&Region::Northern].rows, 0);
    }
}
