//! Console tables for command results.

use bd_climate_analytics_models::{
    CorrelationResult, DashboardResult, RankResult, RegionsResult, SummaryResult, TrendResult,
};
use bd_climate_dataset::{Dataset, clean::CleaningReport};
use bd_climate_forecast_models::{BatchForecast, ScopedForecast};
use bd_climate_indicator_models::{Provenance, Region};
use serde::Serialize;

/// One line of the `districts` listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DistrictRow {
    pub name: String,
    pub division: String,
    pub region: Region,
    pub rows: usize,
}

/// Districts of the dataset with their row counts.
#[must_use]
pub fn district_rows(dataset: &Dataset) -> Vec<DistrictRow> {
    dataset
        .districts()
        .into_iter()
        .map(|district| DistrictRow {
            name: district.name().to_string(),
            division: district.division().to_string(),
            region: district.region(),
            rows: dataset
                .observations()
                .iter()
                .filter(|o| &o.district == district)
                .count(),
        })
        .collect()
}

/// Formats an optional number, `-` when absent.
fn num(value: Option<f64>, decimals: usize) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.decimals$}"))
}

fn rule(width: usize) {
    println!("{}", "-".repeat(width));
}

pub fn print_summary(result: &SummaryResult) {
    println!(
        "{} rows, {} columns, {} districts",
        result.rows, result.columns, result.districts
    );
    if let (Some(first), Some(last)) = (result.first_year, result.last_year) {
        println!("Years {first} to {last}");
    }
    println!(
        "{} measured rows, {} forecast rows",
        result.measured_rows, result.forecast_rows
    );
    println!();
    println!(
        "{:<44} {:>7} {:>10} {:>10} {:>10} {:>10} {:>10} {:>8}",
        "INDICATOR", "COUNT", "MEAN", "STD", "MIN", "MEDIAN", "MAX", "MISSING"
    );
    rule(116);
    for (stats, missing) in result.indicators.iter().zip(&result.missing) {
        println!(
            "{:<44} {:>7} {:>10} {:>10} {:>10} {:>10} {:>10} {:>8}",
            stats.indicator.column(),
            stats.count,
            num(stats.mean, 2),
            num(stats.std_dev, 2),
            num(stats.min, 2),
            num(stats.median, 2),
            num(stats.max, 2),
            missing.missing
        );
    }
}

pub fn print_districts(rows: &[DistrictRow]) {
    println!("{:<20} {:<12} {:<10} ROWS", "DISTRICT", "DIVISION", "REGION");
    rule(50);
    for row in rows {
        println!(
            "{:<20} {:<12} {:<10} {}",
            row.name,
            row.division,
            row.region.label(),
            row.rows
        );
    }
}

pub fn print_trend(result: &TrendResult) {
    println!("{}", result.description);
    if let Some(slope) = result.slope_per_year {
        println!(
            "Trend: {slope:+.4} {} per year",
            result.indicator.unit()
        );
    }
    println!();
    println!("{:<6} {:>12} {:>12}", "YEAR", "VALUE", "TREND");
    rule(32);
    for point in &result.data {
        let marker = match point.provenance {
            Provenance::Measured => "",
            Provenance::Forecast => " (forecast row)",
        };
        println!(
            "{:<6} {:>12} {:>12}{marker}",
            point.year,
            num(point.value, 2),
            num(point.trend, 2)
        );
    }
}

pub fn print_rank(result: &RankResult) {
    println!("{}", result.description);
    println!();
    println!(
        "{:>4} {:<20} {:<10} {:>12} {:>6}",
        "#", "DISTRICT", "REGION", "MEAN", "YEARS"
    );
    rule(56);
    for entry in &result.data {
        println!(
            "{:>4} {:<20} {:<10} {:>12.2} {:>6}",
            entry.rank,
            entry.district,
            entry.region.label(),
            entry.mean,
            entry.count
        );
    }
}

pub fn print_correlation(result: &CorrelationResult, top: usize) {
    println!("Strongest correlations");
    println!();
    println!("{:<44} {:<44} {:>7} {:>6}", "A", "B", "R", "N");
    rule(104);
    for pair in result.strongest.iter().take(top) {
        println!(
            "{:<44} {:<44} {:>7.3} {:>6}",
            pair.a.column(),
            pair.b.column(),
            pair.r,
            pair.n
        );
    }
}

pub fn print_dashboard(result: &DashboardResult) {
    println!("{}", result.description);
    println!("{} years of data", result.years);
    println!();
    println!(
        "{:<44} {:>10} {:>10} {:>10} {:>10} {:>10}",
        "INDICATOR", "FIRST", "LAST", "CHANGE", "MEAN", "SLOPE/YR"
    );
    rule(99);
    for change in &result.indicators {
        println!(
            "{:<44} {:>10} {:>10} {:>10} {:>10} {:>10}",
            change.indicator.column(),
            num(change.first, 2),
            num(change.last, 2),
            num(change.change, 2),
            num(change.mean, 2),
            num(change.slope_per_year, 4)
        );
    }
}

pub fn print_regions(result: &RegionsResult) {
    println!("{:<10} {:>6}  DISTRICTS", "REGION", "ROWS");
    rule(60);
    for split in &result.regions {
        println!(
            "{:<10} {:>6}  {}",
            split.region.label(),
            split.rows,
            split.districts.join(", ")
        );
    }
}

pub fn print_forecast(result: &ScopedForecast) {
    let forecast = &result.forecast;
    println!(
        "{} for {} ({} model, {} points through {})",
        result.indicator.label(),
        result.scope,
        forecast.model,
        forecast.fit.n_points,
        forecast.last_observed_year
    );
    println!(
        "RMSE {:.4}, R\u{b2} {}",
        forecast.fit.rmse,
        num(forecast.fit.r_squared, 4)
    );
    println!();
    println!("{:<6} {:>12} {:>12} {:>12}", "YEAR", "FORECAST", "LOWER 95%", "UPPER 95%");
    rule(45);
    for prediction in &forecast.predictions {
        println!(
            "{:<6} {:>12.2} {:>12.2} {:>12.2}",
            prediction.year, prediction.value, prediction.lower, prediction.upper
        );
    }
}

pub fn print_batch(batch: &BatchForecast) {
    println!(
        "{:<20} {:<44} {:>6} {:>8} {:>12}",
        "DISTRICT", "INDICATOR", "YEAR", "R\u{b2}", "FORECAST"
    );
    rule(94);
    for result in &batch.results {
        for prediction in &result.forecast.predictions {
            println!(
                "{:<20} {:<44} {:>6} {:>8} {:>12.2}",
                result.scope,
                result.indicator.column(),
                prediction.year,
                num(result.forecast.fit.r_squared, 3),
                prediction.value
            );
        }
    }

    if !batch.failures.is_empty() {
        println!();
        println!("{} series could not be forecast:", batch.failures.len());
        for failure in &batch.failures {
            println!(
                "  {} / {}: {}",
                failure.scope,
                failure.indicator.column(),
                failure.error
            );
        }
    }
}

pub fn print_cleaning(report: &CleaningReport) {
    println!(
        "{:<44} {:>8} {:>8} {:>10} {:>10} {:>10}",
        "INDICATOR", "FILLED", "CLIPPED", "MEDIAN", "LOWER", "UPPER"
    );
    rule(95);
    for column in &report.columns {
        println!(
            "{:<44} {:>8} {:>8} {:>10} {:>10} {:>10}",
            column.indicator.column(),
            column.filled,
            column.clipped,
            num(column.median, 2),
            num(column.lower_fence, 2),
            num(column.upper_fence, 2)
        );
    }
    println!(
        "{} cells filled, {} cells clipped",
        report.total_filled(),
        report.total_clipped()
    );
}
