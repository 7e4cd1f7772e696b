//! Runs a parsed subcommand against the loaded dataset.

use std::path::Path;

use bd_climate_analytics::tools;
use bd_climate_analytics_models::{RankParams, TrendParams, YearFilter};
use bd_climate_cli_utils::{IndicatifProgress, MultiProgress};
use bd_climate_dataset::{Dataset, clean, features, write_path};
use bd_climate_forecast::{BatchRequest, ForecastOptions, forecast_all, forecast_scope};
use bd_climate_forecast_models::Config;
use serde::Serialize;

use crate::{Commands, output};

/// Everything a command needs besides its own arguments.
pub struct Context<'a> {
    pub dataset: &'a Dataset,
    pub config: &'a Config,
    /// Path the dataset was loaded from.
    pub input: &'a Path,
    pub json: bool,
    pub multi: &'a MultiProgress,
}

impl Context<'_> {
    /// Prints `value` as pretty JSON, or as a table through `table`.
    fn emit<T: Serialize>(
        &self,
        value: &T,
        table: impl FnOnce(&T),
    ) -> Result<(), serde_json::Error> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(value)?);
        } else {
            table(value);
        }
        Ok(())
    }
}

fn forecast_options(years: Vec<i32>, include_forecast_rows: bool) -> ForecastOptions {
    ForecastOptions {
        targets: (!years.is_empty()).then_some(years),
        include_forecast_rows,
    }
}

/// Executes one command.
///
/// # Errors
///
/// Returns an error if the analysis, forecast or file write fails.
#[allow(clippy::too_many_lines)]
pub fn run(ctx: &Context<'_>, command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Summary => {
            ctx.emit(&tools::summary(ctx.dataset), output::print_summary)?;
        }
        Commands::Districts => {
            ctx.emit(&output::district_rows(ctx.dataset), |rows| {
                output::print_districts(rows);
            })?;
        }
        Commands::Trend {
            indicator,
            scope,
            from,
            to,
            include_forecast_rows,
        } => {
            let params = TrendParams {
                indicator,
                scope,
                years: YearFilter { from, to },
                include_forecast_rows,
            };
            ctx.emit(&tools::trend(ctx.dataset, &params)?, output::print_trend)?;
        }
        Commands::Rank {
            indicator,
            from,
            to,
            limit,
            ascending,
        } => {
            let params = RankParams {
                indicator,
                years: YearFilter { from, to },
                limit,
                ascending,
            };
            ctx.emit(
                &tools::rank_districts(ctx.dataset, &params)?,
                output::print_rank,
            )?;
        }
        Commands::Correlation { top } => {
            ctx.emit(&tools::correlation_matrix(ctx.dataset), |result| {
                output::print_correlation(result, top);
            })?;
        }
        Commands::Dashboard { district } => {
            ctx.emit(
                &tools::district_dashboard(ctx.dataset, &district)?,
                output::print_dashboard,
            )?;
        }
        Commands::Regions => {
            ctx.emit(&tools::split_by_region(ctx.dataset), output::print_regions)?;
        }
        Commands::Forecast {
            indicator,
            scope,
            years,
            include_forecast_rows,
        } => {
            let options = forecast_options(years, include_forecast_rows);
            let result = forecast_scope(ctx.dataset, &scope, indicator, ctx.config, &options)?;
            ctx.emit(&result, output::print_forecast)?;
        }
        Commands::ForecastAll {
            indicators,
            districts,
            years,
            include_forecast_rows,
        } => {
            let request = BatchRequest {
                indicators,
                districts,
                options: forecast_options(years, include_forecast_rows),
            };
            let progress = IndicatifProgress::batch_bar(ctx.multi, "Forecasting");
            let batch = forecast_all(ctx.dataset, ctx.config, &request, &progress);
            progress.clear();
            ctx.emit(&batch?, output::print_batch)?;
        }
        Commands::Preprocess { output: path } => {
            let (cleaned, report) = clean::clean(ctx.dataset);
            features::write_processed_path(&cleaned, &path)?;
            ctx.emit(&report, |report| {
                output::print_cleaning(report);
                println!();
                println!("Processed data written to {}", path.display());
            })?;
        }
        Commands::Roundtrip { output: path } => {
            write_path(ctx.dataset, &path)?;
            let identical = std::fs::read(ctx.input)? == std::fs::read(&path)?;
            if identical {
                log::info!("Round trip is byte-identical");
            } else {
                log::warn!(
                    "Round trip differs from {} (skipped rows are not written)",
                    ctx.input.display()
                );
            }
            ctx.emit(&identical, |identical| {
                println!(
                    "Wrote {} rows to {}: {}",
                    ctx.dataset.len(),
                    path.display(),
                    if *identical {
                        "identical to input"
                    } else {
                        "differs from input"
                    }
                );
            })?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_years_fall_back_to_horizon() {
        assert_eq!(forecast_options(Vec::new(), false).targets, None);
        assert_eq!(
            forecast_options(vec![2030], true),
            ForecastOptions {
                targets: Some(vec![2030]),
                include_forecast_rows: true,
            }
        );
    }
}
