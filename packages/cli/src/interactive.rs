//! Interactive menu for exploring the dataset.
//!
//! Prompts with `dialoguer` for an action and its parameters, and returns
//! the equivalent [`Commands`] value so that menu and flags run the same
//! code.

use std::path::PathBuf;

use bd_climate_dataset::Dataset;
use bd_climate_indicator_models::{Indicator, Region, Scope};
use dialoguer::{Confirm, Input, MultiSelect, Select};

use crate::Commands;

/// Top-level actions available in the interactive menu.
enum Action {
    Summary,
    Districts,
    Trend,
    Rank,
    Correlation,
    Dashboard,
    Regions,
    Forecast,
    ForecastAll,
    Preprocess,
}

impl Action {
    const ALL: &[Self] = &[
        Self::Summary,
        Self::Trend,
        Self::Rank,
        Self::Dashboard,
        Self::Correlation,
        Self::Regions,
        Self::Forecast,
        Self::ForecastAll,
        Self::Preprocess,
        Self::Districts,
    ];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Summary => "Dataset summary",
            Self::Districts => "List districts",
            Self::Trend => "Indicator trend",
            Self::Rank => "Rank districts",
            Self::Correlation => "Indicator correlations",
            Self::Dashboard => "District dashboard",
            Self::Regions => "Split by region",
            Self::Forecast => "Forecast an indicator",
            Self::ForecastAll => "Forecast every district",
            Self::Preprocess => "Clean and export processed data",
        }
    }
}

/// Prompts for an action and its parameters.
///
/// # Errors
///
/// Returns an error if a prompt fails or an entered number does not parse.
pub fn prompt(dataset: &Dataset) -> Result<Commands, Box<dyn std::error::Error>> {
    let labels: Vec<&str> = Action::ALL.iter().map(Action::label).collect();

    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    Ok(match Action::ALL[idx] {
        Action::Summary => Commands::Summary,
        Action::Districts => Commands::Districts,
        Action::Regions => Commands::Regions,
        Action::Correlation => Commands::Correlation {
            top: prompt_optional_u64("Strongest pairs to list (empty for 10)")?
                .map_or(10, |n| usize::try_from(n).unwrap_or(usize::MAX)),
        },
        Action::Trend => Commands::Trend {
            indicator: select_indicator()?,
            scope: select_scope(dataset)?,
            from: prompt_optional_i32("From year (empty for all)")?,
            to: prompt_optional_i32("To year (empty for all)")?,
            include_forecast_rows: include_forecast_rows()?,
        },
        Action::Rank => Commands::Rank {
            indicator: select_indicator()?,
            from: prompt_optional_i32("From year (empty for all)")?,
            to: prompt_optional_i32("To year (empty for all)")?,
            limit: prompt_optional_u64("Show top N (empty for all)")?
                .map(|n| usize::try_from(n).unwrap_or(usize::MAX)),
            ascending: Confirm::new()
                .with_prompt("Lowest first?")
                .default(false)
                .interact()?,
        },
        Action::Dashboard => Commands::Dashboard {
            district: select_district(dataset)?,
        },
        Action::Forecast => Commands::Forecast {
            indicator: select_indicator()?,
            scope: select_scope(dataset)?,
            years: prompt_years()?,
            include_forecast_rows: include_forecast_rows()?,
        },
        Action::ForecastAll => {
            let labels: Vec<&str> = Indicator::all().iter().map(|i| i.label()).collect();
            let defaults = vec![true; labels.len()];
            let selected = MultiSelect::new()
                .with_prompt("Indicators (space=toggle, a=all, enter=confirm)")
                .items(&labels)
                .defaults(&defaults)
                .max_length(15)
                .interact()?;

            Commands::ForecastAll {
                indicators: selected.iter().map(|&i| Indicator::all()[i]).collect(),
                districts: Vec::new(),
                years: prompt_years()?,
                include_forecast_rows: include_forecast_rows()?,
            }
        }
        Action::Preprocess => {
            let output: String = Input::new()
                .with_prompt("Output file")
                .default("processed_climate_data.csv".to_string())
                .interact_text()?;
            Commands::Preprocess {
                output: PathBuf::from(output),
            }
        }
    })
}

fn select_indicator() -> Result<Indicator, Box<dyn std::error::Error>> {
    let labels: Vec<String> = Indicator::all()
        .iter()
        .map(|i| format!("{} ({})", i.label(), i.unit()))
        .collect();
    let idx = Select::new()
        .with_prompt("Indicator")
        .items(&labels)
        .default(0)
        .max_length(15)
        .interact()?;
    Ok(Indicator::all()[idx])
}

fn select_scope(dataset: &Dataset) -> Result<Scope, Box<dyn std::error::Error>> {
    let mut labels = vec!["All of Bangladesh".to_string()];
    labels.extend(
        Region::all()
            .iter()
            .map(|r| format!("{} region", r.label())),
    );
    labels.push("A single district".to_string());

    let idx = Select::new()
        .with_prompt("Scope")
        .items(&labels)
        .default(0)
        .interact()?;

    Ok(match idx {
        0 => Scope::National,
        i if i <= Region::all().len() => Scope::Region(Region::all()[i - 1]),
        _ => Scope::District(select_district(dataset)?),
    })
}

fn select_district(dataset: &Dataset) -> Result<String, Box<dyn std::error::Error>> {
    let names: Vec<&str> = dataset.districts().iter().map(|d| d.name()).collect();
    if names.is_empty() {
        return Err("Dataset has no districts".into());
    }
    let idx = Select::new()
        .with_prompt("District")
        .items(&names)
        .default(0)
        .max_length(20)
        .interact()?;
    Ok(names[idx].to_string())
}

fn include_forecast_rows() -> Result<bool, Box<dyn std::error::Error>> {
    Ok(Confirm::new()
        .with_prompt("Include rows marked as forecast in the file?")
        .default(false)
        .interact()?)
}

/// Prompts for comma-separated target years; empty means the default
/// horizon.
fn prompt_years() -> Result<Vec<i32>, Box<dyn std::error::Error>> {
    let input: String = Input::new()
        .with_prompt("Target years, comma-separated (empty for the next 5)")
        .allow_empty(true)
        .interact_text()?;
    parse_years(&input)
}

fn parse_years(input: &str) -> Result<Vec<i32>, Box<dyn std::error::Error>> {
    Ok(input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect::<Result<_, _>>()?)
}

/// Prompts the user for an optional `u64` value.
///
/// Returns `None` if the input is empty.
fn prompt_optional_u64(prompt: &str) -> Result<Option<u64>, Box<dyn std::error::Error>> {
    let input: String = Input::new()
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()?;

    if input.trim().is_empty() {
        Ok(None)
    } else {
        Ok(Some(input.trim().parse()?))
    }
}

fn prompt_optional_i32(prompt: &str) -> Result<Option<i32>, Box<dyn std::error::Error>> {
    let input: String = Input::new()
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()?;

    if input.trim().is_empty() {
        Ok(None)
    } else {
        Ok(Some(input.trim().parse()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_year_lists() {
        assert_eq!(parse_years("").unwrap(), Vec::<i32>::new());
        assert_eq!(parse_years("2025, 2030,").unwrap(), [2025, 2030]);
        assert!(parse_years("2025,soon").is_err());
    }

    #[test]
    fn every_action_has_a_label() {
        assert!(Action::ALL.iter().all(|a| !a.label().is_empty()));
    }
}
