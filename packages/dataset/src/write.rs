//! CSV re-serialization.
//!
//! Rows are written with the header text, delimiter, line ending and byte
//! order mark of the source file and each cell's original text, so loading a
//! file and writing it back reproduces its rows byte for byte. Columns outside
//! the data model are passed through. Values changed by cleaning are written
//! in their shortest round-trip form.

use std::io::Write;
use std::path::Path;

use bd_climate_indicator_models::Observation;

use crate::{Column, ColumnLayout, Dataset, DatasetError, TextFormat};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Writes a dataset as delimited text.
///
/// # Errors
///
/// * [`DatasetError::Csv`] or [`DatasetError::Io`] if writing fails
pub fn write_csv<W: Write>(dataset: &Dataset, writer: W) -> Result<(), DatasetError> {
    write_with_extra(dataset, writer, &[], |_| Vec::new())
}

/// Writes a dataset to a file, creating or truncating it.
///
/// # Errors
///
/// * [`DatasetError::Io`] if the file cannot be created
/// * any error from [`write_csv`]
pub fn write_path(dataset: &Dataset, path: &Path) -> Result<(), DatasetError> {
    let file = std::fs::File::create(path)?;
    write_csv(dataset, std::io::BufWriter::new(file))?;
    log::info!("Wrote {} rows to {}", dataset.len(), path.display());
    Ok(())
}

/// Writes the dataset's columns followed by `extra_headers`, with the
/// extra cells of each row produced by `extra_cells`.
pub(crate) fn write_with_extra<W: Write>(
    dataset: &Dataset,
    mut writer: W,
    extra_headers: &[&str],
    extra_cells: impl Fn(&Observation) -> Vec<String>,
) -> Result<(), DatasetError> {
    let format = dataset.format();
    if format.bom {
        writer.write_all(UTF8_BOM)?;
    }
    let mut csv_writer = writer_builder(format).from_writer(writer);

    let layout = dataset.layout();
    csv_writer.write_record(
        layout
            .headers()
            .iter()
            .map(String::as_str)
            .chain(extra_headers.iter().copied()),
    )?;

    for obs in dataset.observations() {
        let mut cells = row_cells(layout, obs);
        cells.extend(extra_cells(obs));
        csv_writer.write_record(&cells)?;
    }

    csv_writer.flush()?;
    Ok(())
}

fn writer_builder(format: TextFormat) -> csv::WriterBuilder {
    let mut builder = csv::WriterBuilder::new();
    builder.delimiter(format.delimiter);
    if format.crlf {
        builder.terminator(csv::Terminator::CRLF);
    }
    builder
}

/// Cells of one row. Rows without file text (built in memory) fall back to
/// the canonical spelling of each value.
fn row_cells(layout: &ColumnLayout, obs: &Observation) -> Vec<String> {
    let text = obs.text();
    layout
        .columns()
        .iter()
        .map(|column| match column {
            Column::Year => text.map_or_else(|| obs.year.to_string(), |t| t.year.clone()),
            Column::District => obs.district.label().to_string(),
            Column::Provenance => text
                .and_then(|t| t.provenance.clone())
                .unwrap_or_else(|| obs.provenance.to_string()),
            Column::Indicator(indicator) => obs.reading(*indicator).text().to_string(),
            Column::Extra(idx) => text
                .and_then(|t| t.extra.get(*idx).cloned())
                .unwrap_or_default(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{self, HEADER};
    use crate::{LoadOptions, load_reader};
    use bd_climate_indicator_models::Indicator;

    fn round_trip(text: &str, options: &LoadOptions) -> String {
        let (dataset, _) = load_reader(text.as_bytes(), options).unwrap();
        let mut out = Vec::new();
        write_csv(&dataset, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn unmodified_rows_round_trip_byte_for_byte() {
        let text = fixtures::csv_text();
        assert_eq!(round_trip(&text, &LoadOptions::default()), text);
    }

    #[test]
    fn round_trip_keeps_column_order_labels_and_quoting() {
        let text = "\
District,Year,AQI,Avg_Temperature_C,Annual_Rainfall_mm,Forest_Cover_Percent,River_Water_Level_m,Cyclone_Count,Flood_Impact_Score,Drought_Severity,Agricultural_Yield_ton_per_hectare,Coastal_Erosion_m_per_year,Urbanization_Rate_Percent,Carbon_Emission_Metric_Tons_per_Capita,Renewable_Energy_Usage_Percent
Cox's Bazar,2005,080,26.30,,33.0,NA,5,8.25,1.0,2.7,2.10,14,0.150,1e0
\"Barisal, BD\",2006,81,26.4,3000,32,5,4,8,1,2.8,2.0,15,0.16,1.1
";
        let options = LoadOptions::default().with_strict(false);
        // The quoted label is not a district, so only the first row survives.
        let (dataset, report) = load_reader(text.as_bytes(), &options).unwrap();
        assert_eq!(report.rejected.len(), 1);

        let mut out = Vec::new();
        write_csv(&dataset, &mut out).unwrap();
        let expected: String = text.lines().take(2).map(|l| format!("{l}\n")).collect();
        assert_eq!(String::from_utf8(out).unwrap(), expected);
    }

    #[test]
    fn provenance_column_is_written_back() {
        let text = format!(
            "{HEADER},Provenance\n\
             2020,Dhaka,25,2000,100,10,4,1,5,3,3,0,30,0.4,5,forecast\n"
        );
        assert_eq!(round_trip(&text, &LoadOptions::default()), text);
    }

    #[test]
    fn provenance_spelling_and_empty_cells_survive() {
        let text = format!(
            "{HEADER},Provenance\n\
             2000,Dhaka,25,2000,100,10,4,1,5,3,3,0,30,0.4,5,Measured\n\
             2020,Dhaka,25,2000,100,10,4,1,5,3,3,0,30,0.4,5,FORECAST\n\
             2021,Dhaka,25,2000,100,10,4,1,5,3,3,0,30,0.4,5,\n"
        );
        assert_eq!(round_trip(&text, &LoadOptions::default()), text);
    }

    #[test]
    fn crlf_line_endings_are_kept() {
        let text = fixtures::csv_text().replace('\n', "\r\n");
        assert_eq!(round_trip(&text, &LoadOptions::default()), text);
    }

    #[test]
    fn byte_order_mark_is_kept() {
        let text = format!("\u{feff}{}", fixtures::csv_text());
        let written = round_trip(&text, &LoadOptions::default());
        assert!(written.starts_with('\u{feff}'));
        assert_eq!(written, text);

        let with_crlf = text.replace('\n', "\r\n");
        assert_eq!(round_trip(&with_crlf, &LoadOptions::default()), with_crlf);
    }

    #[test]
    fn unknown_columns_are_passed_through() {
        let text = format!(
            "Notes,{HEADER}, Source \n\
             \"first, checked\",2001,Sylhet,25,4000,80,20,6,1,6,2,3,0,20,0.2,3,survey\n\
             ,2002,Sylhet,25,4000,80,20,6,1,6,2,3,0,20,0.2,3,\n"
        );
        assert_eq!(round_trip(&text, &LoadOptions::default()), text);
    }

    #[test]
    fn rows_built_in_memory_use_canonical_text() {
        let dataset = fixtures::dataset();
        let rebuilt = dataset.with_observations(
            dataset
                .observations()
                .iter()
                .map(|obs| {
                    let readings =
                        std::array::from_fn(|i| obs.reading(Indicator::all()[i]).clone());
                    Observation::new(obs.year, obs.district.clone(), obs.provenance, readings)
                })
                .collect(),
        );
        let mut out = Vec::new();
        write_csv(&rebuilt, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), fixtures::csv_text());
    }

    #[test]
    fn write_path_creates_file() {
        let dataset = fixtures::dataset();
        let path = std::env::temp_dir().join(format!(
            "bd_climate_write_path_{}.csv",
            std::process::id()
        ));
        write_path(&dataset, &path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(written, fixtures::csv_text());
    }
}
