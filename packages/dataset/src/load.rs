//! CSV loading and row validation.
//!
//! Columns are located by header name, so their order in the file is free.
//! The order is recorded in the dataset's [`ColumnLayout`] and reused when
//! writing the data back out, along with the line ending and byte order
//! mark found at the start of the file.

use std::collections::BTreeSet;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

use bd_climate_indicator_models::{
    DEFAULT_MEASURED_THROUGH, DISTRICT_COLUMN, District, INDICATOR_COUNT, Indicator, MAX_YEAR,
    MIN_YEAR, Observation, PROVENANCE_COLUMN, Provenance, Reading, RowText, YEAR_COLUMN,
};

use crate::{Column, ColumnLayout, Dataset, DatasetError, RowError, TextFormat};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// How a file is read and how strictly its rows are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    /// Abort on the first invalid row instead of skipping it.
    pub strict: bool,
    /// Field delimiter byte.
    pub delimiter: u8,
    /// Last measured year, used when the file has no `Provenance` column.
    pub measured_through: i32,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            strict: true,
            delimiter: b',',
            measured_through: DEFAULT_MEASURED_THROUGH,
        }
    }
}

impl LoadOptions {
    #[must_use]
    pub const fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    #[must_use]
    pub const fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    #[must_use]
    pub const fn with_measured_through(mut self, year: i32) -> Self {
        self.measured_through = year;
        self
    }
}

/// A row skipped in lenient mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRow {
    /// 1-based line number in the source file.
    pub line: u64,
    pub error: RowError,
}

/// What happened during a load besides the rows that were kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Data rows read, kept or not.
    pub rows_read: u64,
    pub rejected: Vec<RejectedRow>,
    /// Header names that are not part of the data model. Their cells are
    /// kept as text and written back unchanged.
    pub ignored_columns: Vec<String>,
    /// Whether provenance came from a `Provenance` column rather than the
    /// measured-through year.
    pub provenance_from_column: bool,
}

/// Loads a dataset from a file.
///
/// # Errors
///
/// * [`DatasetError::Io`] if the file cannot be opened
/// * any error from [`load_reader`]
pub fn load_path(
    path: &Path,
    options: &LoadOptions,
) -> Result<(Dataset, LoadReport), DatasetError> {
    log::info!("Loading climate dataset from {}", path.display());
    let file = std::fs::File::open(path)?;
    let (dataset, report) = load_reader(file, options)?;
    log::info!(
        "Dataset loaded: {} rows, {} columns, {} rejected",
        dataset.len(),
        dataset.layout().len(),
        report.rejected.len()
    );
    Ok((dataset, report))
}

/// Loads a dataset from any reader.
///
/// # Errors
///
/// * [`DatasetError::Io`] if the input cannot be read
/// * [`DatasetError::Csv`] if the input is not readable as delimited text
/// * [`DatasetError::MissingColumn`] if a required header is absent
/// * [`DatasetError::InvalidRow`] for the first bad row in strict mode
pub fn load_reader<R: Read>(
    reader: R,
    options: &LoadOptions,
) -> Result<(Dataset, LoadReport), DatasetError> {
    let mut reader = BufReader::new(reader);
    let (bom, crlf) = sniff_format(&mut reader)?;
    let format = TextFormat {
        delimiter: options.delimiter,
        crlf,
        bom,
    };
    log::debug!("Text format: {format:?}");

    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(options.delimiter)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader.headers()?.iter().map(str::to_owned).collect();

    let header_map = HeaderMap::from_headers(headers)?;
    for name in &header_map.ignored {
        log::warn!("Unknown column '{name}' is kept as text only");
    }

    let mut report = LoadReport {
        ignored_columns: header_map.ignored.clone(),
        provenance_from_column: header_map.provenance.is_some(),
        ..LoadReport::default()
    };
    let mut observations = Vec::new();
    let mut seen = BTreeSet::new();

    for result in csv_reader.records() {
        let record = result?;
        let line = record.position().map_or(0, csv::Position::line);
        report.rows_read += 1;

        let parsed = header_map.parse_row(&record, options).and_then(|obs| {
            if seen.insert((obs.district.name(), obs.year)) {
                Ok(obs)
            } else {
                Err(RowError::Duplicate {
                    year: obs.year,
                    district: obs.district.name().to_string(),
                })
            }
        });

        match parsed {
            Ok(obs) => observations.push(obs),
            Err(error) if options.strict => {
                return Err(DatasetError::InvalidRow {
                    line,
                    source: error,
                });
            }
            Err(error) => {
                log::warn!("Skipping line {line}: {error}");
                report.rejected.push(RejectedRow { line, error });
            }
        }
    }

    log::debug!(
        "Parsed {} of {} rows",
        observations.len(),
        report.rows_read
    );

    let dataset = Dataset::from_parts(observations, header_map.layout, format)?;
    Ok((dataset, report))
}

/// Consumes a leading UTF-8 byte order mark and reports whether there was
/// one, and whether the first line ends in `\r\n`.
fn sniff_format<R: BufRead>(reader: &mut R) -> std::io::Result<(bool, bool)> {
    let buf = reader.fill_buf()?;
    let bom = buf.starts_with(UTF8_BOM);
    let crlf = buf
        .iter()
        .position(|&b| b == b'\n')
        .is_some_and(|pos| pos > 0 && buf[pos - 1] == b'\r');
    if bom {
        reader.consume(UTF8_BOM.len());
    }
    Ok((bom, crlf))
}

/// Header positions of every known column.
struct HeaderMap {
    /// Number of header cells; every row must have exactly this many.
    width: usize,
    year: usize,
    district: usize,
    provenance: Option<usize>,
    indicators: [usize; INDICATOR_COUNT],
    /// Positions of columns outside the data model.
    extras: Vec<usize>,
    layout: ColumnLayout,
    ignored: Vec<String>,
}

impl HeaderMap {
    fn from_headers(headers: Vec<String>) -> Result<Self, DatasetError> {
        let mut columns = Vec::with_capacity(headers.len());
        let mut year = None;
        let mut district = None;
        let mut provenance = None;
        let mut indicators = [None; INDICATOR_COUNT];
        let mut extras = Vec::new();
        let mut ignored = Vec::new();

        for (idx, header) in headers.iter().enumerate() {
            let column = match header.trim() {
                YEAR_COLUMN if year.is_none() => {
                    year = Some(idx);
                    Column::Year
                }
                DISTRICT_COLUMN if district.is_none() => {
                    district = Some(idx);
                    Column::District
                }
                PROVENANCE_COLUMN if provenance.is_none() => {
                    provenance = Some(idx);
                    Column::Provenance
                }
                name => match Indicator::all().iter().find(|i| i.column() == name) {
                    Some(&indicator) if indicators[indicator.index()].is_none() => {
                        indicators[indicator.index()] = Some(idx);
                        Column::Indicator(indicator)
                    }
                    _ => {
                        ignored.push(name.to_string());
                        extras.push(idx);
                        Column::Extra(extras.len() - 1)
                    }
                },
            };
            columns.push(column);
        }

        let missing = |column: &str| DatasetError::MissingColumn {
            column: column.to_string(),
        };
        let year = year.ok_or_else(|| missing(YEAR_COLUMN))?;
        let district = district.ok_or_else(|| missing(DISTRICT_COLUMN))?;
        let mut positions = [0; INDICATOR_COUNT];
        for indicator in Indicator::all() {
            positions[indicator.index()] =
                indicators[indicator.index()].ok_or_else(|| missing(indicator.column()))?;
        }

        Ok(Self {
            width: headers.len(),
            year,
            district,
            provenance,
            indicators: positions,
            extras,
            layout: ColumnLayout::new(columns, headers),
            ignored,
        })
    }

    fn parse_row(
        &self,
        record: &csv::StringRecord,
        options: &LoadOptions,
    ) -> Result<Observation, RowError> {
        if record.len() != self.width {
            return Err(RowError::FieldCount {
                expected: self.width,
                found: record.len(),
            });
        }
        let cell = |idx: usize| record.get(idx).unwrap_or("");

        let year_text = cell(self.year).trim();
        if year_text.is_empty() {
            return Err(RowError::MissingField {
                column: YEAR_COLUMN,
            });
        }
        let year: i32 = year_text.parse().map_err(|_| RowError::InvalidYear {
            value: year_text.to_string(),
        })?;
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return Err(RowError::YearOutOfRange { year });
        }

        let district_text = cell(self.district);
        if district_text.trim().is_empty() {
            return Err(RowError::MissingField {
                column: DISTRICT_COLUMN,
            });
        }
        let district = District::parse(district_text)?;

        let provenance = match self.provenance.map(|idx| cell(idx).trim()) {
            Some(text) if !text.is_empty() => {
                text.parse::<Provenance>()
                    .map_err(|_| RowError::InvalidProvenance {
                        value: text.to_string(),
                    })?
            }
            _ => Provenance::for_year(year, options.measured_through),
        };

        let mut readings: [Reading; INDICATOR_COUNT] = std::array::from_fn(|_| Reading::missing());
        for indicator in Indicator::all() {
            let text = cell(self.indicators[indicator.index()]);
            readings[indicator.index()] =
                Reading::parse(text).map_err(|source| RowError::InvalidNumber {
                    column: indicator.column(),
                    source,
                })?;
        }

        let text = RowText {
            year: cell(self.year).to_string(),
            provenance: self.provenance.map(|idx| cell(idx).to_string()),
            extra: self.extras.iter().map(|&idx| cell(idx).to_string()).collect(),
        };

        Ok(Observation::new(year, district, provenance, readings).with_text(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{self, HEADER};

    fn load(text: &str, options: &LoadOptions) -> Result<(Dataset, LoadReport), DatasetError> {
        load_reader(text.as_bytes(), options)
    }

    #[test]
    fn loads_fixture_rows() {
        let (dataset, report) = load(&fixtures::csv_text(), &LoadOptions::default()).unwrap();
        assert_eq!(dataset.len(), 6);
        assert_eq!(report.rows_read, 6);
        assert!(report.rejected.is_empty());
        assert!(!report.provenance_from_column);

        let first = &dataset.observations()[0];
        assert_eq!(first.year, 1990);
        assert_eq!(first.district.name(), "Dhaka");
        assert_eq!(first.value(Indicator::AvgTemperature), Some(25.1));
        assert_eq!(first.reading(Indicator::AvgTemperature).text(), "25.10");
    }

    #[test]
    fn provenance_follows_cutoff_year() {
        let options = LoadOptions::default().with_measured_through(1995);
        let (dataset, _) = load(&fixtures::csv_text(), &options).unwrap();
        assert_eq!(dataset.provenance_counts(), (3, 3));
    }

    #[test]
    fn provenance_column_is_authoritative() {
        let text = format!(
            "{HEADER},Provenance\n\
             2020,Dhaka,25,2000,100,10,4,1,5,3,3,0,30,0.4,5,forecast\n\
             2024,Dhaka,26,2000,100,10,4,1,5,3,3,0,30,0.4,5,Measured\n"
        );
        let (dataset, report) = load(&text, &LoadOptions::default()).unwrap();
        assert!(report.provenance_from_column);
        assert!(dataset.layout().has_provenance());
        assert_eq!(dataset.observations()[0].provenance, Provenance::Forecast);
        assert_eq!(dataset.observations()[1].provenance, Provenance::Measured);
    }

    #[test]
    fn missing_column_is_reported() {
        let header = HEADER.replace(",AQI", "");
        let err = load(&format!("{header}\n"), &LoadOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            DatasetError::MissingColumn { column } if column == "AQI"
        ));
    }

    #[test]
    fn unknown_columns_are_kept_as_text() {
        let text = format!(
            "Notes,{HEADER}\n\
             hello,2001,Sylhet,25,4000,80,20,6,1,6,2,3,0,20,0.2,3\n"
        );
        let (dataset, report) = load(&text, &LoadOptions::default()).unwrap();
        assert_eq!(report.ignored_columns, ["Notes"]);
        assert_eq!(dataset.observations()[0].district.name(), "Sylhet");
        assert_eq!(dataset.layout().len(), 16);
        assert_eq!(dataset.layout().columns()[0], Column::Extra(0));
        assert_eq!(dataset.layout().header(Column::Extra(0)), "Notes");
        assert_eq!(
            dataset.observations()[0].text().unwrap().extra,
            ["hello"]
        );
    }

    #[test]
    fn strict_mode_rejects_out_of_range_year() {
        let text = format!("{HEADER}\n1989,Dhaka,25,2000,100,10,4,1,5,3,3,0,30,0.4,5\n");
        let err = load(&text, &LoadOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            DatasetError::InvalidRow {
                line: 2,
                source: RowError::YearOutOfRange { year: 1989 }
            }
        ));
    }

    #[test]
    fn strict_mode_rejects_unknown_district() {
        let text = format!("{HEADER}\n2000,Atlantis,25,2000,100,10,4,1,5,3,3,0,30,0.4,5\n");
        let err = load(&text, &LoadOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            DatasetError::InvalidRow {
                source: RowError::UnknownDistrict(_),
                ..
            }
        ));
    }

    #[test]
    fn strict_mode_rejects_duplicate_spelling_variant() {
        let text = format!(
            "{HEADER}\n\
             2000,Bogura,25,2000,100,10,4,1,5,3,3,0,30,0.4,5\n\
             2000,Bogra,25,2000,100,10,4,1,5,3,3,0,30,0.4,5\n"
        );
        let err = load(&text, &LoadOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            DatasetError::InvalidRow {
                line: 3,
                source: RowError::Duplicate { year: 2000, .. }
            }
        ));
    }

    #[test]
    fn lenient_mode_skips_and_reports_bad_rows() {
        let text = format!(
            "{HEADER}\n\
             2000,Dhaka,25,2000,100,10,4,1,5,3,3,0,30,0.4,5\n\
             2030,Dhaka,25,2000,100,10,4,1,5,3,3,0,30,0.4,5\n\
             2001,Dhaka,hot,2000,100,10,4,1,5,3,3,0,30,0.4,5\n\
             year,Dhaka,25,2000,100,10,4,1,5,3,3,0,30,0.4,5\n\
             2002,Dhaka,25,2000,100,10,4,1,5,3,3,0,30,0.4,5\n"
        );
        let options = LoadOptions::default().with_strict(false);
        let (dataset, report) = load(&text, &options).unwrap();

        assert_eq!(dataset.years(), [2000, 2002]);
        assert_eq!(report.rows_read, 5);
        let lines: Vec<u64> = report.rejected.iter().map(|r| r.line).collect();
        assert_eq!(lines, [3, 4, 5]);
        assert!(matches!(
            report.rejected[1].error,
            RowError::InvalidNumber {
                column: "Avg_Temperature_C",
                ..
            }
        ));
        assert!(matches!(
            report.rejected[2].error,
            RowError::InvalidYear { .. }
        ));
    }

    #[test]
    fn strict_mode_rejects_short_and_long_rows() {
        let short = format!("{HEADER}\n2000,Dhaka,25,2000,100,10,4,1,5,3,3,0,30,0.4\n");
        let err = load(&short, &LoadOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            DatasetError::InvalidRow {
                line: 2,
                source: RowError::FieldCount {
                    expected: 15,
                    found: 14
                }
            }
        ));

        let long = format!("{HEADER}\n2000,Dhaka,25,2000,100,10,4,1,5,3,3,0,30,0.4,5,6\n");
        let err = load(&long, &LoadOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            DatasetError::InvalidRow {
                source: RowError::FieldCount {
                    expected: 15,
                    found: 16
                },
                ..
            }
        ));
    }

    #[test]
    fn lenient_mode_rejects_rows_with_wrong_field_count() {
        let text = format!(
            "{HEADER}\n\
             2000,Dhaka\n\
             2001,Dhaka,25,2000,100,10,4,1,5,3,3,0,30,0.4,5,extra\n\
             2002,Dhaka,25,2000,100,10,4,1,5,3,3,0,30,0.4,5\n"
        );
        let options = LoadOptions::default().with_strict(false);
        let (dataset, report) = load(&text, &options).unwrap();

        assert_eq!(dataset.years(), [2002]);
        assert_eq!(report.rows_read, 3);
        assert_eq!(
            report.rejected,
            [
                RejectedRow {
                    line: 2,
                    error: RowError::FieldCount {
                        expected: 15,
                        found: 2
                    },
                },
                RejectedRow {
                    line: 3,
                    error: RowError::FieldCount {
                        expected: 15,
                        found: 16
                    },
                },
            ]
        );
    }

    #[test]
    fn strict_mode_rejects_empty_year() {
        let text = format!("{HEADER}\n ,Dhaka,25,2000,100,10,4,1,5,3,3,0,30,0.4,5\n");
        let err = load(&text, &LoadOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            DatasetError::InvalidRow {
                line: 2,
                source: RowError::MissingField {
                    column: YEAR_COLUMN
                }
            }
        ));
    }

    #[test]
    fn strict_mode_rejects_empty_district() {
        let text = format!("{HEADER}\n2000,,25,2000,100,10,4,1,5,3,3,0,30,0.4,5\n");
        let err = load(&text, &LoadOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            DatasetError::InvalidRow {
                line: 2,
                source: RowError::MissingField {
                    column: DISTRICT_COLUMN
                }
            }
        ));
    }

    #[test]
    fn strict_mode_rejects_unknown_provenance() {
        let text = format!(
            "{HEADER},Provenance\n\
             2000,Dhaka,25,2000,100,10,4,1,5,3,3,0,30,0.4,5,guess\n"
        );
        let err = load(&text, &LoadOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            DatasetError::InvalidRow {
                line: 2,
                source: RowError::InvalidProvenance { value }
            } if value == "guess"
        ));
    }

    #[test]
    fn cell_text_is_kept_for_write_back() {
        let text = format!(
            "{HEADER},Provenance\n\
             2000,Dhaka,25,2000,100,10,4,1,5,3,3,0,30,0.4,5,Measured\n\
             2001,Dhaka,25,2000,100,10,4,1,5,3,3,0,30,0.4,5,\n"
        );
        let (dataset, _) = load(&text, &LoadOptions::default()).unwrap();
        let text = |i: usize| dataset.observations()[i].text().unwrap().clone();
        assert_eq!(text(0).year, "2000");
        assert_eq!(text(0).provenance.as_deref(), Some("Measured"));
        assert_eq!(text(1).provenance.as_deref(), Some(""));
        assert_eq!(dataset.observations()[1].provenance, Provenance::Measured);
    }

    #[test]
    fn detects_byte_order_mark_and_crlf() {
        let text = format!("\u{feff}{}", fixtures::csv_text().replace('\n', "\r\n"));
        let (dataset, _) = load(&text, &LoadOptions::default()).unwrap();
        assert_eq!(dataset.len(), 6);
        assert_eq!(dataset.layout().header(Column::Year), YEAR_COLUMN);
        assert_eq!(
            dataset.format(),
            TextFormat {
                delimiter: b',',
                crlf: true,
                bom: true,
            }
        );

        let (plain, _) = load(&fixtures::csv_text(), &LoadOptions::default()).unwrap();
        assert_eq!(plain.format(), TextFormat::default());
    }

    #[test]
    fn semicolon_delimiter() {
        let text = fixtures::csv_text().replace(',', ";");
        let options = LoadOptions::default().with_delimiter(b';');
        let (dataset, _) = load(&text, &options).unwrap();
        assert_eq!(dataset.len(), 6);
        assert_eq!(dataset.delimiter(), b';');
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_path(
            Path::new("/nonexistent/bd_climate.csv"),
            &LoadOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, DatasetError::Io(_)));
    }
}
