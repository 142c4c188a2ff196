//! CSV import of user-supplied hourly series.
//!
//! A file holds a `date_time` column and exactly one value column, with one
//! header row and [`HORIZON`] data rows.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::HORIZON;

const TIMESTAMP_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Which input a file provides; determines the expected value column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesKind {
    PvCapacityFactor,
    Load,
    ElectricityPrice,
    Co2Emissions,
}

impl SeriesKind {
    pub const fn column(self) -> &'static str {
        match self {
            Self::PvCapacityFactor => "pv_cf",
            Self::Load => "profile_1",
            Self::ElectricityPrice => "electricity_price",
            Self::Co2Emissions => "CO2_emissions",
        }
    }
}

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to read file: {0}")]
    Io(#[from] io::Error),

    #[error("error processing file: {0}")]
    Csv(#[from] csv::Error),

    #[error("Please provide exactly {} value rows. Found {found} rows with values.", HORIZON)]
    RowCount { found: usize },

    #[error(
        "Please rename the columns to match ['date_time'{separator}  '{expected}']! Found {}.",
        format_columns(.found)
    )]
    Columns {
        separator: char,
        expected: &'static str,
        found: Vec<String>,
    },

    #[error("row {row}: cannot parse `{value}` in column `{column}` as a number")]
    Value {
        row: usize,
        column: &'static str,
        value: String,
    },

    #[error("row {row}: cannot parse `{value}` as a timestamp")]
    Timestamp { row: usize, value: String },

    #[error("separator must be a single ASCII character, got `{0}`")]
    Separator(char),
}

fn format_columns(found: &[String]) -> String {
    let quoted: Vec<String> = found.iter().map(|c| format!("'{c}'")).collect();
    format!("[{}]", quoted.join(", "))
}

/// A validated hourly series read from a file.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedSeries {
    pub kind: SeriesKind,
    pub timestamps: Vec<NaiveDateTime>,
    pub values: Vec<f64>,
}

fn parse_timestamp(row: usize, raw: &str) -> Result<NaiveDateTime, ImportError> {
    let raw = raw.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .ok_or_else(|| ImportError::Timestamp {
            row,
            value: raw.to_owned(),
        })
}

/// Reads and validates a series from any reader.
///
/// # Arguments
///
/// * `reader` - CSV source with a header row
/// * `kind` - Expected value column
/// * `separator` - Field delimiter, e.g. `,` or `;`
///
/// # Errors
///
/// The row count is checked before the column names; afterwards every
/// timestamp and value must parse.
pub fn read_series(reader: impl Read, kind: SeriesKind, separator: char) -> Result<ImportedSeries, ImportError> {
    if !separator.is_ascii() {
        return Err(ImportError::Separator(separator));
    }
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(separator as u8)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_owned).collect();
    let records = rdr
        .records()
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .filter(|r| r.iter().any(|field| !field.is_empty()))
        .collect::<Vec<_>>();

    if records.len() != HORIZON {
        return Err(ImportError::RowCount {
            found: records.len(),
        });
    }

    let expected = kind.column();
    let position = |name: &str| headers.iter().position(|h| h == name);
    let (Some(ts_col), Some(value_col), 2) = (position("date_time"), position(expected), headers.len()) else {
        return Err(ImportError::Columns {
            separator,
            expected,
            found: headers,
        });
    };

    let mut timestamps = Vec::with_capacity(HORIZON);
    let mut values = Vec::with_capacity(HORIZON);
    for (i, record) in records.iter().enumerate() {
        let row = i + 1;
        timestamps.push(parse_timestamp(row, record.get(ts_col).unwrap_or_default())?);
        let raw = record.get(value_col).unwrap_or_default();
        let value = raw
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| ImportError::Value {
                row,
                column: expected,
                value: raw.to_owned(),
            })?;
        values.push(value);
    }

    Ok(ImportedSeries {
        kind,
        timestamps,
        values,
    })
}

/// Reads and validates a series from a file.
///
/// # Errors
///
/// See [`read_series`]; also fails if the file cannot be opened.
pub fn import_series(path: &Path, kind: SeriesKind, separator: char) -> Result<ImportedSeries, ImportError> {
    let file = File::open(path)?;
    read_series(io::BufReader::new(file), kind, separator)
}

/// Unit of an uploaded load profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadUnit {
    /// Watts, as exported by smart plugs; converted to kW.
    #[default]
    W,
    #[serde(rename = "kw")]
    KW,
}

/// How an uploaded load profile relates to the default one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadMode {
    /// Replace the default profile.
    #[default]
    Standalone,
    /// Add to the default profile.
    Combine,
}

impl LoadMode {
    /// Tag used in export file names.
    pub const fn tag(self) -> &'static str {
        match self {
            Self::Standalone => "S",
            Self::Combine => "C",
        }
    }
}

/// Converts an uploaded load profile to kW and applies it to `default_kw`.
pub fn apply_uploaded_load(default_kw: &[f64], uploaded: &[f64], unit: LoadUnit, mode: LoadMode) -> Vec<f64> {
    let to_kw = |v: f64| match unit {
        LoadUnit::W => v / 1000.0,
        LoadUnit::KW => v,
    };
    match mode {
        LoadMode::Standalone => uploaded.iter().map(|&v| to_kw(v)).collect(),
        LoadMode::Combine => default_kw
            .iter()
            .zip(uploaded)
            .map(|(&d, &u)| d + to_kw(u))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn csv_text(header: &str, sep: char, rows: usize) -> String {
        let mut out = format!("{header}\n");
        for h in 0..rows {
            out.push_str(&format!(
                "2015-01-{:02} {:02}:00:00{sep}{}\n",
                h / 24 + 1,
                h % 24,
                h as f64 * 0.5
            ));
        }
        out
    }

    #[test]
    fn reads_valid_series() {
        let text = csv_text("date_time,pv_cf", ',', HORIZON);
        let series = read_series(text.as_bytes(), SeriesKind::PvCapacityFactor, ',').expect("valid file");
        assert_eq!(series.values.len(), HORIZON);
        assert_eq!(series.values[3], 1.5);
        assert_eq!(series.timestamps[25].format("%d %H").to_string(), "02 01");
    }

    #[test]
    fn honours_semicolon_separator() {
        let text = csv_text("date_time;CO2_emissions", ';', HORIZON);
        assert!(read_series(text.as_bytes(), SeriesKind::Co2Emissions, ';').is_ok());
    }

    #[test]
    fn wrong_row_count_uses_upload_message() {
        let text = csv_text("date_time,pv_cf", ',', 100);
        let err = read_series(text.as_bytes(), SeriesKind::PvCapacityFactor, ',').expect_err("too short");
        assert_eq!(
            err.to_string(),
            "Please provide exactly 168 value rows. Found 100 rows with values."
        );
    }

    #[test]
    fn wrong_columns_are_listed() {
        let text = csv_text("date_time,load", ',', HORIZON);
        let err = read_series(text.as_bytes(), SeriesKind::Load, ',').expect_err("bad column");
        assert_eq!(
            err.to_string(),
            "Please rename the columns to match ['date_time',  'profile_1']! Found ['date_time', 'load']."
        );
    }

    #[test]
    fn non_numeric_value_is_reported_with_row() {
        let mut text = csv_text("date_time,electricity_price", ',', HORIZON);
        text = text.replacen("0.5\n", "abc\n", 1);
        let err = read_series(text.as_bytes(), SeriesKind::ElectricityPrice, ',').expect_err("bad value");
        assert!(matches!(err, ImportError::Value { row: 2, .. }));
    }

    #[test]
    fn uploaded_load_in_watts_is_converted() {
        let default = [0.5, 0.5];
        let uploaded = [1000.0, 250.0];
        assert_eq!(
            apply_uploaded_load(&default, &uploaded, LoadUnit::W, LoadMode::Standalone),
            vec![1.0, 0.25]
        );
        assert_eq!(
            apply_uploaded_load(&default, &uploaded, LoadUnit::W, LoadMode::Combine),
            vec![1.5, 0.75]
        );
        assert_eq!(
            apply_uploaded_load(&default, &[2.0, 0.0], LoadUnit::KW, LoadMode::Combine),
            vec![2.5, 0.5]
        );
    }
}
