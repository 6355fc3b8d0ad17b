//! Series CSV ingest.
//!
//! Input files are expected to be cleaned already: a header row, a `value`
//! column and optionally a `date` or `timestamp` column. Any row that does not
//! parse is an error for the whole file; nothing is imputed or dropped.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::StringRecord;

use crate::domain::{Observation, Series};
use crate::error::{AppError, EXIT_NO_DATA, EXIT_USAGE};

const TIMESTAMP_COLUMNS: [&str; 2] = ["date", "timestamp"];
const VALUE_COLUMN: &str = "value";

/// Read a series from a CSV file; the series is named after the file name.
pub fn read_series_csv(path: &Path) -> Result<Series, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(EXIT_USAGE, format!("Failed to open CSV '{}': {e}", path.display())))?;
    read_series_from_reader(series_name(path), file)
}

/// File name used as the series name (falls back to the full path).
pub fn series_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Read a series from any CSV source.
pub fn read_series_from_reader<R: Read>(name: impl Into<String>, source: R) -> Result<Series, AppError> {
    let name = name.into();
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(EXIT_USAGE, format!("{name}: failed to read CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    let value_idx = *header_map
        .get(VALUE_COLUMN)
        .ok_or_else(|| AppError::new(EXIT_USAGE, format!("{name}: missing required column `value`")))?;
    let ts_idx = TIMESTAMP_COLUMNS.iter().find_map(|c| header_map.get(*c).copied());

    let epoch = NaiveDateTime::default();
    let mut observations = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // Header is line 1.
        let line = idx + 2;
        let record =
            result.map_err(|e| AppError::new(EXIT_USAGE, format!("{name}: line {line}: CSV parse error: {e}")))?;

        let value = parse_value(field(&record, value_idx))
            .map_err(|msg| AppError::new(EXIT_USAGE, format!("{name}: line {line}: {msg}")))?;
        let timestamp = match ts_idx {
            Some(i) => parse_timestamp(field(&record, i))
                .map_err(|msg| AppError::new(EXIT_USAGE, format!("{name}: line {line}: {msg}")))?,
            None => epoch + chrono::Duration::days(observations.len() as i64),
        };
        observations.push(Observation { timestamp, value });
    }

    if observations.is_empty() {
        return Err(AppError::new(EXIT_NO_DATA, format!("{name}: no observations")));
    }
    Ok(Series::new(name, observations))
}

fn field(record: &StringRecord, idx: usize) -> &str {
    record.get(idx).unwrap_or("")
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Strip a UTF-8 BOM left on the first header by spreadsheet exports.
    name.trim().trim_start_matches('\u{feff}').to_ascii_lowercase()
}

fn parse_value(raw: &str) -> Result<f64, String> {
    let v: f64 = raw
        .parse()
        .map_err(|_| format!("invalid value '{raw}'"))?;
    if !v.is_finite() {
        return Err(format!("non-finite value '{raw}'"));
    }
    Ok(v)
}

/// Accepts `%Y-%m-%d`, `%Y-%m-%d %H:%M:%S` and RFC 3339.
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, String> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Ok(dt);
    }
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(d.and_time(chrono::NaiveTime::default()));
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.naive_utc())
        .map_err(|_| format!("invalid timestamp '{raw}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_dated_series() {
        let csv = "date,value\n2020-01-01,1.5\n2020-01-02, 2.5\n";
        let s = read_series_from_reader("a.csv", csv.as_bytes()).unwrap();
        assert_eq!(s.name, "a.csv");
        assert_eq!(s.values(), vec![1.5, 2.5]);
        assert_eq!(
            s.observations[1].timestamp,
            NaiveDate::from_ymd_opt(2020, 1, 2).unwrap().and_hms_opt(0, 0, 0).unwrap()
        );
    }

    #[test]
    fn missing_timestamp_column_uses_daily_index() {
        let csv = "\u{feff}Value\n3\n4\n5\n";
        let s = read_series_from_reader("b", csv.as_bytes()).unwrap();
        assert_eq!(s.len(), 3);
        let step = s.observations[2].timestamp - s.observations[1].timestamp;
        assert_eq!(step, chrono::Duration::days(1));
    }

    #[test]
    fn accepts_all_timestamp_formats() {
        assert!(parse_timestamp("2021-03-04").is_ok());
        assert!(parse_timestamp("2021-03-04 05:06:07").is_ok());
        assert!(parse_timestamp("2021-03-04T05:06:07+02:00").is_ok());
        assert!(parse_timestamp("04/03/2021").is_err());
    }

    #[test]
    fn invalid_rows_fail_the_file() {
        let err = read_series_from_reader("c", "value\n1\nabc\n".as_bytes()).unwrap_err();
        assert_eq!(err.exit_code(), EXIT_USAGE);
        assert!(err.message().contains("line 3"));

        let err = read_series_from_reader("c", "value\nNaN\n".as_bytes()).unwrap_err();
        assert!(err.message().contains("non-finite"));
    }

    #[test]
    fn missing_value_column_or_rows_is_an_error() {
        let err = read_series_from_reader("d", "date\n2020-01-01\n".as_bytes()).unwrap_err();
        assert_eq!(err.exit_code(), EXIT_USAGE);
        let err = read_series_from_reader("d", "value\n".as_bytes()).unwrap_err();
        assert_eq!(err.exit_code(), EXIT_NO_DATA);
    }
}
