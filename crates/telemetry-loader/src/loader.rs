//! Fixed-Schema Telemetry Loader

use crate::error::LoaderError;
use crate::{TelemetryRecord, COLUMN_COUNT, COLUMN_NAMES, SENSOR_COUNT, SETTING_COUNT};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info};

/// Loader for whitespace-delimited, header-less engine telemetry
pub struct TelemetryLoader;

impl TelemetryLoader {
    /// Load all records from a file on local disk
    pub fn load_path(path: impl AsRef<Path>) -> Result<Vec<TelemetryRecord>, LoaderError> {
        let path = path.as_ref();
        debug!("Loading telemetry from {}", path.display());
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Load all records from an in-memory string
    pub fn parse_str(text: &str) -> Result<Vec<TelemetryRecord>, LoaderError> {
        Self::from_reader(text.as_bytes())
    }

    /// Load all records from any buffered reader.
    ///
    /// Any malformed row fails the whole load; no partial result is returned.
    /// Cycle ordering is not checked here.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Vec<TelemetryRecord>, LoaderError> {
        let mut records = Vec::new();

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            records.push(Self::parse_line(idx + 1, &line)?);
        }

        let engines: BTreeSet<u32> = records.iter().map(|r| r.engine_id).collect();
        info!(
            "Loaded {} telemetry rows for {} engines",
            records.len(),
            engines.len()
        );

        Ok(records)
    }

    /// Parse a single row (1-based line number for error reporting)
    pub fn parse_line(line_no: usize, line: &str) -> Result<TelemetryRecord, LoaderError> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != COLUMN_COUNT {
            return Err(LoaderError::SchemaMismatch {
                line: line_no,
                expected: COLUMN_COUNT,
                actual: fields.len(),
            });
        }

        let engine_id = parse_index(line_no, 0, fields[0])?;
        let cycle = parse_index(line_no, 1, fields[1])?;

        let mut settings = [0.0; SETTING_COUNT];
        for (i, slot) in settings.iter_mut().enumerate() {
            let col = 2 + i;
            *slot = parse_value(line_no, col, fields[col])?;
        }

        let mut sensors = [0.0; SENSOR_COUNT];
        for (i, slot) in sensors.iter_mut().enumerate() {
            let col = 2 + SETTING_COUNT + i;
            *slot = parse_value(line_no, col, fields[col])?;
        }

        Ok(TelemetryRecord {
            engine_id,
            cycle,
            settings,
            sensors,
        })
    }
}

fn parse_index(line: usize, col: usize, raw: &str) -> Result<u32, LoaderError> {
    raw.parse::<u32>().map_err(|_| LoaderError::InvalidField {
        line,
        column: COLUMN_NAMES[col],
        value: raw.to_string(),
    })
}

fn parse_value(line: usize, col: usize, raw: &str) -> Result<f64, LoaderError> {
    raw.parse::<f64>().map_err(|_| LoaderError::InvalidField {
        line,
        column: COLUMN_NAMES[col],
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Write;

    const ROW_1: &str = "1 1 -0.0007 -0.0004 100.0 518.67 641.82 1589.70 1400.60 14.62 21.61 554.36 2388.06 9046.19 1.30 47.47 521.66 2388.02 8138.62 8.4195 0.03 392 2388 100.00 39.06 23.4190  ";
    const ROW_2: &str = "1 2 0.0019 -0.0003 100.0 518.67 642.15 1591.82 1403.14 14.62 21.61 553.75 2388.04 9044.07 1.30 47.49 522.28 2388.07 8131.49 8.4318 0.03 392 2388 100.00 39.00 23.4236";

    #[test]
    fn test_parse_fd001_rows() {
        let text = format!("{}\n{}\n", ROW_1, ROW_2);
        let records = TelemetryLoader::parse_str(&text).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].engine_id, 1);
        assert_eq!(records[0].cycle, 1);
        assert_eq!(records[1].cycle, 2);
        assert!((records[0].settings[0] + 0.0007).abs() < 1e-12);
        assert!((records[0].sensor(1).unwrap() - 518.67).abs() < 1e-9);
        assert!((records[1].sensor(7).unwrap() - 553.75).abs() < 1e-9);
        assert!((records[1].sensor(21).unwrap() - 23.4236).abs() < 1e-9);
    }

    #[test]
    fn test_blank_lines_skipped() {
        let text = format!("\n{}\n\n   \n{}\n", ROW_1, ROW_2);
        let records = TelemetryLoader::parse_str(&text).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_short_row_is_schema_mismatch() {
        let text = format!("{}\n1 3 0.0 0.0 100.0 518.67\n", ROW_1);
        let err = TelemetryLoader::parse_str(&text).unwrap_err();

        match err {
            LoaderError::SchemaMismatch {
                line,
                expected,
                actual,
            } => {
                assert_eq!(line, 2);
                assert_eq!(expected, 26);
                assert_eq!(actual, 6);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_extra_column_is_schema_mismatch() {
        let text = format!("{} 99.0\n", ROW_2);
        assert!(matches!(
            TelemetryLoader::parse_str(&text),
            Err(LoaderError::SchemaMismatch { actual: 27, .. })
        ));
    }

    #[test]
    fn test_non_numeric_field() {
        let text = ROW_2.replacen("642.15", "n/a", 1);
        match TelemetryLoader::parse_str(&text).unwrap_err() {
            LoaderError::InvalidField { column, value, .. } => {
                assert_eq!(column, "sensor_2");
                assert_eq!(value, "n/a");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_fractional_cycle_rejected() {
        let text = ROW_2.replacen("1 2 ", "1 2.5 ", 1);
        assert!(matches!(
            TelemetryLoader::parse_str(&text),
            Err(LoaderError::InvalidField { column: "cycle", .. })
        ));
    }

    #[test]
    fn test_load_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{}", ROW_1).unwrap();
        writeln!(file, "{}", ROW_2).unwrap();

        let records = TelemetryLoader::load_path(file.path()).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = TelemetryLoader::load_path("/nonexistent/FD001.txt");
        assert!(matches!(result, Err(LoaderError::Io(_))));
    }

    proptest! {
        #[test]
        fn prop_wrong_field_count_always_rejected(count in 1usize..40) {
            prop_assume!(count != COLUMN_COUNT);
            let line = vec!["1"; count].join(" ");
            let is_mismatch = matches!(
                TelemetryLoader::parse_line(1, &line),
                Err(LoaderError::SchemaMismatch { .. })
            );
            prop_assert!(is_mismatch);
        }
    }
}
