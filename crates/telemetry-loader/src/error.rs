//! Loader Error Types

use thiserror::Error;

/// Errors that can occur while loading engine telemetry
#[derive(Debug, Error)]
pub enum LoaderError {
    /// Row field count does not match the fixed column schema
    #[error("Schema mismatch on line {line}: expected {expected} fields, got {actual}")]
    SchemaMismatch {
        line: usize,
        expected: usize,
        actual: usize,
    },

    /// Field could not be parsed into its column type
    #[error("Invalid value {value:?} for column {column} on line {line}")]
    InvalidField {
        line: usize,
        column: &'static str,
        value: String,
    },

    /// Underlying read failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
