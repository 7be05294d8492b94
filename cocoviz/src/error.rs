use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

#[derive(Clone, Debug, Error, Serialize)]
#[cfg_attr(test, derive(PartialEq))]
#[error(transparent)]
// As long as the struct member is private, we force people to use the `new` method and log the error.
pub struct Error(Arc<ErrorDetails>);

impl Error {
    pub fn new(details: ErrorDetails) -> Self {
        details.log();
        Error(Arc::new(details))
    }

    pub fn get_details(&self) -> &ErrorDetails {
        &self.0
    }

    pub fn log(&self) {
        self.0.log();
    }

    pub fn log_at_level(&self, prefix: &str, level: tracing::Level) {
        self.0.log_at_level(prefix, level);
    }
}

impl From<ErrorDetails> for Error {
    fn from(details: ErrorDetails) -> Self {
        Error::new(details)
    }
}

#[derive(Debug, Error, Serialize)]
#[cfg_attr(test, derive(PartialEq))]
pub enum ErrorDetails {
    Arrow {
        message: String,
    },
    BadRuntimeProfile {
        message: String,
    },
    ColumnLengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },
    ColumnNotFound {
        column: String,
    },
    Config {
        message: String,
    },
    EmptyTable,
    FileRead {
        path: PathBuf,
        message: String,
    },
    FileWrite {
        path: PathBuf,
        message: String,
    },
    IndicatorMismatch {
        expected: BTreeSet<String>,
        actual: BTreeSet<String>,
    },
    InvalidFevals {
        row: usize,
        value: f64,
    },
    InvalidProblem {
        message: String,
    },
    MissingMetadata {
        key: String,
    },
    NoSuchIndicator {
        indicator: String,
        available: BTreeSet<String>,
    },
    Parquet {
        message: String,
    },
    ReservedColumn {
        column: String,
    },
    Serialization {
        message: String,
    },
    UnknownIndicator {
        name: String,
    },
}

impl ErrorDetails {
    /// Defines the error level for logging this error
    fn level(&self) -> tracing::Level {
        match self {
            ErrorDetails::Arrow { .. } => tracing::Level::ERROR,
            ErrorDetails::BadRuntimeProfile { .. } => tracing::Level::WARN,
            ErrorDetails::ColumnLengthMismatch { .. } => tracing::Level::WARN,
            ErrorDetails::ColumnNotFound { .. } => tracing::Level::WARN,
            ErrorDetails::Config { .. } => tracing::Level::ERROR,
            ErrorDetails::EmptyTable => tracing::Level::WARN,
            ErrorDetails::FileRead { .. } => tracing::Level::ERROR,
            ErrorDetails::FileWrite { .. } => tracing::Level::ERROR,
            ErrorDetails::IndicatorMismatch { .. } => tracing::Level::WARN,
            ErrorDetails::InvalidFevals { .. } => tracing::Level::WARN,
            ErrorDetails::InvalidProblem { .. } => tracing::Level::WARN,
            ErrorDetails::MissingMetadata { .. } => tracing::Level::ERROR,
            ErrorDetails::NoSuchIndicator { .. } => tracing::Level::WARN,
            ErrorDetails::Parquet { .. } => tracing::Level::ERROR,
            ErrorDetails::ReservedColumn { .. } => tracing::Level::WARN,
            ErrorDetails::Serialization { .. } => tracing::Level::ERROR,
            ErrorDetails::UnknownIndicator { .. } => tracing::Level::WARN,
        }
    }

    pub fn log_at_level(&self, prefix: &str, level: tracing::Level) {
        match level {
            tracing::Level::ERROR => tracing::error!("{prefix}{self}"),
            tracing::Level::WARN => tracing::warn!("{prefix}{self}"),
            tracing::Level::INFO => tracing::info!("{prefix}{self}"),
            tracing::Level::DEBUG => tracing::debug!("{prefix}{self}"),
            tracing::Level::TRACE => tracing::trace!("{prefix}{self}"),
        }
    }

    /// Log the error using the `tracing` library
    pub fn log(&self) {
        self.log_at_level("", self.level());
    }
}

/// Formats a set of column names as `{a, b, c}` for error messages.
fn display_set(set: &BTreeSet<String>) -> String {
    let names: Vec<&str> = set.iter().map(String::as_str).collect();
    format!("{{{}}}", names.join(", "))
}

impl std::fmt::Display for ErrorDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorDetails::Arrow { message } => write!(f, "Arrow error: {message}"),
            ErrorDetails::BadRuntimeProfile { message } => {
                write!(f, "Cannot derive runtime profile: {message}")
            }
            ErrorDetails::ColumnLengthMismatch {
                column,
                expected,
                actual,
            } => write!(
                f,
                "Column `{column}` has {actual} rows but the table has {expected} rows"
            ),
            ErrorDetails::ColumnNotFound { column } => {
                write!(f, "Column `{column}` not found in table")
            }
            ErrorDetails::Config { message } => write!(f, "Configuration error: {message}"),
            ErrorDetails::EmptyTable => write!(f, "Result table must contain at least one column"),
            ErrorDetails::FileRead { path, message } => {
                write!(f, "Failed to read `{}`: {message}", path.display())
            }
            ErrorDetails::FileWrite { path, message } => {
                write!(f, "Failed to write `{}`: {message}", path.display())
            }
            ErrorDetails::IndicatorMismatch { expected, actual } => write!(
                f,
                "Indicators in results don't match: {} vs {}",
                display_set(expected),
                display_set(actual)
            ),
            ErrorDetails::InvalidFevals { row, value } => write!(
                f,
                "Number of function evaluations must be finite, got {value} in row {row}"
            ),
            ErrorDetails::InvalidProblem { message } => {
                write!(f, "Invalid problem description: {message}")
            }
            ErrorDetails::MissingMetadata { key } => {
                write!(f, "Persisted result is missing `{key}` metadata")
            }
            ErrorDetails::NoSuchIndicator {
                indicator,
                available,
            } => write!(
                f,
                "No such indicator `{indicator}` in result (available: {})",
                display_set(available)
            ),
            ErrorDetails::Parquet { message } => write!(f, "Parquet error: {message}"),
            ErrorDetails::ReservedColumn { column } => write!(
                f,
                "Column name `{column}` is reserved and cannot be used as an indicator"
            ),
            ErrorDetails::Serialization { message } => {
                write!(f, "Serialization error: {message}")
            }
            ErrorDetails::UnknownIndicator { name } => write!(
                f,
                "Unknown indicator `{name}`. Register it first with `cocoviz::indicator::register(Indicator::new(\"{name}\", larger_is_better))`"
            ),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::new(ErrorDetails::Serialization {
            message: err.to_string(),
        })
    }
}

impl From<arrow::error::ArrowError> for Error {
    fn from(err: arrow::error::ArrowError) -> Self {
        Error::new(ErrorDetails::Arrow {
            message: err.to_string(),
        })
    }
}

impl From<parquet::errors::ParquetError> for Error {
    fn from(err: parquet::errors::ParquetError) -> Self {
        Error::new(ErrorDetails::Parquet {
            message: err.to_string(),
        })
    }
}
